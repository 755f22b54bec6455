use serde::{Deserialize, Serialize};

use super::ExtraFields;

/// Site-facing feed of recently added talks, slides and recordings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLog {
    #[serde(default)]
    pub data_version: String,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub entries: Vec<UpdateLogEntry>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLogEntry {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub logged_at: String,
    #[serde(default)]
    pub sort_hint: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub parts: Vec<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talk_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slides_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}
