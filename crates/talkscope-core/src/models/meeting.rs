use serde::{Deserialize, Serialize};

use super::ExtraFields;

/// One conference instance, keyed by its slug (`2024-10`, `2019-04-08`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
    /// Filled from the scraped page only while absent; curated afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled: Option<bool>,
    #[serde(default)]
    pub talk_count: usize,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Meeting {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Self::default()
        }
    }
}
