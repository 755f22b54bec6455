use serde::{Deserialize, Serialize};

use super::ExtraFields;

/// `events/index.json`: the list of bundle files the site loads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub data_version: String,
    #[serde(default)]
    pub event_files: Vec<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}
