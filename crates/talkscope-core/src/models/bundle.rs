use serde::{Deserialize, Serialize};

use super::{ExtraFields, Meeting, Talk};

/// The persisted unit: one meeting and all of its talks (`{slug}.json`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeetingBundle {
    #[serde(default)]
    pub meeting: Meeting,
    #[serde(default)]
    pub talks: Vec<Talk>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl MeetingBundle {
    pub fn new(meeting: Meeting, talks: Vec<Talk>) -> Self {
        Self {
            meeting,
            talks,
            extra: ExtraFields::new(),
        }
    }

    pub fn talk(&self, id: &str) -> Option<&Talk> {
        self.talks.iter().find(|t| t.id == id)
    }
}
