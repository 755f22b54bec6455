use std::fmt;

use serde::{Deserialize, Serialize};

use super::ExtraFields;

/// Session category as published on the meeting pages.
///
/// Unknown values coming from hand-edited bundles are kept in `Other` so
/// they survive a load/save cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TalkCategory {
    Keynote,
    #[default]
    TechnicalTalk,
    StudentTalk,
    Tutorial,
    Panel,
    QuickTalk,
    LightningTalk,
    Bof,
    Poster,
    Workshop,
    Other(String),
}

impl TalkCategory {
    pub const ALL: [TalkCategory; 10] = [
        Self::Keynote,
        Self::TechnicalTalk,
        Self::StudentTalk,
        Self::Tutorial,
        Self::Panel,
        Self::QuickTalk,
        Self::LightningTalk,
        Self::Bof,
        Self::Poster,
        Self::Workshop,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Keynote => "keynote",
            Self::TechnicalTalk => "technical-talk",
            Self::StudentTalk => "student-talk",
            Self::Tutorial => "tutorial",
            Self::Panel => "panel",
            Self::QuickTalk => "quick-talk",
            Self::LightningTalk => "lightning-talk",
            Self::Bof => "bof",
            Self::Poster => "poster",
            Self::Workshop => "workshop",
            Self::Other(raw) => raw,
        }
    }

    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == trimmed)
            .unwrap_or_else(|| Self::Other(raw.to_string()))
    }

    /// Placeholder used when a stored talk has no category key at all.
    pub fn missing() -> Self {
        Self::Other(String::new())
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for TalkCategory {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<TalkCategory> for String {
    fn from(category: TalkCategory) -> Self {
        match category {
            TalkCategory::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TalkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A presenter. Extraction only ever fills `name`; the rest is curated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Speaker {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub affiliation: String,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Speaker {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// One presentation record as stored in a meeting bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Talk {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "meeting", default)]
    pub meeting_slug: String,
    #[serde(default)]
    pub meeting_name: String,
    #[serde(default)]
    pub meeting_location: String,
    #[serde(default)]
    pub meeting_date: String,
    #[serde(default = "TalkCategory::missing")]
    pub category: TalkCategory,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub speakers: Vec<Speaker>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub slides_url: Option<String>,
    /// `None` means the key was absent from the stored record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Talk {
    pub fn new(id: impl Into<String>, meeting_slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            meeting_slug: meeting_slug.into(),
            meeting_name: String::new(),
            meeting_location: String::new(),
            meeting_date: String::new(),
            category: TalkCategory::default(),
            title: title.into(),
            speakers: Vec::new(),
            abstract_text: String::new(),
            video_url: None,
            video_id: None,
            slides_url: None,
            project_github: Some(String::new()),
            tags: Some(Vec::new()),
            extra: ExtraFields::new(),
        }
    }

    pub fn speaker_names(&self) -> impl Iterator<Item = &str> {
        self.speakers.iter().map(|s| s.name.as_str())
    }

    pub fn has_slides(&self) -> bool {
        has_text(self.slides_url.as_deref())
    }

    pub fn has_video(&self) -> bool {
        has_text(self.video_url.as_deref()) || has_text(self.video_id.as_deref())
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
