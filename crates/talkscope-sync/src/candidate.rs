//! Shapes handed from the extractor to the reconciliation core.

use serde::{Deserialize, Serialize};

use talkscope_core::{Speaker, TalkCategory};

use crate::extract::links::parse_video_id;
use crate::reconcile::clean_abstract_text;
use crate::text::collapse_ws;

const KEYNOTE_PREFIX: &str = "keynote:";

/// A freshly scraped talk, not yet reconciled into storage.
///
/// Empty strings and `None` mean "no information", never "clear the field".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkCandidate {
    pub title: String,
    pub category: TalkCategory,
    pub speakers: Vec<Speaker>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub video_url: Option<String>,
    pub video_id: Option<String>,
    pub slides_url: Option<String>,
}

impl TalkCandidate {
    pub fn new(title: impl Into<String>, category: TalkCategory) -> Self {
        Self {
            title: title.into(),
            category,
            ..Self::default()
        }
    }

    pub fn with_speakers<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.speakers = names.into_iter().map(Speaker::named).collect();
        self
    }

    pub fn speaker_names(&self) -> Vec<&str> {
        self.speakers.iter().map(|s| s.name.as_str()).collect()
    }

    /// Canonical form used for matching and merging.
    ///
    /// Applied once, by the reconciliation core, to the raw extracted values.
    ///
    /// Whitespace is collapsed everywhere, a leading `Keynote:` moves into the
    /// category, the abstract is cleaned against the talk's own title and
    /// speakers, and blank links become `None`.
    pub fn normalized(&self) -> Self {
        let (title, keynote) = split_keynote_prefix(&self.title);
        let category = if keynote {
            TalkCategory::Keynote
        } else {
            self.category.clone()
        };

        let speakers: Vec<Speaker> = self
            .speakers
            .iter()
            .filter_map(|speaker| {
                let name = collapse_ws(&speaker.name);
                (!name.is_empty()).then(|| Speaker {
                    name,
                    ..speaker.clone()
                })
            })
            .collect();

        let names: Vec<&str> = speakers.iter().map(|s| s.name.as_str()).collect();
        let abstract_text = clean_abstract_text(&self.abstract_text, &title, &names);

        let video_url = non_blank(self.video_url.as_deref());
        let video_id = non_blank(self.video_id.as_deref())
            .or_else(|| video_url.as_deref().and_then(parse_video_id));

        Self {
            title,
            category,
            speakers,
            abstract_text,
            video_url,
            video_id,
            slides_url: non_blank(self.slides_url.as_deref()),
        }
    }
}

/// Collapsed title without one leading `Keynote:`, and whether it had one.
pub fn split_keynote_prefix(raw: &str) -> (String, bool) {
    let title = collapse_ws(raw);
    match title.get(..KEYNOTE_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(KEYNOTE_PREFIX) => {
            (collapse_ws(&title[KEYNOTE_PREFIX.len()..]), true)
        }
        _ => (title, false),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Best-effort meeting summary scraped from the meeting page itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeetingHint {
    pub name: String,
    pub date: String,
    pub location: String,
    pub canceled: bool,
}

/// Independently sourced date/location for a meeting (the devmtg index page).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexHint {
    pub date: String,
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keynote_prefix_moves_into_category() {
        let candidate = TalkCandidate::new("  Keynote:   Foo  Bar ", TalkCategory::TechnicalTalk)
            .normalized();
        assert_eq!(candidate.title, "Foo Bar");
        assert_eq!(candidate.category, TalkCategory::Keynote);

        let lower = TalkCandidate::new("keynote: Foo", TalkCategory::Panel).normalized();
        assert_eq!(lower.title, "Foo");
        assert_eq!(lower.category, TalkCategory::Keynote);
    }

    #[test]
    fn title_mentioning_keynote_later_is_untouched() {
        let candidate = TalkCandidate::new("After the keynote: Q&A", TalkCategory::Panel).normalized();
        assert_eq!(candidate.title, "After the keynote: Q&A");
        assert_eq!(candidate.category, TalkCategory::Panel);
    }

    #[test]
    fn blank_speakers_and_links_are_dropped() {
        let mut candidate =
            TalkCandidate::new("GlobalISel", TalkCategory::Tutorial).with_speakers(["  ", "Amara  Emerson"]);
        candidate.slides_url = Some("   ".into());
        candidate.video_url = Some("https://www.youtube.com/watch?v=abc123XYZ".into());

        let normalized = candidate.normalized();
        assert_eq!(normalized.speaker_names(), vec!["Amara Emerson"]);
        assert!(normalized.slides_url.is_none());
        assert_eq!(normalized.video_id.as_deref(), Some("abc123XYZ"));
    }

    #[test]
    fn abstract_is_cleaned_against_own_title() {
        let mut candidate =
            TalkCandidate::new("Loop Vectorizer", TalkCategory::TechnicalTalk).with_speakers(["Ann Lee"]);
        candidate.abstract_text =
            "Loop Vectorizer [Slides] Speakers: Ann Lee — We describe the cost model.".into();

        assert_eq!(candidate.normalized().abstract_text, "We describe the cost model.");
    }

    #[test]
    fn only_one_keynote_prefix_is_removed() {
        assert_eq!(
            split_keynote_prefix(" Keynote:  Keynote: X"),
            ("Keynote: X".to_string(), true)
        );
        assert_eq!(split_keynote_prefix("Plain"), ("Plain".to_string(), false));
    }
}
