//! HTML extraction for llvm.org developer meeting pages.
//!
//! Produces [`MeetingHint`](crate::MeetingHint)s, [`IndexHint`](crate::IndexHint)s
//! and normalised [`TalkCandidate`](crate::TalkCandidate)s; it never looks at
//! stored data.

pub mod index;
pub mod links;
pub mod page;

pub use index::parse_index_hints;
pub use links::{abs_url, parse_video_id};
pub use page::{ExtractedMeeting, category_from_heading, clean_title, parse_meeting_page};

use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, SyncError};
use crate::text::collapse_ws;

pub(crate) fn parse_selector(input: &str) -> Result<Selector> {
    Selector::parse(input).map_err(|e| SyncError::Selector(format!("{input}: {e}")))
}

/// Whitespace-collapsed text content of an element.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    collapse_ws(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text content of a raw HTML snippet.
pub(crate) fn fragment_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    collapse_ws(&fragment.root_element().text().collect::<Vec<_>>().join(" "))
}

pub(crate) fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}
