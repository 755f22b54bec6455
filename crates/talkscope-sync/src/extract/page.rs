use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde::Serialize;

use talkscope_core::{Speaker, TalkCategory};

use super::links::{LinkKind, abs_url, link_kinds};
use super::{element_text, fragment_text, has_class, parse_selector};
use crate::candidate::{MeetingHint, TalkCandidate, split_keynote_prefix};
use crate::error::Result;
use crate::reconcile::{MatchKey, clean_abstract_text};
use crate::text::{collapse_ws, normalize_key};

const DATE_LABELS: &[&str] = &["Conference Date", "When", "Date"];
const LOCATION_LABELS: &[&str] = &["Location", "Where"];

/// Section heading labels, most specific first for the substring pass.
const CATEGORY_LABELS: &[(&str, TalkCategory)] = &[
    ("student technical talks", TalkCategory::StudentTalk),
    ("student technical talk", TalkCategory::StudentTalk),
    ("technical talks", TalkCategory::TechnicalTalk),
    ("technical talk", TalkCategory::TechnicalTalk),
    ("keynotes", TalkCategory::Keynote),
    ("keynote", TalkCategory::Keynote),
    ("tutorials", TalkCategory::Tutorial),
    ("tutorial", TalkCategory::Tutorial),
    ("panels", TalkCategory::Panel),
    ("panel", TalkCategory::Panel),
    ("quick talks", TalkCategory::QuickTalk),
    ("quick talk", TalkCategory::QuickTalk),
    ("lightning talks", TalkCategory::LightningTalk),
    ("lightning talk", TalkCategory::LightningTalk),
    ("birds of a feather", TalkCategory::Bof),
    ("bof", TalkCategory::Bof),
    ("posters", TalkCategory::Poster),
    ("poster", TalkCategory::Poster),
    ("workshops", TalkCategory::Workshop),
    ("workshop", TalkCategory::Workshop),
];

static CANCELED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bcance(?:lled|led|llation|lation)\b").expect("valid regex")
});
static BACK_TO_SCHEDULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*▲\s*back to schedule.*$").expect("valid regex"));
static SPEAKER_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(?:speakers?|presenters?)\s*:\s*(.*?)<br").expect("valid regex")
});
static SPEAKER_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:speakers?|presenters?)\s*:").expect("valid regex"));

/// Everything one meeting page yields.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ExtractedMeeting {
    pub hint: MeetingHint,
    pub talks: Vec<TalkCandidate>,
}

/// Parse one `devmtg/{slug}/index.html` page.
///
/// Talks come from `div.session-entry` blocks, or from `h3`/`h4`/`p` abstract
/// sections on older pages without a schedule table. Candidates carry the raw
/// page values and are unique by match key; normalisation happens once, in
/// [`crate::reconcile::reconcile_meeting`].
pub fn parse_meeting_page(html: &str, slug: &str, page_base: &str) -> Result<ExtractedMeeting> {
    let document = Html::parse_document(html);

    let hint = MeetingHint {
        name: meeting_name(&document, slug)?,
        date: labeled_value(&document, DATE_LABELS)?,
        location: labeled_value(&document, LOCATION_LABELS)?,
        canceled: CANCELED_RE.is_match(&document.root_element().text().collect::<String>()),
    };

    let mut talks = session_entries(&document, slug, page_base)?;
    if talks.is_empty() {
        talks = abstract_sections(&document, slug, page_base)?;
    }

    let mut seen = HashSet::new();
    let talks = talks
        .into_iter()
        .filter(|talk| {
            let (title, _) = split_keynote_prefix(&talk.title);
            let key = MatchKey::new(&title, talk.speaker_names());
            key.is_usable() && seen.insert(key)
        })
        .collect();

    Ok(ExtractedMeeting { hint, talks })
}

/// Map a section heading to a category: exact label first, then substring.
pub fn category_from_heading(heading: &str) -> Option<TalkCategory> {
    let clean = collapse_ws(heading).to_lowercase();
    let clean = clean.trim_end_matches(':').trim();
    CATEGORY_LABELS
        .iter()
        .find(|(label, _)| *label == clean)
        .or_else(|| CATEGORY_LABELS.iter().find(|(label, _)| clean.contains(*label)))
        .map(|(_, category)| category.clone())
}

/// Collapse whitespace and drop a trailing "▲ back to schedule" marker.
pub fn clean_title(raw: &str) -> String {
    let title = collapse_ws(raw);
    let title = BACK_TO_SCHEDULE_RE.replace(&title, "");
    collapse_ws(&title.replace('▲', ""))
}

fn meeting_name(document: &Html, slug: &str) -> Result<String> {
    for selector in ["h1", "div.www_sectiontitle"] {
        let selector = parse_selector(selector)?;
        if let Some(name) = document
            .select(&selector)
            .next()
            .map(|el| clean_title(&element_text(&el)))
            .filter(|name| !name.is_empty())
        {
            return Ok(name);
        }
    }
    Ok(slug.to_string())
}

/// Value of the first `<li><b>Label:</b> value</li>` for any of `labels`,
/// tried in order.
fn labeled_value(document: &Html, labels: &[&str]) -> Result<String> {
    let li_selector = parse_selector("li")?;
    for label in labels {
        for li in document.select(&li_selector) {
            let Some(bold) = li.children().filter_map(ElementRef::wrap).next() else {
                continue;
            };
            if bold.value().name() != "b" {
                continue;
            }
            let bold_text = element_text(&bold);
            if !bold_text.trim_end_matches(':').trim().eq_ignore_ascii_case(label) {
                continue;
            }
            let full = element_text(&li);
            let value = full
                .strip_prefix(bold_text.as_str())
                .unwrap_or(&full)
                .trim_start()
                .trim_start_matches(':');
            let value = collapse_ws(value);
            if !value.is_empty() {
                return Ok(value);
            }
        }
    }
    Ok(String::new())
}

fn session_entries(document: &Html, slug: &str, page_base: &str) -> Result<Vec<TalkCandidate>> {
    let token_selector = parse_selector("p, div.www_sectiontitle, div.session-entry")?;
    let title_selector = parse_selector("i")?;
    let paragraph_selector = parse_selector("p")?;
    let anchor_selector = parse_selector("a[href]")?;

    let mut category = TalkCategory::TechnicalTalk;
    let mut talks = Vec::new();

    for element in document.select(&token_selector) {
        if has_class(&element, "session-entry") {
            let Some(title) = element
                .select(&title_selector)
                .next()
                .map(|el| clean_title(&element_text(&el)))
                .filter(|title| !title.is_empty())
            else {
                continue;
            };

            let speakers = SPEAKER_LINE_RE
                .captures(&element.inner_html())
                .and_then(|caps| caps.get(1))
                .map(|m| parse_speakers(&fragment_text(m.as_str())))
                .unwrap_or_default();
            let names: Vec<&str> = speakers.iter().map(|s| s.name.as_str()).collect();
            let (bare_title, _) = split_keynote_prefix(&title);

            // Pick by cleaned length, keep the raw paragraph.
            let mut abstract_text = String::new();
            let mut best_len = 0;
            for paragraph in element.select(&paragraph_selector) {
                let raw = element_text(&paragraph);
                let cleaned = clean_abstract_text(&raw, &bare_title, &names);
                if cleaned.is_empty()
                    || SPEAKER_LABEL_RE.is_match(&cleaned)
                    || normalize_key(&cleaned) == normalize_key(&bare_title)
                {
                    continue;
                }
                let len = cleaned.chars().count();
                if len > best_len {
                    best_len = len;
                    abstract_text = collapse_ws(&raw);
                }
            }

            let (video_url, slides_url) = links_in(&element, &anchor_selector, slug, page_base);
            talks.push(TalkCandidate {
                title,
                category: category.clone(),
                speakers,
                abstract_text,
                video_url,
                video_id: None,
                slides_url,
            });
            continue;
        }

        let is_heading = if has_class(&element, "www_sectiontitle") {
            true
        } else {
            !inside_session_entry(&element) && is_bold_paragraph(&element)
        };
        if is_heading && let Some(found) = category_from_heading(&element_text(&element)) {
            category = found;
        }
    }

    Ok(talks)
}

/// `<h3 id=..>title</h3> <h4>speakers</h4> <p>abstract</p>` runs.
fn abstract_sections(document: &Html, slug: &str, page_base: &str) -> Result<Vec<TalkCandidate>> {
    let heading_selector = parse_selector("h3[id]")?;
    let anchor_selector = parse_selector("a[href]")?;
    let mut talks = Vec::new();

    for heading in document.select(&heading_selector) {
        let title = clean_title(&element_text(&heading));
        if title.is_empty() {
            continue;
        }
        let lower = title.to_lowercase();
        if lower.contains("call for speakers") || lower.contains("program committee") {
            continue;
        }

        let mut following = next_elements(&heading);
        let Some(speaker_el) = following.next().filter(|el| el.value().name() == "h4") else {
            continue;
        };
        let Some(abstract_el) = following.next().filter(|el| el.value().name() == "p") else {
            continue;
        };

        let (video_url, slides_url) = links_in(&heading, &anchor_selector, slug, page_base);
        talks.push(TalkCandidate {
            title,
            category: TalkCategory::TechnicalTalk,
            speakers: parse_speakers(&element_text(&speaker_el)),
            abstract_text: element_text(&abstract_el),
            video_url,
            video_id: None,
            slides_url,
        });
    }

    Ok(talks)
}

/// Sibling elements after `element`, stopping at the first non-blank text.
fn next_elements<'a>(element: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element
        .next_siblings()
        .take_while(|node| node.value().as_text().is_none_or(|t| t.trim().is_empty()))
        .filter_map(ElementRef::wrap)
}

fn links_in(
    element: &ElementRef<'_>,
    anchor_selector: &scraper::Selector,
    slug: &str,
    page_base: &str,
) -> (Option<String>, Option<String>) {
    let mut video_url = None;
    let mut slides_url = None;
    for anchor in element.select(anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        for kind in link_kinds(&element_text(&anchor)) {
            let slot = match kind {
                LinkKind::Video => &mut video_url,
                LinkKind::Slides => &mut slides_url,
            };
            if slot.is_none() {
                *slot = Some(abs_url(page_base, slug, href));
            }
        }
    }
    (video_url, slides_url)
}

fn parse_speakers(raw: &str) -> Vec<Speaker> {
    let clean = collapse_ws(raw);
    if clean == "-" || clean == "—" {
        return Vec::new();
    }
    clean
        .split(',')
        .map(collapse_ws)
        .filter(|name| !name.is_empty())
        .map(Speaker::named)
        .collect()
}

fn inside_session_entry(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| has_class(&ancestor, "session-entry"))
}

/// `<p><b>Heading</b></p>`: the paragraph's text is exactly one bold child.
fn is_bold_paragraph(element: &ElementRef<'_>) -> bool {
    let mut children = element.children().filter_map(ElementRef::wrap);
    match (children.next(), children.next()) {
        (Some(only), None) if only.value().name() == "b" => {
            let text = element_text(element);
            !text.is_empty() && text == element_text(&only)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://llvm.org/devmtg";

    const SESSION_PAGE: &str = r#"<html><body>
<div class="www_sectiontitle">2024 LLVM Developers' Meeting</div>
<ul>
  <li><b>Conference Date:</b> October 22-24, 2024</li>
  <li><b>Location:</b> Santa Clara Marriott, Santa Clara, CA</li>
</ul>
<p><b>Keynotes</b></p>
<div class="session-entry">
  <i>Keynote: The State of LLVM</i><br>
  Speakers: Jane Doe<br>
  [<a href="https://youtu.be/abc123">Video</a>] [<a href="slides/State.pdf">Slides</a>]
  <p>The State of LLVM [Slides] Speakers: Jane Doe - A look back at the year.</p>
</div>
<p><b>Technical Talks</b></p>
<div class="session-entry">
  <i>Vectorizing Loops ▲ back to schedule</i><br>
  Speakers: Ann Lee, Bo Li<br>
  <p>Short.</p>
  <p>We describe the new cost model in detail.</p>
</div>
<div class="session-entry">
  <i>Vectorizing   loops</i><br>
  Speakers: Ann Lee, Bo Li<br>
</div>
<div class="session-entry"><b>No title here</b></div>
</body></html>"#;

    #[test]
    fn session_entries_yield_candidates_with_categories() {
        let page = parse_meeting_page(SESSION_PAGE, "2024-10", BASE).unwrap();

        assert_eq!(page.hint.name, "2024 LLVM Developers' Meeting");
        assert_eq!(page.hint.date, "October 22-24, 2024");
        assert_eq!(page.hint.location, "Santa Clara Marriott, Santa Clara, CA");
        assert!(!page.hint.canceled);

        assert_eq!(page.talks.len(), 2);
        let keynote = &page.talks[0];
        assert_eq!(keynote.title, "Keynote: The State of LLVM");
        assert_eq!(keynote.category, TalkCategory::Keynote);
        assert_eq!(keynote.speaker_names(), vec!["Jane Doe"]);
        assert_eq!(keynote.video_url.as_deref(), Some("https://youtu.be/abc123"));
        assert_eq!(
            keynote.slides_url.as_deref(),
            Some("https://llvm.org/devmtg/2024-10/slides/State.pdf")
        );
        assert_eq!(
            keynote.abstract_text,
            "The State of LLVM [Slides] Speakers: Jane Doe - A look back at the year."
        );

        let normalized = keynote.normalized();
        assert_eq!(normalized.title, "The State of LLVM");
        assert_eq!(normalized.video_id.as_deref(), Some("abc123"));
        assert_eq!(normalized.abstract_text, "A look back at the year.");

        let talk = &page.talks[1];
        assert_eq!(talk.title, "Vectorizing Loops");
        assert_eq!(talk.category, TalkCategory::TechnicalTalk);
        assert_eq!(talk.speaker_names(), vec!["Ann Lee", "Bo Li"]);
        assert_eq!(talk.abstract_text, "We describe the new cost model in detail.");
    }

    #[test]
    fn older_pages_fall_back_to_abstract_sections() {
        let html = r#"<html><body><h1>2009 LLVM Developers' Meeting</h1>
<ul><li><b>When</b>: October 2, 2009</li><li><b>Where</b> Cupertino, CA</li></ul>
<h3 id="cfp">Call for Speakers</h3><h4>-</h4><p>Send proposals.</p>
<h3 id="clang">Clang Progress <a href="slides/Clang.pdf">[Slides]</a></h3>
<h4>Chris Lattner</h4>
<p>An update on the Clang frontend.</p>
<h3 id="orphan">No Speakers</h3>
<p>Missing heading.</p>
</body></html>"#;
        let page = parse_meeting_page(html, "2009-10", BASE).unwrap();

        assert_eq!(page.hint.name, "2009 LLVM Developers' Meeting");
        assert_eq!(page.hint.date, "October 2, 2009");
        assert_eq!(page.hint.location, "Cupertino, CA");
        assert_eq!(page.talks.len(), 1);
        let talk = &page.talks[0];
        assert_eq!(talk.title, "Clang Progress [Slides]");
        assert_eq!(talk.speaker_names(), vec!["Chris Lattner"]);
        assert_eq!(talk.abstract_text, "An update on the Clang frontend.");
        assert_eq!(
            talk.slides_url.as_deref(),
            Some("https://llvm.org/devmtg/2009-10/slides/Clang.pdf")
        );
    }

    #[test]
    fn canceled_meetings_are_flagged() {
        let html = "<html><body><h1>2020 Meeting</h1><p>This event has been cancelled.</p></body></html>";
        let page = parse_meeting_page(html, "2020-04", BASE).unwrap();
        assert!(page.hint.canceled);
        assert!(page.talks.is_empty());
        assert_eq!(page.hint.date, "");
    }

    #[test]
    fn missing_headings_fall_back_to_slug() {
        let page = parse_meeting_page("<html><body></body></html>", "2011-11", BASE).unwrap();
        assert_eq!(page.hint.name, "2011-11");
    }

    #[test]
    fn headings_map_to_categories() {
        assert_eq!(category_from_heading("Keynotes:"), Some(TalkCategory::Keynote));
        assert_eq!(
            category_from_heading("Student Technical Talks"),
            Some(TalkCategory::StudentTalk)
        );
        assert_eq!(
            category_from_heading("Lightning Talks (Tuesday)"),
            Some(TalkCategory::LightningTalk)
        );
        assert_eq!(category_from_heading("BoFs"), Some(TalkCategory::Bof));
        assert_eq!(category_from_heading("Lunch"), None);
    }

    #[test]
    fn titles_lose_schedule_marker() {
        assert_eq!(clean_title("  Foo   Bar ▲ back to schedule "), "Foo Bar");
        assert_eq!(clean_title("Plain"), "Plain");
    }
}
