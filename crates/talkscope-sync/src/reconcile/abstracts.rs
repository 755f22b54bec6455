//! Abstract cleaning.
//!
//! Scraped abstracts often start with a repeat of the title, `[Video]` /
//! `[Slides]` link labels and a `Speakers: ...` line. Cleaning runs a fixed
//! pipeline of leading-noise strippers until the text stops changing, bounded
//! by [`MAX_CLEAN_PASSES`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::{collapse_ws, normalize_key};

/// Upper bound on pipeline iterations.
pub const MAX_CLEAN_PASSES: usize = 6;

static METADATA_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:\[\s*(?:video|slides?)\s*\]|(?:speakers?|presenters?)\s*:)")
        .expect("valid regex")
});
static LINK_TAGS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:\[\s*(?:video|slides?)\s*\]\s*)+").expect("valid regex"));
static SPEAKER_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:speakers?|presenters?)\s*:\s*").expect("valid regex"));
static LEADING_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[\-:;,.]+\s*").expect("valid regex"));

/// What the strippers know about the talk the abstract belongs to.
///
/// The title and speaker-list patterns are compiled once here and shared by
/// every pass.
#[derive(Debug, Clone)]
pub struct AbstractContext {
    title: String,
    title_key: String,
    title_re: Option<Regex>,
    speaker_list_re: Option<Regex>,
}

impl AbstractContext {
    pub fn new(title: &str, speakers: &[&str]) -> Self {
        let title = collapse_ws(title);
        let title_re = (!title.is_empty())
            .then(|| {
                Regex::new(&format!(
                    r"(?i)^\s*{}\s*(?:[\-:–—]\s*)?",
                    regex::escape(&title)
                ))
                .ok()
            })
            .flatten();
        Self {
            title_key: normalize_key(&title),
            title,
            title_re,
            speaker_list_re: speaker_list_pattern(speakers),
        }
    }
}

/// `Name, Name and Name -` for this talk's speakers, longest name first so
/// "Ann Lee" wins over "Ann".
fn speaker_list_pattern(speakers: &[&str]) -> Option<Regex> {
    let mut names: Vec<String> = speakers
        .iter()
        .map(|name| collapse_ws(name))
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        return None;
    }
    names.sort();
    names.dedup();
    names.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));

    let alternatives = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"(?i)^(?:{alternatives})(?:\s*(?:,|and|&)\s*(?:{alternatives}))*\s*(?:[\-:;–—]\s*)?"
    ))
    .ok()
}

type CleanStep = fn(&str, &AbstractContext) -> String;

const PIPELINE: [CleanStep; 4] = [
    strip_leading_title,
    strip_link_tags,
    strip_speaker_block,
    strip_leading_punctuation,
];

/// Clean `raw` against the talk's title and speaker names.
pub fn clean_abstract_text(raw: &str, title: &str, speakers: &[&str]) -> String {
    let mut text = collapse_ws(raw);
    if text.is_empty() {
        return text;
    }

    let ctx = AbstractContext::new(title, speakers);
    for _ in 0..MAX_CLEAN_PASSES {
        let before = text.clone();
        text = clean_pass(&text, &ctx);
        if text == before {
            break;
        }
    }
    text
}

/// One run of the pipeline, re-normalised.
pub fn clean_pass(text: &str, ctx: &AbstractContext) -> String {
    let stripped = PIPELINE
        .iter()
        .fold(text.to_string(), |acc, step| step(&acc, ctx));
    collapse_ws(&stripped)
}

/// Drop a leading copy of the title, literal or fuzzy.
///
/// The title is only removed when what follows is empty or starts with
/// link/speaker metadata; an abstract that merely opens with the title's
/// words keeps them.
pub fn strip_leading_title(text: &str, ctx: &AbstractContext) -> String {
    let abstract_text = collapse_ws(text);
    if abstract_text.is_empty() || ctx.title.is_empty() {
        return abstract_text;
    }

    if let Some(re) = &ctx.title_re
        && let Some(m) = re.find(&abstract_text)
    {
        let remainder = &abstract_text[m.end()..];
        return if is_strippable_remainder(remainder) {
            remainder.to_string()
        } else {
            abstract_text
        };
    }

    let title_key = &ctx.title_key;
    if title_key.is_empty() || !normalize_key(&abstract_text).starts_with(title_key.as_str()) {
        return abstract_text;
    }

    // Walk the alphanumerics of the abstract until the title key is covered.
    let wanted = title_key.chars().count();
    let mut consumed = String::new();
    let mut seen = 0usize;
    let mut end_index = None;
    for (idx, ch) in abstract_text.char_indices() {
        if ch.is_alphanumeric() {
            consumed.extend(ch.to_lowercase());
            seen += 1;
            if seen >= wanted {
                end_index = Some(idx + ch.len_utf8());
                break;
            }
        }
    }

    let Some(end_index) = end_index else {
        return abstract_text;
    };
    if consumed != *title_key {
        return abstract_text;
    }
    let remainder = &abstract_text[end_index..];
    if is_strippable_remainder(remainder) {
        remainder.to_string()
    } else {
        abstract_text
    }
}

fn is_strippable_remainder(remainder: &str) -> bool {
    remainder.trim().is_empty() || METADATA_PREFIX_RE.is_match(remainder)
}

pub fn strip_link_tags(text: &str, _ctx: &AbstractContext) -> String {
    LINK_TAGS_RE.replace(text, "").into_owned()
}

/// Drop a `Speakers:` / `Presenters:` label and, when it follows, the list of
/// this talk's speaker names.
pub fn strip_speaker_block(text: &str, ctx: &AbstractContext) -> String {
    let value = collapse_ws(text);
    let Some(label) = SPEAKER_LABEL_RE.find(&value) else {
        return value;
    };
    let remainder = value[label.end()..].trim_start();

    if let Some(re) = &ctx.speaker_list_re
        && let Some(m) = re.find(remainder)
    {
        return remainder[m.end()..].to_string();
    }
    remainder.to_string()
}

pub fn strip_leading_punctuation(text: &str, _ctx: &AbstractContext) -> String {
    LEADING_PUNCT_RE.replace(text, "").into_owned()
}
