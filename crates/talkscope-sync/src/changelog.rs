//! The site's "recent updates" feed.
//!
//! After a sync, every talk that is new, or newly gained slides or a
//! recording, becomes one [`UpdateLogEntry`]. Entries are keyed by a
//! fingerprint so re-running a sync never logs the same event twice.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use talkscope_core::{MeetingBundle, Talk, UpdateLog, UpdateLogEntry};

use crate::text::collapse_ws;

const PART_ORDER: &[&str] = &["talk", "slides", "video"];
const UNTITLED: &str = "(Untitled talk)";

static SLUG_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})(?:-(\d{2}))?$").expect("valid regex"));
static ABSOLUTE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("valid regex"));

/// `2024-10` → `2024-10-00`, `2019-04-08` unchanged, anything else `0000-00-00`.
pub fn meeting_sort_hint(slug: &str) -> String {
    match SLUG_DATE_RE.captures(&collapse_ws(slug)) {
        Some(caps) => format!(
            "{}-{}-{}",
            &caps[1],
            &caps[2],
            caps.get(3).map_or("00", |m| m.as_str())
        ),
        None => "0000-00-00".to_string(),
    }
}

/// Canonical form of the `--site-base` prefix used for detail links.
pub fn normalize_site_base(raw: &str) -> String {
    let value = collapse_ws(raw);
    if value.is_empty() || value == "." {
        return String::new();
    }
    if ABSOLUTE_URL_RE.is_match(&value) {
        return value.trim_end_matches('/').to_string();
    }
    if value == "/" {
        return value;
    }
    if value.starts_with('/') {
        return format!("/{}", value.trim_matches('/'));
    }
    value.trim_matches('/').to_string()
}

/// `{site_base}/{page}?id={id}`, or a relative link when there is no base.
pub fn build_detail_url(site_base: &str, page: &str, id: &str) -> String {
    let target = format!("{page}?id={}", urlencoding::encode(id));
    match site_base {
        "" => target,
        "/" => format!("/{target}"),
        base => format!("{}/{target}", base.trim_end_matches('/')),
    }
}

/// Explicit video URL, else a YouTube watch URL built from the id.
pub fn talk_video_url(talk: &Talk) -> Option<String> {
    let explicit = collapse_ws(talk.video_url.as_deref().unwrap_or_default());
    if !explicit.is_empty() {
        return Some(explicit);
    }
    let id = collapse_ws(talk.video_id.as_deref().unwrap_or_default());
    (!id.is_empty())
        .then(|| format!("https://www.youtube.com/watch?v={}", urlencoding::encode(&id)))
}

/// `YYYY-MM-DDTHH:MM:SSZ`.
pub fn logged_at(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Entries for what `current` has gained over `previous`.
pub fn diff_talk_entries(
    current: &MeetingBundle,
    previous: Option<&MeetingBundle>,
    logged_at: &str,
    site_base: &str,
) -> Vec<UpdateLogEntry> {
    let previous: HashMap<String, &Talk> = previous
        .map(|bundle| {
            bundle
                .talks
                .iter()
                .map(|talk| (collapse_ws(&talk.id), talk))
                .filter(|(id, _)| !id.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for talk in &current.talks {
        let id = collapse_ws(&talk.id);
        if id.is_empty() || !seen.insert(id.clone()) {
            continue;
        }

        let before = previous.get(&id);
        let mut parts = Vec::new();
        if before.is_none() {
            parts.push("talk");
        }
        if talk.has_slides() && !before.is_some_and(|t| t.has_slides()) {
            parts.push("slides");
        }
        if talk.has_video() && !before.is_some_and(|t| t.has_video()) {
            parts.push("video");
        }

        if !parts.is_empty() {
            entries.push(talk_entry(talk, &parts, logged_at, site_base));
        }
    }
    entries
}

fn talk_entry(talk: &Talk, parts: &[&str], logged_at: &str, site_base: &str) -> UpdateLogEntry {
    let id = collapse_ws(&talk.id);
    let parts = normalize_parts(parts);
    let title = collapse_ws(&talk.title);
    let slides_url = collapse_ws(talk.slides_url.as_deref().unwrap_or_default());

    UpdateLogEntry {
        kind: "talk".to_string(),
        logged_at: logged_at.to_string(),
        sort_hint: meeting_sort_hint(&talk.meeting_slug),
        fingerprint: format!("talk:{id}:{}", parts.join(",")),
        parts,
        title: if title.is_empty() { UNTITLED.to_string() } else { title },
        url: build_detail_url(site_base, "talk.html", &id),
        talk_id: Some(id),
        meeting_slug: Some(collapse_ws(&talk.meeting_slug)),
        meeting_name: Some(collapse_ws(&talk.meeting_name)),
        meeting_date: Some(collapse_ws(&talk.meeting_date)),
        slides_url: (!slides_url.is_empty()).then_some(slides_url),
        video_url: talk_video_url(talk),
        ..UpdateLogEntry::default()
    }
}

/// Known parts in canonical order, lower-cased and unique.
fn normalize_parts(parts: &[&str]) -> Vec<String> {
    let mut keys: Vec<String> = parts
        .iter()
        .map(|part| collapse_ws(part).to_lowercase())
        .filter(|part| !part.is_empty())
        .collect();
    keys.sort_by_key(|key| {
        PART_ORDER
            .iter()
            .position(|known| known == key)
            .unwrap_or(PART_ORDER.len())
    });
    keys.dedup();
    keys
}

/// Merge `entries` into `log` (or a fresh log).
///
/// Entries whose fingerprint is already logged are dropped. The version
/// stamps are only refreshed when something was appended or the log is new,
/// so an idle sync leaves the file byte-identical. Returns the merged log and
/// how many entries were appended.
pub fn append_entries(
    log: Option<UpdateLog>,
    entries: Vec<UpdateLogEntry>,
    now: DateTime<Utc>,
) -> (UpdateLog, usize) {
    let is_new = log.is_none();
    let mut log = log.unwrap_or_default();

    let mut fingerprints: HashSet<String> = log
        .entries
        .iter()
        .map(|entry| collapse_ws(&entry.fingerprint))
        .filter(|fingerprint| !fingerprint.is_empty())
        .collect();

    let mut appended = 0;
    for entry in entries {
        let fingerprint = collapse_ws(&entry.fingerprint);
        if fingerprint.is_empty() || !fingerprints.insert(fingerprint) {
            continue;
        }
        log.entries.push(entry);
        appended += 1;
    }

    log.entries.sort_by(|a, b| {
        let key = |e: &UpdateLogEntry| {
            (
                collapse_ws(&e.logged_at),
                collapse_ws(&e.sort_hint),
                collapse_ws(&e.title),
            )
        };
        key(b).cmp(&key(a))
    });

    let stamp = logged_at(now);
    let version = format!("{}-updates-log", now.format("%Y-%m-%d"));
    if appended > 0 || is_new {
        log.data_version = version;
        log.generated_at = stamp;
    } else {
        if log.data_version.trim().is_empty() {
            log.data_version = version;
        }
        if log.generated_at.trim().is_empty() {
            log.generated_at = stamp;
        }
    }

    (log, appended)
}
