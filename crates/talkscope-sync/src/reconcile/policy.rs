//! Field-by-field merge rules.
//!
//! Each rule takes the stored record plus the freshly extracted values and
//! returns a new record; nothing here mutates its inputs. A field is only
//! reported as changed when the value actually differs.

use talkscope_core::{Meeting, Talk, TalkCategory};

use crate::candidate::{IndexHint, MeetingHint, TalkCandidate};
use crate::reconcile::abstracts::clean_abstract_text;
use crate::text::{
    collapse_ws, is_meaningful_abstract, is_meaningful_meta_value, normalize_key,
    pick_preferred_value,
};

/// Preferred meeting name/location/date for one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MeetingContext {
    pub name: String,
    pub location: String,
    pub date: String,
    /// Raw values as extracted from the meeting page.
    pub raw_name: String,
    pub raw_location: String,
    pub raw_date: String,
}

impl MeetingContext {
    /// Precedence: stored meeting, first stored talk, index hint, raw page
    /// value. When the winner is just the raw page value and the index hint
    /// disagrees, the hint is promoted.
    pub fn resolve(
        slug: &str,
        stored: Option<&Meeting>,
        exemplar: Option<&Talk>,
        hint: &MeetingHint,
        index: Option<&IndexHint>,
    ) -> Self {
        let stored_name = stored.map_or("", |m| m.name.as_str());
        let stored_location = stored.map_or("", |m| m.location.as_str());
        let stored_date = stored.map_or("", |m| m.date.as_str());
        let exemplar_name = exemplar.map_or("", |t| t.meeting_name.as_str());
        let exemplar_location = exemplar.map_or("", |t| t.meeting_location.as_str());
        let exemplar_date = exemplar.map_or("", |t| t.meeting_date.as_str());
        let index_location = index.map_or("", |h| h.location.as_str());
        let index_date = index.map_or("", |h| h.date.as_str());

        let name = pick_preferred_value(&[stored_name, exemplar_name, hint.name.as_str(), slug]);
        let mut location = pick_preferred_value(&[
            stored_location,
            exemplar_location,
            index_location,
            hint.location.as_str(),
        ]);
        let mut date =
            pick_preferred_value(&[stored_date, exemplar_date, index_date, hint.date.as_str()]);

        if index.is_some() {
            location = promote_index_hint(&location, &hint.location, index_location);
            date = promote_index_hint(&date, &hint.date, index_date);
        }

        Self {
            name,
            location,
            date,
            raw_name: collapse_ws(&hint.name),
            raw_location: collapse_ws(&hint.location),
            raw_date: collapse_ws(&hint.date),
        }
    }
}

/// Replace `current` with the index hint when `current` is exactly the raw
/// page value and the hint says something else.
pub fn promote_index_hint(current: &str, raw: &str, hint: &str) -> String {
    let current_key = normalize_key(current);
    let raw_key = normalize_key(raw);
    let hint_key = normalize_key(hint);
    let all_present = !current_key.is_empty() && !raw_key.is_empty() && !hint_key.is_empty();
    if all_present && current_key == raw_key && current_key != hint_key {
        collapse_ws(hint)
    } else {
        current.to_string()
    }
}

/// Whether a meeting-context field may be overwritten with `preferred`.
///
/// True when the current value is a placeholder, or when it is verbatim the
/// raw auto-filled value and a different preferred value now exists.
pub fn should_refresh_meta(current: &str, raw: &str, preferred: &str) -> bool {
    if !is_meaningful_meta_value(current) {
        return true;
    }
    let current_key = normalize_key(current);
    let raw_key = normalize_key(raw);
    let preferred_key = normalize_key(preferred);
    !raw_key.is_empty()
        && !preferred_key.is_empty()
        && current_key == raw_key
        && current_key != preferred_key
}

/// The value a meeting-context field should take, if it should change.
pub fn refreshed_meta(current: &str, raw: &str, preferred: &str) -> Option<String> {
    (should_refresh_meta(current, raw, preferred)
        && is_meaningful_meta_value(preferred)
        && current != preferred)
        .then(|| preferred.to_string())
}

/// Collects the names of fields that were actually altered.
#[derive(Debug, Default)]
struct FieldChanges(Vec<&'static str>);

impl FieldChanges {
    fn set<T: PartialEq>(&mut self, field: &'static str, slot: &mut T, value: T) {
        if *slot != value {
            *slot = value;
            self.0.push(field);
        }
    }
}

/// Result of merging one candidate into one stored talk.
#[derive(Debug, Clone, PartialEq)]
pub struct TalkMerge {
    pub talk: Talk,
    pub changed_fields: Vec<&'static str>,
}

impl TalkMerge {
    pub fn changed(&self) -> bool {
        !self.changed_fields.is_empty()
    }
}

/// Merge a normalised candidate into a stored talk.
pub fn merge_talk(
    stored: &Talk,
    candidate: &TalkCandidate,
    slug: &str,
    ctx: &MeetingContext,
) -> TalkMerge {
    let mut talk = stored.clone();
    let mut changes = FieldChanges::default();

    changes.set("meeting", &mut talk.meeting_slug, slug.to_string());
    if talk.project_github.is_none() {
        changes.set("projectGithub", &mut talk.project_github, Some(String::new()));
    }
    if talk.tags.is_none() {
        changes.set("tags", &mut talk.tags, Some(Vec::new()));
    }

    if let Some(name) = refreshed_meta(&talk.meeting_name, &ctx.raw_name, &ctx.name) {
        changes.set("meetingName", &mut talk.meeting_name, name);
    }
    if let Some(location) =
        refreshed_meta(&talk.meeting_location, &ctx.raw_location, &ctx.location)
    {
        changes.set("meetingLocation", &mut talk.meeting_location, location);
    }
    if let Some(date) = refreshed_meta(&talk.meeting_date, &ctx.raw_date, &ctx.date) {
        changes.set("meetingDate", &mut talk.meeting_date, date);
    }

    if !is_meaningful_meta_value(&talk.title) && !candidate.title.is_empty() {
        changes.set("title", &mut talk.title, candidate.title.clone());
    }
    if !is_meaningful_meta_value(talk.category.as_str())
        && is_meaningful_meta_value(candidate.category.as_str())
    {
        changes.set("category", &mut talk.category, candidate.category.clone());
    }

    if let Some(abstract_text) = merged_abstract(&talk, candidate) {
        changes.set("abstract", &mut talk.abstract_text, abstract_text);
    }

    if talk.speakers.is_empty() && !candidate.speakers.is_empty() {
        changes.set("speakers", &mut talk.speakers, candidate.speakers.clone());
    }

    for (field, slot, fresh) in [
        ("videoUrl", &mut talk.video_url, &candidate.video_url),
        ("videoId", &mut talk.video_id, &candidate.video_id),
        ("slidesUrl", &mut talk.slides_url, &candidate.slides_url),
    ] {
        if let Some(fresh) = fresh.as_deref().filter(|v| !v.is_empty()) {
            changes.set(field, slot, Some(fresh.to_string()));
        }
    }

    TalkMerge {
        talk,
        changed_fields: changes.0,
    }
}

/// New abstract for `stored`, if it should change.
///
/// A meaningful stored abstract is curated and only loses leading noise; a
/// placeholder abstract is replaced by the candidate's cleaned one.
fn merged_abstract(stored: &Talk, candidate: &TalkCandidate) -> Option<String> {
    let current = collapse_ws(&stored.abstract_text);
    let fresh = &candidate.abstract_text;

    if is_meaningful_abstract(&current) {
        let title = pick_preferred_value(&[stored.title.as_str(), candidate.title.as_str()]);
        let names: Vec<&str> = if stored.speakers.is_empty() {
            candidate.speaker_names()
        } else {
            stored.speaker_names().collect()
        };
        let cleaned = clean_abstract_text(&current, &title, &names);
        if cleaned == current {
            return None;
        }
        if is_meaningful_abstract(&cleaned) {
            return Some(cleaned);
        }
        return is_meaningful_abstract(fresh).then(|| fresh.clone());
    }

    (is_meaningful_abstract(fresh) && *fresh != stored.abstract_text).then(|| fresh.clone())
}

/// Build a brand-new talk from a normalised candidate.
pub fn new_talk(id: String, slug: &str, candidate: &TalkCandidate, ctx: &MeetingContext) -> Talk {
    let mut talk = Talk::new(id, slug, candidate.title.clone());
    talk.meeting_name = ctx.name.clone();
    talk.meeting_location = ctx.location.clone();
    talk.meeting_date = ctx.date.clone();
    talk.category = if is_meaningful_meta_value(candidate.category.as_str()) {
        candidate.category.clone()
    } else {
        TalkCategory::TechnicalTalk
    };
    talk.speakers = candidate.speakers.clone();
    talk.abstract_text = candidate.abstract_text.clone();
    talk.video_url = candidate.video_url.clone();
    talk.video_id = candidate.video_id.clone();
    talk.slides_url = candidate.slides_url.clone();
    talk
}

/// Refresh the meeting summary after the talk list is final.
pub fn merge_meeting(
    stored: Option<&Meeting>,
    slug: &str,
    ctx: &MeetingContext,
    hint: &MeetingHint,
    talk_count: usize,
) -> (Meeting, Vec<&'static str>) {
    let mut changes = FieldChanges::default();
    let mut meeting = match stored {
        Some(meeting) => meeting.clone(),
        None => {
            changes.0.push("meeting");
            Meeting::new(slug)
        }
    };

    changes.set("slug", &mut meeting.slug, slug.to_string());
    if let Some(name) = refreshed_meta(&meeting.name, &ctx.raw_name, &ctx.name) {
        changes.set("name", &mut meeting.name, name);
    }
    if let Some(date) = refreshed_meta(&meeting.date, &ctx.raw_date, &ctx.date) {
        changes.set("date", &mut meeting.date, date);
    }
    if let Some(location) = refreshed_meta(&meeting.location, &ctx.raw_location, &ctx.location) {
        changes.set("location", &mut meeting.location, location);
    }
    if meeting.canceled.is_none() {
        changes.set("canceled", &mut meeting.canceled, Some(hint.canceled));
    }
    changes.set("talkCount", &mut meeting.talk_count, talk_count);

    (meeting, changes.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use talkscope_core::Speaker;

    fn hint(name: &str, date: &str, location: &str) -> MeetingHint {
        MeetingHint {
            name: name.into(),
            date: date.into(),
            location: location.into(),
            canceled: false,
        }
    }

    fn stored_talk() -> Talk {
        let mut talk = Talk::new("2024-10-001", "2024-10", "Clang Modules");
        talk.meeting_name = "2024 LLVM Developers' Meeting".into();
        talk.meeting_location = "Santa Clara, CA".into();
        talk.meeting_date = "October 22-24, 2024".into();
        talk.speakers = vec![Speaker::named("Jane Doe")];
        talk.abstract_text = "Curated abstract.".into();
        talk
    }

    fn ctx_for(talk: &Talk) -> MeetingContext {
        MeetingContext::resolve(
            "2024-10",
            None,
            Some(talk),
            &hint(&talk.meeting_name, &talk.meeting_date, &talk.meeting_location),
            None,
        )
    }

    #[test]
    fn should_refresh_placeholder_values() {
        assert!(should_refresh_meta("TBD", "", "Chicago, IL"));
        assert!(should_refresh_meta("", "", ""));
    }

    #[test]
    fn should_refresh_mechanical_auto_fill_only() {
        // Stored equals raw auto-fill and a better value exists.
        assert!(should_refresh_meta("Oct 2024", "oct 2024", "October 22-24, 2024"));
        // Hand-edited value differs from raw: keep it.
        assert!(!should_refresh_meta("Oct 22, 2024", "Oct 2024", "October 22-24, 2024"));
        // Nothing better available.
        assert!(!should_refresh_meta("Oct 2024", "Oct 2024", "Oct 2024"));
        assert!(!should_refresh_meta("Oct 2024", "", "October"));
    }

    #[test]
    fn refreshed_meta_never_downgrades() {
        assert_eq!(refreshed_meta("", "", "TBD"), None);
        assert_eq!(refreshed_meta("TBA", "", "Chicago"), Some("Chicago".into()));
        assert_eq!(refreshed_meta("Chicago", "", "Chicago"), None);
    }

    #[test]
    fn index_hint_replaces_raw_page_value() {
        let ctx = MeetingContext::resolve(
            "2024-10",
            None,
            None,
            &hint("", "Oct 2024", "Santa Clara"),
            Some(&IndexHint {
                date: "October 22-24, 2024".into(),
                location: "Santa Clara, CA".into(),
            }),
        );
        assert_eq!(ctx.date, "October 22-24, 2024");
        assert_eq!(ctx.location, "Santa Clara, CA");
        assert_eq!(ctx.name, "2024-10");
    }

    #[test]
    fn stored_meeting_values_outrank_hints() {
        let mut meeting = Meeting::new("2024-10");
        meeting.location = "San Jose, CA".into();
        let ctx = MeetingContext::resolve(
            "2024-10",
            Some(&meeting),
            None,
            &hint("Dev Meeting", "", "Santa Clara"),
            Some(&IndexHint {
                date: String::new(),
                location: "Santa Clara, CA".into(),
            }),
        );
        assert_eq!(ctx.location, "San Jose, CA");
        assert_eq!(ctx.name, "Dev Meeting");
    }

    #[test]
    fn curated_fields_survive_merge() {
        let stored = stored_talk();
        let candidate = TalkCandidate {
            title: "Clang Modules".into(),
            category: TalkCategory::Tutorial,
            abstract_text: "A different upstream abstract.".into(),
            speakers: vec![Speaker::named("Someone Else")],
            ..TalkCandidate::default()
        };
        let merged = merge_talk(&stored, &candidate, "2024-10", &ctx_for(&stored));
        assert!(!merged.changed(), "changed: {:?}", merged.changed_fields);
        assert_eq!(merged.talk, stored);
    }

    #[test]
    fn placeholder_abstract_is_filled() {
        let mut stored = stored_talk();
        stored.abstract_text = "TBD".into();
        let candidate = TalkCandidate {
            title: "Clang Modules".into(),
            abstract_text: "Real abstract.".into(),
            ..TalkCandidate::default()
        };
        let merged = merge_talk(&stored, &candidate, "2024-10", &ctx_for(&stored));
        assert_eq!(merged.talk.abstract_text, "Real abstract.");
        assert_eq!(merged.changed_fields, vec!["abstract"]);
    }

    #[test]
    fn noisy_stored_abstract_loses_only_noise() {
        let mut stored = stored_talk();
        stored.abstract_text = "[Slides] Speakers: Jane Doe - Curated abstract.".into();
        let candidate = TalkCandidate::new("Clang Modules", TalkCategory::missing());
        let merged = merge_talk(&stored, &candidate, "2024-10", &ctx_for(&stored));
        assert_eq!(merged.talk.abstract_text, "Curated abstract.");
    }

    #[test]
    fn links_follow_upstream_but_blanks_do_not_clear() {
        let mut stored = stored_talk();
        stored.video_url = Some("https://youtu.be/old".into());
        let candidate = TalkCandidate {
            title: "Clang Modules".into(),
            slides_url: Some("https://x/slides.pdf".into()),
            video_url: None,
            ..TalkCandidate::default()
        };
        let merged = merge_talk(&stored, &candidate, "2024-10", &ctx_for(&stored));
        assert_eq!(merged.changed_fields, vec!["slidesUrl"]);
        assert_eq!(merged.talk.video_url.as_deref(), Some("https://youtu.be/old"));
    }

    #[test]
    fn missing_curator_fields_are_defaulted_once() {
        let mut stored = stored_talk();
        stored.project_github = None;
        stored.tags = None;
        let candidate = TalkCandidate::new("Clang Modules", TalkCategory::missing());
        let merged = merge_talk(&stored, &candidate, "2024-10", &ctx_for(&stored));
        assert_eq!(merged.talk.project_github.as_deref(), Some(""));
        assert_eq!(merged.talk.tags.as_deref(), Some(&[][..]));
        let again = merge_talk(&merged.talk, &candidate, "2024-10", &ctx_for(&stored));
        assert!(!again.changed());
    }

    #[test]
    fn empty_speaker_list_is_filled() {
        let mut stored = stored_talk();
        stored.speakers.clear();
        let candidate = TalkCandidate::new("Clang Modules", TalkCategory::missing())
            .with_speakers(["Jane Doe"]);
        let merged = merge_talk(&stored, &candidate, "2024-10", &ctx_for(&stored));
        assert_eq!(merged.talk.speaker_names().collect::<Vec<_>>(), vec!["Jane Doe"]);
    }

    #[test]
    fn new_talk_defaults_category() {
        let ctx = MeetingContext::resolve("2024-10", None, None, &hint("", "", ""), None);
        let candidate = TalkCandidate::new("Foo", TalkCategory::missing());
        let talk = new_talk("2024-10-001".into(), "2024-10", &candidate, &ctx);
        assert_eq!(talk.category, TalkCategory::TechnicalTalk);
        assert_eq!(talk.meeting_name, "2024-10");
    }

    #[test]
    fn meeting_is_created_and_then_stable() {
        let h = MeetingHint {
            canceled: true,
            ..hint("Dev Meeting", "Oct 2024", "Santa Clara")
        };
        let ctx = MeetingContext::resolve("2024-10", None, None, &h, None);
        let (meeting, changes) = merge_meeting(None, "2024-10", &ctx, &h, 3);
        assert!(!changes.is_empty());
        assert_eq!(meeting.name, "Dev Meeting");
        assert_eq!(meeting.canceled, Some(true));
        assert_eq!(meeting.talk_count, 3);

        let ctx = MeetingContext::resolve("2024-10", Some(&meeting), None, &h, None);
        let (again, changes) = merge_meeting(Some(&meeting), "2024-10", &ctx, &h, 3);
        assert!(changes.is_empty(), "{changes:?}");
        assert_eq!(again, meeting);
    }

    #[test]
    fn curated_canceled_flag_is_kept() {
        let mut meeting = Meeting::new("2020-10");
        meeting.canceled = Some(false);
        let h = MeetingHint {
            canceled: true,
            ..hint("", "", "")
        };
        let ctx = MeetingContext::resolve("2020-10", Some(&meeting), None, &h, None);
        let (merged, _) = merge_meeting(Some(&meeting), "2020-10", &ctx, &h, 0);
        assert_eq!(merged.canceled, Some(false));
    }
}
