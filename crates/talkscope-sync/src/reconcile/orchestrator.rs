use std::collections::BTreeSet;

use talkscope_core::MeetingBundle;

use crate::candidate::{IndexHint, MeetingHint, TalkCandidate};
use crate::reconcile::ids::next_id;
use crate::reconcile::matcher::{MatchKey, TalkIndex};
use crate::reconcile::policy::{MeetingContext, merge_meeting, merge_talk, new_talk};

/// Outcome of reconciling one meeting.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub bundle: MeetingBundle,
    pub changed: bool,
    pub new_count: usize,
    /// Candidates dropped for lacking a usable title.
    pub skipped: usize,
}

/// Merge one meeting's freshly extracted candidates into its stored bundle.
///
/// Pure and deterministic: the stored bundle is never modified, and the same
/// inputs always yield the same output.
pub fn reconcile_meeting(
    slug: &str,
    hint: &MeetingHint,
    index_hint: Option<&IndexHint>,
    candidates: &[TalkCandidate],
    stored: Option<&MeetingBundle>,
) -> Reconciliation {
    let stored_meeting = stored.map(|b| &b.meeting);
    let mut talks = stored.map(|b| b.talks.clone()).unwrap_or_default();
    let ctx = MeetingContext::resolve(slug, stored_meeting, talks.first(), hint, index_hint);

    let mut index = TalkIndex::build(&talks);
    let mut allocated: BTreeSet<String> = talks
        .iter()
        .map(|talk| talk.id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();

    let mut changed = false;
    let mut new_count = 0;
    let mut skipped = 0;

    for raw in candidates {
        let candidate = raw.normalized();
        let key = MatchKey::for_candidate(&candidate);
        if !key.is_usable() {
            tracing::debug!(slug, title = %raw.title, "skipping candidate without a usable title");
            skipped += 1;
            continue;
        }

        match index.find(&key) {
            Some(hit) => {
                let merged = merge_talk(&talks[hit.position], &candidate, slug, &ctx);
                if merged.changed() {
                    tracing::debug!(
                        slug,
                        id = %merged.talk.id,
                        fields = ?merged.changed_fields,
                        "talk updated"
                    );
                    talks[hit.position] = merged.talk;
                    changed = true;
                }
            }
            None => {
                let id = next_id(talks.iter().map(|t| t.id.as_str()), slug, &mut allocated);
                tracing::debug!(slug, %id, title = %candidate.title, "new talk");
                talks.push(new_talk(id, slug, &candidate, &ctx));
                index.insert(key, talks.len() - 1);
                changed = true;
                new_count += 1;
            }
        }
    }

    let (meeting, meeting_changes) =
        merge_meeting(stored_meeting, slug, &ctx, hint, talks.len());
    if !meeting_changes.is_empty() {
        tracing::debug!(slug, fields = ?meeting_changes, "meeting updated");
        changed = true;
    }

    let extra = stored.map(|b| b.extra.clone()).unwrap_or_default();
    Reconciliation {
        bundle: MeetingBundle {
            meeting,
            talks,
            extra,
        },
        changed,
        new_count,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talkscope_core::TalkCategory;

    fn hint() -> MeetingHint {
        MeetingHint {
            name: "2024 LLVM Developers' Meeting".into(),
            date: "October 22-24, 2024".into(),
            location: "Santa Clara, CA".into(),
            canceled: false,
        }
    }

    #[test]
    fn keynote_prefix_creates_first_talk() {
        let candidate = TalkCandidate::new("Keynote: Foo", TalkCategory::TechnicalTalk)
            .with_speakers(["A"]);
        let result = reconcile_meeting("2024-10", &hint(), None, &[candidate], None);

        assert!(result.changed);
        assert_eq!(result.new_count, 1);
        let talk = &result.bundle.talks[0];
        assert_eq!(talk.id, "2024-10-001");
        assert_eq!(talk.title, "Foo");
        assert_eq!(talk.category, TalkCategory::Keynote);
        assert_eq!(result.bundle.meeting.talk_count, 1);
    }

    #[test]
    fn untitled_candidates_are_skipped() {
        let candidates = [
            TalkCandidate::new("   ", TalkCategory::Panel),
            TalkCandidate::new("Real", TalkCategory::Panel),
        ];
        let result = reconcile_meeting("2024-10", &hint(), None, &candidates, None);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.bundle.talks.len(), 1);
    }

    #[test]
    fn duplicate_candidates_in_one_batch_create_one_talk() {
        let candidate = TalkCandidate::new("Same Talk", TalkCategory::Panel).with_speakers(["A"]);
        let result = reconcile_meeting(
            "2024-10",
            &hint(),
            None,
            &[candidate.clone(), candidate],
            None,
        );
        assert_eq!(result.new_count, 1);
        assert_eq!(result.bundle.talks.len(), 1);
    }

    #[test]
    fn rerun_is_a_no_op() {
        let candidates = [
            TalkCandidate::new("One", TalkCategory::Tutorial).with_speakers(["A"]),
            TalkCandidate::new("Two", TalkCategory::Panel).with_speakers(["B", "C"]),
        ];
        let first = reconcile_meeting("2024-10", &hint(), None, &candidates, None);
        let second =
            reconcile_meeting("2024-10", &hint(), None, &candidates, Some(&first.bundle));
        assert!(!second.changed);
        assert_eq!(second.new_count, 0);
        assert_eq!(second.bundle, first.bundle);
    }

    #[test]
    fn keynote_prefix_is_stripped_once() {
        let candidate = TalkCandidate::new("Keynote: Keynote: X", TalkCategory::TechnicalTalk)
            .with_speakers(["A"]);
        let result = reconcile_meeting("2024-10", &hint(), None, &[candidate], None);
        let talk = &result.bundle.talks[0];
        assert_eq!(talk.title, "Keynote: X");
        assert_eq!(talk.category, TalkCategory::Keynote);
    }

    #[test]
    fn abstract_cleaning_stays_within_pass_limit() {
        let mut candidate =
            TalkCandidate::new("Noisy", TalkCategory::TechnicalTalk).with_speakers(["Ann"]);
        candidate.abstract_text =
            format!("{}Body.", "Speakers: Ann; ".repeat(crate::reconcile::MAX_CLEAN_PASSES + 2));
        let result = reconcile_meeting("2024-10", &hint(), None, &[candidate], None);
        assert_eq!(
            result.bundle.talks[0].abstract_text,
            "Speakers: Ann; Speakers: Ann; Body."
        );
    }
}
