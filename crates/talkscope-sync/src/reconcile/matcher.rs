//! Correlate freshly extracted candidates with stored talks.

use std::collections::BTreeMap;

use talkscope_core::Talk;

use crate::candidate::TalkCandidate;
use crate::text::{normalize_key, speaker_key};

/// `(title key, speaker key)` for one talk or candidate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchKey {
    pub title: String,
    pub speakers: String,
}

impl MatchKey {
    pub fn new<'a>(title: &str, speakers: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            title: normalize_key(title),
            speakers: speaker_key(speakers),
        }
    }

    pub fn for_talk(talk: &Talk) -> Self {
        Self::new(&talk.title, talk.speaker_names())
    }

    pub fn for_candidate(candidate: &TalkCandidate) -> Self {
        Self::new(&candidate.title, candidate.speaker_names())
    }

    /// Candidates without a usable title can never match or be created.
    pub fn is_usable(&self) -> bool {
        !self.title.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchVia {
    Composite,
    Title,
}

/// A hit: the position of the stored talk in the meeting's talk list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TalkMatch {
    pub position: usize,
    pub via: MatchVia,
}

/// Lookup tables over one meeting's talks.
///
/// Buckets hold positions in insertion order, so ties always resolve to the
/// earliest stored talk.
#[derive(Debug, Default)]
pub struct TalkIndex {
    by_composite: BTreeMap<MatchKey, Vec<usize>>,
    by_title: BTreeMap<String, Vec<usize>>,
}

impl TalkIndex {
    pub fn build(talks: &[Talk]) -> Self {
        let mut index = Self::default();
        for (position, talk) in talks.iter().enumerate() {
            index.insert(MatchKey::for_talk(talk), position);
        }
        index
    }

    pub fn insert(&mut self, key: MatchKey, position: usize) {
        if !key.is_usable() {
            return;
        }
        self.by_title
            .entry(key.title.clone())
            .or_default()
            .push(position);
        self.by_composite.entry(key).or_default().push(position);
    }

    /// Composite hit first (earliest wins), then a title hit only when it is
    /// the single talk with that title.
    pub fn find(&self, key: &MatchKey) -> Option<TalkMatch> {
        if !key.is_usable() {
            return None;
        }

        if let Some(hits) = self.by_composite.get(key)
            && let Some(&position) = hits.first()
        {
            if hits.len() > 1 {
                tracing::debug!(title = %key.title, "ambiguous composite match, taking first");
            }
            return Some(TalkMatch {
                position,
                via: MatchVia::Composite,
            });
        }

        match self.by_title.get(&key.title).map(Vec::as_slice) {
            Some([position]) => Some(TalkMatch {
                position: *position,
                via: MatchVia::Title,
            }),
            Some(hits) if hits.len() > 1 => {
                tracing::debug!(
                    title = %key.title,
                    hits = hits.len(),
                    "ambiguous title match, treating as new talk"
                );
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talkscope_core::Speaker;

    fn talk(id: &str, title: &str, speakers: &[&str]) -> Talk {
        let mut talk = Talk::new(id, "2024-10", title);
        talk.speakers = speakers.iter().copied().map(Speaker::named).collect();
        talk
    }

    #[test]
    fn composite_match_wins_over_title() {
        let talks = vec![
            talk("a-001", "Intro to X", &["A"]),
            talk("a-002", "Intro to X", &["B"]),
        ];
        let index = TalkIndex::build(&talks);
        let hit = index.find(&MatchKey::new("intro to x!", ["b"])).unwrap();
        assert_eq!(hit.position, 1);
        assert_eq!(hit.via, MatchVia::Composite);
    }

    #[test]
    fn ambiguous_title_only_is_no_match() {
        let talks = vec![
            talk("a-001", "Intro to X", &["A"]),
            talk("a-002", "Intro to X", &["B"]),
        ];
        let index = TalkIndex::build(&talks);
        assert_eq!(index.find(&MatchKey::new("Intro to X", ["C"])), None);
    }

    #[test]
    fn single_title_hit_ignores_speaker_drift() {
        let talks = vec![talk("a-001", "Vectorization in LLVM", &["Ann Lee"])];
        let index = TalkIndex::build(&talks);
        let hit = index
            .find(&MatchKey::new("Vectorization in LLVM", ["Ann Lee", "Bo"]))
            .unwrap();
        assert_eq!(hit.position, 0);
        assert_eq!(hit.via, MatchVia::Title);
    }

    #[test]
    fn duplicate_composite_takes_first_in_stored_order() {
        let talks = vec![
            talk("a-003", "Same", &["A"]),
            talk("a-001", "Same", &["A"]),
        ];
        let index = TalkIndex::build(&talks);
        assert_eq!(index.find(&MatchKey::new("Same", ["A"])).unwrap().position, 0);
    }

    #[test]
    fn blank_title_never_matches() {
        let talks = vec![talk("a-001", "???", &["A"])];
        let index = TalkIndex::build(&talks);
        assert_eq!(index.find(&MatchKey::new("--", ["A"])), None);
    }

    #[test]
    fn inserted_talks_become_matchable() {
        let mut index = TalkIndex::default();
        index.insert(MatchKey::new("New Talk", ["A"]), 4);
        assert_eq!(index.find(&MatchKey::new("new talk", ["A"])).unwrap().position, 4);
    }

    #[test]
    fn lookups_do_not_depend_on_unrelated_talks() {
        let mut talks: Vec<Talk> = (0..32)
            .map(|n| talk(&format!("a-{n:03}"), &format!("Talk {n}"), &["A"]))
            .collect();
        talks.push(talk("a-100", "Target", &["Z"]));
        let forward = TalkIndex::build(&talks);
        let hit = forward.find(&MatchKey::new("Target", ["Z"])).unwrap();
        assert_eq!(hit.position, 32);

        talks[..32].reverse();
        let shuffled = TalkIndex::build(&talks);
        assert_eq!(shuffled.find(&MatchKey::new("Target", ["Z"])), Some(hit));
        assert_eq!(
            shuffled.find(&MatchKey::new("Talk 0", ["A"])).unwrap().position,
            31
        );
    }
}
