//! Sequential talk ids: `{slug}-{n:03}`.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Decimal id suffix of any width, kept without leading zeros.
///
/// Ordered numerically, so `1000` sorts after `999` and a suffix wider than
/// any machine integer still counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence(String);

impl Sequence {
    pub fn zero() -> Self {
        Self("0".to_string())
    }

    /// `None` unless `digits` is a non-empty run of ASCII digits.
    pub fn parse(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = digits.trim_start_matches('0');
        Some(if trimmed.is_empty() {
            Self::zero()
        } else {
            Self(trimmed.to_string())
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The following value; carries into a new leading digit instead of
    /// wrapping or saturating.
    pub fn successor(&self) -> Self {
        let mut digits = self.0.clone().into_bytes();
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                return Self(String::from_utf8_lossy(&digits).into_owned());
            }
        }
        digits.insert(0, b'1');
        Self(String::from_utf8_lossy(&digits).into_owned())
    }
}

impl Ord for Sequence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Sequence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0>3}", self.0)
    }
}

/// Largest numeric suffix among ids of the form `{slug}-{digits}`.
pub fn max_sequence<'a>(ids: impl IntoIterator<Item = &'a str>, slug: &str) -> Sequence {
    let prefix = format!("{slug}-");
    ids.into_iter()
        .filter_map(|id| id.strip_prefix(&prefix))
        .filter_map(Sequence::parse)
        .max()
        .unwrap_or_else(Sequence::zero)
}

/// Next free id for `slug`.
///
/// Counting resumes after the highest suffix in `existing` so removed ids are
/// never handed out again; `allocated` holds ids given out earlier in the same
/// run and receives the new one.
pub fn next_id<'a>(
    existing: impl IntoIterator<Item = &'a str>,
    slug: &str,
    allocated: &mut BTreeSet<String>,
) -> String {
    let existing: BTreeSet<&str> = existing.into_iter().collect();
    let start = max_sequence(
        existing
            .iter()
            .copied()
            .chain(allocated.iter().map(String::as_str)),
        slug,
    );

    // Strictly increasing, so this ends once it passes every known id.
    let mut sequence = start.successor();
    loop {
        let candidate = format!("{slug}-{sequence}");
        if !existing.contains(candidate.as_str()) && !allocated.contains(&candidate) {
            allocated.insert(candidate.clone());
            return candidate;
        }
        sequence = sequence.successor();
    }
}
