//! Text normalisation and the placeholder classifier.
//!
//! Every fuzzy comparison in the crate goes through these helpers so that
//! matching, merge precedence and abstract cleaning agree on what "the same
//! value" and "a real value" mean.

/// Values that stand in for "not known yet" in meeting metadata.
pub const META_PLACEHOLDERS: &[&str] = &[
    "tbd",
    "tba",
    "tbc",
    "na",
    "n/a",
    "none",
    "unknown",
    "null",
    "todo",
    "comingsoon",
    "tobeannounced",
    "tobedetermined",
];

/// Values that stand in for a missing abstract.
pub const ABSTRACT_PLACEHOLDERS: &[&str] = &[
    "tbd",
    "tba",
    "none",
    "unknown",
    "noabstract",
    "noabstractavailable",
    "abstracttbd",
];

/// Collapse every whitespace run to one space and trim both ends.
pub fn collapse_ws(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fuzzy key: lower-cased, only `[a-z0-9]` kept.
pub fn normalize_key(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Looser key for person names: keeps single inner spaces.
pub fn normalize_speaker_name(value: &str) -> String {
    let kept: String = collapse_ws(value)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
        .collect();
    kept.trim().to_string()
}

/// Comma-joined normalised names, blank names dropped, order preserved.
pub fn speaker_key<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .map(normalize_speaker_name)
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn is_meaningful_meta_value(value: &str) -> bool {
    is_meaningful(value, META_PLACEHOLDERS)
}

pub fn is_meaningful_abstract(value: &str) -> bool {
    is_meaningful(value, ABSTRACT_PLACEHOLDERS)
}

fn is_meaningful(value: &str, placeholders: &[&str]) -> bool {
    let key = normalize_key(value);
    !key.is_empty() && !placeholders.contains(&key.as_str())
}

/// First meaningful candidate, else first non-empty one, else `""`.
///
/// Candidates are in precedence order; callers list stored values before
/// freshly scraped ones. The winner is returned whitespace-collapsed.
pub fn pick_preferred_value(candidates: &[&str]) -> String {
    let collapsed: Vec<String> = candidates.iter().map(|c| collapse_ws(c)).collect();
    collapsed
        .iter()
        .find(|c| is_meaningful_meta_value(c))
        .or_else(|| collapsed.iter().find(|c| !c.is_empty()))
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_ws_trims_and_squeezes() {
        assert_eq!(collapse_ws("  Clang \t\n Static   Analyzer "), "Clang Static Analyzer");
        assert_eq!(collapse_ws(""), "");
        assert_eq!(collapse_ws(" \n "), "");
    }

    #[test]
    fn normalize_key_ignores_case_and_punctuation() {
        assert_eq!(normalize_key("MLIR: The Next Step!"), "mlirthenextstep");
        assert_eq!(normalize_key("  "), "");
        assert_eq!(normalize_key("Ünïcode 2.0"), "ncode20");
    }

    #[test]
    fn normalize_speaker_name_keeps_inner_spaces() {
        assert_eq!(normalize_speaker_name("  Chris   Lattner "), "chris lattner");
        assert_eq!(normalize_speaker_name("J. R. R. Smith-Jones"), "j r r smithjones");
        assert_eq!(normalize_speaker_name("---"), "");
    }

    #[test]
    fn speaker_key_drops_blank_names() {
        assert_eq!(speaker_key(["Alice Wu", " ", "Bob"]), "alice wu,bob");
        assert_eq!(speaker_key(Vec::<&str>::new()), "");
    }

    #[test]
    fn placeholders_are_not_meaningful() {
        for value in ["", "TBD", "t.b.a.", "N/A", "Coming soon", "To be announced", "null"] {
            assert!(!is_meaningful_meta_value(value), "{value:?} should be a placeholder");
        }
        assert!(is_meaningful_meta_value("San Jose, CA"));
        assert!(is_meaningful_meta_value("October 22-24, 2024"));
    }

    #[test]
    fn abstract_placeholders_are_separate() {
        assert!(!is_meaningful_abstract("No abstract available."));
        assert!(!is_meaningful_abstract("Abstract: TBD"));
        // "coming soon" is a meta placeholder only
        assert!(is_meaningful_abstract("Coming soon"));
        assert!(is_meaningful_abstract("We present a new register allocator."));
    }

    #[test]
    fn pick_preferred_value_precedence() {
        assert_eq!(pick_preferred_value(&["TBD", "Chicago, IL"]), "Chicago, IL");
        assert_eq!(pick_preferred_value(&["", ""]), "");
        assert_eq!(pick_preferred_value(&["TBD", ""]), "TBD");
        assert_eq!(pick_preferred_value(&["", "  TBA  ", "n/a"]), "TBA");
        assert_eq!(pick_preferred_value(&["Santa  Clara", "San Jose"]), "Santa Clara");
        assert_eq!(pick_preferred_value(&[]), "");
    }
}
