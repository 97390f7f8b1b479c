//! Wildcard tag matching.
//!
//! Patterns support a single metacharacter, `*`, meaning "zero or more
//! characters", and are anchored at both ends: `ltsc2022-*` matches
//! `ltsc2022-amd64` but not `windows-ltsc2022-amd64`. Matching is
//! case-sensitive, deterministic, and performs no I/O.

/// Returns true when the tag satisfies any of the patterns.
///
/// An empty pattern sequence is equivalent to the single pattern `*`,
/// i.e. every tag matches.
///
/// # Examples
///
/// ```
/// use tagwatch_core::pattern::matches;
///
/// let patterns = vec!["ltsc2022-*".to_string()];
/// assert!(matches("ltsc2022-amd64", &patterns));
/// assert!(!matches("windows-ltsc2022-amd64", &patterns));
/// assert!(matches("anything", &[]));
/// ```
#[must_use]
pub fn matches(tag: &str, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return true;
    }
    patterns.iter().any(|p| matches_pattern(tag, p))
}

/// Returns true when the tag matches a single pattern.
///
/// A pattern containing no `*` requires an exact match.
#[must_use]
pub fn matches_pattern(tag: &str, pattern: &str) -> bool {
    let tag = tag.as_bytes();
    let pattern = pattern.as_bytes();

    let mut t = 0;
    let mut p = 0;
    // Position to resume from when a literal run after a `*` fails.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < tag.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p + 1, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == tag[t] {
            p += 1;
            t += 1;
        } else if let Some((bp, bt)) = backtrack {
            // Let the previous `*` swallow one more byte and retry.
            p = bp;
            t = bt + 1;
            backtrack = Some((bp, bt + 1));
        } else {
            return false;
        }
    }

    // Trailing stars match the empty remainder.
    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pats(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_exact_match_without_wildcard() {
        assert!(matches_pattern("latest", "latest"));
        assert!(!matches_pattern("latest", "latest2"));
        assert!(!matches_pattern("latest2", "latest"));
    }

    #[test]
    fn test_prefix_wildcard_is_anchored() {
        assert!(matches_pattern("ltsc2022-amd64", "ltsc2022-*"));
        assert!(!matches_pattern("windows-ltsc2022-amd64", "ltsc2022-*"));
    }

    #[test]
    fn test_suffix_wildcard_is_anchored() {
        assert!(matches_pattern("v1.2-windows", "*-windows"));
        assert!(!matches_pattern("v1.2-windows-amd64", "*-windows"));
    }

    #[test]
    fn test_infix_wildcard() {
        assert!(matches_pattern("ltsc2022-kb123-amd64", "ltsc2022-*-amd64"));
        assert!(matches_pattern("ltsc2022--amd64", "ltsc2022-*-amd64"));
        assert!(!matches_pattern("ltsc2022-amd64", "ltsc2022-*-arm64"));
    }

    #[test]
    fn test_star_matches_zero_characters() {
        assert!(matches_pattern("abc", "abc*"));
        assert!(matches_pattern("abc", "*abc"));
        assert!(matches_pattern("abc", "a*b*c"));
    }

    #[test]
    fn test_multiple_stars() {
        assert!(matches_pattern("1.27.3-ltsc2022", "*ltsc*"));
        assert!(matches_pattern("x", "***"));
        assert!(matches_pattern("", "*"));
    }

    #[test]
    fn test_empty_pattern_requires_empty_tag() {
        assert!(matches_pattern("", ""));
        assert!(!matches_pattern("a", ""));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!matches_pattern("Latest", "latest"));
        assert!(!matches_pattern("ltsc2022-AMD64", "ltsc2022-amd64"));
    }

    #[test]
    fn test_any_pattern_in_sequence_matches() {
        let patterns = pats(&["ltsc2019-*", "ltsc2022-*"]);
        assert!(matches("ltsc2019-amd64", &patterns));
        assert!(matches("ltsc2022-arm64", &patterns));
        assert!(!matches("ltsc2025-amd64", &patterns));
    }

    #[test]
    fn test_empty_sequence_matches_everything() {
        assert!(matches("anything-at-all", &[]));
        assert!(matches("", &[]));
    }

    #[test]
    fn test_backtracking_with_repeated_literals() {
        // The first `a` run the star tries is too short; the matcher has
        // to backtrack past it.
        assert!(matches_pattern("aaab", "*ab"));
        assert!(matches_pattern("aabaab", "*aab"));
        assert!(!matches_pattern("aabaa", "*ab"));
    }
}
