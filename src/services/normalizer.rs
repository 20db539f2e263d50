//! Answer normalization - capability layer
//!
//! Pure string canonicalization applied before any comparison. No grading
//! semantics live here; scorers decide what a match is worth.

use std::sync::OnceLock;

use regex::Regex;

use crate::services::choice_scorer;

/// Normalization options, mirroring the batch grading options
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// Compare case-sensitively when true
    pub case_sensitive: bool,
    /// Strip all whitespace when true; otherwise collapse runs to one space
    pub ignore_whitespace: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            ignore_whitespace: true,
        }
    }
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex is valid"))
}

/// Canonicalize a raw answer string.
///
/// Trims, folds case and whitespace per the options, and maps a single
/// choice token in any of its equivalent notations (Latin letter, Arabic
/// digit, circled digit, Korean ordinal) to the canonical digit. Idempotent:
/// normalizing an already-normalized answer returns the same string.
pub fn normalize(raw: &str, options: NormalizeOptions) -> String {
    let trimmed = raw.trim();

    let folded = if options.case_sensitive {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    };

    let spaced = if options.ignore_whitespace {
        whitespace_run().replace_all(&folded, "").into_owned()
    } else {
        whitespace_run().replace_all(&folded, " ").into_owned()
    };

    // A bare choice symbol collapses to its canonical digit so that "②",
    // "b" and "나" all compare equal.
    if let Some(index) = choice_scorer::canonical_choice_index(&spaced) {
        return index.to_string();
    }

    spaced
}

/// Normalize with the default options (ignore case, ignore whitespace)
pub fn normalize_default(raw: &str) -> String {
    normalize(raw, NormalizeOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whitespace_and_case_by_default() {
        assert_eq!(normalize_default("  Sea Level  "), "sealevel");
    }

    #[test]
    fn collapses_whitespace_when_significant() {
        let options = NormalizeOptions {
            case_sensitive: true,
            ignore_whitespace: false,
        };
        assert_eq!(normalize("x   =  3", options), "x = 3");
    }

    #[test]
    fn choice_variants_share_one_token() {
        for raw in ["B", "b", "2", "②", "나"] {
            assert_eq!(normalize_default(raw), "2", "variant {:?}", raw);
        }
    }

    #[test]
    fn idempotent() {
        for raw in ["  Hello World ", "③", "대한민국", "x = 3"] {
            let once = normalize_default(raw);
            assert_eq!(normalize_default(&once), once);
        }
    }

    #[test]
    fn korean_text_passes_through() {
        assert_eq!(normalize_default("대한민국"), "대한민국");
    }
}
