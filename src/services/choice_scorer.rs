//! Multiple-choice and true/false scoring - capability layer
//!
//! Maps heterogeneous option notations onto canonical indices and compares.
//! Deterministic, no external calls; unrecognized notation simply fails to
//! match instead of erroring.

use phf::phf_map;

/// Every recognized rendering of the four answer options, mapped to a
/// canonical 1-based index: Latin letters, Arabic digits, circled digits,
/// and Korean ordinals.
static CHOICE_TOKENS: phf::Map<&'static str, u8> = phf_map! {
    "A" => 1, "a" => 1, "1" => 1, "①" => 1, "가" => 1,
    "B" => 2, "b" => 2, "2" => 2, "②" => 2, "나" => 2,
    "C" => 3, "c" => 3, "3" => 3, "③" => 3, "다" => 3,
    "D" => 4, "d" => 4, "4" => 4, "④" => 4, "라" => 4,
};

/// Recognized true/false notations
static TRUE_FALSE_TOKENS: phf::Map<&'static str, bool> = phf_map! {
    "o" => true,  "O" => true,  "○" => true, "true" => true,  "t" => true,
    "참" => true,  "맞다" => true,
    "x" => false, "X" => false, "✗" => false, "false" => false, "f" => false,
    "거짓" => false, "틀리다" => false,
};

/// Canonical option index for a choice token, if the notation is recognized
pub fn canonical_choice_index(token: &str) -> Option<u8> {
    CHOICE_TOKENS.get(token.trim()).copied()
}

/// Canonical boolean for a true/false token, if the notation is recognized
pub fn canonical_truth_value(token: &str) -> Option<bool> {
    let trimmed = token.trim();
    TRUE_FALSE_TOKENS
        .get(trimmed)
        .copied()
        .or_else(|| TRUE_FALSE_TOKENS.get(trimmed.to_lowercase().as_str()).copied())
}

/// Outcome of an all-or-nothing comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChoiceScore {
    pub is_correct: bool,
    pub score: f64,
}

/// Multiple-choice scorer
pub struct MultipleChoiceScorer;

impl MultipleChoiceScorer {
    /// Compare a student choice against the canonical option.
    ///
    /// Both sides pass through the canonicalization table, so "B", "2" and
    /// "②" all name the same option. Either side failing to canonicalize
    /// means no match, never an error. No partial credit for this type.
    pub fn score(student: &str, correct: &str, max_score: f64) -> ChoiceScore {
        let matched = match (
            canonical_choice_index(student),
            canonical_choice_index(correct),
        ) {
            (Some(s), Some(c)) => s == c,
            _ => false,
        };

        ChoiceScore {
            is_correct: matched,
            score: if matched { max_score } else { 0.0 },
        }
    }

    /// Compare a true/false answer against the canonical value
    pub fn score_true_false(student: &str, correct: &str, max_score: f64) -> ChoiceScore {
        let matched = match (
            canonical_truth_value(student),
            canonical_truth_value(correct),
        ) {
            (Some(s), Some(c)) => s == c,
            _ => false,
        };

        ChoiceScore {
            is_correct: matched,
            score: if matched { max_score } else { 0.0 },
        }
    }
}
