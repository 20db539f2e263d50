//! Short-answer similarity scoring - capability layer
//!
//! The only scorer that awards partial credit from pure string comparison.
//! Threshold values gate pass/fail outcomes, so they come from `Config`
//! rather than living at call sites.

use similar::TextDiff;
use tracing::debug;

use crate::config::Config;
use crate::services::normalizer::{self, NormalizeOptions};

/// Outcome of a similarity comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScore {
    pub is_correct: bool,
    pub score: f64,
    /// Best similarity across accepted answers, in [0, 1]
    pub similarity: f64,
}

/// Edit-distance-based short-answer scorer
pub struct SimilarityScorer {
    full_threshold: f64,
    partial_threshold: f64,
}

impl SimilarityScorer {
    pub fn new(config: &Config) -> Self {
        Self {
            full_threshold: config.similarity_full_threshold,
            partial_threshold: config.similarity_partial_threshold,
        }
    }

    /// Character-level similarity between two normalized strings, in [0, 1].
    /// Identical strings yield exactly 1.0.
    fn similarity(a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        f64::from(TextDiff::from_chars(a, b).ratio())
    }

    /// Score a student answer against one or more accepted literals.
    ///
    /// `accepted` comes from splitting the canonical answer on commas. The
    /// best similarity across candidates decides the outcome: at or above
    /// the full threshold the answer earns full credit; at or above the
    /// partial threshold (when partial credit is allowed) it earns
    /// proportional credit without being counted correct; below, zero.
    pub fn score(
        &self,
        student: &str,
        accepted: &[&str],
        max_score: f64,
        partial_credit: bool,
        options: NormalizeOptions,
    ) -> SimilarityScore {
        let normalized_student = normalizer::normalize(student, options);

        let best = accepted
            .iter()
            .map(|candidate| {
                let normalized_candidate = normalizer::normalize(candidate, options);
                Self::similarity(&normalized_student, &normalized_candidate)
            })
            .fold(0.0_f64, f64::max);

        debug!(
            "similarity best={:.3} across {} candidates",
            best,
            accepted.len()
        );

        if best >= self.full_threshold {
            SimilarityScore {
                is_correct: true,
                score: max_score,
                similarity: best,
            }
        } else if partial_credit && best >= self.partial_threshold {
            SimilarityScore {
                is_correct: false,
                score: best * max_score,
                similarity: best,
            }
        } else {
            SimilarityScore {
                is_correct: false,
                score: 0.0,
                similarity: best,
            }
        }
    }
}
