//! Summary aggregation - capability layer
//!
//! Pure reduction of per-question results into a statistical summary. No
//! async, no external calls, no mutation of inputs.

use std::collections::{BTreeMap, HashMap};

use crate::config::Config;
use crate::models::question::Question;
use crate::models::result::{
    BreakdownRow, Correctness, GradeBand, GradingResult, GradingSummary, WeakUnit,
};
use crate::models::submission::AnswerSubmission;

/// Cap on how many weak units a summary reports
const MAX_WEAK_UNITS: usize = 5;

/// Reduces a batch of grading results into a `GradingSummary`
pub struct SummaryAggregator {
    weak_unit_threshold: f64,
}

impl SummaryAggregator {
    pub fn new(config: &Config) -> Self {
        Self {
            weak_unit_threshold: config.weak_unit_threshold,
        }
    }

    /// Correct-equivalent units for one result: a correct answer counts as
    /// one unit, partial credit as half a unit. The half weighting keeps
    /// breakdown tables comparable to the binary headline accuracy.
    fn weighted_units(result: &GradingResult) -> f64 {
        match result.correctness {
            Correctness::Correct => 1.0,
            _ if result.is_partial() => 0.5,
            _ => 0.0,
        }
    }

    /// Reduce results into totals, banding, breakdown tables, weak units,
    /// and timing. Failed and unanswered items stay in every count; table
    /// totals always sum to the number of results.
    pub fn summarize(
        &self,
        results: &[GradingResult],
        questions: &HashMap<String, Question>,
        submission: &AnswerSubmission,
    ) -> GradingSummary {
        let mut total_score = 0.0;
        let mut max_score = 0.0;
        let mut correct_count = 0;
        let mut partial_count = 0;
        let mut incorrect_count = 0;
        let mut unanswered_count = 0;

        let mut by_difficulty: BTreeMap<String, BreakdownRow> = BTreeMap::new();
        let mut by_type: BTreeMap<String, BreakdownRow> = BTreeMap::new();
        let mut by_unit: BTreeMap<String, BreakdownRow> = BTreeMap::new();

        for result in results {
            total_score += result.score;
            max_score += result.max_score;

            match result.correctness {
                Correctness::Correct => correct_count += 1,
                Correctness::Unknown => unanswered_count += 1,
                Correctness::Incorrect => {
                    if result.is_partial() {
                        partial_count += 1;
                    } else {
                        incorrect_count += 1;
                    }
                }
            }

            let units = Self::weighted_units(result);
            let (difficulty, qtype, unit) = match questions.get(&result.question_id) {
                Some(q) => (
                    q.difficulty.as_str().to_string(),
                    q.question_type.as_str().to_string(),
                    q.unit.clone(),
                ),
                // The orchestrator guarantees the lookup table is complete;
                // stay total anyway so counts never drift from input length.
                None => (
                    "unknown".to_string(),
                    "unknown".to_string(),
                    "unknown".to_string(),
                ),
            };

            for (table, key) in [
                (&mut by_difficulty, difficulty),
                (&mut by_type, qtype),
                (&mut by_unit, unit),
            ] {
                let row = table.entry(key).or_default();
                row.correct += units;
                row.total += 1;
            }
        }

        for table in [&mut by_difficulty, &mut by_type, &mut by_unit] {
            for row in table.values_mut() {
                row.percentage = if row.total == 0 {
                    0.0
                } else {
                    row.correct / row.total as f64 * 100.0
                };
            }
        }

        let mut weak_units: Vec<WeakUnit> = by_unit
            .iter()
            .filter(|(_, row)| row.percentage < self.weak_unit_threshold)
            .map(|(unit, row)| WeakUnit {
                unit: unit.clone(),
                accuracy: row.percentage,
            })
            .collect();
        weak_units.sort_by(|a, b| a.accuracy.total_cmp(&b.accuracy));
        weak_units.truncate(MAX_WEAK_UNITS);

        let percentage = if max_score == 0.0 {
            0.0
        } else {
            total_score / max_score * 100.0
        };

        GradingSummary {
            total_score,
            max_score,
            percentage,
            band: GradeBand::from_percentage(percentage),
            correct_count,
            partial_count,
            incorrect_count,
            unanswered_count,
            by_difficulty,
            by_type,
            by_unit,
            weak_units,
            elapsed_seconds: submission.elapsed_seconds(),
            over_time_limit: submission.over_time_limit(),
        }
    }
}
