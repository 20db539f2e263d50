use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tri-state correctness. `Unknown` is used only for unanswered items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correctness {
    Correct,
    Incorrect,
    Unknown,
}

/// One evaluated step of a worked math solution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionStep {
    pub index: usize,
    pub description: String,
    /// Formula or expression the step evaluates, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    pub is_correct: bool,
    pub feedback: String,
}

/// Grading outcome for a single answer item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingResult {
    pub question_id: String,
    pub normalized_answer: String,
    pub correctness: Correctness,
    /// Always within [0, max_score]; fractional values allowed
    pub score: f64,
    pub max_score: f64,
    pub feedback: String,
    /// math_solution only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<SolutionStep>>,
    /// Cropped diff image (PNG bytes), math_solution only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_image: Option<Vec<u8>>,
    /// False when the qualitative outcome came from the deterministic
    /// fallback instead of the configured capability
    pub assessment_configured: bool,
    pub duration_ms: u64,
}

impl GradingResult {
    /// Partial credit: some points, but not judged correct
    pub fn is_partial(&self) -> bool {
        self.score > 0.0 && self.correctness != Correctness::Correct
    }
}

/// Letter grade band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeBand {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    F,
}

impl GradeBand {
    /// Fixed percentage-to-letter table
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 90.0 {
            GradeBand::APlus
        } else if pct >= 85.0 {
            GradeBand::A
        } else if pct >= 80.0 {
            GradeBand::BPlus
        } else if pct >= 75.0 {
            GradeBand::B
        } else if pct >= 70.0 {
            GradeBand::CPlus
        } else if pct >= 65.0 {
            GradeBand::C
        } else if pct >= 55.0 {
            GradeBand::D
        } else {
            GradeBand::F
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GradeBand::APlus => "A+",
            GradeBand::A => "A",
            GradeBand::BPlus => "B+",
            GradeBand::B => "B",
            GradeBand::CPlus => "C+",
            GradeBand::C => "C",
            GradeBand::D => "D",
            GradeBand::F => "F",
        }
    }
}

/// One row of an accuracy breakdown table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakdownRow {
    /// Correct-equivalent units: correct = 1.0, partial = 0.5
    pub correct: f64,
    pub total: usize,
    pub percentage: f64,
}

/// Statistical summary of a graded batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingSummary {
    pub total_score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub band: GradeBand,
    pub correct_count: usize,
    pub partial_count: usize,
    pub incorrect_count: usize,
    pub unanswered_count: usize,
    pub by_difficulty: BTreeMap<String, BreakdownRow>,
    pub by_type: BTreeMap<String, BreakdownRow>,
    pub by_unit: BTreeMap<String, BreakdownRow>,
    /// Units below the weak-unit threshold, weakest first, at most five
    pub weak_units: Vec<WeakUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<i64>,
    pub over_time_limit: bool,
}

/// A unit flagged for remediation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeakUnit {
    pub unit: String,
    pub accuracy: f64,
}

/// Everything the engine hands back for one graded submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradedSubmission {
    pub results: Vec<GradingResult>,
    pub summary: GradingSummary,
}
