use serde::{Deserialize, Serialize};

/// Question type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    ShortAnswer,
    TrueFalse,
    Essay,
    MathSolution,
}

impl QuestionType {
    /// Stable label used in breakdown tables and logs
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::TrueFalse => "true_false",
            QuestionType::Essay => "essay",
            QuestionType::MathSolution => "math_solution",
        }
    }

    /// Parse a label (exact match)
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "multiple_choice" => Some(QuestionType::MultipleChoice),
            "short_answer" => Some(QuestionType::ShortAnswer),
            "true_false" => Some(QuestionType::TrueFalse),
            "essay" => Some(QuestionType::Essay),
            "math_solution" => Some(QuestionType::MathSolution),
            _ => None,
        }
    }

    /// True for types whose grading may call the external capability
    pub fn needs_assessment(self) -> bool {
        matches!(self, QuestionType::Essay | QuestionType::MathSolution)
    }
}

/// Question difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// A question as stored in the question bank.
///
/// Immutable once a submission references it; the engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question_type: QuestionType,
    pub prompt: String,
    /// Canonical answer. For short answers this may hold several accepted
    /// literals separated by commas; for multiple choice it is the option id.
    pub answer: String,
    pub difficulty: Difficulty,
    /// Subject unit label, e.g. a chapter or curriculum unit
    pub unit: String,
    pub max_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rubric: Option<String>,
    /// Worked solution text or steps, if the author provided one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
}

impl Question {
    /// Accepted answer literals, split on commas and trimmed
    pub fn accepted_answers(&self) -> Vec<&str> {
        self.answer
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Default for Question {
    fn default() -> Self {
        Self {
            id: String::new(),
            question_type: QuestionType::ShortAnswer,
            prompt: String::new(),
            answer: String::new(),
            difficulty: Difficulty::Medium,
            unit: String::new(),
            max_score: 100.0,
            rubric: None,
            solution: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_answers_splits_on_commas() {
        let q = Question {
            answer: "대한민국, 한국".to_string(),
            ..Default::default()
        };
        assert_eq!(q.accepted_answers(), vec!["대한민국", "한국"]);
    }

    #[test]
    fn accepted_answers_skips_empty_segments() {
        let q = Question {
            answer: "seoul,, ".to_string(),
            ..Default::default()
        };
        assert_eq!(q.accepted_answers(), vec!["seoul"]);
    }

    #[test]
    fn question_type_round_trips_labels() {
        for qt in [
            QuestionType::MultipleChoice,
            QuestionType::ShortAnswer,
            QuestionType::TrueFalse,
            QuestionType::Essay,
            QuestionType::MathSolution,
        ] {
            assert_eq!(QuestionType::from_str(qt.as_str()), Some(qt));
        }
        assert_eq!(QuestionType::from_str("matching"), None);
    }
}
