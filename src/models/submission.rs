use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Original/submitted image pair for handwritten math work.
///
/// Buffers hold encoded image bytes (PNG or JPEG); decoding happens in the
/// image differ so the model stays serialization-friendly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePair {
    pub original: Vec<u8>,
    pub submitted: Vec<u8>,
}

/// One answered question inside a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerItem {
    pub question_id: String,
    /// Raw student answer exactly as entered
    pub answer: String,
    /// Present only for math_solution items with handwritten work
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<ImagePair>,
}

impl AnswerItem {
    pub fn new(question_id: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            answer: answer.into(),
            images: None,
        }
    }

    pub fn with_images(mut self, images: ImagePair) -> Self {
        self.images = Some(images);
        self
    }

    /// An item with no text answer and no images counts as unanswered
    pub fn is_unanswered(&self) -> bool {
        self.answer.trim().is_empty() && self.images.is_none()
    }
}

/// A complete answer submission for one student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub submitter_id: String,
    /// Ordered; result order must match this
    pub items: Vec<AnswerItem>,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
}

impl AnswerSubmission {
    pub fn new(submitter_id: impl Into<String>, items: Vec<AnswerItem>) -> Self {
        Self {
            submitter_id: submitter_id.into(),
            items,
            submitted_at: Utc::now(),
            started_at: None,
            time_limit_minutes: None,
        }
    }

    /// Elapsed working time in seconds, when the start time is known
    pub fn elapsed_seconds(&self) -> Option<i64> {
        self.started_at
            .map(|started| (self.submitted_at - started).num_seconds())
    }

    /// Whether the submission came in past its declared time limit
    pub fn over_time_limit(&self) -> bool {
        match (self.elapsed_seconds(), self.time_limit_minutes) {
            (Some(elapsed), Some(limit)) => elapsed > i64::from(limit) * 60,
            _ => false,
        }
    }
}
