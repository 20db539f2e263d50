//! Qualitative assessment - capability layer
//!
//! Delegates essay and solution-step assessment to an external capability
//! behind the `AssessmentCapability` port. When the capability is missing or
//! failing, a deterministic fallback keeps the rest of the pipeline working;
//! the fallback is always flagged in the result rather than passed off as a
//! real assessment.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppResult;

/// Everything the external capability needs to assess one answer
#[derive(Debug, Clone)]
pub struct AssessmentContext {
    pub prompt: String,
    /// Student answer text, or a caption for image-based work
    pub answer: String,
    /// Extracted work image (PNG bytes), math_solution only
    pub work_image: Option<Vec<u8>>,
    /// Author-provided worked solution, when available
    pub solution: Option<String>,
    /// Request per-dimension detail in the outcome
    pub detailed: bool,
}

/// Per-dimension breakdown of a detailed assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentDetails {
    pub accuracy: f64,
    pub completeness: f64,
    pub logic: f64,
    pub expression: f64,
}

/// One assessed step of a worked solution, as the capability reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepAssessment {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    pub is_correct: bool,
    pub feedback: String,
}

/// Structured result of one assessment call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentOutcome {
    /// In [0, 100]
    pub score: f64,
    pub feedback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<AssessmentDetails>,
    /// Per-step verdicts for multi-step solutions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<StepAssessment>>,
}

/// External assessment capability port.
///
/// The engine owns only this interface; real implementations live in
/// `clients` and deterministic fakes live in tests.
#[async_trait]
pub trait AssessmentCapability: Send + Sync {
    async fn assess(
        &self,
        context: &AssessmentContext,
        rubric: Option<&str>,
    ) -> AppResult<AssessmentOutcome>;
}

/// Qualitative outcome as the orchestrator consumes it
#[derive(Debug, Clone)]
pub struct QualitativeResult {
    pub score: f64,
    pub feedback: String,
    pub details: Option<AssessmentDetails>,
    pub steps: Option<Vec<StepAssessment>>,
    /// False when this came from the deterministic fallback
    pub is_configured: bool,
}

/// Scorer for essay and math-solution items
pub struct QualitativeScorer {
    capability: Option<Arc<dyn AssessmentCapability>>,
}

impl QualitativeScorer {
    pub fn new(capability: Option<Arc<dyn AssessmentCapability>>) -> Self {
        Self { capability }
    }

    pub fn is_configured(&self) -> bool {
        self.capability.is_some()
    }

    /// Assess one answer, retrying the capability at most once before
    /// falling back. Capability failures never escape this method; they are
    /// contained here so one bad item cannot fail a batch.
    pub async fn assess(
        &self,
        context: &AssessmentContext,
        rubric: Option<&str>,
    ) -> QualitativeResult {
        let capability = match &self.capability {
            Some(capability) => capability,
            None => return Self::fallback(context),
        };

        for attempt in 0..2 {
            match capability.assess(context, rubric).await {
                Ok(outcome) => {
                    return QualitativeResult {
                        score: outcome.score.clamp(0.0, 100.0),
                        feedback: outcome.feedback,
                        details: outcome.details,
                        steps: outcome.steps,
                        is_configured: true,
                    };
                }
                Err(e) => {
                    warn!("assessment attempt {} failed: {}", attempt + 1, e);
                }
            }
        }

        Self::fallback(context)
    }

    /// Deterministic fallback used when the capability is unconfigured,
    /// unreachable, or out of retries. Same input, same outcome.
    pub fn fallback(context: &AssessmentContext) -> QualitativeResult {
        let has_work = !context.answer.trim().is_empty() || context.work_image.is_some();

        let (score, feedback) = if has_work {
            (
                50.0,
                "Automatic assessment was unavailable. The answer was recorded and provisionally \
                 scored; a reviewer should grade it manually."
                    .to_string(),
            )
        } else {
            (
                0.0,
                "No answer was provided for this question.".to_string(),
            )
        };

        QualitativeResult {
            score,
            feedback,
            details: None,
            steps: None,
            is_configured: false,
        }
    }
}
