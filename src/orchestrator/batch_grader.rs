//! Batch grading orchestrator - orchestration layer
//!
//! ## Responsibilities
//!
//! 1. **Validation**: reject malformed submissions before any work starts
//! 2. **Question lookup**: one batch call to the question store; missing ids
//!    fail the whole batch
//! 3. **Fan-out**: one task per answer item, bounded by a Semaphore
//! 4. **Fan-in**: join in input order so results line up with items
//! 5. **Containment**: per-item failures degrade that item only
//! 6. **Reduction**: hand the ordered results to the summary aggregator
//! 7. **Best-effort persistence**: sink failures are logged, never returned
//!
//! ## Design notes
//!
//! - Scorers are pure; the only suspension points are the assessment
//!   capability and the question store
//! - No shared mutable state across items; the question table is read-only
//! - Results are placed by input position, not completion order

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::time::timeout_at;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ImageError, ValidationError};
use crate::models::question::{Question, QuestionType};
use crate::models::result::{Correctness, GradedSubmission, GradingResult, SolutionStep};
use crate::models::submission::{AnswerItem, AnswerSubmission, ImagePair};
use crate::services::choice_scorer::MultipleChoiceScorer;
use crate::services::image_diff::{self, ImageDiffExtractor};
use crate::services::normalizer::{self, NormalizeOptions};
use crate::services::qualitative::{
    AssessmentCapability, AssessmentContext, QualitativeResult, QualitativeScorer,
};
use crate::services::similarity_scorer::SimilarityScorer;
use crate::services::store::{QuestionStore, ResultSink};
use crate::services::summary::SummaryAggregator;

/// Qualitative score (0-100) at or above which an essay or math answer is
/// counted correct rather than partially correct
const QUALITATIVE_CORRECT_THRESHOLD: f64 = 80.0;

/// Per-batch grading options
#[derive(Debug, Clone, Copy)]
pub struct GradeOptions {
    /// Allow partial credit for near-miss short answers
    pub partial_credit: bool,
    /// Compare answers case-sensitively
    pub case_sensitive: bool,
    /// Strip whitespace before comparison
    pub ignore_whitespace: bool,
    /// Use the external capability for essay/math assessment
    pub ai_grading: bool,
    /// Produce explanatory feedback text for objective types
    pub generate_feedback: bool,
}

impl Default for GradeOptions {
    fn default() -> Self {
        Self {
            partial_credit: true,
            case_sensitive: false,
            ignore_whitespace: true,
            ai_grading: true,
            generate_feedback: true,
        }
    }
}

impl GradeOptions {
    fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            case_sensitive: self.case_sensitive,
            ignore_whitespace: self.ignore_whitespace,
        }
    }
}

/// Grading phases one item moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemPhase {
    Pending,
    Normalizing,
    ExtractingDiff,
    Scoring,
    Scored,
    Failed,
}

impl fmt::Display for ItemPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemPhase::Pending => "pending",
            ItemPhase::Normalizing => "normalizing",
            ItemPhase::ExtractingDiff => "extracting_diff",
            ItemPhase::Scoring => "scoring",
            ItemPhase::Scored => "scored",
            ItemPhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Shared, read-only scorer set used by all concurrent item tasks
struct GraderCore {
    similarity: SimilarityScorer,
    image_diff: ImageDiffExtractor,
    qualitative: QualitativeScorer,
}

/// Batch grading orchestrator
pub struct BatchGrader {
    core: Arc<GraderCore>,
    store: Arc<dyn QuestionStore>,
    sink: Option<Arc<dyn ResultSink>>,
    semaphore: Arc<Semaphore>,
    aggregator: SummaryAggregator,
    batch_timeout: Duration,
}

impl BatchGrader {
    /// Build a grader. The assessment capability is injected by the host
    /// application; its lifecycle is not owned here.
    pub fn new(
        config: &Config,
        store: Arc<dyn QuestionStore>,
        capability: Option<Arc<dyn AssessmentCapability>>,
        sink: Option<Arc<dyn ResultSink>>,
    ) -> Self {
        Self {
            core: Arc::new(GraderCore {
                similarity: SimilarityScorer::new(config),
                image_diff: ImageDiffExtractor::new(config),
                qualitative: QualitativeScorer::new(capability),
            }),
            store,
            sink,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_gradings.max(1))),
            aggregator: SummaryAggregator::new(config),
            batch_timeout: Duration::from_secs(config.grading_timeout_secs),
        }
    }

    /// Grade a whole submission.
    ///
    /// Items are graded concurrently under the semaphore bound; the result
    /// vector always has the same length and order as the input items, even
    /// when individual items fail or time out.
    pub async fn grade_submission(
        &self,
        submission: &AnswerSubmission,
        options: GradeOptions,
    ) -> AppResult<GradedSubmission> {
        Self::validate(submission)?;

        let questions = self.lookup_questions(&submission.items).await?;
        let questions = Arc::new(questions);

        info!(
            "grading {} answers for {} ({} concurrent)",
            submission.items.len(),
            submission.submitter_id,
            self.semaphore.available_permits()
        );

        let deadline = tokio::time::Instant::now() + self.batch_timeout;

        let mut handles = Vec::with_capacity(submission.items.len());
        for (index, item) in submission.items.iter().enumerate() {
            let snapshot = question_snapshot(&questions, item);
            let core = self.core.clone();
            let semaphore = self.semaphore.clone();
            let questions = questions.clone();
            let item = item.clone();

            let handle = tokio::spawn(async move {
                // lookup_questions guarantees the id is present
                let question = match questions.get(&item.question_id) {
                    Some(question) => question.clone(),
                    None => return failed_result(&item.question_id, 0.0),
                };
                // The semaphore is never closed; a failed acquire still must
                // not lose the item's slot in the result vector
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return failed_result(&question.id, question.max_score),
                };
                grade_item(&core, &question, &item, options, index).await
            });
            handles.push((index, snapshot, handle));
        }

        // Fan-in: join by input position so output order matches input order
        let mut results = Vec::with_capacity(handles.len());
        for (index, (question_id, max_score), mut handle) in handles {
            let result = match timeout_at(deadline, &mut handle).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_err)) => {
                    let err = AppError::internal_scoring(&question_id, join_err.to_string());
                    error!("grading task {} failed: {}", index, err);
                    failed_result(&question_id, max_score)
                }
                Err(_) => {
                    // Abandon the in-flight call without blocking the response
                    handle.abort();
                    warn!("grading task {} missed the batch deadline", index);
                    timed_out_result(&question_id, max_score)
                }
            };
            results.push(result);
        }

        debug_assert_eq!(results.len(), submission.items.len());

        let summary = self
            .aggregator
            .summarize(&results, &questions, submission);

        if let Some(sink) = &self.sink {
            let batch_key = format!(
                "{}-{}",
                submission.submitter_id,
                submission.submitted_at.timestamp()
            );
            if let Err(e) = sink.save_results(&batch_key, &results, &summary).await {
                warn!("saving results failed (batch {}): {}", batch_key, e);
            }
        }

        info!(
            "graded {}: {:.1}/{:.1} ({})",
            submission.submitter_id,
            summary.total_score,
            summary.max_score,
            summary.band.as_str()
        );

        Ok(GradedSubmission { results, summary })
    }

    /// Grade one ad-hoc answer against a question of a declared type,
    /// without assembling a full submission
    pub async fn grade_single(
        &self,
        question: &Question,
        answer: &str,
        images: Option<&ImagePair>,
        options: GradeOptions,
    ) -> GradingResult {
        let mut item = AnswerItem::new(question.id.clone(), answer);
        if let Some(images) = images {
            item = item.with_images(images.clone());
        }
        grade_item(&self.core, question, &item, options, 0).await
    }

    fn validate(submission: &AnswerSubmission) -> AppResult<()> {
        if submission.items.is_empty() {
            return Err(AppError::Validation(ValidationError::EmptySubmission));
        }
        for (index, item) in submission.items.iter().enumerate() {
            if item.question_id.trim().is_empty() {
                return Err(AppError::Validation(ValidationError::EmptyQuestionId {
                    index,
                }));
            }
        }
        if let Some(0) = submission.time_limit_minutes {
            return Err(AppError::Validation(ValidationError::InvalidTimeLimit {
                minutes: 0,
            }));
        }
        Ok(())
    }

    /// One batch lookup; a missing question invalidates the whole request
    async fn lookup_questions(
        &self,
        items: &[AnswerItem],
    ) -> AppResult<HashMap<String, Question>> {
        let mut ids: Vec<String> = items.iter().map(|i| i.question_id.clone()).collect();
        ids.sort();
        ids.dedup();

        let questions = self.store.get_questions_by_id(&ids).await?;

        let mut missing: Vec<String> = ids
            .into_iter()
            .filter(|id| !questions.contains_key(id))
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(AppError::questions_not_found(missing));
        }

        Ok(questions)
    }
}

fn question_snapshot(
    questions: &HashMap<String, Question>,
    item: &AnswerItem,
) -> (String, f64) {
    let max_score = questions
        .get(&item.question_id)
        .map(|q| q.max_score)
        .unwrap_or(0.0);
    (item.question_id.clone(), max_score)
}

/// Grade one item. Never returns an error: every failure inside a scorer is
/// contained here and becomes a degraded result.
async fn grade_item(
    core: &GraderCore,
    question: &Question,
    item: &AnswerItem,
    options: GradeOptions,
    index: usize,
) -> GradingResult {
    let started = Instant::now();
    debug!("item {} [{}]: {}", index, question.id, ItemPhase::Pending);

    let mut result = match score_item(core, question, item, options, index).await {
        Ok(result) => result,
        Err(e) => {
            debug!("item {} [{}]: {}", index, question.id, ItemPhase::Failed);
            error!("scoring failed for question {}: {}", question.id, e);
            match e {
                AppError::Image(ImageError::DimensionMismatch { .. }) => GradingResult {
                    question_id: question.id.clone(),
                    normalized_answer: normalizer::normalize(
                        &item.answer,
                        options.normalize_options(),
                    ),
                    correctness: Correctness::Incorrect,
                    score: 0.0,
                    max_score: question.max_score,
                    feedback: "The submitted image could not be compared against the original \
                               because the dimensions do not match. Please re-scan and resubmit."
                        .to_string(),
                    steps: None,
                    diff_image: None,
                    assessment_configured: true,
                    duration_ms: 0,
                },
                _ => failed_result(&question.id, question.max_score),
            }
        }
    };

    result.duration_ms = started.elapsed().as_millis() as u64;
    result
}

/// Type dispatch: exactly one scorer per item
async fn score_item(
    core: &GraderCore,
    question: &Question,
    item: &AnswerItem,
    options: GradeOptions,
    index: usize,
) -> AppResult<GradingResult> {
    debug!("item {} [{}]: {}", index, question.id, ItemPhase::Normalizing);
    let normalized = normalizer::normalize(&item.answer, options.normalize_options());

    if item.is_unanswered() {
        return Ok(unanswered_result(question, normalized));
    }

    let result = match question.question_type {
        QuestionType::MultipleChoice => {
            debug!("item {} [{}]: {}", index, question.id, ItemPhase::Scoring);
            let scored =
                MultipleChoiceScorer::score(&item.answer, &question.answer, question.max_score);
            objective_result(question, normalized, scored.is_correct, scored.score, options)
        }
        QuestionType::TrueFalse => {
            debug!("item {} [{}]: {}", index, question.id, ItemPhase::Scoring);
            let scored = MultipleChoiceScorer::score_true_false(
                &item.answer,
                &question.answer,
                question.max_score,
            );
            objective_result(question, normalized, scored.is_correct, scored.score, options)
        }
        QuestionType::ShortAnswer => {
            debug!("item {} [{}]: {}", index, question.id, ItemPhase::Scoring);
            let scored = core.similarity.score(
                &item.answer,
                &question.accepted_answers(),
                question.max_score,
                options.partial_credit,
                options.normalize_options(),
            );
            let feedback = if !options.generate_feedback {
                String::new()
            } else if scored.is_correct {
                "Correct.".to_string()
            } else if scored.score > 0.0 {
                format!(
                    "Close: your answer is {:.0}% similar to an accepted answer ({}).",
                    scored.similarity * 100.0,
                    question.answer
                )
            } else {
                format!("Incorrect. An accepted answer is: {}.", question.answer)
            };
            GradingResult {
                question_id: question.id.clone(),
                normalized_answer: normalized,
                correctness: if scored.is_correct {
                    Correctness::Correct
                } else {
                    Correctness::Incorrect
                },
                score: scored.score,
                max_score: question.max_score,
                feedback,
                steps: None,
                diff_image: None,
                assessment_configured: true,
                duration_ms: 0,
            }
        }
        QuestionType::Essay => {
            debug!("item {} [{}]: {}", index, question.id, ItemPhase::Scoring);
            let context = AssessmentContext {
                prompt: question.prompt.clone(),
                answer: item.answer.clone(),
                work_image: None,
                solution: question.solution.clone(),
                detailed: options.generate_feedback,
            };
            let assessed = if options.ai_grading {
                core.qualitative.assess(&context, question.rubric.as_deref()).await
            } else {
                QualitativeScorer::fallback(&context)
            };
            qualitative_result(question, normalized, assessed, None)
        }
        QuestionType::MathSolution => {
            let (work_image, diff_feedback) = match &item.images {
                Some(images) => {
                    debug!(
                        "item {} [{}]: {}",
                        index,
                        question.id,
                        ItemPhase::ExtractingDiff
                    );
                    let original = image_diff::decode_image(&images.original)?;
                    let submitted = image_diff::decode_image(&images.submitted)?;
                    let extraction = core
                        .image_diff
                        .extract_with_metadata(&original, &submitted)?;
                    let feedback = format!(
                        "Detected written work covering {:.1}% of the page.",
                        extraction.diff_percentage * 100.0
                    );
                    (Some(image_diff::encode_png(&extraction.image)?), feedback)
                }
                // Typed-in math work is assessed from the text answer alone
                None => (None, "No work image was submitted; graded from the typed answer.".to_string()),
            };

            debug!("item {} [{}]: {}", index, question.id, ItemPhase::Scoring);
            let context = AssessmentContext {
                prompt: question.prompt.clone(),
                answer: item.answer.clone(),
                work_image: work_image.clone(),
                solution: question.solution.clone(),
                detailed: options.generate_feedback,
            };
            let assessed = if options.ai_grading {
                core.qualitative.assess(&context, question.rubric.as_deref()).await
            } else {
                QualitativeScorer::fallback(&context)
            };

            let mut result = qualitative_result(question, normalized, assessed, work_image);
            // Math results always carry diff-derived feedback, fallback or not
            if result.feedback.is_empty() {
                result.feedback = diff_feedback;
            } else {
                result.feedback = format!("{} {}", diff_feedback, result.feedback);
            }
            result
        }
    };

    debug!("item {} [{}]: {}", index, question.id, ItemPhase::Scored);
    Ok(result)
}

fn unanswered_result(question: &Question, normalized: String) -> GradingResult {
    GradingResult {
        question_id: question.id.clone(),
        normalized_answer: normalized,
        correctness: Correctness::Unknown,
        score: 0.0,
        max_score: question.max_score,
        feedback: "No answer was provided for this question.".to_string(),
        steps: None,
        diff_image: None,
        assessment_configured: true,
        duration_ms: 0,
    }
}

fn objective_result(
    question: &Question,
    normalized: String,
    is_correct: bool,
    score: f64,
    options: GradeOptions,
) -> GradingResult {
    let feedback = if !options.generate_feedback {
        String::new()
    } else if is_correct {
        "Correct.".to_string()
    } else {
        format!("Incorrect. The correct answer is: {}.", question.answer)
    };

    GradingResult {
        question_id: question.id.clone(),
        normalized_answer: normalized,
        correctness: if is_correct {
            Correctness::Correct
        } else {
            Correctness::Incorrect
        },
        score,
        max_score: question.max_score,
        feedback,
        steps: None,
        diff_image: None,
        assessment_configured: true,
        duration_ms: 0,
    }
}

/// Map a 0-100 qualitative outcome onto the question's score scale
fn qualitative_result(
    question: &Question,
    normalized: String,
    assessed: QualitativeResult,
    diff_image: Option<Vec<u8>>,
) -> GradingResult {
    let score = (assessed.score / 100.0 * question.max_score).clamp(0.0, question.max_score);
    let correctness = if assessed.score >= QUALITATIVE_CORRECT_THRESHOLD {
        Correctness::Correct
    } else {
        Correctness::Incorrect
    };

    let steps = assessed.steps.map(|steps| {
        steps
            .into_iter()
            .enumerate()
            .map(|(i, s)| SolutionStep {
                index: i + 1,
                description: s.description,
                expression: s.expression,
                is_correct: s.is_correct,
                feedback: s.feedback,
            })
            .collect()
    });

    GradingResult {
        question_id: question.id.clone(),
        normalized_answer: normalized,
        correctness,
        score,
        max_score: question.max_score,
        feedback: assessed.feedback,
        steps,
        diff_image,
        assessment_configured: assessed.is_configured,
        duration_ms: 0,
    }
}

/// Result for an item whose task panicked or errored unexpectedly
fn failed_result(question_id: &str, max_score: f64) -> GradingResult {
    GradingResult {
        question_id: question_id.to_string(),
        normalized_answer: String::new(),
        correctness: Correctness::Incorrect,
        score: 0.0,
        max_score,
        feedback: "An unexpected error occurred while grading this answer; it was scored zero. \
                   A reviewer should grade it manually."
            .to_string(),
        steps: None,
        diff_image: None,
        assessment_configured: true,
        duration_ms: 0,
    }
}

/// Result for an item still pending when the batch deadline passed
fn timed_out_result(question_id: &str, max_score: f64) -> GradingResult {
    GradingResult {
        question_id: question_id.to_string(),
        normalized_answer: String::new(),
        correctness: Correctness::Incorrect,
        score: 0.0,
        max_score,
        feedback: "Grading did not complete before the deadline; the answer was recorded for \
                   manual review."
            .to_string(),
        steps: None,
        diff_image: None,
        assessment_configured: false,
        duration_ms: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::Difficulty;
    use crate::services::qualitative::{AssessmentOutcome, StepAssessment};
    use crate::services::store::InMemoryQuestionStore;
    use async_trait::async_trait;

    fn question(id: &str, question_type: QuestionType, answer: &str) -> Question {
        Question {
            id: id.to_string(),
            question_type,
            prompt: format!("prompt for {}", id),
            answer: answer.to_string(),
            difficulty: Difficulty::Medium,
            unit: "unit-1".to_string(),
            max_score: 100.0,
            rubric: None,
            solution: None,
        }
    }

    fn grader_with(
        questions: Vec<Question>,
        capability: Option<Arc<dyn AssessmentCapability>>,
    ) -> BatchGrader {
        BatchGrader::new(
            &Config::default(),
            Arc::new(InMemoryQuestionStore::new(questions)),
            capability,
            None,
        )
    }

    struct ScriptedCapability {
        score: f64,
    }

    #[async_trait]
    impl AssessmentCapability for ScriptedCapability {
        async fn assess(
            &self,
            _context: &AssessmentContext,
            _rubric: Option<&str>,
        ) -> AppResult<AssessmentOutcome> {
            Ok(AssessmentOutcome {
                score: self.score,
                feedback: "Scripted feedback.".to_string(),
                details: None,
                steps: Some(vec![StepAssessment {
                    description: "Setup".to_string(),
                    expression: Some("2a + 2b = 2(a+b)".to_string()),
                    is_correct: true,
                    feedback: "Good setup.".to_string(),
                }]),
            })
        }
    }

    #[tokio::test]
    async fn empty_submission_is_a_validation_error() {
        let grader = grader_with(vec![], None);
        let submission = AnswerSubmission::new("stu-1", vec![]);
        let err = grader
            .grade_submission(&submission, GradeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::EmptySubmission)
        ));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn missing_questions_fail_the_whole_batch() {
        let grader = grader_with(
            vec![question("q1", QuestionType::MultipleChoice, "2")],
            None,
        );
        let submission = AnswerSubmission::new(
            "stu-1",
            vec![AnswerItem::new("q1", "B"), AnswerItem::new("ghost", "A")],
        );

        let result = grader
            .grade_submission(&submission, GradeOptions::default())
            .await;
        match result {
            Err(AppError::QuestionsNotFound { missing }) => {
                assert_eq!(missing, vec!["ghost".to_string()]);
            }
            other => panic!("expected QuestionsNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn results_match_input_length_and_order() {
        let grader = grader_with(
            vec![
                question("q1", QuestionType::MultipleChoice, "2"),
                question("q2", QuestionType::ShortAnswer, "대한민국, 한국"),
                question("q3", QuestionType::TrueFalse, "O"),
                question("q4", QuestionType::Essay, ""),
            ],
            None,
        );
        let submission = AnswerSubmission::new(
            "stu-1",
            vec![
                AnswerItem::new("q1", "②"),
                AnswerItem::new("q2", "대한민국"),
                AnswerItem::new("q3", "참"),
                AnswerItem::new("q4", "An essay without a grader configured."),
            ],
        );

        let graded = grader
            .grade_submission(&submission, GradeOptions::default())
            .await
            .unwrap();

        assert_eq!(graded.results.len(), submission.items.len());
        let ids: Vec<&str> = graded
            .results
            .iter()
            .map(|r| r.question_id.as_str())
            .collect();
        assert_eq!(ids, vec!["q1", "q2", "q3", "q4"]);

        assert_eq!(graded.results[0].correctness, Correctness::Correct);
        assert_eq!(graded.results[1].correctness, Correctness::Correct);
        assert_eq!(graded.results[1].score, 100.0);
        assert_eq!(graded.results[2].correctness, Correctness::Correct);
        // Essay fell back: flagged, still carries feedback
        assert!(!graded.results[3].assessment_configured);
        assert!(!graded.results[3].feedback.is_empty());
    }

    #[tokio::test]
    async fn unanswered_items_are_unknown_not_incorrect() {
        let grader = grader_with(
            vec![question("q1", QuestionType::ShortAnswer, "seoul")],
            None,
        );
        let submission =
            AnswerSubmission::new("stu-1", vec![AnswerItem::new("q1", "   ")]);

        let graded = grader
            .grade_submission(&submission, GradeOptions::default())
            .await
            .unwrap();
        assert_eq!(graded.results[0].correctness, Correctness::Unknown);
        assert_eq!(graded.summary.unanswered_count, 1);
    }

    #[tokio::test]
    async fn scripted_capability_grades_essays() {
        let grader = grader_with(
            vec![question("q1", QuestionType::Essay, "")],
            Some(Arc::new(ScriptedCapability { score: 92.0 })),
        );
        let submission = AnswerSubmission::new(
            "stu-1",
            vec![AnswerItem::new("q1", "A thorough essay answer.")],
        );

        let graded = grader
            .grade_submission(&submission, GradeOptions::default())
            .await
            .unwrap();

        let result = &graded.results[0];
        assert!(result.assessment_configured);
        assert_eq!(result.correctness, Correctness::Correct);
        assert!((result.score - 92.0).abs() < 1e-9);
        assert_eq!(result.feedback, "Scripted feedback.");
        assert_eq!(result.steps.as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ai_grading_can_be_disabled() {
        let grader = grader_with(
            vec![question("q1", QuestionType::Essay, "")],
            Some(Arc::new(ScriptedCapability { score: 92.0 })),
        );
        let submission =
            AnswerSubmission::new("stu-1", vec![AnswerItem::new("q1", "An essay.")]);

        let options = GradeOptions {
            ai_grading: false,
            ..Default::default()
        };
        let graded = grader.grade_submission(&submission, options).await.unwrap();
        assert!(!graded.results[0].assessment_configured);
    }

    struct SlowCapability;

    #[async_trait]
    impl AssessmentCapability for SlowCapability {
        async fn assess(
            &self,
            _context: &AssessmentContext,
            _rubric: Option<&str>,
        ) -> AppResult<AssessmentOutcome> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(AssessmentOutcome {
                score: 100.0,
                feedback: "too late to count".to_string(),
                details: None,
                steps: None,
            })
        }
    }

    #[tokio::test]
    async fn deadline_downgrades_pending_items_and_keeps_completed_ones() {
        let config = Config {
            grading_timeout_secs: 1,
            ..Config::default()
        };
        let grader = BatchGrader::new(
            &config,
            Arc::new(InMemoryQuestionStore::new(vec![
                question("q1", QuestionType::MultipleChoice, "2"),
                question("q2", QuestionType::Essay, ""),
            ])),
            Some(Arc::new(SlowCapability)),
            None,
        );
        let submission = AnswerSubmission::new(
            "stu-1",
            vec![
                AnswerItem::new("q1", "B"),
                AnswerItem::new("q2", "An essay the grader never finishes."),
            ],
        );

        let graded = grader
            .grade_submission(&submission, GradeOptions::default())
            .await
            .unwrap();

        // Completed items keep their scores
        assert_eq!(graded.results.len(), 2);
        assert_eq!(graded.results[0].correctness, Correctness::Correct);
        assert_eq!(graded.results[0].score, 100.0);

        // The pending item is aborted and downgraded, not dropped
        let timed_out = &graded.results[1];
        assert_eq!(timed_out.question_id, "q2");
        assert!(!timed_out.assessment_configured);
        assert_eq!(timed_out.score, 0.0);
        assert!(!timed_out.feedback.is_empty());
    }

    #[tokio::test]
    async fn grade_single_scores_one_answer() {
        let grader = grader_with(vec![], None);
        let q = question("adhoc", QuestionType::MultipleChoice, "1");

        let result = grader
            .grade_single(&q, "가", None, GradeOptions::default())
            .await;
        assert_eq!(result.correctness, Correctness::Correct);
        assert_eq!(result.score, 100.0);
    }
}
