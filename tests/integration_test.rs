use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};

use grade_submission::models::{Difficulty, Question, QuestionType};
use grade_submission::services::{
    AssessmentCapability, AssessmentContext, AssessmentOutcome, InMemoryQuestionStore, ResultSink,
};
use grade_submission::{
    AnswerItem, AnswerSubmission, AppResult, BatchGrader, Config, Correctness, GradeBand,
    GradeOptions, GradedSubmission, GradingResult, GradingSummary, ImagePair,
};

fn question(id: &str, question_type: QuestionType, answer: &str, unit: &str) -> Question {
    Question {
        id: id.to_string(),
        question_type,
        prompt: format!("prompt for {}", id),
        answer: answer.to_string(),
        difficulty: Difficulty::Medium,
        unit: unit.to_string(),
        max_score: 100.0,
        rubric: None,
        solution: None,
    }
}

fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
    bytes
}

/// Blank page plus the same page with a dark block of handwriting
fn work_images() -> ImagePair {
    let original = DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 120, Rgb([255, 255, 255])));
    let mut submitted = original.to_rgb8();
    for y in 40..60 {
        for x in 30..80 {
            submitted.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
    let submitted = DynamicImage::ImageRgb8(submitted);
    ImagePair {
        original: png_bytes(&original),
        submitted: png_bytes(&submitted),
    }
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
            feedback: "Well reasoned.".to_string(),
            details: None,
            steps: None,
        })
    }
}

struct FailingCapability;

#[async_trait]
impl AssessmentCapability for FailingCapability {
    async fn assess(
        &self,
        _context: &AssessmentContext,
        _rubric: Option<&str>,
    ) -> AppResult<AssessmentOutcome> {
        Err(grade_submission::AppError::assessment_unavailable(
            "simulated outage",
        ))
    }
}

#[derive(Default)]
struct RecordingSink {
    saved: Mutex<Vec<String>>,
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn save_results(
        &self,
        batch_key: &str,
        results: &[GradingResult],
        _summary: &GradingSummary,
    ) -> AppResult<()> {
        self.saved
            .lock()
            .unwrap()
            .push(format!("{}:{}", batch_key, results.len()));
        Ok(())
    }
}

fn mixed_bank() -> Vec<Question> {
    vec![
        question("mc-1", QuestionType::MultipleChoice, "2", "geometry"),
        question("sa-1", QuestionType::ShortAnswer, "대한민국, 한국", "history"),
        question("tf-1", QuestionType::TrueFalse, "O", "history"),
        question("es-1", QuestionType::Essay, "", "writing"),
        question("ma-1", QuestionType::MathSolution, "x = 4", "algebra"),
    ]
}

fn mixed_submission() -> AnswerSubmission {
    AnswerSubmission::new(
        "stu-42",
        vec![
            AnswerItem::new("mc-1", "B"),
            AnswerItem::new("sa-1", "한국"),
            AnswerItem::new("tf-1", "참"),
            AnswerItem::new("es-1", "A thoughtful essay about the topic."),
            AnswerItem::new("ma-1", "x = 4").with_images(work_images()),
        ],
    )
}

#[tokio::test]
async fn mixed_batch_end_to_end() {
    let sink = Arc::new(RecordingSink::default());
    let grader = BatchGrader::new(
        &Config::default(),
        Arc::new(InMemoryQuestionStore::new(mixed_bank())),
        Some(Arc::new(ScriptedCapability { score: 90.0 })),
        Some(sink.clone()),
    );

    let submission = mixed_submission();
    let graded = grader
        .grade_submission(&submission, GradeOptions::default())
        .await
        .unwrap();

    // Results line up with the input, item for item
    assert_eq!(graded.results.len(), submission.items.len());
    let ids: Vec<&str> = graded
        .results
        .iter()
        .map(|r| r.question_id.as_str())
        .collect();
    assert_eq!(ids, vec!["mc-1", "sa-1", "tf-1", "es-1", "ma-1"]);

    // Objective items: "B" matches option 2, "한국" is an accepted literal,
    // "참" matches O
    assert_eq!(graded.results[0].correctness, Correctness::Correct);
    assert_eq!(graded.results[1].correctness, Correctness::Correct);
    assert_eq!(graded.results[1].score, 100.0);
    assert_eq!(graded.results[2].correctness, Correctness::Correct);

    // Qualitative items went through the scripted capability
    assert!(graded.results[3].assessment_configured);
    assert_eq!(graded.results[3].correctness, Correctness::Correct);

    // The math item carries the cropped work image and diff feedback
    let math = &graded.results[4];
    assert!(math.diff_image.is_some());
    assert!(math.feedback.contains("written work"));
    let crop = image::load_from_memory(math.diff_image.as_ref().unwrap()).unwrap();
    // 50x20 block plus the default 10px margin
    assert_eq!(image::GenericImageView::dimensions(&crop), (70, 40));

    // Summary invariants
    let summary = &graded.summary;
    assert_eq!(
        summary.correct_count
            + summary.partial_count
            + summary.incorrect_count
            + summary.unanswered_count,
        graded.results.len()
    );
    assert_eq!(summary.max_score, 500.0);
    assert_eq!(summary.band, GradeBand::APlus);
    let type_total: usize = summary.by_type.values().map(|row| row.total).sum();
    assert_eq!(type_total, graded.results.len());

    // The sink saw exactly one batch
    let saved = sink.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].ends_with(":5"));
}

#[tokio::test]
async fn mismatched_images_fail_only_that_item() {
    let grader = BatchGrader::new(
        &Config::default(),
        Arc::new(InMemoryQuestionStore::new(mixed_bank())),
        Some(Arc::new(ScriptedCapability { score: 90.0 })),
        None,
    );

    let original = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([255, 255, 255])));
    let submitted = DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 100, Rgb([255, 255, 255])));
    let submission = AnswerSubmission::new(
        "stu-9",
        vec![
            AnswerItem::new("mc-1", "B"),
            AnswerItem::new("ma-1", "x = 4").with_images(ImagePair {
                original: png_bytes(&original),
                submitted: png_bytes(&submitted),
            }),
        ],
    );

    let graded = grader
        .grade_submission(&submission, GradeOptions::default())
        .await
        .unwrap();

    // The batch completes with a full-length result vector
    assert_eq!(graded.results.len(), 2);
    assert_eq!(graded.results[0].correctness, Correctness::Correct);
    assert_eq!(graded.results[0].score, 100.0);

    // The mismatched item alone is zero-scored with explanatory feedback
    let math = &graded.results[1];
    assert_eq!(math.correctness, Correctness::Incorrect);
    assert_eq!(math.score, 0.0);
    assert!(math.feedback.contains("dimensions"));
    assert!(math.diff_image.is_none());

    // Counts stay consistent with the input length
    let summary = &graded.summary;
    assert_eq!(
        summary.correct_count
            + summary.partial_count
            + summary.incorrect_count
            + summary.unanswered_count,
        graded.results.len()
    );
}

#[tokio::test]
async fn capability_outage_degrades_to_fallback() {
    let grader = BatchGrader::new(
        &Config::default(),
        Arc::new(InMemoryQuestionStore::new(mixed_bank())),
        Some(Arc::new(FailingCapability)),
        None,
    );

    let graded = grader
        .grade_submission(&mixed_submission(), GradeOptions::default())
        .await
        .unwrap();

    // Objective items are unaffected by the outage
    assert_eq!(graded.results[0].correctness, Correctness::Correct);

    // Essay and math fall back to the provisional score, clearly flagged
    for result in [&graded.results[3], &graded.results[4]] {
        assert!(!result.assessment_configured);
        assert_eq!(result.score, 50.0);
        assert!(!result.feedback.is_empty());
    }
}

#[tokio::test]
async fn wrong_answers_produce_explanatory_feedback() {
    let grader = BatchGrader::new(
        &Config::default(),
        Arc::new(InMemoryQuestionStore::new(mixed_bank())),
        None,
        None,
    );

    let submission = AnswerSubmission::new(
        "stu-7",
        vec![
            AnswerItem::new("mc-1", "C"),
            AnswerItem::new("sa-1", "일본"),
            AnswerItem::new("tf-1", "X"),
        ],
    );
    let graded = grader
        .grade_submission(&submission, GradeOptions::default())
        .await
        .unwrap();

    for result in &graded.results {
        assert_eq!(result.correctness, Correctness::Incorrect);
        assert!(!result.feedback.is_empty());
    }
    assert_eq!(graded.summary.band, GradeBand::F);
    assert_eq!(graded.summary.incorrect_count, 3);
}

#[tokio::test]
async fn graded_submission_serializes_to_json() {
    let grader = BatchGrader::new(
        &Config::default(),
        Arc::new(InMemoryQuestionStore::new(mixed_bank())),
        Some(Arc::new(ScriptedCapability { score: 75.0 })),
        None,
    );

    let graded = grader
        .grade_submission(&mixed_submission(), GradeOptions::default())
        .await
        .unwrap();

    let json = serde_json::to_string_pretty(&graded).unwrap();
    let parsed: GradedSubmission = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.results.len(), graded.results.len());
    assert_eq!(parsed.summary.band, graded.summary.band);
}

#[tokio::test]
#[ignore] // needs LLM_API_KEY; run manually: cargo test -- --ignored
async fn live_llm_grades_an_essay() {
    grade_submission::utils::logging::init();
    let config = Config::from_env();
    assert!(config.llm_configured(), "LLM_API_KEY must be set");

    let grader = BatchGrader::new(
        &config,
        Arc::new(InMemoryQuestionStore::new(vec![question(
            "es-live",
            QuestionType::Essay,
            "",
            "writing",
        )])),
        Some(Arc::new(grade_submission::LlmAssessmentClient::new(
            &config,
        ))),
        None,
    );

    let submission = AnswerSubmission::new(
        "stu-live",
        vec![AnswerItem::new(
            "es-live",
            "Photosynthesis converts light energy into chemical energy stored in glucose.",
        )],
    );
    let graded = grader
        .grade_submission(&submission, GradeOptions::default())
        .await
        .unwrap();

    let result = &graded.results[0];
    assert!(result.assessment_configured);
    println!("live score: {:.1}, feedback: {}", result.score, result.feedback);
}
