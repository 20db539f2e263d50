use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use grade_submission::models::loaders::{load_question_bank, load_submission};
use grade_submission::services::{AssessmentCapability, InMemoryQuestionStore};
use grade_submission::utils::logging;
use grade_submission::{BatchGrader, Config, GradeOptions, LlmAssessmentClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init();

    // Load configuration
    let config = Config::from_env();
    config.validate()?;
    logging::log_startup(config.max_concurrent_gradings);

    // Load inputs
    let questions = load_question_bank(Path::new(&config.bank_file)).await?;
    let submission = load_submission(Path::new(&config.submission_file)).await?;
    logging::log_batch_start(&submission.submitter_id, submission.items.len());

    let store = Arc::new(InMemoryQuestionStore::new(questions));

    // Essay and math assessment runs without the capability too, on the
    // deterministic fallback path
    let capability: Option<Arc<dyn AssessmentCapability>> = if config.llm_configured() {
        Some(Arc::new(LlmAssessmentClient::new(&config)))
    } else {
        warn!("⚠️ LLM_API_KEY not set, essay/math answers fall back to manual-review scoring");
        None
    };

    let grader = BatchGrader::new(&config, store, capability, None);
    let graded = grader
        .grade_submission(&submission, GradeOptions::default())
        .await?;

    logging::print_summary(&graded.summary);

    // Write the full report
    let report = serde_json::to_string_pretty(&graded)?;
    tokio::fs::write(&config.report_file, report)
        .await
        .with_context(|| format!("cannot write report file: {}", config.report_file))?;
    info!("✅ report written to {}", config.report_file);

    Ok(())
}
