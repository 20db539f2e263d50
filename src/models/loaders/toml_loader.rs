use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::fs;
use tracing::info;

use crate::models::question::Question;
use crate::models::submission::{AnswerItem, AnswerSubmission, ImagePair};

/// TOML shape of a question bank file
#[derive(Debug, Deserialize)]
struct BankFile {
    #[serde(default)]
    questions: Vec<Question>,
}

/// TOML shape of a submission file
#[derive(Debug, Deserialize)]
struct SubmissionFile {
    submitter_id: String,
    submitted_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    time_limit_minutes: Option<u32>,
    #[serde(default)]
    answers: Vec<AnswerEntry>,
}

/// One answer row in a submission file. Image paths are resolved relative
/// to the submission file's directory and read into memory.
#[derive(Debug, Deserialize)]
struct AnswerEntry {
    question_id: String,
    #[serde(default)]
    answer: String,
    original_image: Option<String>,
    submitted_image: Option<String>,
}

/// Load a question bank from a TOML file
pub async fn load_question_bank(path: &Path) -> Result<Vec<Question>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read bank file: {}", path.display()))?;

    let bank: BankFile = toml::from_str(&content)
        .with_context(|| format!("cannot parse bank file: {}", path.display()))?;

    info!("loaded {} questions from {}", bank.questions.len(), path.display());

    Ok(bank.questions)
}

/// Load a submission from a TOML file, reading referenced images into memory
pub async fn load_submission(path: &Path) -> Result<AnswerSubmission> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read submission file: {}", path.display()))?;

    let file: SubmissionFile = toml::from_str(&content)
        .with_context(|| format!("cannot parse submission file: {}", path.display()))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut items = Vec::with_capacity(file.answers.len());
    for entry in file.answers {
        let images = match (&entry.original_image, &entry.submitted_image) {
            (Some(original), Some(submitted)) => Some(ImagePair {
                original: read_image(base_dir, original).await?,
                submitted: read_image(base_dir, submitted).await?,
            }),
            _ => None,
        };

        let mut item = AnswerItem::new(entry.question_id, entry.answer);
        if let Some(images) = images {
            item = item.with_images(images);
        }
        items.push(item);
    }

    info!("loaded submission with {} answers from {}", items.len(), path.display());

    Ok(AnswerSubmission {
        submitter_id: file.submitter_id,
        items,
        submitted_at: file.submitted_at.unwrap_or_else(Utc::now),
        started_at: file.started_at,
        time_limit_minutes: file.time_limit_minutes,
    })
}

async fn read_image(base_dir: &Path, relative: &str) -> Result<Vec<u8>> {
    let full = base_dir.join(relative);
    fs::read(&full)
        .await
        .with_context(|| format!("cannot read image file: {}", full.display()))
}
