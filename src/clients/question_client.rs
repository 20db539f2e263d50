//! Question bank API client
//!
//! Network-backed `QuestionStore` for deployments where questions live
//! behind an HTTP question-bank service. Returns whatever subset of the
//! requested ids the service knows; the orchestrator turns gaps into a
//! batch-level error.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult, StoreError};
use crate::models::question::Question;
use crate::services::store::QuestionStore;

/// HTTP question store
pub struct HttpQuestionStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

/// Response shape of the batch lookup endpoint
#[derive(Debug, Deserialize)]
struct BatchLookupResponse {
    #[serde(default)]
    questions: Vec<Question>,
}

impl HttpQuestionStore {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.bank_api_base_url.clone(),
            token: config.bank_api_token.clone(),
        }
    }
}

#[async_trait]
impl QuestionStore for HttpQuestionStore {
    async fn get_questions_by_id(&self, ids: &[String]) -> AppResult<HashMap<String, Question>> {
        let endpoint = format!("{}/api/questions/batch", self.base_url);
        debug!("looking up {} questions at {}", ids.len(), endpoint);

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "ids": ids }))
            .send()
            .await
            .map_err(|e| {
                AppError::Store(StoreError::RequestFailed {
                    endpoint: endpoint.clone(),
                    source: Box::new(e),
                })
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.ok();
            return Err(AppError::Store(StoreError::BadResponse {
                endpoint,
                code: Some(status.as_u16()),
                message,
            }));
        }

        let body: BatchLookupResponse = response.json().await.map_err(|e| {
            AppError::Store(StoreError::RequestFailed {
                endpoint: endpoint.clone(),
                source: Box::new(e),
            })
        })?;

        debug!("question bank returned {} questions", body.questions.len());

        Ok(body
            .questions
            .into_iter()
            .map(|q| (q.id.clone(), q))
            .collect())
    }
}
