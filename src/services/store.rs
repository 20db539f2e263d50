//! External collaborator ports - question store and result sink
//!
//! The engine stays correct against fake implementations of both; the
//! network-backed question store lives in `clients`.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::question::Question;
use crate::models::result::{GradingResult, GradingSummary};

/// Read-only question lookup.
///
/// Implementations return whatever subset of the requested ids they know;
/// the orchestrator decides that missing ids fail the batch.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn get_questions_by_id(&self, ids: &[String]) -> AppResult<HashMap<String, Question>>;
}

/// Optional best-effort result persistence. Failure is logged by the
/// orchestrator and never blocks the grading response.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn save_results(
        &self,
        batch_key: &str,
        results: &[GradingResult],
        summary: &GradingSummary,
    ) -> AppResult<()>;
}

/// In-memory question store, used by the CLI driver and tests
#[derive(Default)]
pub struct InMemoryQuestionStore {
    questions: HashMap<String, Question>,
}

impl InMemoryQuestionStore {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions: questions.into_iter().map(|q| (q.id.clone(), q)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[async_trait]
impl QuestionStore for InMemoryQuestionStore {
    async fn get_questions_by_id(&self, ids: &[String]) -> AppResult<HashMap<String, Question>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.questions.get(id).map(|q| (id.clone(), q.clone())))
            .collect())
    }
}
