//! # Grade Submission
//!
//! An automated grading engine for heterogeneous question types: exact-match
//! choice questions, similarity-scored short answers, rubric-driven essays,
//! and image-differenced handwritten math work.
//!
//! ## Architecture
//!
//! The crate uses a strict layered architecture:
//!
//! ### ① Capability layer (`services/`)
//! - Describes "what the engine can do", one answer at a time
//! - `normalizer` - answer canonicalization
//! - `choice_scorer` - multiple-choice / true-false comparison
//! - `similarity_scorer` - edit-distance partial credit
//! - `image_diff` - solution-area extraction from image pairs
//! - `qualitative` - essay/math assessment behind a capability port
//! - `summary` - pure reduction into a statistical report
//! - `store` - question store and result sink ports
//!
//! ### ② Client layer (`clients/`)
//! - Network-backed implementations of the ports
//! - `LlmAssessmentClient` - OpenAI-compatible assessment capability
//! - `HttpQuestionStore` - question bank API
//!
//! ### ③ Orchestration layer (`orchestrator/`)
//! - `BatchGrader` - validation, bounded fan-out, ordered fan-in,
//!   failure containment, best-effort persistence
//!
//! ## Module structure

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// Re-export the commonly used types
pub use clients::{HttpQuestionStore, LlmAssessmentClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{
    AnswerItem, AnswerSubmission, Correctness, GradeBand, GradedSubmission, GradingResult,
    GradingSummary, ImagePair, Question, QuestionType,
};
pub use orchestrator::{BatchGrader, GradeOptions};
pub use services::{
    AssessmentCapability, AssessmentContext, AssessmentOutcome, ImageDiffExtractor,
    InMemoryQuestionStore, MultipleChoiceScorer, QualitativeScorer, QuestionStore, ResultSink,
    SimilarityScorer, SummaryAggregator,
};
