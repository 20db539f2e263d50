pub mod llm_client;
pub mod question_client;

pub use llm_client::LlmAssessmentClient;
pub use question_client::HttpQuestionStore;
