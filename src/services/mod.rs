pub mod choice_scorer;
pub mod image_diff;
pub mod normalizer;
pub mod qualitative;
pub mod similarity_scorer;
pub mod store;
pub mod summary;

pub use choice_scorer::MultipleChoiceScorer;
pub use image_diff::ImageDiffExtractor;
pub use qualitative::{AssessmentCapability, AssessmentContext, AssessmentOutcome, QualitativeScorer};
pub use similarity_scorer::SimilarityScorer;
pub use store::{InMemoryQuestionStore, QuestionStore, ResultSink};
pub use summary::SummaryAggregator;
