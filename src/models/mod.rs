pub mod loaders;
pub mod question;
pub mod result;
pub mod submission;

pub use loaders::{load_question_bank, load_submission};
pub use question::{Difficulty, Question, QuestionType};
pub use result::{
    BreakdownRow, Correctness, GradeBand, GradedSubmission, GradingResult, GradingSummary,
    SolutionStep, WeakUnit,
};
pub use submission::{AnswerItem, AnswerSubmission, ImagePair};
