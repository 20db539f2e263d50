pub mod toml_loader;

pub use toml_loader::{load_question_bank, load_submission};
