use std::fmt;

/// Top-level application error type
#[derive(Debug)]
pub enum AppError {
    /// Request validation errors (batch never starts)
    Validation(ValidationError),
    /// One or more requested questions do not exist (fails the whole batch)
    QuestionsNotFound { missing: Vec<String> },
    /// Image decoding / differencing errors
    Image(ImageError),
    /// External assessment capability errors
    Assessment(AssessmentError),
    /// Unexpected errors inside a scorer
    Scoring(ScoringError),
    /// Question store / result sink errors
    Store(StoreError),
    /// Configuration errors
    Config(ConfigError),
    /// File loading errors
    File(FileError),
    /// Catch-all for wrapped third-party errors
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "validation error: {}", e),
            AppError::QuestionsNotFound { missing } => {
                write!(f, "questions not found: [{}]", missing.join(", "))
            }
            AppError::Image(e) => write!(f, "image error: {}", e),
            AppError::Assessment(e) => write!(f, "assessment error: {}", e),
            AppError::Scoring(e) => write!(f, "scoring error: {}", e),
            AppError::Store(e) => write!(f, "store error: {}", e),
            AppError::Config(e) => write!(f, "config error: {}", e),
            AppError::File(e) => write!(f, "file error: {}", e),
            AppError::Other(msg) => write!(f, "error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Validation(e) => Some(e),
            AppError::Image(e) => Some(e),
            AppError::Assessment(e) => Some(e),
            AppError::Scoring(e) => Some(e),
            AppError::Store(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::QuestionsNotFound { .. } | AppError::Other(_) => None,
        }
    }
}

/// Request validation errors
#[derive(Debug)]
pub enum ValidationError {
    /// The submission contains no answer items
    EmptySubmission,
    /// An answer item has an empty question id
    EmptyQuestionId { index: usize },
    /// The declared time limit is not usable
    InvalidTimeLimit { minutes: u32 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptySubmission => write!(f, "submission has no answer items"),
            ValidationError::EmptyQuestionId { index } => {
                write!(f, "answer item {} has an empty question id", index)
            }
            ValidationError::InvalidTimeLimit { minutes } => {
                write!(f, "time limit of {} minutes is invalid", minutes)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Image decoding and differencing errors
#[derive(Debug)]
pub enum ImageError {
    /// The original and submitted images do not share dimensions
    DimensionMismatch {
        original: (u32, u32),
        submitted: (u32, u32),
    },
    /// Decoding an image buffer failed
    DecodeFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Encoding an image to PNG failed
    EncodeFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::DimensionMismatch {
                original,
                submitted,
            } => write!(
                f,
                "image dimensions do not match: original {}x{}, submitted {}x{}",
                original.0, original.1, submitted.0, submitted.1
            ),
            ImageError::DecodeFailed { source } => write!(f, "failed to decode image: {}", source),
            ImageError::EncodeFailed { source } => write!(f, "failed to encode image: {}", source),
        }
    }
}

impl std::error::Error for ImageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImageError::DecodeFailed { source } | ImageError::EncodeFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            ImageError::DimensionMismatch { .. } => None,
        }
    }
}

/// External assessment capability errors
#[derive(Debug)]
pub enum AssessmentError {
    /// The capability is unreachable or exhausted its retry budget
    Unavailable { reason: String },
    /// The underlying API call failed
    CallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The capability returned no content
    EmptyResponse { model: String },
    /// The capability returned content that could not be interpreted
    MalformedResponse { response: String },
}

impl fmt::Display for AssessmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentError::Unavailable { reason } => {
                write!(f, "assessment capability unavailable: {}", reason)
            }
            AssessmentError::CallFailed { model, source } => {
                write!(f, "assessment call failed (model: {}): {}", model, source)
            }
            AssessmentError::EmptyResponse { model } => {
                write!(f, "assessment returned no content (model: {})", model)
            }
            AssessmentError::MalformedResponse { response } => {
                write!(f, "could not interpret assessment response: {}", response)
            }
        }
    }
}

impl std::error::Error for AssessmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssessmentError::CallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// Unexpected scorer failures, contained at the per-item boundary
#[derive(Debug)]
pub enum ScoringError {
    /// A scorer failed in a way it should not have
    Internal {
        question_id: String,
        message: String,
    },
}

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringError::Internal {
                question_id,
                message,
            } => write!(
                f,
                "internal scoring error (question {}): {}",
                question_id, message
            ),
        }
    }
}

impl std::error::Error for ScoringError {}

/// Question store and result sink errors
#[derive(Debug)]
pub enum StoreError {
    /// Network request failed
    RequestFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The store answered with an error payload
    BadResponse {
        endpoint: String,
        code: Option<u16>,
        message: Option<String>,
    },
    /// Persisting results failed (best-effort path, logged only)
    SaveFailed { batch_key: String, message: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::RequestFailed { endpoint, source } => {
                write!(f, "store request failed ({}): {}", endpoint, source)
            }
            StoreError::BadResponse {
                endpoint,
                code,
                message,
            } => write!(
                f,
                "store returned an error ({}): code={:?}, message={:?}",
                endpoint, code, message
            ),
            StoreError::SaveFailed { batch_key, message } => {
                write!(f, "saving results failed (batch {}): {}", batch_key, message)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::RequestFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    /// A threshold is outside its valid range
    InvalidThreshold { name: String, value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidThreshold { name, value } => {
                write!(f, "threshold {} = {} is outside [0, 1]", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// File loading errors
#[derive(Debug)]
pub enum FileError {
    /// File does not exist
    NotFound { path: String },
    /// Reading a file failed
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Writing a file failed
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML parsing failed
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "file not found: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "failed to read file ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "failed to write file ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "failed to parse TOML ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            FileError::NotFound { .. } => None,
        }
    }
}

// ========== Conversions from common error types ==========
// anyhow already blanket-converts anything implementing std::error::Error,
// so no manual From<AppError> for anyhow::Error is needed.

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Image(ImageError::DecodeFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== Convenience constructors ==========

impl AppError {
    /// Missing-question error for a batch lookup
    pub fn questions_not_found(missing: Vec<String>) -> Self {
        AppError::QuestionsNotFound { missing }
    }

    /// Dimension-mismatch error for the image differ
    pub fn image_mismatch(original: (u32, u32), submitted: (u32, u32)) -> Self {
        AppError::Image(ImageError::DimensionMismatch {
            original,
            submitted,
        })
    }

    /// Assessment-unavailable error
    pub fn assessment_unavailable(reason: impl Into<String>) -> Self {
        AppError::Assessment(AssessmentError::Unavailable {
            reason: reason.into(),
        })
    }

    /// Internal scoring error for a question
    pub fn internal_scoring(question_id: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Scoring(ScoringError::Internal {
            question_id: question_id.into(),
            message: message.into(),
        })
    }

    /// True when the error is fatal to the whole batch rather than one item
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_) | AppError::QuestionsNotFound { .. }
        )
    }
}

// ========== Result type alias ==========

/// Application result type
pub type AppResult<T> = Result<T, AppError>;
