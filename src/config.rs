use crate::error::{AppError, AppResult, ConfigError};

/// Engine configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of answer items graded at the same time
    pub max_concurrent_gradings: usize,
    /// Deadline for a whole batch, in seconds; pending items past the
    /// deadline are reported with the fallback outcome
    pub grading_timeout_secs: u64,
    /// Similarity at or above which a short answer earns full credit
    pub similarity_full_threshold: f64,
    /// Similarity at or above which a short answer earns partial credit
    pub similarity_partial_threshold: f64,
    /// Per-pixel luma difference (0-255) counted as "changed"
    pub diff_pixel_threshold: u8,
    /// Margin in pixels added around the changed bounding box
    pub diff_crop_margin: u32,
    /// Weighted accuracy below which a unit is flagged as weak (percent)
    pub weak_unit_threshold: f64,
    /// Input files for the CLI driver
    pub bank_file: String,
    pub submission_file: String,
    /// Report written by the CLI driver
    pub report_file: String,
    // --- LLM assessment configuration ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- Question bank API configuration ---
    pub bank_api_base_url: String,
    pub bank_api_token: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_gradings: 8,
            grading_timeout_secs: 120,
            similarity_full_threshold: 0.95,
            similarity_partial_threshold: 0.6,
            diff_pixel_threshold: 32,
            diff_crop_margin: 10,
            weak_unit_threshold: 70.0,
            bank_file: "questions.toml".to_string(),
            submission_file: "submission.toml".to_string(),
            report_file: "grading_report.json".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            bank_api_base_url: String::new(),
            bank_api_token: String::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_gradings: std::env::var("MAX_CONCURRENT_GRADINGS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_gradings),
            grading_timeout_secs: std::env::var("GRADING_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.grading_timeout_secs),
            similarity_full_threshold: std::env::var("SIMILARITY_FULL_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.similarity_full_threshold),
            similarity_partial_threshold: std::env::var("SIMILARITY_PARTIAL_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.similarity_partial_threshold),
            diff_pixel_threshold: std::env::var("DIFF_PIXEL_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.diff_pixel_threshold),
            diff_crop_margin: std::env::var("DIFF_CROP_MARGIN").ok().and_then(|v| v.parse().ok()).unwrap_or(default.diff_crop_margin),
            weak_unit_threshold: std::env::var("WEAK_UNIT_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.weak_unit_threshold),
            bank_file: std::env::var("BANK_FILE").unwrap_or(default.bank_file),
            submission_file: std::env::var("SUBMISSION_FILE").unwrap_or(default.submission_file),
            report_file: std::env::var("REPORT_FILE").unwrap_or(default.report_file),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            bank_api_base_url: std::env::var("BANK_API_BASE_URL").unwrap_or(default.bank_api_base_url),
            bank_api_token: std::env::var("BANK_API_TOKEN").unwrap_or(default.bank_api_token),
        }
    }

    /// Whether the external assessment capability is configured at all
    pub fn llm_configured(&self) -> bool {
        !self.llm_api_key.is_empty()
    }

    /// Check that similarity thresholds are usable before any grading starts
    pub fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("similarity_full_threshold", self.similarity_full_threshold),
            ("similarity_partial_threshold", self.similarity_partial_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::Config(ConfigError::InvalidThreshold {
                    name: name.to_string(),
                    value,
                }));
            }
        }
        Ok(())
    }
}
