//! Logging utilities
//!
//! tracing initialization plus formatted progress and summary output for the
//! CLI driver.

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::result::GradingSummary;

/// Initialize the tracing subscriber. `RUST_LOG` overrides the default level.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

/// Log startup information
pub fn log_startup(max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 grading engine starting");
    info!("📊 max concurrent gradings: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// Log the start of a grading batch
pub fn log_batch_start(submitter: &str, item_count: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 grading submission from {} ({} answers)", submitter, item_count);
    info!("{}", "=".repeat(60));
}

/// Print the final summary
pub fn print_summary(summary: &GradingSummary) {
    info!("\n{}", "=".repeat(60));
    info!("📊 grading complete");
    info!(
        "finished at: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!(
        "✅ score: {:.1}/{:.1} ({:.1}%) grade {}",
        summary.total_score,
        summary.max_score,
        summary.percentage,
        summary.band.as_str()
    );
    info!(
        "correct {} | partial {} | incorrect {} | unanswered {}",
        summary.correct_count,
        summary.partial_count,
        summary.incorrect_count,
        summary.unanswered_count
    );
    for (unit, row) in &summary.by_unit {
        info!(
            "  unit {:<20} {:.1}/{} ({:.0}%)",
            unit, row.correct, row.total, row.percentage
        );
    }
    if !summary.weak_units.is_empty() {
        let weakest: Vec<String> = summary
            .weak_units
            .iter()
            .map(|w| format!("{} ({:.0}%)", w.unit, w.accuracy))
            .collect();
        info!("⚠️ weak units: {}", weakest.join(", "));
    }
    if summary.over_time_limit {
        info!("⚠️ submitted past the time limit");
    }
    info!("{}", "=".repeat(60));
}

/// Truncate long text for log display
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
