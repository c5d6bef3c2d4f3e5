// Progress indicators and spinners

use indicatif::{ProgressBar, ProgressStyle};
use ochat_client::DownloadProgress;
use std::time::Duration;

/// Steps on the pull bar; progress is drawn from the clamped ratio
pub const PULL_BAR_STEPS: u64 = 1000;

/// Create a spinner for long-running operations
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to create spinner template: {}", e);
            ProgressStyle::default_spinner()
        });
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Create the bar shown while a model is pulled
pub fn create_pull_bar(model: &str) -> ProgressBar {
    let pb = ProgressBar::new(PULL_BAR_STEPS);
    let style = ProgressStyle::default_bar()
        .template("{prefix} [{bar:40.cyan/blue}] {msg}")
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to create progress bar template: {}", e);
            ProgressStyle::default_bar()
        })
        .progress_chars("=>-");
    pb.set_style(style);
    pb.set_prefix(model.to_string());
    pb
}

/// Bar position for a progress snapshot
pub fn bar_position(progress: &DownloadProgress) -> u64 {
    (progress.ratio() * PULL_BAR_STEPS as f64).round() as u64
}

/// Text after the bar: status (if any) and the MB counter
pub fn bar_message(progress: &DownloadProgress) -> String {
    match progress.status.as_deref() {
        Some(status) if !status.is_empty() => format!("{} {}", status, progress.display()),
        _ => progress.display(),
    }
}

/// Move `pb` to `progress`
pub fn update_pull_bar(pb: &ProgressBar, progress: &DownloadProgress) {
    pb.set_position(bar_position(progress));
    pb.set_message(bar_message(progress));
}

/// Take the bar off screen after a failed pull
pub fn clear_pull_bar(pb: &ProgressBar) {
    pb.finish_and_clear();
}
