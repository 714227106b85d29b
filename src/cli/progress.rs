//! Terminal progress bar for mapper batches.
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use qytools::{PoolSummary, ProgressSink};

/// Progress sink that drives an `indicatif` bar on stderr and prints failures above it.
pub struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }
}

impl Default for BarSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarSink {
    fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        if total > 0 {
            self.bar.enable_steady_tick(Duration::from_millis(100));
        } else {
            self.bar.println("0 tasks");
        }
    }

    fn tick(&self, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
    }

    fn failure(&self, arg: &str, message: &str) {
        self.bar.println(format!("error: {} ({})", arg, message));
    }

    fn finish(&self, summary: &PoolSummary) {
        self.bar.finish_and_clear();
        if summary.failed.is_empty() {
            eprintln!("{} of {} tasks completed", summary.completed, summary.total);
            return;
        }
        eprintln!("failed {} of {}", summary.failed.len(), summary.total);
        for arg in &summary.failed {
            eprintln!("  - {}", arg);
        }
    }
}
