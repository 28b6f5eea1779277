use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use near_duper_core::ProgressReporter;
use std::sync::Mutex;
use std::time::Duration;

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Signature phase: progress bar over the corpus
/// - Compare phase: spinner (pairs per bucket are not known upfront)
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style.tick_chars(TICKS));
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn done(message: String) {
    eprintln!("  {} {}", "✓".green(), message);
}

impl ProgressReporter for CliReporter {
    fn on_signature_start(&self, total_files: usize) {
        let pb = ProgressBar::new(total_files as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} Signing [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining)",
        ) {
            pb.set_style(style.progress_chars("━╸─").tick_chars(TICKS));
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_signature_progress(&self, files_done: usize, _total_files: usize) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_position(files_done as u64);
            }
        }
    }

    fn on_signature_complete(&self, signed: usize, skipped: usize, duration_secs: f64) {
        self.finish_bar();
        done(format!(
            "Signatures complete: {} files signed, {} skipped in {:.2}s",
            signed, skipped, duration_secs
        ));
    }

    fn on_compare_start(&self, buckets: usize) {
        self.set_bar(spinner(format!(
            "Comparing candidates in {} length buckets...",
            buckets
        )));
    }

    fn on_compare_complete(&self, candidate_pairs: usize, edges: usize, duration_secs: f64) {
        self.finish_bar();
        done(format!(
            "Comparison complete: {} candidate pairs, {} similar in {:.2}s",
            candidate_pairs, edges, duration_secs
        ));
    }

    fn on_cluster_complete(&self, groups: usize, duration_secs: f64) {
        done(format!(
            "Clustering complete: {} duplicate groups in {:.2}s",
            groups, duration_secs
        ));
    }
}
