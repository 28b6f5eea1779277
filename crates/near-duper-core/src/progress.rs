/// Trait for reporting dedupe progress.
///
/// The CLI implements it with indicatif bars; all methods default to no-ops.
pub trait ProgressReporter: Send + Sync {
    fn on_signature_start(&self, _total_files: usize) {}
    fn on_signature_progress(&self, _files_done: usize, _total_files: usize) {}
    fn on_signature_complete(&self, _signed: usize, _skipped: usize, _duration_secs: f64) {}
    fn on_compare_start(&self, _buckets: usize) {}
    fn on_compare_complete(&self, _candidate_pairs: usize, _edges: usize, _duration_secs: f64) {}
    fn on_cluster_complete(&self, _groups: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
