use crate::error::Result;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::thread;
use tracing::debug;

/// Bounded worker pool for signature generation and bucket comparison.
///
/// Owns a dedicated rayon pool so the engine never competes with the
/// global pool an embedding application may be using.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// `worker_count == 0` sizes the pool from the available cores.
    pub fn new(worker_count: usize) -> Result<Self> {
        let threads = resolve_worker_count(worker_count);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("near-duper-worker-{}", i))
            .build()?;
        debug!("Worker pool started with {} thread(s)", threads);
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool; rayon parallel iterators used by `op`
    /// are scheduled on this pool's threads.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

/// Leaves one core to the indexer when sizing automatically.
pub fn resolve_worker_count(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    let cores = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cores.saturating_sub(1).max(1)
}
