//! Work distribution across walk workers.
//!
//! Repositories are pulled, not partitioned: every worker repeatedly claims
//! the next unclaimed index from a shared [`WorkCursor`] until it runs dry,
//! so workers that draw small repositories simply claim more of them.

use crate::error::Result;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Repositories each worker should have before another worker is worth it
pub const MIN_PER_WORKER: usize = 16;

/// Shared claim counter over `[0, len)`
#[derive(Debug)]
pub struct WorkCursor {
    next: AtomicUsize,
    len: usize,
}

impl WorkCursor {
    pub fn new(len: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len,
        }
    }

    /// Claim the next index, or `None` once every index has been handed out.
    ///
    /// Each index in range is returned exactly once across all callers.
    #[inline]
    pub fn claim(&self) -> Option<usize> {
        // The claimed value is only used as an index; nothing is published through it
        let idx = self.next.fetch_add(1, Ordering::Relaxed);
        (idx < self.len).then_some(idx)
    }

    /// Stop handing out work; later `claim` calls return `None`
    pub fn exhaust(&self) {
        self.next.fetch_max(self.len, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// How a walk of `n` repositories is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Everything on the calling thread
    Inline,
    /// A dedicated pool of `workers` threads
    Pool { workers: usize },
}

impl Schedule {
    /// Pick a schedule for `num_repos` repositories on `available` cores.
    ///
    /// Below `2 * MIN_PER_WORKER` repositories the spawn cost outweighs the
    /// parallelism and the walk stays inline.
    pub fn for_workload(num_repos: usize, available: usize) -> Self {
        if num_repos < 2 * MIN_PER_WORKER {
            return Schedule::Inline;
        }
        Schedule::Pool {
            workers: worker_count(num_repos, available),
        }
    }
}

/// `min(available, ceil(num_repos / MIN_PER_WORKER))`, at least 1
pub fn worker_count(num_repos: usize, available: usize) -> usize {
    let max_workers = num_repos.div_ceil(MIN_PER_WORKER);
    available.min(max_workers).max(1)
}

/// Hardware parallelism, or 2 when it cannot be determined
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}

/// Run `worker` according to `schedule` and wait for every worker to finish.
///
/// With a pool, `worker` runs exactly once on each pool thread; all of them
/// share `cursor`. The first error (in worker order) is returned after all
/// workers have returned.
pub fn run_workers<F>(schedule: Schedule, cursor: &WorkCursor, worker: F) -> Result<()>
where
    F: Fn(&WorkCursor) -> Result<()> + Sync,
{
    match schedule {
        Schedule::Inline => worker(cursor),
        Schedule::Pool { workers } => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("gitidx-walk-{}", i))
                .build()?;

            // broadcast returns only once every pool thread has run the closure
            let results = pool.broadcast(|_| worker(cursor));
            results.into_iter().collect()
        }
    }
}
