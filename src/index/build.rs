use crate::backend::IndexBackend;
use crate::config::{RepoSpec, WalkOptions};
use crate::error::Result;
use crate::index::aggregate::Aggregator;
use crate::index::handoff::hand_off;
use crate::index::scheduler::{Schedule, WorkCursor, available_parallelism, run_workers};
use crate::index::sort::locality_sort;
use crate::index::types::WalkBatch;
use crate::index::walker::Walker;
use crate::metrics::Metrics;
use crate::score::Scorer;
use crate::store::ObjectStore;
use crate::utils::Progress;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of a complete indexing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// Repository handles opened, submodules included
    pub repos: usize,
    /// Revisions opened as backend trees, submodules included
    pub revisions: u64,
    pub files: usize,
    pub bytes: u64,
    pub walk_elapsed: Duration,
    pub index_elapsed: Duration,
}

/// Drives a run: parallel walk, locality sort, then sequential handoff.
pub struct GitIndexer<'a, S, C> {
    store: &'a S,
    scorer: &'a C,
    metrics: &'a Metrics,
    options: WalkOptions,
    silent: bool,
}

impl<'a, S, C> GitIndexer<'a, S, C>
where
    S: ObjectStore,
    C: Scorer,
{
    pub fn new(store: &'a S, scorer: &'a C, metrics: &'a Metrics) -> Self {
        Self {
            store,
            scorer,
            metrics,
            options: WalkOptions::default(),
            silent: false,
        }
    }

    pub fn options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    /// Hide progress bars
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Walk every repository in `repos` and collect the files they contain,
    /// in walk order.
    ///
    /// On a fatal error, workers stop claiming new repositories, the ones in
    /// flight are allowed to finish, and the first error is returned.
    pub fn walk<B: IndexBackend>(
        &self,
        repos: &[RepoSpec],
        backend: &B,
    ) -> Result<WalkBatch<S::Repo>> {
        let schedule = Schedule::for_workload(repos.len(), available_parallelism());
        info!(repos = repos.len(), ?schedule, "Walking repositories");

        let total_revisions: usize = repos.iter().map(|r| r.revisions.len()).sum();
        let progress = Progress::maybe(
            self.silent,
            total_revisions as u64,
            "Walking repos...",
            "Walk complete",
        );

        let walker = Walker::new(
            self.store,
            backend,
            self.scorer,
            &self.options,
            self.metrics,
            &progress,
        );
        let cursor = WorkCursor::new(repos.len());
        let aggregator = Aggregator::new();

        run_workers(schedule, &cursor, |cursor| {
            let mut local = WalkBatch::new();
            let mut result = Ok(());
            while let Some(idx) = cursor.claim() {
                result = walker.process_repo(&repos[idx], &mut local);
                if result.is_err() {
                    cursor.exhaust();
                    break;
                }
            }
            aggregator.merge(local);
            result
        })?;

        progress.finish();
        Ok(aggregator.into_inner())
    }

    /// Walk and sort: the exact file order a run would hand to the backend
    pub fn plan<B: IndexBackend>(
        &self,
        repos: &[RepoSpec],
        backend: &B,
    ) -> Result<WalkBatch<S::Repo>> {
        let mut batch = self.walk(repos, backend)?;
        info!(files = batch.file_count(), "Sorting files");
        locality_sort(batch.files_mut());
        Ok(batch)
    }

    /// Run the whole pipeline against `backend`
    pub fn index<B: IndexBackend>(
        &self,
        repos: &[RepoSpec],
        backend: &mut B,
    ) -> Result<IndexSummary> {
        let revisions = self.metrics.counter("walk.revisions");
        let revisions_before = revisions.get();

        let walk_start = Instant::now();
        let batch = self.plan(repos, &*backend)?;
        let walk_elapsed = walk_start.elapsed();
        debug!("took {:?} to walk and sort repos", walk_elapsed);

        let repo_count = batch.repo_count();
        let progress = Progress::maybe(
            self.silent,
            batch.file_count() as u64,
            "Indexing files...",
            "Indexing complete",
        );

        let index_start = Instant::now();
        let handoff = hand_off(self.store, batch, backend, self.metrics, &progress)?;
        progress.finish();
        let index_elapsed = index_start.elapsed();
        debug!("took {:?} to index files", index_elapsed);

        Ok(IndexSummary {
            repos: repo_count,
            revisions: revisions.get() - revisions_before,
            files: handoff.files,
            bytes: handoff.bytes,
            walk_elapsed,
            index_elapsed,
        })
    }
}
