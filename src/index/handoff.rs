use crate::backend::IndexBackend;
use crate::error::{IndexError, Result};
use crate::index::types::WalkBatch;
use crate::metrics::Metrics;
use crate::store::ObjectStore;
use crate::utils::Progress;
use tracing::info;

/// What the handoff delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandoffStats {
    pub files: usize,
    pub bytes: u64,
}

/// Feed every file of `batch` to `backend`, in batch order, on the calling thread.
///
/// Each blob is borrowed from its own repository handle only for the
/// duration of `index_file`. Any read failure is fatal. The batch, and with
/// it every repository handle, is dropped once all files have been delivered.
pub fn hand_off<S, B>(
    store: &S,
    batch: WalkBatch<S::Repo>,
    backend: &mut B,
    metrics: &Metrics,
    progress: &Progress,
) -> Result<HandoffStats>
where
    S: ObjectStore,
    B: IndexBackend,
{
    let files = metrics.counter("index.files");
    let bytes = metrics.counter("index.bytes");
    let mut stats = HandoffStats::default();

    for record in batch.files() {
        let len = store
            .with_blob(batch.repo(record.repo), record.blob, |content| {
                backend.index_file(record.tree, &record.path, content);
                content.len() as u64
            })
            .map_err(|source| IndexError::ReadBlob {
                repo: record.repo_path.to_path_buf(),
                path: record.path.clone(),
                blob: record.blob,
                source,
            })?;

        stats.files += 1;
        stats.bytes += len;
        files.inc();
        bytes.add(len);
        progress.tick();
    }

    info!(repos = batch.repo_count(), "Closing open git repos");
    drop(batch);

    Ok(stats)
}
