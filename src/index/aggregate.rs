use crate::index::types::WalkBatch;
use std::sync::{Mutex, PoisonError};

/// Global result of a walk, filled by workers once each as they finish.
///
/// Workers accumulate into a private [`WalkBatch`] and merge it here in one
/// locked append, so contention is one lock per worker, not per file.
#[derive(Debug)]
pub struct Aggregator<R> {
    global: Mutex<WalkBatch<R>>,
}

impl<R> Default for Aggregator<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Aggregator<R> {
    pub fn new() -> Self {
        Self {
            global: Mutex::new(WalkBatch::new()),
        }
    }

    /// Append a worker's batch, handles and records together
    pub fn merge(&self, local: WalkBatch<R>) {
        if local.is_empty() {
            return;
        }
        let mut global = self.global.lock().unwrap_or_else(PoisonError::into_inner);
        global.append(local);
    }

    pub fn into_inner(self) -> WalkBatch<R> {
        self.global.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TreeId;
    use crate::index::types::FileRecord;
    use crate::store::ObjectId;
    use std::path::Path;
    use std::sync::Arc;

    #[test]
    fn test_concurrent_merges_keep_handles_paired() {
        let aggregator: Aggregator<String> = Aggregator::new();

        std::thread::scope(|s| {
            for worker in 0..4 {
                let aggregator = &aggregator;
                s.spawn(move || {
                    let mut local = WalkBatch::new();
                    for n in 0..10 {
                        let name = format!("w{}-r{}", worker, n);
                        let repo = local.add_repo(name.clone());
                        local.push(FileRecord {
                            tree: TreeId(0),
                            repo_path: Arc::from(Path::new(&name)),
                            path: name,
                            score: 0,
                            repo,
                            blob: ObjectId::default(),
                        });
                    }
                    aggregator.merge(local);
                });
            }
        });

        let batch = aggregator.into_inner();
        assert_eq!(batch.repo_count(), 40);
        assert_eq!(batch.file_count(), 40);
        for file in batch.files() {
            assert_eq!(batch.repo(file.repo), &file.path);
        }
    }
}
