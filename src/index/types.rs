use crate::backend::TreeId;
use crate::store::ObjectId;
use std::path::Path;
use std::sync::Arc;

/// Index of an open repository handle within a [`WalkBatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RepoId(u32);

impl RepoId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One file waiting to be handed to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Backend tree (repository + revision) the file belongs to
    pub tree: TreeId,
    /// On-disk path of the repository the blob lives in
    pub repo_path: Arc<Path>,
    /// Path relative to the revision root it was found under
    pub path: String,
    pub score: i32,
    /// Handle the blob must be read through
    pub repo: RepoId,
    pub blob: ObjectId,
}

/// Open repository handles together with the file records that read from them.
///
/// Records only ever name handles of the batch that holds them, so dropping
/// the batch is the one place handles are closed, and it cannot happen while
/// a record still needs its handle.
#[derive(Debug)]
pub struct WalkBatch<R> {
    repos: Vec<R>,
    files: Vec<FileRecord>,
}

impl<R> Default for WalkBatch<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> WalkBatch<R> {
    pub fn new() -> Self {
        Self {
            repos: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Take ownership of an open handle and return its id
    pub fn add_repo(&mut self, repo: R) -> RepoId {
        let id = RepoId(self.repos.len() as u32);
        self.repos.push(repo);
        id
    }

    /// Handle behind `id`.
    ///
    /// Ids are only minted by [`add_repo`](Self::add_repo) and rebased by
    /// [`append`](Self::append), so an id taken from this batch is always valid.
    pub fn repo(&self, id: RepoId) -> &R {
        &self.repos[id.index()]
    }

    pub fn push(&mut self, record: FileRecord) {
        debug_assert!(record.repo.index() < self.repos.len());
        self.files.push(record);
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub(crate) fn files_mut(&mut self) -> &mut [FileRecord] {
        &mut self.files
    }

    pub fn repo_count(&self) -> usize {
        self.repos.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty() && self.files.is_empty()
    }

    /// Move every handle and record of `other` to the end of this batch,
    /// rebasing `other`'s repository ids onto this batch.
    pub fn append(&mut self, mut other: WalkBatch<R>) {
        let base = self.repos.len() as u32;
        if base > 0 {
            for record in &mut other.files {
                record.repo = RepoId(record.repo.0 + base);
            }
        }
        self.repos.append(&mut other.repos);
        self.files.append(&mut other.files);
    }
}
