//! Object store access.
//!
//! The pipeline never talks to git directly. It goes through [`ObjectStore`],
//! which exposes the handful of primitives the walk needs:
//!
//! - [`git`] - repositories on disk via libgit2
//! - [`memory`] - deterministic in-memory repositories for tests and benches
//!
//! Repository handles are owned by the caller (`Self::Repo`); every other
//! operation borrows one.

pub mod git;
pub mod memory;

use std::fmt;
use std::path::Path;

pub use git::GitStore;
pub use memory::{MemoryRepo, MemoryStore, TreeSpec};

/// Fixed-size object identifier (SHA-1 sized).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId([u8; ObjectId::LEN]);

impl ObjectId {
    pub const LEN: usize = 20;

    pub const fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Build from a byte slice; `None` unless it is exactly [`Self::LEN`] long
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; Self::LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Parse a full-length lowercase or uppercase hex string
    pub fn from_hex(hex: &str) -> Option<Self> {
        // Oid::from_str also accepts abbreviated ids, which are not object names here
        if hex.len() != Self::LEN * 2 {
            return None;
        }
        let oid = git2::Oid::from_str(hex).ok()?;
        Self::from_bytes(oid.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self)
    }
}

/// Kind of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Tree,
    Blob,
    /// Gitlink: a submodule pinned at a commit of another repository
    Commit,
}

/// One named entry of a tree, in store order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub kind: EntryKind,
    pub id: ObjectId,
}

impl TreeEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind, id: ObjectId) -> Self {
        Self {
            name: name.into(),
            kind,
            id,
        }
    }
}

/// A revision peeled to its commit and root tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRevision {
    pub commit: ObjectId,
    pub tree: ObjectId,
}

/// Error reported by an object store.
///
/// Carries the store's own diagnostic detail (code, class, message) so fatal
/// errors can be printed the way the store describes them.
#[derive(Debug, Clone, thiserror::Error)]
#[error("error {code}/{class}: {message}")]
pub struct StoreError {
    pub code: i32,
    pub class: String,
    pub message: String,
}

impl StoreError {
    pub fn new(code: i32, class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            class: class.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(-3, "NotFound", message)
    }
}

impl From<git2::Error> for StoreError {
    fn from(err: git2::Error) -> Self {
        Self {
            code: err.raw_code(),
            class: format!("{:?}", err.class()),
            message: err.message().to_string(),
        }
    }
}

/// Version-control object store consumed by the walk.
///
/// Implementations must be shareable between workers (`Sync`); the handles
/// they hand out only need to move between threads (`Send`), never be shared.
pub trait ObjectStore: Sync {
    type Repo: Send;

    /// Open the repository at `path`
    fn open(&self, path: &Path) -> Result<Self::Repo, StoreError>;

    /// Resolve `rev` to a commit and its root tree
    fn resolve(&self, repo: &Self::Repo, rev: &str) -> Result<ResolvedRevision, StoreError>;

    /// List the entries of `tree` in natural store order
    fn tree_entries(&self, repo: &Self::Repo, tree: ObjectId)
        -> Result<Vec<TreeEntry>, StoreError>;

    /// Declared name of the submodule mounted at `path`
    fn submodule_name(&self, repo: &Self::Repo, path: &str) -> Result<String, StoreError>;

    /// Borrow the raw content of blob `id` for the duration of `f`.
    ///
    /// The blob is released when `f` returns.
    fn with_blob<T>(
        &self,
        repo: &Self::Repo,
        id: ObjectId,
        f: impl FnOnce(&[u8]) -> T,
    ) -> Result<T, StoreError>;
}
