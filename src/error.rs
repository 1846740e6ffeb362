use crate::store::{ObjectId, StoreError};
use std::path::PathBuf;

/// Fatal pipeline errors.
///
/// Anything that can be skipped (an unresolvable revision, an undeclared
/// submodule) is logged where it happens and never becomes an `IndexError`.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to open repository {path}: {source}")]
    OpenRepository { path: PathBuf, source: StoreError },

    #[error("failed to open submodule repository {path}: {source}")]
    OpenSubmodule { path: PathBuf, source: StoreError },

    #[error("failed to read tree {tree} in {repo}: {source}")]
    ReadTree {
        repo: PathBuf,
        tree: ObjectId,
        source: StoreError,
    },

    #[error("failed to read blob {blob} ({path}) in {repo}: {source}")]
    ReadBlob {
        repo: PathBuf,
        path: String,
        blob: ObjectId,
        source: StoreError,
    },

    #[error("failed to start walk workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl IndexError {
    /// Store diagnostic detail behind this error
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            IndexError::OpenRepository { source, .. }
            | IndexError::OpenSubmodule { source, .. }
            | IndexError::ReadTree { source, .. }
            | IndexError::ReadBlob { source, .. } => Some(source),
            IndexError::ThreadPool(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
