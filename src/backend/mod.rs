//! Index backends: where the walked files end up.
//!
//! The pipeline only needs [`IndexBackend`]. [`CodeIndex`] is the bundled
//! implementation; it keeps content in insertion-ordered chunks and can be
//! written to disk with [`writer::write_index`].

pub mod code_index;
pub mod writer;

use crate::config::Metadata;
use serde::{Deserialize, Serialize};

pub use code_index::{BackendConfig, CodeIndex, IndexedFile, IndexedTree, IndexStats};
pub use writer::{IndexMeta, write_index};

/// Handle to one (repository, revision) pair inside a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeId(pub u32);

/// Consumer of the ordered file stream.
///
/// `open_tree` is called from walk workers concurrently; `index_file` is only
/// ever called from the single-threaded handoff, in the final file order.
pub trait IndexBackend: Sync {
    fn open_tree(&self, name: &str, metadata: &Metadata, version: &str) -> TreeId;

    fn index_file(&mut self, tree: TreeId, path: &str, content: &[u8]);
}
