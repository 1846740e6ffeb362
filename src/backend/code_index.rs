use super::{IndexBackend, TreeId};
use crate::config::Metadata;
use crate::utils::is_binary;
use ahash::{AHashMap, RandomState};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Identifier of a stored (deduplicated) content blob
pub type ContentId = u32;

/// Configuration for the bundled backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Target bytes per content chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Files larger than this are not indexed
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_skip_binary")]
    pub skip_binary: bool,
}

fn default_chunk_size() -> usize {
    32 * 1024 * 1024
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_skip_binary() -> bool {
    true
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_file_size: default_max_file_size(),
            skip_binary: default_skip_binary(),
        }
    }
}

/// A (repository, revision) pair registered with the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTree {
    pub id: TreeId,
    pub name: String,
    pub version: String,
    pub metadata: Metadata,
}

/// A file as recorded by the index, in insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    pub tree: TreeId,
    pub path: String,
    pub content: ContentId,
}

/// Location of a content blob inside its chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRef {
    pub chunk: u32,
    pub offset: usize,
    pub len: usize,
}

/// Contiguous run of content, filled in insertion order
#[derive(Debug, Default)]
pub struct Chunk {
    pub data: Vec<u8>,
    pub contents: Vec<ContentId>,
}

/// Counters kept while files stream in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub files_indexed: u64,
    pub files_deduplicated: u64,
    pub files_skipped_binary: u64,
    pub files_skipped_large: u64,
    pub bytes_seen: u64,
    pub bytes_stored: u64,
}

/// In-memory code index.
///
/// Identical contents are stored once; every stored blob is appended to the
/// current chunk, so chunk layout follows the order files are handed in.
#[derive(Debug)]
pub struct CodeIndex {
    config: BackendConfig,
    trees: Mutex<Vec<IndexedTree>>,
    files: Vec<IndexedFile>,
    contents: Vec<ContentRef>,
    chunks: Vec<Chunk>,
    dedup: AHashMap<u64, Vec<ContentId>>,
    hasher: RandomState,
    stats: IndexStats,
}

impl CodeIndex {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            trees: Mutex::new(Vec::new()),
            files: Vec::new(),
            contents: Vec::new(),
            chunks: Vec::new(),
            dedup: AHashMap::new(),
            hasher: RandomState::new(),
            stats: IndexStats::default(),
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Snapshot of the registered trees, in registration order
    pub fn trees(&self) -> Vec<IndexedTree> {
        self.trees
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn files(&self) -> &[IndexedFile] {
        &self.files
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn content_ref(&self, id: ContentId) -> Option<ContentRef> {
        self.contents.get(id as usize).copied()
    }

    pub fn content_count(&self) -> usize {
        self.contents.len()
    }

    /// Bytes of a stored content blob
    pub fn content(&self, id: ContentId) -> Option<&[u8]> {
        let loc = self.content_ref(id)?;
        let chunk = self.chunks.get(loc.chunk as usize)?;
        chunk.data.get(loc.offset..loc.offset + loc.len)
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    fn find_duplicate(&self, hash: u64, content: &[u8]) -> Option<ContentId> {
        self.dedup
            .get(&hash)?
            .iter()
            .copied()
            .find(|&id| self.content(id) == Some(content))
    }

    fn store_content(&mut self, hash: u64, content: &[u8]) -> ContentId {
        let needs_new_chunk = match self.chunks.last() {
            None => true,
            Some(chunk) => {
                !chunk.data.is_empty() && chunk.data.len() + content.len() > self.config.chunk_size
            }
        };
        if needs_new_chunk {
            self.chunks.push(Chunk::default());
        }

        let id = self.contents.len() as ContentId;
        let chunk_idx = self.chunks.len() - 1;
        let chunk = &mut self.chunks[chunk_idx];
        let offset = chunk.data.len();
        chunk.data.extend_from_slice(content);
        chunk.contents.push(id);

        self.contents.push(ContentRef {
            chunk: chunk_idx as u32,
            offset,
            len: content.len(),
        });
        self.dedup.entry(hash).or_default().push(id);
        self.stats.bytes_stored += content.len() as u64;
        id
    }
}

impl Default for CodeIndex {
    fn default() -> Self {
        Self::new(BackendConfig::default())
    }
}

impl IndexBackend for CodeIndex {
    fn open_tree(&self, name: &str, metadata: &Metadata, version: &str) -> TreeId {
        let mut trees = self.trees.lock().unwrap_or_else(PoisonError::into_inner);
        let id = TreeId(trees.len() as u32);
        trees.push(IndexedTree {
            id,
            name: name.to_string(),
            version: version.to_string(),
            metadata: metadata.clone(),
        });
        id
    }

    fn index_file(&mut self, tree: TreeId, path: &str, content: &[u8]) {
        self.stats.bytes_seen += content.len() as u64;

        if content.len() as u64 > self.config.max_file_size {
            self.stats.files_skipped_large += 1;
            return;
        }
        if self.config.skip_binary && is_binary(content) {
            self.stats.files_skipped_binary += 1;
            return;
        }

        let hash = self.hasher.hash_one(content);
        let content_id = match self.find_duplicate(hash, content) {
            Some(id) => {
                self.stats.files_deduplicated += 1;
                id
            }
            None => self.store_content(hash, content),
        };

        self.files.push(IndexedFile {
            tree,
            path: path.to_string(),
            content: content_id,
        });
        self.stats.files_indexed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_chunks(chunk_size: usize) -> CodeIndex {
        CodeIndex::new(BackendConfig {
            chunk_size,
            ..BackendConfig::default()
        })
    }

    #[test]
    fn test_open_tree_assigns_sequential_ids() {
        let index = CodeIndex::default();
        let meta = Metadata::new().with("github", "org/repo");
        let a = index.open_tree("org/repo", &meta, "main");
        let b = index.open_tree("org/repo", &meta, "v1");

        assert_eq!(a, TreeId(0));
        assert_eq!(b, TreeId(1));
        let trees = index.trees();
        assert_eq!(trees[1].version, "v1");
        assert_eq!(trees[0].metadata.get("github"), Some("org/repo"));
    }

    #[test]
    fn test_identical_content_is_stored_once() {
        let mut index = CodeIndex::default();
        let tree = index.open_tree("r", &Metadata::new(), "HEAD");
        index.index_file(tree, "a/LICENSE", b"MIT License\n");
        index.index_file(tree, "b/LICENSE", b"MIT License\n");
        index.index_file(tree, "main.c", b"int main() {}\n");

        assert_eq!(index.files().len(), 3);
        assert_eq!(index.content_count(), 2);
        assert_eq!(index.files()[0].content, index.files()[1].content);
        let stats = index.stats();
        assert_eq!(stats.files_deduplicated, 1);
        assert_eq!(stats.files_indexed, 3);
    }

    #[test]
    fn test_binary_and_large_files_are_skipped() {
        let mut index = CodeIndex::new(BackendConfig {
            max_file_size: 8,
            ..BackendConfig::default()
        });
        let tree = index.open_tree("r", &Metadata::new(), "HEAD");
        index.index_file(tree, "blob.bin", &[0u8; 8]);
        index.index_file(tree, "big.txt", b"0123456789");
        index.index_file(tree, "ok.txt", b"hello\n");

        let stats = index.stats();
        assert_eq!(stats.files_skipped_binary, 1);
        assert_eq!(stats.files_skipped_large, 1);
        assert_eq!(index.files().len(), 1);
        assert_eq!(index.files()[0].path, "ok.txt");
    }

    #[test]
    fn test_chunks_follow_insertion_order() {
        let mut index = small_chunks(10);
        let tree = index.open_tree("r", &Metadata::new(), "HEAD");
        index.index_file(tree, "first", b"aaaaaa");
        index.index_file(tree, "second", b"bbbbbb");
        index.index_file(tree, "third", b"cc");

        assert_eq!(index.chunks().len(), 2);
        assert_eq!(index.chunks()[0].data, b"aaaaaa");
        assert_eq!(index.chunks()[1].data, b"bbbbbbcc");
        assert_eq!(index.content(2), Some(&b"cc"[..]));
    }

    #[test]
    fn test_oversized_file_gets_its_own_chunk() {
        let mut index = small_chunks(4);
        let tree = index.open_tree("r", &Metadata::new(), "HEAD");
        index.index_file(tree, "big", b"0123456789");

        assert_eq!(index.chunks().len(), 1);
        assert_eq!(index.content(0), Some(&b"0123456789"[..]));
    }
}
