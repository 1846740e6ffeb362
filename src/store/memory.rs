//! In-memory object store.
//!
//! Repositories are assembled with [`TreeSpec`] and registered under a path.
//! Tree entries keep insertion order, which makes the natural store order
//! fully controllable from tests.

use super::{EntryKind, ObjectId, ObjectStore, ResolvedRevision, StoreError, TreeEntry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT: AtomicU64 = AtomicU64::new(1);

/// Allocate an object id that is unique within the process
fn next_id() -> ObjectId {
    let n = NEXT_OBJECT.fetch_add(1, Ordering::Relaxed);
    let mut bytes = [0u8; ObjectId::LEN];
    bytes[..8].copy_from_slice(&n.to_be_bytes());
    bytes[8..16].copy_from_slice(&(!n).to_le_bytes());
    ObjectId::new(bytes)
}

#[derive(Debug, Clone)]
enum Object {
    Tree(Vec<TreeEntry>),
    Blob(Vec<u8>),
    Commit { tree: ObjectId },
}

#[derive(Debug, Clone)]
enum Node {
    Blob(Vec<u8>),
    Tree(TreeSpec),
    Submodule(ObjectId),
}

/// Declarative description of a tree, written with [`MemoryRepo::write_tree`]
#[derive(Debug, Clone, Default)]
pub struct TreeSpec {
    entries: Vec<(String, Node)>,
}

impl TreeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from `(path, content)` pairs, creating directories as needed
    pub fn from_files<P: AsRef<str>, C: AsRef<[u8]>>(files: &[(P, C)]) -> Self {
        files
            .iter()
            .fold(Self::new(), |spec, (path, content)| spec.file(path.as_ref(), content))
    }

    /// Add a file; `/` in `path` creates (or reuses) intermediate directories
    pub fn file(mut self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.insert(path, Node::Blob(content.as_ref().to_vec()));
        self
    }

    /// Add an empty directory
    pub fn dir(mut self, path: &str) -> Self {
        self.insert(path, Node::Tree(TreeSpec::new()));
        self
    }

    /// Add a gitlink pinned at `commit`
    pub fn submodule(mut self, path: &str, commit: ObjectId) -> Self {
        self.insert(path, Node::Submodule(commit));
        self
    }

    fn insert(&mut self, path: &str, node: Node) {
        match path.split_once('/') {
            Some((head, rest)) => {
                let pos = match self.entries.iter().position(|(name, _)| name == head) {
                    Some(pos) => pos,
                    None => {
                        self.entries.push((head.to_string(), Node::Tree(TreeSpec::new())));
                        self.entries.len() - 1
                    }
                };
                if let Node::Tree(sub) = &mut self.entries[pos].1 {
                    sub.insert(rest, node);
                }
            }
            None => match self.entries.iter_mut().find(|(name, _)| name == path) {
                Some(slot) => slot.1 = node,
                None => self.entries.push((path.to_string(), node)),
            },
        }
    }
}

/// A single in-memory repository
#[derive(Debug, Clone, Default)]
pub struct MemoryRepo {
    objects: HashMap<ObjectId, Object>,
    refs: HashMap<String, ObjectId>,
    submodules: HashMap<String, String>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_blob(&mut self, content: impl AsRef<[u8]>) -> ObjectId {
        let id = next_id();
        self.objects.insert(id, Object::Blob(content.as_ref().to_vec()));
        id
    }

    /// Store a tree with exactly these entries, in this order
    pub fn add_tree(&mut self, entries: Vec<TreeEntry>) -> ObjectId {
        let id = next_id();
        self.objects.insert(id, Object::Tree(entries));
        id
    }

    /// Write `spec` recursively and return the root tree id
    pub fn write_tree(&mut self, spec: &TreeSpec) -> ObjectId {
        let entries = spec
            .entries
            .iter()
            .map(|(name, node)| match node {
                Node::Blob(content) => TreeEntry::new(name, EntryKind::Blob, self.add_blob(content)),
                Node::Tree(sub) => TreeEntry::new(name, EntryKind::Tree, self.write_tree(sub)),
                Node::Submodule(commit) => TreeEntry::new(name, EntryKind::Commit, *commit),
            })
            .collect();
        self.add_tree(entries)
    }

    pub fn add_commit(&mut self, tree: ObjectId) -> ObjectId {
        let id = next_id();
        self.objects.insert(id, Object::Commit { tree });
        id
    }

    pub fn set_ref(&mut self, name: impl Into<String>, commit: ObjectId) {
        self.refs.insert(name.into(), commit);
    }

    /// Write `spec`, commit it and point `refname` at the commit
    pub fn commit_tree(&mut self, refname: &str, spec: &TreeSpec) -> ObjectId {
        let tree = self.write_tree(spec);
        let commit = self.add_commit(tree);
        self.set_ref(refname, commit);
        commit
    }

    /// Declare the name of the submodule mounted at `path` (as `.gitmodules` would)
    pub fn declare_submodule(&mut self, path: impl Into<String>, name: impl Into<String>) {
        self.submodules.insert(path.into(), name.into());
    }

    fn lookup_commit(&self, rev: &str) -> Option<ObjectId> {
        let candidates = [
            self.refs.get(rev).copied(),
            self.refs.get(&format!("refs/heads/{}", rev)).copied(),
            ObjectId::from_hex(rev),
        ];
        candidates
            .into_iter()
            .flatten()
            .find(|id| matches!(self.objects.get(id), Some(Object::Commit { .. })))
    }
}

/// Object store holding [`MemoryRepo`]s keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    repos: HashMap<PathBuf, Arc<MemoryRepo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, repo: MemoryRepo) {
        self.repos.insert(path.into(), Arc::new(repo));
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

impl ObjectStore for MemoryStore {
    type Repo = Arc<MemoryRepo>;

    fn open(&self, path: &Path) -> Result<Arc<MemoryRepo>, StoreError> {
        self.repos.get(path).cloned().ok_or_else(|| {
            StoreError::new(
                -3,
                "Repository",
                format!("could not find repository at '{}'", path.display()),
            )
        })
    }

    fn resolve(&self, repo: &Arc<MemoryRepo>, rev: &str) -> Result<ResolvedRevision, StoreError> {
        let commit = repo
            .lookup_commit(rev)
            .ok_or_else(|| StoreError::not_found(format!("revspec '{}' not found", rev)))?;
        match repo.objects.get(&commit) {
            Some(Object::Commit { tree }) => Ok(ResolvedRevision { commit, tree: *tree }),
            _ => Err(StoreError::not_found(format!("revspec '{}' not found", rev))),
        }
    }

    fn tree_entries(&self, repo: &Arc<MemoryRepo>, tree: ObjectId) -> Result<Vec<TreeEntry>, StoreError> {
        match repo.objects.get(&tree) {
            Some(Object::Tree(entries)) => Ok(entries.clone()),
            _ => Err(StoreError::not_found(format!("tree {} not found", tree))),
        }
    }

    fn submodule_name(&self, repo: &Arc<MemoryRepo>, path: &str) -> Result<String, StoreError> {
        repo.submodules.get(path).cloned().ok_or_else(|| {
            StoreError::new(-3, "Submodule", format!("no submodule named '{}'", path))
        })
    }

    fn with_blob<T>(
        &self,
        repo: &Arc<MemoryRepo>,
        id: ObjectId,
        f: impl FnOnce(&[u8]) -> T,
    ) -> Result<T, StoreError> {
        match repo.objects.get(&id) {
            Some(Object::Blob(content)) => Ok(f(content)),
            _ => Err(StoreError::not_found(format!("blob {} not found", id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_spec_nests_paths() {
        let spec = TreeSpec::new()
            .file("src/main.rs", "fn main() {}")
            .file("README.md", "hi")
            .file("src/lib.rs", "");
        let mut repo = MemoryRepo::new();
        repo.commit_tree("HEAD", &spec);

        let mut store = MemoryStore::new();
        store.insert("/repos/a", repo);
        let handle = store.open(Path::new("/repos/a")).unwrap();
        let root = store.resolve(&handle, "HEAD").unwrap().tree;

        let entries = store.tree_entries(&handle, root).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["src", "README.md"]);
        assert_eq!(entries[0].kind, EntryKind::Tree);

        let src = store.tree_entries(&handle, entries[0].id).unwrap();
        let names: Vec<_> = src.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["main.rs", "lib.rs"]);
    }

    #[test]
    fn test_resolve_by_branch_and_hex() {
        let mut repo = MemoryRepo::new();
        let commit = repo.commit_tree("refs/heads/main", &TreeSpec::new().file("a", "1"));
        let mut store = MemoryStore::new();
        store.insert("r", repo);
        let handle = store.open(Path::new("r")).unwrap();

        assert_eq!(store.resolve(&handle, "main").unwrap().commit, commit);
        assert_eq!(store.resolve(&handle, &commit.to_string()).unwrap().commit, commit);
        assert!(store.resolve(&handle, "refs/heads/ghost").is_err());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut repo = MemoryRepo::new();
        let a = repo.add_blob("same");
        let b = repo.add_blob("same");
        assert_ne!(a, b);
    }
}
