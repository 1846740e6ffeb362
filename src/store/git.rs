//! libgit2-backed object store for repositories on disk.

use super::{EntryKind, ObjectId, ObjectStore, ResolvedRevision, StoreError, TreeEntry};
use git2::{ObjectType, Oid, Repository};
use std::path::Path;

/// Object store over bare or working-tree repositories on disk
#[derive(Debug, Default, Clone, Copy)]
pub struct GitStore;

impl GitStore {
    pub fn new() -> Self {
        Self
    }
}

fn to_oid(id: ObjectId) -> Result<Oid, StoreError> {
    Ok(Oid::from_bytes(id.as_bytes())?)
}

fn from_oid(oid: Oid) -> ObjectId {
    // libgit2 is built for SHA-1 here, so every oid is 20 bytes
    ObjectId::from_bytes(oid.as_bytes()).unwrap_or_default()
}

impl ObjectStore for GitStore {
    type Repo = Repository;

    fn open(&self, path: &Path) -> Result<Repository, StoreError> {
        // Mirrors are usually bare; submodule names can only be looked up
        // through a working tree, so both layouts are accepted
        Ok(Repository::open(path)?)
    }

    fn resolve(&self, repo: &Repository, rev: &str) -> Result<ResolvedRevision, StoreError> {
        let object = repo.revparse_single(&format!("{}^0", rev))?;
        let commit = object.peel_to_commit()?;
        Ok(ResolvedRevision {
            commit: from_oid(commit.id()),
            tree: from_oid(commit.tree_id()),
        })
    }

    fn tree_entries(&self, repo: &Repository, tree: ObjectId) -> Result<Vec<TreeEntry>, StoreError> {
        let tree = repo.find_tree(to_oid(tree)?)?;
        let mut entries = Vec::with_capacity(tree.len());

        for entry in tree.iter() {
            let kind = match entry.kind() {
                Some(ObjectType::Tree) => EntryKind::Tree,
                Some(ObjectType::Blob) => EntryKind::Blob,
                Some(ObjectType::Commit) => EntryKind::Commit,
                _ => continue,
            };
            let name = match entry.name() {
                Some(name) => name.to_string(),
                None => String::from_utf8_lossy(entry.name_bytes()).into_owned(),
            };
            entries.push(TreeEntry::new(name, kind, from_oid(entry.id())));
        }

        Ok(entries)
    }

    fn submodule_name(&self, repo: &Repository, path: &str) -> Result<String, StoreError> {
        if repo.is_bare() {
            return Err(StoreError::new(
                -8,
                "Submodule",
                "submodules cannot be looked up in a bare repository",
            ));
        }

        // Lookup by path; find_submodule only maps path to name for
        // submodules missing from HEAD and the index
        repo.submodules()?
            .iter()
            .find(|s| s.path() == Path::new(path))
            .map(|s| s.name().unwrap_or(path).to_string())
            .ok_or_else(|| StoreError::not_found(format!("no submodule at path '{}'", path)))
    }

    fn with_blob<T>(
        &self,
        repo: &Repository,
        id: ObjectId,
        f: impl FnOnce(&[u8]) -> T,
    ) -> Result<T, StoreError> {
        let blob = repo.find_blob(to_oid(id)?)?;
        Ok(f(blob.content()))
    }
}
