//! Repository, revision and tree walking.
//!
//! A [`Walker`] is shared by every walk worker. It turns one [`RepoSpec`]
//! into backend trees and [`FileRecord`]s appended to the worker's private
//! [`WalkBatch`], recursing into submodules as it finds them.

use crate::backend::{IndexBackend, TreeId};
use crate::config::{Metadata, RepoSpec, WalkOptions};
use crate::error::{IndexError, Result};
use crate::index::types::{FileRecord, RepoId, WalkBatch};
use crate::metrics::{Counter, Metrics};
use crate::score::Scorer;
use crate::store::{EntryKind, ObjectId, ObjectStore, TreeEntry};
use crate::utils::Progress;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reorder `entries` so that names listed in `hint` (whitespace separated) come
/// first, in hint order. Everything else keeps its relative store order.
///
/// Hint names missing from `entries` are ignored.
pub fn order_entries(mut entries: Vec<TreeEntry>, hint: &str) -> Vec<TreeEntry> {
    if hint.is_empty() {
        return entries;
    }

    let mut ordered = Vec::with_capacity(entries.len());
    for name in hint.split_whitespace() {
        if let Some(pos) = entries.iter().position(|e| e.name == name) {
            ordered.push(entries.remove(pos));
        }
    }
    ordered.append(&mut entries);
    ordered
}

/// One revision of one repository to walk
#[derive(Debug, Clone)]
pub struct Revision<'a> {
    pub repo: RepoId,
    pub repo_path: Arc<Path>,
    pub name: &'a str,
    pub metadata: &'a Metadata,
    pub rev: &'a str,
    pub walk_submodules: bool,
    /// Ordering hint for the revision's root tree
    pub order_root: &'a str,
    /// Path of the enclosing submodule relative to the top-level repository,
    /// with a trailing `/`; empty at top level
    pub submodule_prefix: &'a str,
    /// Submodule nesting level; 0 at top level
    pub depth: usize,
}

/// A revision after it has been opened in the backend
struct OpenTree<'r, 'a> {
    id: TreeId,
    rev: &'r Revision<'a>,
}

struct WalkCounters {
    repos: Counter,
    revisions: Counter,
    revisions_skipped: Counter,
    submodules: Counter,
    submodules_skipped: Counter,
    files: Counter,
}

impl WalkCounters {
    fn register(metrics: &Metrics) -> Self {
        Self {
            repos: metrics.counter("walk.repos"),
            revisions: metrics.counter("walk.revisions"),
            revisions_skipped: metrics.counter("walk.revisions_skipped"),
            submodules: metrics.counter("walk.submodules"),
            submodules_skipped: metrics.counter("walk.submodules_skipped"),
            files: metrics.counter("walk.files"),
        }
    }
}

/// Shared walk state; one per pipeline run
pub struct Walker<'a, S, B, C> {
    store: &'a S,
    backend: &'a B,
    scorer: &'a C,
    options: &'a WalkOptions,
    progress: &'a Progress,
    counters: WalkCounters,
}

impl<'a, S, B, C> Walker<'a, S, B, C>
where
    S: ObjectStore,
    B: IndexBackend,
    C: Scorer,
{
    pub fn new(
        store: &'a S,
        backend: &'a B,
        scorer: &'a C,
        options: &'a WalkOptions,
        metrics: &Metrics,
        progress: &'a Progress,
    ) -> Self {
        Self {
            store,
            backend,
            scorer,
            options,
            progress,
            counters: WalkCounters::register(metrics),
        }
    }

    /// Open `spec`'s repository and walk each of its revisions in order.
    ///
    /// The opened handle moves into `batch` before any revision is walked.
    /// Failing to open the repository is fatal; a revision that does not
    /// resolve is logged and skipped.
    pub fn process_repo(&self, spec: &RepoSpec, batch: &mut WalkBatch<S::Repo>) -> Result<()> {
        let handle = self
            .store
            .open(&spec.path)
            .map_err(|source| IndexError::OpenRepository {
                path: spec.path.clone(),
                source,
            })?;
        let repo = batch.add_repo(handle);
        self.counters.repos.inc();

        let repo_path: Arc<Path> = Arc::from(spec.path.as_path());
        let order_root = spec
            .order_root
            .as_deref()
            .unwrap_or(self.options.order_root.as_str());

        for rev in &spec.revisions {
            let revision = Revision {
                repo,
                repo_path: repo_path.clone(),
                name: &spec.name,
                metadata: &spec.metadata,
                rev,
                walk_submodules: spec.walk_submodules,
                order_root,
                submodule_prefix: "",
                depth: 0,
            };
            self.walk_revision(&revision, batch)?;
            self.progress.tick();
        }

        Ok(())
    }

    /// Resolve one revision, open a backend tree for it and walk its root
    pub fn walk_revision(&self, rev: &Revision<'_>, batch: &mut WalkBatch<S::Repo>) -> Result<()> {
        let resolved = match self.store.resolve(batch.repo(rev.repo), rev.rev) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(
                    repo = rev.name,
                    rev = rev.rev,
                    "ref not found, skipping (empty repo?): {}",
                    err
                );
                self.counters.revisions_skipped.inc();
                return Ok(());
            }
        };

        let version = if self.options.revparse {
            resolved.commit.to_string()
        } else {
            rev.rev.to_string()
        };

        let id = self.backend.open_tree(rev.name, rev.metadata, &version);
        self.counters.revisions.inc();
        debug!(
            repo = rev.name,
            rev = rev.rev,
            commit = %resolved.commit,
            prefix = rev.submodule_prefix,
            "walking revision"
        );

        let tree = OpenTree { id, rev };
        self.walk_tree(&tree, resolved.tree, "", rev.order_root, batch)
    }

    fn walk_tree(
        &self,
        tree: &OpenTree<'_, '_>,
        oid: ObjectId,
        prefix: &str,
        order: &str,
        batch: &mut WalkBatch<S::Repo>,
    ) -> Result<()> {
        let rev = tree.rev;
        let entries = self
            .store
            .tree_entries(batch.repo(rev.repo), oid)
            .map_err(|source| IndexError::ReadTree {
                repo: rev.repo_path.to_path_buf(),
                tree: oid,
                source,
            })?;

        for entry in order_entries(entries, order) {
            let path = format!("{}{}", prefix, entry.name);
            match entry.kind {
                EntryKind::Tree => {
                    let sub_prefix = format!("{}/", path);
                    self.walk_tree(tree, entry.id, &sub_prefix, "", batch)?;
                }
                EntryKind::Blob => {
                    let full_path = format!("{}{}", rev.submodule_prefix, path);
                    let score = self.scorer.score(&full_path);
                    batch.push(FileRecord {
                        tree: tree.id,
                        repo_path: rev.repo_path.clone(),
                        path,
                        score,
                        repo: rev.repo,
                        blob: entry.id,
                    });
                    self.counters.files.inc();
                }
                EntryKind::Commit => {
                    self.walk_submodule(rev, &path, entry.id, batch)?;
                }
            }
        }

        Ok(())
    }

    /// Walk the gitlink at `path`, pinned at `commit`, as its own revision
    fn walk_submodule(
        &self,
        rev: &Revision<'_>,
        path: &str,
        commit: ObjectId,
        batch: &mut WalkBatch<S::Repo>,
    ) -> Result<()> {
        if !rev.walk_submodules {
            return Ok(());
        }

        let name = match self.store.submodule_name(batch.repo(rev.repo), path) {
            Ok(name) => name,
            Err(err) => {
                warn!(
                    repo = rev.name,
                    "Unable to get submodule entry for {}, skipping: {}",
                    path,
                    err
                );
                self.counters.submodules_skipped.inc();
                return Ok(());
            }
        };

        if rev.depth >= self.options.max_submodule_depth {
            warn!(
                repo = rev.name,
                submodule = %name,
                "Submodule {}{} nested deeper than {}, skipping",
                rev.submodule_prefix,
                path,
                self.options.max_submodule_depth
            );
            self.counters.submodules_skipped.inc();
            return Ok(());
        }

        let sub_path = rev.repo_path.join(path);
        let handle = self
            .store
            .open(&sub_path)
            .map_err(|source| IndexError::OpenSubmodule {
                path: sub_path.clone(),
                source,
            })?;
        let sub_repo = batch.add_repo(handle);
        self.counters.submodules.inc();

        let sub_rev = commit.to_string();
        let sub_prefix = format!("{}{}/", rev.submodule_prefix, path);
        let metadata = Metadata::default();

        let revision = Revision {
            repo: sub_repo,
            repo_path: Arc::from(sub_path),
            name: &name,
            metadata: &metadata,
            rev: &sub_rev,
            walk_submodules: true,
            order_root: rev.order_root,
            submodule_prefix: &sub_prefix,
            depth: rev.depth + 1,
        };
        self.walk_revision(&revision, batch)
    }
}
