//! Index configuration: which repositories to walk and how.

use crate::backend::BackendConfig;
use crate::score::ScoringRules;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default bound on nested submodule recursion
pub const DEFAULT_MAX_SUBMODULE_DEPTH: usize = 8;

/// Opaque per-repository metadata, handed to the backend untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub BTreeMap<String, String>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One repository to index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSpec {
    /// On-disk path of the (bare) repository
    pub path: PathBuf,
    /// Display name
    pub name: String,
    /// Revisions to index, in order
    #[serde(default = "default_revisions")]
    pub revisions: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub walk_submodules: bool,
    /// Space-separated top-level directories to visit first.
    /// Falls back to [`WalkOptions::order_root`] when absent.
    #[serde(default)]
    pub order_root: Option<String>,
}

fn default_revisions() -> Vec<String> {
    vec!["HEAD".to_string()]
}

impl RepoSpec {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            revisions: default_revisions(),
            metadata: Metadata::default(),
            walk_submodules: false,
            order_root: None,
        }
    }

    pub fn revisions<I, S>(mut self, revisions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.revisions = revisions.into_iter().map(Into::into).collect();
        self
    }

    pub fn walk_submodules(mut self, enabled: bool) -> Self {
        self.walk_submodules = enabled;
        self
    }

    pub fn order_root(mut self, order: impl Into<String>) -> Self {
        self.order_root = Some(order.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Knobs the walk consumes from the surrounding CLI/config layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkOptions {
    /// Default root-level ordering hint
    #[serde(default)]
    pub order_root: String,
    /// Report resolved commit ids as versions instead of the revision as given
    #[serde(default)]
    pub revparse: bool,
    #[serde(default = "default_max_submodule_depth")]
    pub max_submodule_depth: usize,
}

fn default_max_submodule_depth() -> usize {
    DEFAULT_MAX_SUBMODULE_DEPTH
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            order_root: String::new(),
            revparse: false,
            max_submodule_depth: DEFAULT_MAX_SUBMODULE_DEPTH,
        }
    }
}

/// Top-level index configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Name of the index being built
    pub name: String,
    pub repositories: Vec<RepoSpec>,
    #[serde(default)]
    pub scoring: ScoringRules,
    #[serde(default)]
    pub backend: BackendConfig,
}

impl IndexSpec {
    /// Load an index configuration from a JSON file.
    ///
    /// Relative repository paths are resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut spec: IndexSpec = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        if let Some(base) = path.parent() {
            for repo in &mut spec.repositories {
                if repo.path.is_relative() {
                    repo.path = base.join(&repo.path);
                }
            }
        }

        Ok(spec)
    }
}
