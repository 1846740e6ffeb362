//! # gitidx - offline git repository indexer
//!
//! gitidx walks the trees of many git repositories (and, optionally, their
//! submodules), scores every file by its path, and hands file contents to an
//! index backend in a single, deliberate order: highest score first, with
//! files of equal score kept in tree order so related files end up next to
//! each other in the index.
//!
//! ## Architecture
//!
//! - [`store`] - object store access ([`store::GitStore`], [`store::MemoryStore`])
//! - [`index`] - the pipeline: parallel walk, locality sort, sequential handoff
//! - [`backend`] - the [`backend::IndexBackend`] seam and the bundled code index
//! - [`score`] - path scoring
//! - [`config`] - repository specs and walk options
//! - [`metrics`] - named counters and their text dump
//! - [`utils`] - trigram, varint, progress and app-data helpers
//!
//! ## Quick Start
//!
//! ```ignore
//! use gitidx::backend::CodeIndex;
//! use gitidx::config::RepoSpec;
//! use gitidx::index::GitIndexer;
//! use gitidx::metrics::Metrics;
//! use gitidx::score::PathScorer;
//! use gitidx::store::GitStore;
//!
//! let repos = vec![RepoSpec::new("/srv/git/linux.git", "linux").revisions(["master"])];
//! let store = GitStore::new();
//! let scorer = PathScorer::default();
//! let metrics = Metrics::new();
//!
//! let mut index = CodeIndex::default();
//! let summary = GitIndexer::new(&store, &scorer, &metrics).index(&repos, &mut index)?;
//! println!("{} files from {} repos", summary.files, summary.repos);
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod index;
pub mod metrics;
pub mod score;
pub mod store;
pub mod utils;

pub use error::{IndexError, Result};
