//! The walk-sort-handoff pipeline.
//!
//! - [`walker`] - repository, revision and tree traversal
//! - [`scheduler`] - pull-based distribution of repositories over workers
//! - [`aggregate`] - merging per-worker results into one batch
//! - [`sort`] - stable ordering by descending score
//! - [`handoff`] - sequential delivery of file contents to the backend
//! - [`build`] - [`GitIndexer`], which runs the phases in order

pub mod aggregate;
pub mod build;
pub mod handoff;
pub mod scheduler;
pub mod sort;
pub mod stats;
pub mod types;
pub mod walker;

pub use build::{GitIndexer, IndexSummary};
pub use handoff::HandoffStats;
pub use types::{FileRecord, RepoId, WalkBatch};
pub use walker::order_entries;
