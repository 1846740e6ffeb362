//! Utility functions shared across the crate.
//!
//! ## Modules
//!
//! - [`app_data`] - Application data directory (default index location)
//! - [`encoding`] - Variable-length integer encoding (varint)
//! - [`progress`] - Thread-safe progress counters/bars
//! - [`trigram`] - 3-byte sequence extraction and binary detection

pub mod app_data;
pub mod encoding;
pub mod progress;
pub mod trigram;

pub use app_data::*;
pub use encoding::*;
pub use progress::Progress;
pub use trigram::*;
