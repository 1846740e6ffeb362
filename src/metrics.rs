//! Named counters for a single indexing run.
//!
//! A [`Metrics`] registry is created by whoever drives the run and passed by
//! reference to the pipeline; there is no process-wide registry. Counters are
//! cheap handles (`Arc<AtomicU64>`) and can be bumped from any thread.
//!
//! The dump format is line oriented so external exporters can scrape it:
//!
//! ```text
//! repository indexed in 12.000345s
//! == begin metrics ==
//! index.files 1024
//! == end metrics ==
//! ```

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Handle to one registered counter
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicU64>);

impl Counter {
    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, delta: u64) {
        self.0.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Registry of named counters
#[derive(Debug, Default)]
pub struct Metrics {
    counters: Mutex<BTreeMap<String, Counter>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the counter called `name`, registering it on first use
    pub fn counter(&self, name: &str) -> Counter {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.entry(name.to_string()).or_default().clone()
    }

    /// Current value of `name`, if registered
    pub fn get(&self, name: &str) -> Option<u64> {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.get(name).map(Counter::get)
    }

    /// Name/value pairs in name order
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.iter().map(|(name, c)| (name.clone(), c.get())).collect()
    }

    /// Write the `== begin metrics ==` block
    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "== begin metrics ==")?;
        for (name, value) in self.snapshot() {
            writeln!(out, "{} {}", name, value)?;
        }
        writeln!(out, "== end metrics ==")
    }

    /// Elapsed-time header followed by the metrics block
    pub fn report<W: Write>(&self, out: &mut W, elapsed: Duration) -> io::Result<()> {
        writeln!(
            out,
            "repository indexed in {}.{:06}s",
            elapsed.as_secs(),
            elapsed.subsec_micros()
        )?;
        self.dump(out)
    }

    /// Write [`report`](Self::report) to `path`
    pub fn dump_to_file(&self, path: &Path, elapsed: Duration) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Cannot open {}", path.display()))?;
        let mut out = BufWriter::new(file);
        self.report(&mut out, elapsed)?;
        out.flush()?;
        Ok(())
    }
}
