use crate::backend::IndexMeta;
use crate::utils::{default_index_dir, read_u32_le, read_u64_le};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Totals read back from the per-chunk trigram dictionaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GramStats {
    /// Dictionary entries summed over chunks
    pub trigrams: u64,
    /// Posting list entries summed over chunks
    pub postings: u64,
}

/// Walk every `chunk_NNNN.grams.dict` of the index
pub fn gram_stats(index_dir: &Path, chunk_count: u32) -> Result<GramStats> {
    let mut stats = GramStats::default();
    for chunk in 0..chunk_count {
        let path = index_dir
            .join("chunks")
            .join(format!("chunk_{:04}.grams.dict", chunk));
        let mut dict = BufReader::new(
            File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?,
        );

        let entries = read_u32_le(&mut dict)?;
        for _ in 0..entries {
            let _trigram = read_u32_le(&mut dict)?;
            let _offset = read_u64_le(&mut dict)?;
            let _len = read_u32_le(&mut dict)?;
            stats.postings += read_u32_le(&mut dict)? as u64;
        }
        stats.trigrams += entries as u64;
    }
    Ok(stats)
}

/// Resolve the index directory for `target`: an existing directory holding
/// `meta.json` is used as is, anything else is taken as an index name.
pub fn resolve_index_dir(target: &str) -> Result<PathBuf> {
    let path = Path::new(target);
    if path.join("meta.json").is_file() {
        return Ok(path.to_path_buf());
    }
    default_index_dir(target)
}

/// Display statistics for a written index
pub fn show_stats(index_dir: &Path) -> Result<()> {
    let meta = IndexMeta::load(index_dir)?;

    println!("Index Statistics");
    println!("================");
    println!();
    println!("Name:             {}", meta.name);
    println!("Index location:   {}", index_dir.display());
    println!("Index version:    {}", meta.version);
    println!("Trees:            {}", meta.tree_count);
    println!("Files:            {}", meta.file_count);
    println!("Unique contents:  {}", meta.content_count);
    println!("Chunks:           {}", meta.chunk_count);
    println!("Content bytes:    {}", format_size(meta.content_bytes));

    if meta.file_count > 0 {
        let dedup = meta.file_count.saturating_sub(meta.content_count);
        println!(
            "Deduplicated:     {} ({:.1}%)",
            dedup,
            dedup as f64 * 100.0 / meta.file_count as f64
        );
    }

    let grams = gram_stats(index_dir, meta.chunk_count)?;
    println!("Trigrams:         {}", grams.trigrams);
    println!("Postings:         {}", grams.postings);

    if let Ok(size) = dir_size(index_dir) {
        println!();
        println!("Index size:       {}", format_size(size));
    }

    println!();
    println!("Created:          {}", format_timestamp(meta.created_at));

    Ok(())
}

/// Calculate directory size recursively
fn dir_size(path: &Path) -> std::io::Result<u64> {
    let mut size = 0;
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                size += entry.metadata()?.len();
            } else if path.is_dir() {
                size += dir_size(&path)?;
            }
        }
    }
    Ok(size)
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

fn format_timestamp(ts: u64) -> String {
    use std::time::{Duration, UNIX_EPOCH};
    let datetime = UNIX_EPOCH + Duration::from_secs(ts);
    format!("{:?}", datetime)
}
