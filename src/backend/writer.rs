use super::code_index::{Chunk, CodeIndex};
use crate::utils::{delta_encode, extract_trigrams, write_u16_le, write_u32_le, write_u64_le};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// On-disk format version
pub const INDEX_VERSION: u32 = 1;

/// Index metadata stored in meta.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub name: String,
    pub tree_count: u32,
    pub file_count: u32,
    pub content_count: u32,
    pub chunk_count: u32,
    pub content_bytes: u64,
    pub created_at: u64,
}

impl IndexMeta {
    /// Read meta.json from an index directory
    pub fn load(index_dir: &Path) -> Result<Self> {
        let meta_path = index_dir.join("meta.json");
        let file = File::open(&meta_path)
            .with_context(|| format!("Failed to open {}", meta_path.display()))?;
        let meta = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse {}", meta_path.display()))?;
        Ok(meta)
    }
}

/// Write `index` into `index_dir`, replacing whatever index files were there.
///
/// Layout:
/// - `meta.json`, `trees.json`
/// - `files.bin`: count, then `[tree u32, content u32, path_len u16, path]`
/// - `contents.bin`: count, then `[chunk u32, offset u64, len u64]`
/// - `chunks/chunk_NNNN.{data,grams.dict,grams.postings}`
pub fn write_index(index: &CodeIndex, name: &str, index_dir: &Path) -> Result<IndexMeta> {
    let chunks_dir = index_dir.join("chunks");
    fs::create_dir_all(&chunks_dir)
        .with_context(|| format!("Failed to create {}", chunks_dir.display()))?;

    write_trees(index, index_dir)?;
    write_files(index, index_dir)?;
    write_contents(index, index_dir)?;

    for (chunk_idx, chunk) in index.chunks().iter().enumerate() {
        write_chunk(index, chunk, chunk_idx, &chunks_dir)?;
    }

    let meta = IndexMeta {
        version: INDEX_VERSION,
        name: name.to_string(),
        tree_count: index.trees().len() as u32,
        file_count: index.files().len() as u32,
        content_count: index.content_count() as u32,
        chunk_count: index.chunks().len() as u32,
        content_bytes: index.stats().bytes_stored,
        created_at: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    };

    let meta_path = index_dir.join("meta.json");
    let file = File::create(&meta_path)?;
    serde_json::to_writer_pretty(file, &meta)?;

    Ok(meta)
}

fn write_trees(index: &CodeIndex, index_dir: &Path) -> Result<()> {
    let file = File::create(index_dir.join("trees.json"))?;
    serde_json::to_writer_pretty(file, &index.trees())?;
    Ok(())
}

fn write_files(index: &CodeIndex, index_dir: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(index_dir.join("files.bin"))?);

    write_u32_le(&mut file, index.files().len() as u32)?;
    for entry in index.files() {
        let path = entry.path.as_bytes();
        let len = u16::try_from(path.len())
            .with_context(|| format!("Path too long to store: {}", entry.path))?;

        write_u32_le(&mut file, entry.tree.0)?;
        write_u32_le(&mut file, entry.content)?;
        write_u16_le(&mut file, len)?;
        file.write_all(path)?;
    }

    file.flush()?;
    Ok(())
}

fn write_contents(index: &CodeIndex, index_dir: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(index_dir.join("contents.bin"))?);

    write_u32_le(&mut file, index.content_count() as u32)?;
    for id in 0..index.content_count() as u32 {
        if let Some(loc) = index.content_ref(id) {
            write_u32_le(&mut file, loc.chunk)?;
            write_u64_le(&mut file, loc.offset as u64)?;
            write_u64_le(&mut file, loc.len as u64)?;
        }
    }

    file.flush()?;
    Ok(())
}

/// Write chunk data plus its trigram dictionary and postings.
///
/// Postings list content ids local to the chunk (position in `chunk.contents`).
fn write_chunk(index: &CodeIndex, chunk: &Chunk, chunk_idx: usize, chunks_dir: &Path) -> Result<()> {
    let stem = format!("chunk_{:04}", chunk_idx);
    fs::write(chunks_dir.join(format!("{}.data", stem)), &chunk.data)?;

    let mut postings: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (local_id, &content_id) in chunk.contents.iter().enumerate() {
        let Some(content) = index.content(content_id) else {
            continue;
        };
        for trigram in extract_trigrams(content) {
            postings.entry(trigram).or_default().push(local_id as u32);
        }
    }

    let mut dict_file = BufWriter::new(File::create(chunks_dir.join(format!("{}.grams.dict", stem)))?);
    let mut postings_file =
        BufWriter::new(File::create(chunks_dir.join(format!("{}.grams.postings", stem)))?);

    write_u32_le(&mut dict_file, postings.len() as u32)?;
    let mut postings_offset: u64 = 0;

    for (trigram, ids) in &postings {
        // Contents are visited in order, so ids are already sorted and unique
        let mut encoded = Vec::new();
        delta_encode(ids, &mut encoded);

        write_u32_le(&mut dict_file, *trigram)?;
        write_u64_le(&mut dict_file, postings_offset)?;
        write_u32_le(&mut dict_file, encoded.len() as u32)?;
        write_u32_le(&mut dict_file, ids.len() as u32)?;

        postings_file.write_all(&encoded)?;
        postings_offset += encoded.len() as u64;
    }

    dict_file.flush()?;
    postings_file.flush()?;
    Ok(())
}
