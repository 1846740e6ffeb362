use crate::index::types::FileRecord;
use std::cmp::Reverse;

/// Order files by descending score.
///
/// The sort is stable: files with equal scores keep the order the walk
/// produced them in, which preserves tree locality within a score band.
pub fn locality_sort(files: &mut [FileRecord]) {
    files.sort_by_key(|f| Reverse(f.score));
}
