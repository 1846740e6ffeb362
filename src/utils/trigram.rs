/// A trigram is a 3-byte sequence stored as u32 (only lower 24 bits used)
pub type Trigram = u32;

/// Convert 3 bytes to a trigram
#[inline]
pub fn bytes_to_trigram(b0: u8, b1: u8, b2: u8) -> Trigram {
    ((b0 as u32) << 16) | ((b1 as u32) << 8) | (b2 as u32)
}

/// Bitset for tracking which trigrams have been seen.
/// Uses 2MB to cover all 16M possible trigram values (24 bits).
struct TrigramBitset {
    bits: Vec<u64>,
}

impl TrigramBitset {
    #[inline]
    fn new() -> Self {
        // 16M trigrams / 64 bits per u64 = 262144 u64s = 2MB
        Self {
            bits: vec![0u64; 262144],
        }
    }

    /// Set the trigram's bit. Returns true if it was already set.
    #[inline]
    fn test_and_set(&mut self, trigram: Trigram) -> bool {
        let idx = (trigram >> 6) as usize;
        let bit = 1u64 << (trigram & 63);
        let was_set = (self.bits[idx] & bit) != 0;
        self.bits[idx] |= bit;
        was_set
    }

    /// Collect all set trigrams in ascending order
    fn collect(&self) -> Vec<Trigram> {
        let mut result = Vec::with_capacity(8192);
        for (word_idx, &word) in self.bits.iter().enumerate() {
            if word == 0 {
                continue;
            }
            let base = (word_idx as u32) << 6;
            let mut w = word;
            while w != 0 {
                let bit_pos = w.trailing_zeros();
                result.push(base | bit_pos);
                w &= w - 1;
            }
        }
        result
    }
}

/// Extract the unique trigrams of `content`, sorted ascending.
///
/// Small inputs use sort+dedup; larger ones a bitset, which avoids hashing.
pub fn extract_trigrams(content: &[u8]) -> Vec<Trigram> {
    if content.len() < 3 {
        return Vec::new();
    }

    if content.len() < 1024 {
        let mut trigrams: Vec<Trigram> = content
            .windows(3)
            .map(|w| bytes_to_trigram(w[0], w[1], w[2]))
            .collect();
        trigrams.sort_unstable();
        trigrams.dedup();
        return trigrams;
    }

    let mut bitset = TrigramBitset::new();
    for window in content.windows(3) {
        bitset.test_and_set(bytes_to_trigram(window[0], window[1], window[2]));
    }
    bitset.collect()
}

/// Check if content is likely binary
pub fn is_binary(content: &[u8]) -> bool {
    let sample_size = content.len().min(8192);
    let sample = &content[..sample_size];

    let null_count = memchr::memchr_iter(0, sample).count();
    if null_count > sample_size / 10 {
        return true;
    }

    let non_text_count = sample
        .iter()
        .filter(|&&b| b < 0x20 && b != b'\n' && b != b'\r' && b != b'\t')
        .count();

    non_text_count > sample_size / 8
}
