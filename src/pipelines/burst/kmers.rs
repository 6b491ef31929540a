//! K-mer census over converted sequence chunks.
//!
//! Every window of `kmer_len` bases free of ambiguous bases is counted once,
//! at its sequence id and absolute position in that sequence. A chunk only
//! counts the windows it owns (see [`SequenceChunk::first_owned_window`]), so
//! the overlap shared by neighbouring chunks is never counted twice.

use crate::core::compute::encoding;
use crate::error::{BurstError, Result};

use super::chunking::SequenceChunk;
use super::shuffle::Emit;

#[derive(Debug, Clone, Copy)]
pub struct KmerCounter {
    kmer_len: usize,
    chunk_overlap: usize,
}

impl KmerCounter {
    /// `chunk_overlap` must be the overlap the chunks were converted with.
    pub fn new(kmer_len: usize, chunk_overlap: usize) -> Result<Self> {
        if kmer_len == 0 || kmer_len > chunk_overlap + 1 {
            return Err(BurstError::InvalidConfig(format!(
                "k-mer length ({}) must be between 1 and chunk overlap + 1 ({})",
                kmer_len,
                chunk_overlap + 1
            )));
        }
        Ok(Self {
            kmer_len,
            chunk_overlap,
        })
    }

    pub fn kmer_len(&self) -> usize {
        self.kmer_len
    }

    /// Emit `(k-mer, (id, absolute position))` for every window `chunk` of
    /// sequence `id` owns. Returns the number of pairs emitted.
    pub fn count_chunk<E>(&self, id: u32, chunk: &SequenceChunk, out: &mut E) -> Result<usize>
    where
        E: Emit<Vec<u8>, (u32, u32)>,
    {
        let first = chunk.first_owned_window(self.chunk_overlap, self.kmer_len);
        let end = (chunk.len() + 1).saturating_sub(self.kmer_len);
        let mut emitted = 0;

        for local in first..end {
            let window = &chunk.sequence[local..local + self.kmer_len];
            if encoding::has_ambiguous_base(window) {
                continue;
            }
            let position = u32::try_from(local)
                .ok()
                .and_then(|local| chunk.offset.checked_add(local))
                .ok_or_else(|| {
                    BurstError::malformed(
                        "chunk",
                        format!("k-mer position {} past offset {} overflows", local, chunk.offset),
                    )
                })?;
            out.emit(window.to_vec(), (id, position));
            emitted += 1;
        }
        Ok(emitted)
    }
}

/// One distinct k-mer and where it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerCount {
    pub kmer: Vec<u8>,
    /// `(sequence id, position)`, ascending
    pub positions: Vec<(u32, u32)>,
}

impl KmerCount {
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    /// `KMER\tcount`, followed by `\tid:pos` for every position when asked.
    pub fn to_line(&self, show_positions: bool) -> String {
        let mut line = format!("{}\t{}", String::from_utf8_lossy(&self.kmer), self.count());
        if show_positions {
            for (id, pos) in &self.positions {
                line.push_str(&format!("\t{}:{}", id, pos));
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burst_opt::ChunkingParams;
    use crate::pipelines::burst::chunking::split_sequence;
    use crate::pipelines::burst::shuffle::KeyGroups;

    fn census(seq: &[u8], kmer_len: usize, overlap: usize, max_chunk_len: usize) -> Vec<KmerCount> {
        let chunks = split_sequence(
            seq,
            ChunkingParams {
                overlap,
                max_chunk_len,
            },
        )
        .unwrap();
        let counter = KmerCounter::new(kmer_len, overlap).unwrap();
        let mut groups = KeyGroups::new();
        for chunk in &chunks {
            counter.count_chunk(1, chunk, &mut groups).unwrap();
        }
        groups
            .into_sorted_groups()
            .into_iter()
            .map(|(kmer, mut positions)| {
                positions.sort_unstable();
                KmerCount { kmer, positions }
            })
            .collect()
    }

    #[test]
    fn test_counts_and_positions() {
        let counts = census(b"ACGACGNAC", 3, 4, 100);
        let lines: Vec<_> = counts.iter().map(|c| c.to_line(true)).collect();
        assert_eq!(lines, vec!["ACG\t2\t1:0\t1:3", "CGA\t1\t1:1", "GAC\t1\t1:2"]);
        assert_eq!(counts[0].to_line(false), "ACG\t2");
    }

    #[test]
    fn test_chunked_census_matches_whole_sequence() {
        let seq: Vec<u8> = b"ACGTTGCAAGNCTTAGGACT".iter().copied().cycle().take(97).collect();
        let whole = census(&seq, 5, 8, 1000);
        for max_chunk_len in [12, 17, 30] {
            assert_eq!(census(&seq, 5, 8, max_chunk_len), whole, "chunk {}", max_chunk_len);
        }
    }

    #[test]
    fn test_kmer_length_bounds() {
        assert!(KmerCounter::new(0, 8).is_err());
        assert!(KmerCounter::new(10, 8).is_err());
        assert_eq!(KmerCounter::new(9, 8).unwrap().kmer_len(), 9);
    }
}
