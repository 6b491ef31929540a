// Seed generation for reference chunks and reads
//
// Reference chunks contribute a seed at every position whose window is free
// of ambiguous bases, with up to `flank_len` bases of flank on each side.
// Reads contribute non-overlapping windows on both strands, with the entire
// rest of the read as flanks. With `seed_len = min_read_len / (k + 1)` every
// read that aligns with at most `k` edits keeps one window intact.

use crate::burst_opt::SeedingParams;
use crate::core::compute::encoding;
use crate::error::{BurstError, Result};
use crate::pipelines::burst::chunking::SequenceChunk;
use crate::pipelines::burst::shuffle::Emit;

use super::types::{encode_payload, SeedKey};

/// Emits `(seed key, seed payload)` pairs for references and reads.
#[derive(Debug, Clone, Copy)]
pub struct SeedGenerator {
    params: SeedingParams,
}

impl SeedGenerator {
    pub fn new(params: SeedingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SeedingParams {
        &self.params
    }

    /// Local position of the first seed in a chunk. Positions before it were
    /// already seeded, with full left flanks, by the previous chunk.
    fn first_seed_position(&self, chunk: &SequenceChunk) -> usize {
        chunk.first_owned_window(
            self.params.chunk_overlap,
            self.params.flank_len + self.params.seed_len,
        )
    }

    /// One past the last seed position. Non-last chunks stop early so the
    /// right flank fits; the next chunk picks up from there.
    fn seed_end_position(&self, chunk: &SequenceChunk) -> usize {
        let end = (chunk.len() + 1).saturating_sub(self.params.seed_len);
        if chunk.is_last {
            end
        } else {
            end.saturating_sub(self.params.flank_len)
        }
    }

    /// Seed one reference chunk of sequence `id`. Returns the number of pairs
    /// emitted.
    pub fn reference_seeds<E>(&self, id: u32, chunk: &SequenceChunk, out: &mut E) -> Result<usize>
    where
        E: Emit<SeedKey, Vec<u8>>,
    {
        let SeedingParams {
            seed_len,
            flank_len,
            redundancy,
            ..
        } = self.params;
        let seq = chunk.sequence.as_slice();
        let mut emitted = 0;

        for start in self.first_seed_position(chunk)..self.seed_end_position(chunk) {
            let window = &seq[start..start + seed_len];
            if encoding::has_ambiguous_base(window) {
                continue;
            }

            let offset = u32::try_from(start)
                .ok()
                .and_then(|local| chunk.offset.checked_add(local))
                .ok_or_else(|| {
                    BurstError::malformed(
                        "chunk",
                        format!("seed position {} past offset {} overflows", start, chunk.offset),
                    )
                })?;

            let left = start.saturating_sub(flank_len)..start;
            let right_start = start + seed_len;
            let right = right_start..(right_start + flank_len).min(seq.len());
            let payload = encode_payload(true, false, offset, id, seq, left, right);

            if redundancy > 1 && encoding::is_repetitive(window) {
                for slot in 0..redundancy {
                    out.emit(SeedKey::new(window, slot, redundancy), payload.clone());
                }
                emitted += redundancy as usize;
            } else {
                out.emit(SeedKey::new(window, 0, redundancy), payload);
                emitted += 1;
            }
        }

        Ok(emitted)
    }

    /// Seed one read on both strands. A read with more than `max_edits`
    /// ambiguous bases cannot align and yields nothing; a read outside the
    /// configured length range is an error.
    pub fn read_seeds<E>(&self, id: u32, read: &[u8], out: &mut E) -> Result<usize>
    where
        E: Emit<SeedKey, Vec<u8>>,
    {
        let SeedingParams {
            seed_len,
            min_read_len,
            max_read_len,
            max_edits,
            redundancy,
            ..
        } = self.params;

        if read.len() < min_read_len || read.len() > max_read_len {
            return Err(BurstError::ReadLength {
                id,
                len: read.len(),
                min: min_read_len,
                max: max_read_len,
            });
        }

        let ambiguous = encoding::count_ambiguous(read);
        if ambiguous > max_edits {
            log::trace!("read {}: {} ambiguous bases, skipped", id, ambiguous);
            return Ok(0);
        }

        let mut seq = read.to_ascii_uppercase();
        let mut emitted = 0;

        for is_rc in [false, true] {
            if is_rc {
                encoding::reverse_complement_in_place(&mut seq);
            }

            for start in (0..).step_by(seed_len).take_while(|i| i + seed_len <= seq.len()) {
                let window = &seq[start..start + seed_len];
                if encoding::has_ambiguous_base(window) {
                    continue;
                }

                let slot = if redundancy > 1 && encoding::is_repetitive(window) {
                    id
                } else {
                    0
                };
                let key = SeedKey::new(window, slot, redundancy);
                // read length is bounded by max_read_len, which fits in u32
                let payload = encode_payload(
                    false,
                    is_rc,
                    start as u32,
                    id,
                    &seq,
                    0..start,
                    start + seed_len..seq.len(),
                );
                out.emit(key, payload);
                emitted += 1;
            }
        }

        Ok(emitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::burst::seeding::types::SeedTuple;

    fn params() -> SeedingParams {
        SeedingParams {
            seed_len: 4,
            flank_len: 6,
            min_read_len: 8,
            max_read_len: 12,
            max_edits: 1,
            redundancy: 1,
            chunk_overlap: 12,
        }
    }

    fn decoded(pairs: &[(SeedKey, Vec<u8>)], seed_len: usize) -> Vec<(String, SeedTuple)> {
        pairs
            .iter()
            .map(|(k, v)| (k.describe(seed_len), SeedTuple::from_bytes(v).unwrap()))
            .collect()
    }

    #[test]
    fn test_reference_every_position() {
        let generator = SeedGenerator::new(params());
        let chunk = SequenceChunk::whole(b"ACGTACGTAC");
        let mut out = Vec::new();
        let n = generator.reference_seeds(3, &chunk, &mut out).unwrap();
        assert_eq!(n, 7);

        let seeds = decoded(&out, 4);
        let offsets: Vec<u32> = seeds.iter().map(|(_, t)| t.offset).collect();
        assert_eq!(offsets, (0..7).collect::<Vec<u32>>());
        assert!(seeds.iter().all(|(_, t)| t.is_reference && t.id == 3));

        // Position 5: left flank ACGTA reversed, right flank C (chunk edge).
        let (key, t) = &seeds[5];
        assert_eq!(key, "CGTA");
        assert_eq!(encoding::decode(&t.left_flank), b"ATGCA".to_vec());
        assert_eq!(encoding::decode(&t.right_flank), b"C".to_vec());
    }

    #[test]
    fn test_reference_skips_ambiguous_windows() {
        let generator = SeedGenerator::new(params());
        let chunk = SequenceChunk::whole(b"ACGTNACGT");
        let mut out = Vec::new();
        generator.reference_seeds(1, &chunk, &mut out).unwrap();
        let offsets: Vec<u32> = decoded(&out, 4).iter().map(|(_, t)| t.offset).collect();
        assert_eq!(offsets, vec![0, 5]);
    }

    #[test]
    fn test_reference_chunk_boundaries() {
        let p = params();
        let generator = SeedGenerator::new(p);
        let seq: Vec<u8> = b"ACGT".iter().cycle().take(40).copied().collect();

        // Non-first, non-last chunk: starts at overlap + 1 - flank - seed = 3,
        // stops flank bases early.
        let chunk = SequenceChunk {
            sequence: seq[20..40].to_vec(),
            offset: 20,
            is_last: false,
        };
        let mut out = Vec::new();
        generator.reference_seeds(1, &chunk, &mut out).unwrap();
        let offsets: Vec<u32> = decoded(&out, 4).iter().map(|(_, t)| t.offset).collect();
        assert_eq!(offsets.first(), Some(&23));
        assert_eq!(offsets.last(), Some(&(20 + 20 - 4 - 6)));
        // Right flanks are never truncated inside a non-last chunk.
        assert!(decoded(&out, 4).iter().all(|(_, t)| t.right_len() == 6));
    }

    #[test]
    fn test_reference_redundancy_fanout() {
        let mut p = params();
        p.redundancy = 3;
        let generator = SeedGenerator::new(p);
        let chunk = SequenceChunk::whole(b"AAAAC");
        let mut out = Vec::new();
        let n = generator.reference_seeds(1, &chunk, &mut out).unwrap();
        // AAAA fans out to 3 slots, AAAC stays in slot 0.
        assert_eq!(n, 4);
        let keys: Vec<String> = out.iter().map(|(k, _)| k.describe(4)).collect();
        assert_eq!(keys, vec!["AAAA/0", "AAAA/1", "AAAA/2", "AAAC/0"]);
        assert!(out[..3].iter().all(|(_, v)| v == &out[0].1));
    }

    #[test]
    fn test_read_both_strands() {
        let generator = SeedGenerator::new(params());
        let mut out = Vec::new();
        let n = generator.read_seeds(9, b"AACCGGTTAC", &mut out).unwrap();
        assert_eq!(n, 4);

        let seeds = decoded(&out, 4);
        let fwd: Vec<_> = seeds.iter().filter(|(_, t)| !t.is_reverse_complement).collect();
        assert_eq!(fwd.len(), 2);
        assert_eq!(fwd[0].0, "AACC");
        assert_eq!(fwd[1].0, "GGTT");
        assert_eq!(fwd[1].1.offset, 4);
        assert_eq!(encoding::decode(&fwd[1].1.left_flank), b"CCAA".to_vec());
        assert_eq!(encoding::decode(&fwd[1].1.right_flank), b"AC".to_vec());

        // Reverse complement of AACCGGTTAC is GTAACCGGTT.
        let rc: Vec<_> = seeds.iter().filter(|(_, t)| t.is_reverse_complement).collect();
        assert_eq!(rc[0].0, "GTAA");
        assert_eq!(rc[1].0, "CCGG");
        assert!(seeds.iter().all(|(_, t)| !t.is_reference && t.id == 9));
    }

    #[test]
    fn test_read_length_and_ambiguity() {
        let generator = SeedGenerator::new(params());
        let mut out = Vec::new();

        let err = generator.read_seeds(4, b"ACGT", &mut out).unwrap_err();
        assert!(matches!(err, BurstError::ReadLength { id: 4, len: 4, .. }));
        assert!(generator.read_seeds(4, &[b'A'; 13], &mut out).is_err());

        assert_eq!(generator.read_seeds(5, b"ANGTACNTAC", &mut out).unwrap(), 0);
        assert!(out.is_empty());

        // One N is within budget; only the window containing it is skipped.
        let n = generator.read_seeds(6, b"ACGTACNTAC", &mut out).unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn test_read_redundancy_slot() {
        let mut p = params();
        p.redundancy = 4;
        let generator = SeedGenerator::new(p);
        let mut out = Vec::new();
        generator.read_seeds(6, b"AAAACGTA", &mut out).unwrap();
        assert_eq!(out[0].0.describe(4), "AAAA/2");
        assert_eq!(out[1].0.describe(4), "CGTA/0");
    }
}
