//! Sequence chunks.
//!
//! Long sequences are stored as overlapping chunks so that no chunk exceeds
//! `max_chunk_len` bases. Consecutive chunks of one sequence share `overlap`
//! bases, which is at least the longest read, so every seed window with its
//! flanks is whole in some chunk.
//!
//! Wire form: `[is_last: u8][offset: u32 BE][packed-4 sequence]`.
//! Text form: `is_last\toffset\tSEQUENCE`.

use std::fmt;
use std::str::FromStr;

use crate::burst_opt::ChunkingParams;
use crate::core::compute::encoding;
use crate::error::{BurstError, Result};

const KIND: &str = "chunk";
const HEADER_LEN: usize = 5;

/// One piece of an input sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceChunk {
    /// Upper-case ASCII bases
    pub sequence: Vec<u8>,
    /// Position of `sequence[0]` in the original sequence
    pub offset: u32,
    /// True for the chunk that ends at the true end of the sequence
    pub is_last: bool,
}

impl SequenceChunk {
    /// A whole sequence as a single chunk (reads are never split).
    pub fn whole(sequence: &[u8]) -> Self {
        Self {
            sequence: sequence.to_ascii_uppercase(),
            offset: 0,
            is_last: true,
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Local start of the first `window_len` window this chunk owns. Windows
    /// starting earlier end inside the overlap and belong to the previous
    /// chunk.
    pub fn first_owned_window(&self, overlap: usize, window_len: usize) -> usize {
        if self.offset == 0 {
            0
        } else {
            (overlap + 1).saturating_sub(window_len)
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + encoding::packed_len(self.sequence.len()));
        out.push(u8::from(self.is_last));
        out.extend_from_slice(&self.offset.to_be_bytes());
        out.extend_from_slice(&encoding::encode(&self.sequence));
        out
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() < HEADER_LEN {
            return Err(BurstError::malformed(
                KIND,
                format!("{} bytes, header needs {}", raw.len(), HEADER_LEN),
            ));
        }
        let is_last = match raw[0] {
            0 => false,
            1 => true,
            b => return Err(BurstError::malformed(KIND, format!("last-chunk flag {:#04x}", b))),
        };
        Ok(Self {
            sequence: encoding::decode(&raw[HEADER_LEN..]),
            offset: u32::from_be_bytes([raw[1], raw[2], raw[3], raw[4]]),
            is_last,
        })
    }
}

impl fmt::Display for SequenceChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}",
            u8::from(self.is_last),
            self.offset,
            String::from_utf8_lossy(&self.sequence)
        )
    }
}

impl FromStr for SequenceChunk {
    type Err = BurstError;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.splitn(3, '\t').collect();
        let [is_last, offset, sequence] = fields[..] else {
            return Err(BurstError::malformed(KIND, format!("expected 3 fields: {:?}", s)));
        };
        let is_last = match is_last {
            "0" => false,
            "1" => true,
            other => return Err(BurstError::malformed(KIND, format!("last-chunk flag {:?}", other))),
        };
        let offset = offset
            .parse::<u32>()
            .map_err(|e| BurstError::malformed(KIND, format!("offset {:?}: {}", offset, e)))?;
        Ok(Self {
            sequence: sequence.as_bytes().to_ascii_uppercase(),
            offset,
            is_last,
        })
    }
}

/// Split `seq` into overlapping chunks of at most `params.max_chunk_len`
/// bases. The next chunk starts `params.overlap` bases before the end of the
/// previous one. An empty sequence yields no chunks.
pub fn split_sequence(seq: &[u8], params: ChunkingParams) -> Result<Vec<SequenceChunk>> {
    if params.overlap >= params.max_chunk_len {
        return Err(BurstError::InvalidConfig(format!(
            "chunk overlap ({}) must be smaller than max chunk length ({})",
            params.overlap, params.max_chunk_len
        )));
    }

    let mut chunks = Vec::with_capacity(seq.len() / (params.max_chunk_len - params.overlap) + 1);
    let mut offset = 0usize;
    while offset < seq.len() {
        let end = (offset + params.max_chunk_len).min(seq.len());
        let is_last = end == seq.len();
        let chunk_offset = u32::try_from(offset).map_err(|_| {
            BurstError::malformed(KIND, format!("offset {} does not fit in 32 bits", offset))
        })?;
        chunks.push(SequenceChunk {
            sequence: seq[offset..end].to_ascii_uppercase(),
            offset: chunk_offset,
            is_last,
        });
        if is_last {
            break;
        }
        offset = end - params.overlap;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(overlap: usize, max_chunk_len: usize) -> ChunkingParams {
        ChunkingParams {
            overlap,
            max_chunk_len,
        }
    }

    #[test]
    fn test_split_overlap_and_offsets() {
        let seq = b"ACGTACGTAC";
        let chunks = split_sequence(seq, params(2, 4)).unwrap();
        let offsets: Vec<u32> = chunks.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 2, 4, 6]);
        assert!(chunks[..3].iter().all(|c| !c.is_last && c.len() == 4));
        assert!(chunks[3].is_last);

        // Every chunk is the original sequence at its offset.
        for c in &chunks {
            let start = c.offset as usize;
            assert_eq!(&seq[start..start + c.len()], c.sequence.as_slice());
        }
        // Consecutive chunks share exactly `overlap` bases.
        for pair in chunks.windows(2) {
            let prev_end = pair[0].offset as usize + pair[0].len();
            assert_eq!(prev_end - pair[1].offset as usize, 2);
        }
    }

    #[test]
    fn test_split_short_and_empty() {
        let chunks = split_sequence(b"acgt", params(2, 10)).unwrap();
        assert_eq!(chunks, vec![SequenceChunk::whole(b"ACGT")]);
        assert!(split_sequence(b"", params(2, 10)).unwrap().is_empty());
        assert!(split_sequence(b"ACGT", params(4, 4)).is_err());
    }

    #[test]
    fn test_owned_windows_tile_the_sequence() {
        let seq: Vec<u8> = b"ACGT".iter().copied().cycle().take(30).collect();
        let window = 4;
        let chunks = split_sequence(&seq, params(6, 12)).unwrap();
        assert!(chunks.len() > 2);

        let mut starts = Vec::new();
        for c in &chunks {
            let first = c.first_owned_window(6, window);
            for local in first..c.len() + 1 - window {
                starts.push(c.offset as usize + local);
            }
        }
        assert_eq!(starts, (0..=seq.len() - window).collect::<Vec<_>>());
    }

    #[test]
    fn test_binary_form() {
        let chunk = SequenceChunk {
            sequence: b"ACGTN".to_vec(),
            offset: 0x0102_0304,
            is_last: false,
        };
        let bytes = chunk.to_bytes();
        assert_eq!(&bytes[..5], &[0, 1, 2, 3, 4]);
        assert_eq!(bytes.len(), 5 + 3);
        assert_eq!(SequenceChunk::from_bytes(&bytes).unwrap(), chunk);

        assert!(SequenceChunk::from_bytes(&[1, 0, 0]).is_err());
        assert!(SequenceChunk::from_bytes(&[2, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_text_form() {
        let chunk = SequenceChunk {
            sequence: b"GATTACA".to_vec(),
            offset: 64511,
            is_last: true,
        };
        let text = chunk.to_string();
        assert_eq!(text, "1\t64511\tGATTACA");
        assert_eq!(text.parse::<SequenceChunk>().unwrap(), chunk);
        assert!("1\tx\tACGT".parse::<SequenceChunk>().is_err());
        assert!("1\t5".parse::<SequenceChunk>().is_err());
    }
}
