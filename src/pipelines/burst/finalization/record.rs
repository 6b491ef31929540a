//! Alignment record.
//!
//! One read aligned to one reference interval. Records are keyed by read id
//! in every file and group they pass through, so the read id is not part of
//! the record itself.

use std::fmt;
use std::str::FromStr;

use crate::error::{BurstError, Result};

const KIND: &str = "alignment";

/// Size of the binary form in bytes.
pub const ALIGNMENT_RECORD_LEN: usize = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlignmentRecord {
    pub ref_id: u32,
    /// First aligned reference position
    pub ref_start: u32,
    /// One past the last aligned reference position
    pub ref_end: u32,
    pub edit_count: u32,
    /// The read aligned on the reverse strand
    pub is_reverse_complement: bool,
}

impl AlignmentRecord {
    /// `[is_rc][ref_id][ref_start][ref_end][edit_count]`, integers big-endian.
    pub fn to_bytes(&self) -> [u8; ALIGNMENT_RECORD_LEN] {
        let mut out = [0u8; ALIGNMENT_RECORD_LEN];
        out[0] = u8::from(self.is_reverse_complement);
        out[1..5].copy_from_slice(&self.ref_id.to_be_bytes());
        out[5..9].copy_from_slice(&self.ref_start.to_be_bytes());
        out[9..13].copy_from_slice(&self.ref_end.to_be_bytes());
        out[13..17].copy_from_slice(&self.edit_count.to_be_bytes());
        out
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() != ALIGNMENT_RECORD_LEN {
            return Err(BurstError::malformed(
                KIND,
                format!("{} bytes, expected {}", raw.len(), ALIGNMENT_RECORD_LEN),
            ));
        }
        let is_reverse_complement = match raw[0] {
            0 => false,
            1 => true,
            b => return Err(BurstError::malformed(KIND, format!("strand flag {:#04x}", b))),
        };
        let word = |at: usize| u32::from_be_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        Ok(Self {
            ref_id: word(1),
            ref_start: word(5),
            ref_end: word(9),
            edit_count: word(13),
            is_reverse_complement,
        })
    }

    pub fn strand(&self) -> char {
        if self.is_reverse_complement {
            '-'
        } else {
            '+'
        }
    }

    /// Tab-separated report line: `ref start end read edits strand`.
    pub fn to_alignment_line(&self, read_id: u32) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.ref_id,
            self.ref_start,
            self.ref_end,
            read_id,
            self.edit_count,
            self.strand()
        )
    }
}

/// `ref_id\tis_rc\tref_start\tref_end\tedit_count`
impl fmt::Display for AlignmentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.ref_id,
            u8::from(self.is_reverse_complement),
            self.ref_start,
            self.ref_end,
            self.edit_count
        )
    }
}

impl FromStr for AlignmentRecord {
    type Err = BurstError;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split('\t').collect();
        let [ref_id, is_rc, ref_start, ref_end, edit_count] = fields[..] else {
            return Err(BurstError::malformed(KIND, format!("expected 5 fields: {:?}", s)));
        };
        let num = |field: &str| {
            field
                .parse::<u32>()
                .map_err(|e| BurstError::malformed(KIND, format!("{:?}: {}", field, e)))
        };
        let is_reverse_complement = match is_rc {
            "0" => false,
            "1" => true,
            other => return Err(BurstError::malformed(KIND, format!("strand flag {:?}", other))),
        };
        Ok(Self {
            ref_id: num(ref_id)?,
            ref_start: num(ref_start)?,
            ref_end: num(ref_end)?,
            edit_count: num(edit_count)?,
            is_reverse_complement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AlignmentRecord {
        AlignmentRecord {
            ref_id: 2,
            ref_start: 70_000,
            ref_end: 70_036,
            edit_count: 1,
            is_reverse_complement: true,
        }
    }

    #[test]
    fn test_binary_layout() {
        let bytes = sample().to_bytes();
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..5], &[0, 0, 0, 2]);
        assert_eq!(&bytes[13..17], &[0, 0, 0, 1]);
        assert_eq!(AlignmentRecord::from_bytes(&bytes).unwrap(), sample());

        assert!(AlignmentRecord::from_bytes(&bytes[..16]).is_err());
        let mut bad = bytes;
        bad[0] = 7;
        assert!(AlignmentRecord::from_bytes(&bad).is_err());
    }

    #[test]
    fn test_text_forms() {
        assert_eq!(sample().to_string(), "2\t1\t70000\t70036\t1");
        assert_eq!("2\t1\t70000\t70036\t1".parse::<AlignmentRecord>().unwrap(), sample());
        assert!("2\t1\t70000\t70036".parse::<AlignmentRecord>().is_err());
        assert!("2\tx\t70000\t70036\t1".parse::<AlignmentRecord>().is_err());
        assert_eq!(sample().to_alignment_line(42), "2\t70000\t70036\t42\t1\t-");
    }
}
