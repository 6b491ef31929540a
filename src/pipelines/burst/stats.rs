//! Summary statistics over alignment record files.

use rustc_hash::FxHashSet;
use std::fmt;

use super::finalization::AlignmentRecord;

#[derive(Debug, Clone, Default)]
pub struct AlignmentStats {
    pub files: usize,
    pub alignments: u64,
    pub rc_alignments: u64,
    reads: FxHashSet<u32>,
}

impl AlignmentStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, read_id: u32, record: &AlignmentRecord) {
        self.alignments += 1;
        if record.is_reverse_complement {
            self.rc_alignments += 1;
        }
        self.reads.insert(read_id);
    }

    /// Distinct reads with at least one alignment.
    pub fn reads_aligned(&self) -> usize {
        self.reads.len()
    }

    pub fn merge(&mut self, other: AlignmentStats) {
        self.files += other.files;
        self.alignments += other.alignments;
        self.rc_alignments += other.rc_alignments;
        self.reads.extend(other.reads);
    }
}

impl fmt::Display for AlignmentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} files processed", self.files)?;
        writeln!(f, "{} Total Alignments", self.alignments)?;
        writeln!(f, "{} RC Alignments", self.rc_alignments)?;
        write!(f, "{} Reads Aligned", self.reads_aligned())
    }
}
