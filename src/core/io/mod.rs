//! File formats.
//!
//! - `record_file` - framed `(u32 key, bytes)` container shared by every stage
//! - `sequence_reader` - FASTA/FASTQ input, plain or compressed

pub mod record_file;
pub mod sequence_reader;
