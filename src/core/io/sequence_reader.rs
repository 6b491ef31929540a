// Sequence reader module using bio::io::fasta and bio::io::fastq
//
// This module provides one iterator over named sequences for both input
// formats accepted by `convert`:
// - FASTA (.fa, .fasta, .fna) for references and reads
// - FASTQ (.fq, .fastq) for reads; qualities are dropped
//
// Compressed inputs are detected by the .gz extension. BGZIP files are read
// with the multithreaded noodles-bgzf reader, plain gzip falls back to flate2.
// A path of `-` reads standard input.

use bio::io::{fasta, fastq};
use noodles_bgzf as bgzf;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::utils::{has_gz_extension, xzopen};

const BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4MB buffer

/// One input sequence with its header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSequence {
    /// Full header (id and description)
    pub name: String,
    /// Bases exactly as read; callers normalise case
    pub seq: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFormat {
    Fasta,
    Fastq,
}

impl SequenceFormat {
    /// Guess the format from the file name, ignoring a trailing `.gz`.
    pub fn from_path(path: &Path) -> Self {
        let stem = if has_gz_extension(path) {
            path.file_stem().map(Path::new).unwrap_or(path)
        } else {
            path
        };
        match stem.extension().and_then(|s| s.to_str()) {
            Some("fq") | Some("fastq") => SequenceFormat::Fastq,
            _ => SequenceFormat::Fasta,
        }
    }
}

enum Records {
    Fasta(fasta::Records<BufReader<Box<dyn Read + Send>>>),
    Fastq(fastq::Records<BufReader<Box<dyn Read + Send>>>),
}

/// Iterator over the sequences of a FASTA or FASTQ file.
pub struct SequenceReader {
    records: Records,
}

/// Detect if a gzipped file is BGZIP format by checking for the 'BC' extra subfield
fn is_bgzip_format(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 18];

    if file.read(&mut header)? < header.len() {
        return Ok(false);
    }

    // gzip magic, FEXTRA flag, then the BGZF subfield id
    Ok(header[0] == 0x1f
        && header[1] == 0x8b
        && header[3] & 0x04 != 0
        && header[12] == b'B'
        && header[13] == b'C')
}

fn open_input(path: &Path) -> io::Result<Box<dyn Read + Send>> {
    if has_gz_extension(path) && is_bgzip_format(path)? {
        log::debug!("Detected BGZIP format, using parallel decompression");
        let reader = bgzf::MultithreadedReader::new(File::open(path)?);
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, reader)));
    }
    xzopen(path)
}

impl SequenceReader {
    /// Open a sequence file, picking the parser from the file name.
    pub fn new(path: &Path) -> io::Result<Self> {
        Self::with_format(path, SequenceFormat::from_path(path))
    }

    pub fn with_format(path: &Path, format: SequenceFormat) -> io::Result<Self> {
        let input = open_input(path)?;
        let records = match format {
            SequenceFormat::Fasta => Records::Fasta(fasta::Reader::new(input).records()),
            SequenceFormat::Fastq => Records::Fastq(fastq::Reader::new(input).records()),
        };
        Ok(Self { records })
    }
}

fn header_name(id: &str, desc: Option<&str>) -> String {
    match desc {
        Some(desc) if !desc.is_empty() => format!("{} {}", id, desc),
        _ => id.to_string(),
    }
}

impl Iterator for SequenceReader {
    type Item = io::Result<NamedSequence>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.records {
            Records::Fasta(records) => records.next().map(|r| {
                r.map(|record| NamedSequence {
                    name: header_name(record.id(), record.desc()),
                    seq: record.seq().to_vec(),
                })
            }),
            Records::Fastq(records) => records.next().map(|r| {
                r.map(|record| NamedSequence {
                    name: header_name(record.id(), record.desc()),
                    seq: record.seq().to_vec(),
                })
                .map_err(io::Error::other)
            }),
        }
    }
}
