//! Framed key/value record files.
//!
//! Every stage of the aligner reads and writes the same container: a 4-byte
//! magic followed by frames of
//!
//! ```text
//! ┌──────────────┬──────────────┬─────────────────┐
//! │ key: u32 BE  │ len: u32 BE  │ value: len bytes│
//! └──────────────┴──────────────┴─────────────────┘
//! ```
//!
//! Keys are sequence ids (chunk files) or read ids (alignment files). A frame
//! cut short by end of file is a decode error, never a silent truncation.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{BurstError, Result};

pub const RECORD_MAGIC: &[u8; 4] = b"FBR1";

const KIND: &str = "record file";

pub struct RecordWriter<W: Write> {
    inner: W,
    records: u64,
}

impl RecordWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> RecordWriter<W> {
    /// Start a record stream on `inner`, writing the magic immediately.
    pub fn new(mut inner: W) -> Result<Self> {
        inner.write_all(RECORD_MAGIC)?;
        Ok(Self { inner, records: 0 })
    }

    pub fn append(&mut self, key: u32, value: &[u8]) -> Result<()> {
        let len = u32::try_from(value.len())
            .map_err(|_| BurstError::malformed(KIND, format!("value of {} bytes", value.len())))?;
        self.inner.write_all(&key.to_be_bytes())?;
        self.inner.write_all(&len.to_be_bytes())?;
        self.inner.write_all(value)?;
        self.records += 1;
        Ok(())
    }

    /// Number of records appended so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

pub struct RecordReader<R: Read> {
    inner: R,
    done: bool,
}

impl RecordReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read> RecordReader<R> {
    /// Wrap `inner`, checking the magic.
    pub fn new(mut inner: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        inner.read_exact(&mut magic).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => BurstError::malformed(KIND, "missing magic"),
            _ => BurstError::Io(e),
        })?;
        if &magic != RECORD_MAGIC {
            return Err(BurstError::malformed(
                KIND,
                format!("bad magic {:02x?}", magic),
            ));
        }
        Ok(Self { inner, done: false })
    }

    /// Read the next frame. `Ok(None)` at a clean end of stream.
    pub fn read_record(&mut self) -> Result<Option<(u32, Vec<u8>)>> {
        let mut header = [0u8; 8];
        let mut filled = 0;
        while filled < header.len() {
            match self.inner.read(&mut header[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        match filled {
            0 => return Ok(None),
            8 => {}
            n => {
                return Err(BurstError::malformed(
                    KIND,
                    format!("truncated frame header ({} of 8 bytes)", n),
                ))
            }
        }

        let key = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;

        // The length field is untrusted: read what is there, then compare.
        let mut value = Vec::new();
        let read = (&mut self.inner).take(len as u64).read_to_end(&mut value)?;
        if read != len {
            return Err(BurstError::malformed(
                KIND,
                format!(
                    "truncated value for key {} ({} of {} bytes)",
                    key, read, len
                ),
            ));
        }

        Ok(Some((key, value)))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<(u32, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read every record of a file into memory.
pub fn read_all(path: &Path) -> Result<Vec<(u32, Vec<u8>)>> {
    RecordReader::open(path)?.collect()
}

/// Record files under `path`: the file itself, or every non-hidden regular
/// file of a directory in name order.
pub fn record_paths(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn written(records: &[(u32, &[u8])]) -> Vec<u8> {
        let mut w = RecordWriter::new(Vec::new()).unwrap();
        for (key, value) in records {
            w.append(*key, value).unwrap();
        }
        assert_eq!(w.records(), records.len() as u64);
        w.finish().unwrap()
    }

    #[test]
    fn test_in_memory_round_trip() {
        let bytes = written(&[(1, &b"abc"[..]), (7, &b""[..]), (u32::MAX, &[0xFF; 300][..])]);
        let back: Vec<_> = RecordReader::new(Cursor::new(bytes))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            back,
            vec![
                (1, b"abc".to_vec()),
                (7, Vec::new()),
                (u32::MAX, vec![0xFF; 300])
            ]
        );
    }

    #[test]
    fn test_empty_stream() {
        let bytes = written(&[]);
        assert_eq!(bytes, RECORD_MAGIC.to_vec());
        assert_eq!(RecordReader::new(Cursor::new(bytes)).unwrap().count(), 0);
    }

    #[test]
    fn test_bad_magic() {
        let err = RecordReader::new(Cursor::new(b"XXXX".to_vec())).err().unwrap();
        assert!(matches!(err, BurstError::MalformedRecord { .. }));

        let err = RecordReader::new(Cursor::new(b"FB".to_vec())).err().unwrap();
        assert!(err.to_string().contains("missing magic"));
    }

    #[test]
    fn test_truncated_frames() {
        let mut bytes = written(&[(3, &b"ACGT"[..])]);
        bytes.truncate(bytes.len() - 1);
        let results: Vec<_> = RecordReader::new(Cursor::new(bytes.clone())).unwrap().collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].as_ref().unwrap_err().to_string().contains("truncated value"));

        bytes.truncate(RECORD_MAGIC.len() + 5);
        let mut reader = RecordReader::new(Cursor::new(bytes)).unwrap();
        let err = reader.read_record().unwrap_err();
        assert!(err.to_string().contains("truncated frame header"));
    }

    #[test]
    fn test_oversized_length_field() {
        let mut bytes = RECORD_MAGIC.to_vec();
        bytes.extend_from_slice(&9u32.to_be_bytes());
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        bytes.extend_from_slice(b"ACGT");

        let mut reader = RecordReader::new(Cursor::new(bytes)).unwrap();
        let err = reader.read_record().unwrap_err();
        assert!(matches!(err, BurstError::MalformedRecord { .. }));
        assert!(err.to_string().contains("4 of 4294967295 bytes"), "{}", err);
    }

    #[test]
    fn test_record_paths_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["part-1", "part-0", ".crc"] {
            fs::write(dir.path().join(name), RECORD_MAGIC).unwrap();
        }
        let paths = record_paths(dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["part-0", "part-1"]);

        let single = dir.path().join("part-0");
        assert_eq!(record_paths(&single).unwrap(), vec![single]);
    }
}
