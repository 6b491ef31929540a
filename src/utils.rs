use flate2::read::GzDecoder;
use std::fs::OpenOptions;
use std::io::{self, stdin, BufReader, Read};
use std::path::Path;
use std::time::Instant;

/// Open `path` for buffered reading; `-` is standard input.
pub fn xopen(path: &Path) -> io::Result<Box<dyn Read + Send>> {
    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::new(stdin())));
    }

    let file = OpenOptions::new().read(true).open(path)?;
    Ok(Box::new(BufReader::new(file)))
}

/// Open `path` for reading, transparently decompressing `.gz` files.
pub fn xzopen(path: &Path) -> io::Result<Box<dyn Read + Send>> {
    let input = xopen(path)?;
    if has_gz_extension(path) {
        Ok(Box::new(GzDecoder::new(input)))
    } else {
        Ok(input)
    }
}

pub fn has_gz_extension(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("gz")
}

/// Wall-clock stopwatch for phase timings in log output.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_xzopen_plain_and_gz() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("reads.fa");
        std::fs::write(&plain, b">r1\nACGT\n").unwrap();
        let mut buf = String::new();
        xzopen(&plain).unwrap().read_to_string(&mut buf).unwrap();
        assert_eq!(buf, ">r1\nACGT\n");

        let gz = dir.path().join("reads.fa.gz");
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b">r2\nTTTT\n").unwrap();
        std::fs::write(&gz, enc.finish().unwrap()).unwrap();
        let mut buf = String::new();
        xzopen(&gz).unwrap().read_to_string(&mut buf).unwrap();
        assert_eq!(buf, ">r2\nTTTT\n");
    }

    #[test]
    fn test_gz_extension() {
        assert!(has_gz_extension(Path::new("ref.fa.gz")));
        assert!(!has_gz_extension(Path::new("ref.fa")));
    }
}
