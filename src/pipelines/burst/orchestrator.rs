// src/pipelines/burst/orchestrator.rs
//
// End-to-end runs of the seed-and-extend aligner:
//
//   convert  FASTA/FASTQ -> chunk record file (+ `.map` id/name sidecar)
//   align    chunk files -> seed phase -> shuffle -> join phase -> alignment file
//   filter   alignment file -> unique-best alignment per read
//   print    alignment file -> tab-separated lines
//   stats    alignment file(s) -> counts
//   display  chunk or alignment file -> `key -> value` lines
//   count    chunk file -> k-mer counts
//
// The seed phase folds chunks into per-worker key groups on the rayon pool and
// merges them; the join phase hands each key group to a worker that owns one
// BurstWorkspace for its lifetime.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::burst_opt::{BurstOpt, ChunkingParams};
use crate::core::alignment::workspace::BurstWorkspace;
use crate::core::io::record_file::{record_paths, RecordReader, RecordWriter};
use crate::core::io::sequence_reader::SequenceReader;
use crate::utils::Timer;

use super::chunking::{split_sequence, SequenceChunk};
use super::finalization::{combine_top_two, unique_best, AlignmentRecord};
use super::join::{JoinStats, SeedJoin};
use super::kmers::{KmerCount, KmerCounter};
use super::seeding::{SeedGenerator, SeedKey};
use super::shuffle::{Emit, KeyGroups};
use super::stats::AlignmentStats;

type SeedGroups = KeyGroups<SeedKey, Vec<u8>>;
type ReadGroups = KeyGroups<u32, AlignmentRecord>;
type KmerGroups = KeyGroups<Vec<u8>, (u32, u32)>;

/// `<path>` with `suffix` appended to the file name.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Sidecar listing `id name` for every converted sequence.
pub fn map_path(output: &Path) -> PathBuf {
    with_suffix(output, ".map")
}

/// Where unfiltered alignments are staged when filtering is on.
pub fn staging_path(output: &Path) -> PathBuf {
    with_suffix(output, "-alignments")
}

// ============================================================================
// CONVERT
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub sequences: usize,
    pub chunks: usize,
    pub min_len: usize,
    pub max_len: usize,
}

/// Convert a FASTA or FASTQ file into a chunk record file keyed by sequence
/// id. Ids start at 1 in file order; names go to the `.map` sidecar.
pub fn convert_fasta(input: &Path, output: &Path, params: ChunkingParams) -> Result<ConvertSummary> {
    let timer = Timer::start();
    let reader = SequenceReader::new(input)
        .with_context(|| format!("Error opening sequence file {}", input.display()))?;
    let mut writer = RecordWriter::create(output)
        .with_context(|| format!("Error creating record file {}", output.display()))?;
    let map_file = map_path(output);
    let mut names = BufWriter::new(
        File::create(&map_file)
            .with_context(|| format!("Error creating map file {}", map_file.display()))?,
    );

    let mut summary = ConvertSummary::default();
    for (index, record) in reader.enumerate() {
        let record = record.with_context(|| format!("Error reading {}", input.display()))?;
        let id = u32::try_from(index + 1).context("Too many sequences for 32-bit ids")?;
        writeln!(names, "{} {}", id, record.name)?;

        let len = record.seq.len();
        summary.min_len = if summary.sequences == 0 {
            len
        } else {
            summary.min_len.min(len)
        };
        summary.max_len = summary.max_len.max(len);

        let chunks = split_sequence(&record.seq, params)
            .with_context(|| format!("Error chunking sequence {} ({})", id, record.name))?;
        if chunks.len() > 1 {
            log::debug!("Sequence {}: {} bp in {} chunks", id, len, chunks.len());
        }
        for chunk in &chunks {
            writer.append(id, &chunk.to_bytes())?;
        }

        summary.chunks += chunks.len();
        summary.sequences += 1;
    }

    writer.finish()?;
    names.flush()?;

    log::info!(
        "Converted {} sequences into {} chunks in {:.2} sec",
        summary.sequences,
        summary.chunks,
        timer.secs()
    );
    log::info!(
        "min_seq_len: {}, max_seq_len: {}",
        summary.min_len,
        summary.max_len
    );
    Ok(summary)
}

/// Load every chunk record under `path` (a file or a directory of parts).
pub fn load_chunks(path: &Path) -> Result<Vec<(u32, SequenceChunk)>> {
    let mut chunks = Vec::new();
    for file in record_paths(path)? {
        let reader = RecordReader::open(&file)
            .with_context(|| format!("Error opening chunk file {}", file.display()))?;
        for record in reader {
            let (id, raw) =
                record.with_context(|| format!("Error reading chunk file {}", file.display()))?;
            let chunk = SequenceChunk::from_bytes(&raw)
                .with_context(|| format!("{}: sequence {}", file.display(), id))?;
            chunks.push((id, chunk));
        }
    }
    Ok(chunks)
}

// ============================================================================
// ALIGN
// ============================================================================

/// In-memory result of one alignment run.
#[derive(Debug, Clone, Default)]
pub struct AlignmentRun {
    /// `(read id, alignment)` in seed-key order
    pub alignments: Vec<(u32, AlignmentRecord)>,
    pub stats: JoinStats,
}

fn seed_phase(
    generator: &SeedGenerator,
    references: &[(u32, SequenceChunk)],
    reads: &[(u32, SequenceChunk)],
) -> Result<SeedGroups> {
    let reference_groups = references
        .par_iter()
        .try_fold(SeedGroups::new, |mut groups, (id, chunk)| -> Result<SeedGroups> {
            generator
                .reference_seeds(*id, chunk, &mut groups)
                .with_context(|| format!("Reference {} at offset {}", id, chunk.offset))?;
            Ok(groups)
        })
        .try_reduce(SeedGroups::new, |a, b| Ok(a.merge(b)))?;

    let read_groups = reads
        .par_iter()
        .try_fold(SeedGroups::new, |mut groups, (id, chunk)| -> Result<SeedGroups> {
            generator.read_seeds(*id, &chunk.sequence, &mut groups)?;
            Ok(groups)
        })
        .try_reduce(SeedGroups::new, |a, b| Ok(a.merge(b)))?;

    Ok(reference_groups.merge(read_groups))
}

fn join_phase(opt: &BurstOpt, groups: SeedGroups) -> Result<AlignmentRun> {
    let join = SeedJoin::new(opt.extension_params(), opt.join_params());
    let seed_len = opt.seed_len;
    let groups = groups.into_sorted_groups();

    let results = groups
        .par_iter()
        .map_init(
            || BurstWorkspace::new(opt.max_edits, opt.flank_len),
            |ws, (key, payloads)| -> Result<(Vec<(u32, AlignmentRecord)>, JoinStats)> {
                let mut out = Vec::new();
                let stats = join
                    .join_group(ws, payloads, &mut out)
                    .with_context(|| format!("Error joining seed {}", key.describe(seed_len)))?;
                if stats.extensions > 0 {
                    log::debug!(
                        "seed {}: {} refs x {} reads = {} extensions, {} alignments",
                        key.describe(seed_len),
                        stats.reference_tuples,
                        stats.query_tuples,
                        stats.extensions,
                        stats.alignments
                    );
                }
                Ok((out, stats))
            },
        )
        .collect::<Result<Vec<_>>>()?;

    let mut run = AlignmentRun::default();
    for (alignments, stats) in results {
        run.alignments.extend(alignments);
        run.stats += stats;
    }
    Ok(run)
}

/// Align read chunks against reference chunks, both keyed by sequence id.
pub fn align_chunks(
    opt: &BurstOpt,
    references: &[(u32, SequenceChunk)],
    reads: &[(u32, SequenceChunk)],
) -> Result<AlignmentRun> {
    opt.validate()?;

    let timer = Timer::start();
    let generator = SeedGenerator::new(opt.seeding_params());
    let groups = seed_phase(&generator, references, reads)?;
    log::info!(
        "Seed phase: {} reference chunks, {} reads -> {} seeds in {} groups ({:.2} sec)",
        references.len(),
        reads.len(),
        groups.num_values(),
        groups.len(),
        timer.secs()
    );

    let timer = Timer::start();
    let run = join_phase(opt, groups)?;
    log::info!(
        "Join phase: {} extensions -> {} alignments ({:.2} sec)",
        run.stats.extensions,
        run.stats.alignments,
        timer.secs()
    );
    Ok(run)
}

/// Align in-memory sequences. References and reads get ids `1..` in order;
/// references are chunked exactly as `convert` would store them.
pub fn align_sequences(opt: &BurstOpt, references: &[&[u8]], reads: &[&[u8]]) -> Result<AlignmentRun> {
    let params = opt.chunking_params();
    let mut reference_chunks = Vec::new();
    for (id, seq) in (1u32..).zip(references) {
        for chunk in split_sequence(seq, params)? {
            reference_chunks.push((id, chunk));
        }
    }
    let read_chunks: Vec<_> = (1u32..)
        .zip(reads)
        .map(|(id, seq)| (id, SequenceChunk::whole(seq)))
        .collect();

    align_chunks(opt, &reference_chunks, &read_chunks)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub stats: JoinStats,
    /// Alignments in the final output file
    pub alignments_written: usize,
}

fn log_parameters(opt: &BurstOpt) {
    log::info!("Alignment parameters:");
    log::info!(
        "  Read length: {}-{}, max edits: {}, indels: {}",
        opt.min_read_len,
        opt.max_read_len,
        opt.max_edits,
        opt.allow_indels
    );
    log::info!(
        "  Seed length: {}, flank length: {}, redundancy: {}",
        opt.seed_len,
        opt.flank_len,
        opt.redundancy
    );
    log::info!(
        "  Block size: {}, filter alignments: {}",
        opt.block_size,
        opt.filter_alignments
    );
}

/// Align a converted read file against a converted reference and write the
/// alignments keyed by read id. With filtering on, the raw alignments are
/// staged at `<output>-alignments` and the unique-best filter writes `output`.
pub fn run_alignment(opt: &BurstOpt, reference: &Path, reads: &Path, output: &Path) -> Result<RunSummary> {
    opt.validate()?;
    log_parameters(opt);

    let references = load_chunks(reference)?;
    let read_chunks = load_chunks(reads)?;
    let run = align_chunks(opt, &references, &read_chunks)?;

    let alignments_written = if opt.filter_alignments {
        let staging = staging_path(output);
        write_alignments(&staging, &run.alignments)?;
        filter_alignments(&staging, output)?
    } else {
        write_alignments(output, &run.alignments)?;
        run.alignments.len()
    };

    Ok(RunSummary {
        stats: run.stats,
        alignments_written,
    })
}

pub fn write_alignments(path: &Path, alignments: &[(u32, AlignmentRecord)]) -> Result<()> {
    let mut writer = RecordWriter::create(path)
        .with_context(|| format!("Error creating alignment file {}", path.display()))?;
    for (read_id, record) in alignments {
        writer.append(*read_id, &record.to_bytes())?;
    }
    writer.finish()?;
    log::info!("Wrote {} alignments to {}", alignments.len(), path.display());
    Ok(())
}

// ============================================================================
// FILTER / PRINT / STATS
// ============================================================================

/// Visit every `(read id, alignment)` of one alignment file.
fn for_each_alignment<F>(file: &Path, mut f: F) -> Result<()>
where
    F: FnMut(u32, AlignmentRecord),
{
    let reader = RecordReader::open(file)
        .with_context(|| format!("Error opening alignment file {}", file.display()))?;
    for record in reader {
        let (read_id, raw) =
            record.with_context(|| format!("Error reading alignment file {}", file.display()))?;
        let alignment = AlignmentRecord::from_bytes(&raw)
            .with_context(|| format!("{}: read {}", file.display(), read_id))?;
        f(read_id, alignment);
    }
    Ok(())
}

/// One file's alignments, shrunk to the top two per read.
fn combine_file(file: &Path) -> Result<ReadGroups> {
    let mut groups = ReadGroups::new();
    for_each_alignment(file, |read_id, alignment| groups.emit(read_id, alignment))?;

    let mut combined = ReadGroups::new();
    for (read_id, alignments) in groups.into_sorted_groups() {
        for alignment in combine_top_two(alignments) {
            combined.emit(read_id, alignment);
        }
    }
    Ok(combined)
}

fn unique_groups(groups: ReadGroups) -> Vec<(u32, AlignmentRecord)> {
    groups
        .into_sorted_groups()
        .into_iter()
        .filter_map(|(read_id, alignments)| unique_best(alignments).map(|best| (read_id, best)))
        .collect()
}

/// Unique-best alignment of every read, in read id order.
pub fn unique_alignments(
    alignments: impl IntoIterator<Item = (u32, AlignmentRecord)>,
) -> Vec<(u32, AlignmentRecord)> {
    let mut groups = ReadGroups::new();
    for (read_id, alignment) in alignments {
        groups.emit(read_id, alignment);
    }
    unique_groups(groups)
}

/// Keep only reads with an unambiguous best alignment. Returns the number of
/// alignments written.
pub fn filter_alignments(input: &Path, output: &Path) -> Result<usize> {
    let timer = Timer::start();
    let files = record_paths(input)?;

    let combined = files
        .par_iter()
        .map(|file| combine_file(file))
        .try_reduce(ReadGroups::new, |a, b| Ok(a.merge(b)))?;
    let reads = combined.len();
    let kept = unique_groups(combined);

    write_alignments(output, &kept)?;
    log::info!(
        "Filter: {} of {} aligned reads have a unique best alignment ({:.2} sec)",
        kept.len(),
        reads,
        timer.secs()
    );
    Ok(kept.len())
}

/// Write one `ref start end read edits strand` line per alignment.
pub fn print_alignments<W: Write>(path: &Path, out: &mut W) -> Result<usize> {
    let mut printed = 0;
    for file in record_paths(path)? {
        log::info!("Printing {}", file.display());
        let mut result = Ok(());
        for_each_alignment(&file, |read_id, alignment| {
            if result.is_ok() {
                result = writeln!(out, "{}", alignment.to_alignment_line(read_id));
                printed += 1;
            }
        })?;
        result.context("Error writing alignments")?;
    }
    Ok(printed)
}

/// Count alignments, reverse-strand alignments and distinct aligned reads.
/// Files of a directory are summarised in parallel and merged.
pub fn alignment_stats(path: &Path) -> Result<AlignmentStats> {
    record_paths(path)?
        .par_iter()
        .map(|file| -> Result<AlignmentStats> {
            let mut stats = AlignmentStats::new();
            stats.files = 1;
            for_each_alignment(file, |read_id, alignment| stats.add(read_id, &alignment))?;
            Ok(stats)
        })
        .try_reduce(AlignmentStats::new, |mut a, b| {
            a.merge(b);
            Ok(a)
        })
}

// ============================================================================
// DISPLAY / COUNT
// ============================================================================

/// What the values of a record file hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RecordKind {
    /// Sequence chunks written by `convert`
    Chunk,
    /// Alignment records written by `align` or `filter`
    Alignment,
}

/// Write one `key -> value` line per record, decoding values as `kind`.
/// Returns the number of records shown.
pub fn display_records<W: Write>(path: &Path, kind: RecordKind, out: &mut W) -> Result<usize> {
    let mut shown = 0;
    for file in record_paths(path)? {
        let reader = RecordReader::open(&file)
            .with_context(|| format!("Error opening record file {}", file.display()))?;
        for record in reader {
            let (key, raw) =
                record.with_context(|| format!("Error reading record file {}", file.display()))?;
            let value = match kind {
                RecordKind::Chunk => SequenceChunk::from_bytes(&raw).map(|c| c.to_string()),
                RecordKind::Alignment => AlignmentRecord::from_bytes(&raw).map(|a| a.to_string()),
            }
            .with_context(|| format!("{}: key {}", file.display(), key))?;
            writeln!(out, "{} -> {}", key, value).context("Error writing records")?;
            shown += 1;
        }
    }
    log::info!("Saw {} records", shown);
    Ok(shown)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KmerSummary {
    /// Distinct k-mers
    pub distinct: usize,
    /// Counted windows
    pub total: usize,
}

/// Count every k-mer of a chunk file (or directory of parts) and write one
/// `KMER\tcount` line per distinct k-mer in sorted order, with `id:pos`
/// positions appended when `show_positions` is set. `chunk_overlap` must match the
/// overlap the file was converted with.
pub fn count_kmers<W: Write>(
    path: &Path,
    kmer_len: usize,
    chunk_overlap: usize,
    show_positions: bool,
    out: &mut W,
) -> Result<KmerSummary> {
    let timer = Timer::start();
    let counter = KmerCounter::new(kmer_len, chunk_overlap)?;
    let chunks = load_chunks(path)?;

    let groups = chunks
        .par_iter()
        .try_fold(KmerGroups::new, |mut groups, (id, chunk)| -> Result<KmerGroups> {
            counter
                .count_chunk(*id, chunk, &mut groups)
                .with_context(|| format!("Sequence {} at offset {}", id, chunk.offset))?;
            Ok(groups)
        })
        .try_reduce(KmerGroups::new, |a, b| Ok(a.merge(b)))?;

    let summary = KmerSummary {
        distinct: groups.len(),
        total: groups.num_values(),
    };
    for (kmer, mut positions) in groups.into_sorted_groups() {
        positions.sort_unstable();
        let count = KmerCount { kmer, positions };
        writeln!(out, "{}", count.to_line(show_positions)).context("Error writing k-mer counts")?;
    }

    log::info!(
        "Counted {} {}-mers, {} distinct ({:.2} sec)",
        summary.total,
        kmer_len,
        summary.distinct,
        timer.secs()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_paths() {
        assert_eq!(map_path(Path::new("out/ref.br")), PathBuf::from("out/ref.br.map"));
        assert_eq!(
            staging_path(Path::new("out/hits")),
            PathBuf::from("out/hits-alignments")
        );
    }

    #[test]
    fn test_unique_alignments_drops_ties() {
        let rec = |start: u32, edit_count: u32| AlignmentRecord {
            ref_id: 1,
            ref_start: start,
            ref_end: start + 20,
            edit_count,
            is_reverse_complement: false,
        };
        let kept = unique_alignments(vec![
            (2, rec(0, 1)),
            (1, rec(5, 0)),
            (2, rec(9, 1)),
            (1, rec(7, 2)),
            (3, rec(1, 2)),
        ]);
        assert_eq!(kept, vec![(1, rec(5, 0)), (3, rec(1, 2))]);
    }

    fn rec(start: u32, edit_count: u32, is_reverse_complement: bool) -> AlignmentRecord {
        AlignmentRecord {
            ref_id: 1,
            ref_start: start,
            ref_end: start + 20,
            edit_count,
            is_reverse_complement,
        }
    }

    #[test]
    fn test_stats_merge_parts() {
        let dir = tempfile::tempdir().unwrap();
        write_alignments(&dir.path().join("part-0"), &[(1, rec(0, 0, false)), (2, rec(5, 1, true))])
            .unwrap();
        write_alignments(&dir.path().join("part-1"), &[(2, rec(9, 0, false))]).unwrap();

        let stats = alignment_stats(dir.path()).unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.alignments, 3);
        assert_eq!(stats.rc_alignments, 1);
        assert_eq!(stats.reads_aligned(), 2);
    }

    #[test]
    fn test_display_records() {
        let dir = tempfile::tempdir().unwrap();
        let hits = dir.path().join("hits");
        write_alignments(&hits, &[(4, rec(12, 2, true))]).unwrap();

        let mut out = Vec::new();
        assert_eq!(display_records(&hits, RecordKind::Alignment, &mut out).unwrap(), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "4 -> 1\t1\t12\t32\t2\n");

        let chunks = dir.path().join("ref.br");
        let mut writer = RecordWriter::create(&chunks).unwrap();
        let chunk = SequenceChunk {
            sequence: b"GATTACA".to_vec(),
            offset: 40,
            is_last: true,
        };
        writer.append(3, &chunk.to_bytes()).unwrap();
        writer.finish().unwrap();

        let mut out = Vec::new();
        display_records(&chunks, RecordKind::Chunk, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "3 -> 1\t40\tGATTACA\n");

        // A chunk is not a 17-byte alignment record.
        let err = display_records(&chunks, RecordKind::Alignment, &mut Vec::<u8>::new())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("key 3"), "{:#}", err);
    }

    #[test]
    fn test_count_kmers_over_converted_file() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("ref.fa");
        std::fs::write(&fasta, ">a\nACGTACGTNACG\n>b\nTTACG\n").unwrap();
        let converted = dir.path().join("ref.br");
        let params = ChunkingParams {
            overlap: 4,
            max_chunk_len: 6,
        };
        convert_fasta(&fasta, &converted, params).unwrap();

        let mut out = Vec::new();
        let summary = count_kmers(&converted, 4, 4, true, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "ACGT\t2\t1:0\t1:4",
                "CGTA\t1\t1:1",
                "GTAC\t1\t1:2",
                "TACG\t2\t1:3\t2:1",
                "TTAC\t1\t2:0",
            ]
        );
        assert_eq!(summary, KmerSummary { distinct: 5, total: 7 });

        assert!(count_kmers(&converted, 6, 4, false, &mut Vec::<u8>::new()).is_err());
    }

    #[test]
    fn test_align_sequences_finds_planted_read() {
        let mut opt = BurstOpt {
            min_read_len: 12,
            max_read_len: 12,
            max_edits: 1,
            chunk_overlap: 64,
            max_chunk_len: 128,
            ..Default::default()
        };
        opt.derive_lengths();

        let reference = b"TTGACCATGCAAGTCCGATTACAGGCTAGCTTAACG";
        let read = &reference[10..22];
        let run = align_sequences(&opt, &[&reference[..]], &[read]).unwrap();
        let hits: Vec<_> = run
            .alignments
            .iter()
            .filter(|(_, a)| !a.is_reverse_complement)
            .map(|(id, a)| (*id, a.ref_start, a.ref_end, a.edit_count))
            .collect();
        assert_eq!(hits, vec![(1, 10, 22, 0)]);
    }
}
