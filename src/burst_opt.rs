use clap::Args;
use std::path::PathBuf;

use crate::core::alignment::landau_vishkin::EditModel;
use crate::defaults;
use crate::error::{BurstError, Result};

/// Run options for one alignment job.
///
/// `seed_len` and `flank_len` are derived from the read geometry by
/// [`BurstOpt::derive_lengths`]; a caller that overrides `seed_len` must
/// call [`BurstOpt::derive_flank_len`] afterwards.
#[derive(Debug, Clone)]
pub struct BurstOpt {
    /// Shortest read length accepted
    pub min_read_len: usize,
    /// Longest read length accepted
    pub max_read_len: usize,
    /// Edit budget K
    pub max_edits: usize,
    /// Seed window length
    pub seed_len: usize,
    /// Maximum reference flank length carried by each seed
    pub flank_len: usize,
    /// Allow insertions and deletions (k-difference) instead of mismatches only
    pub allow_indels: bool,
    /// Keep only the best (and tied second-best) hit per read, then run the
    /// global unique-best filter
    pub filter_alignments: bool,
    /// Tuples per side of a join block
    pub block_size: usize,
    /// Fan-out of repetitive seeds
    pub redundancy: u32,
    /// Overlap between consecutive chunks of one sequence
    pub chunk_overlap: usize,
    /// Maximum chunk length
    pub max_chunk_len: usize,
    /// Worker threads
    pub n_threads: usize,
}

impl Default for BurstOpt {
    fn default() -> Self {
        let mut opt = BurstOpt {
            min_read_len: defaults::MIN_READ_LEN,
            max_read_len: defaults::MAX_READ_LEN,
            max_edits: defaults::MAX_EDITS,
            seed_len: 0,
            flank_len: 0,
            allow_indels: defaults::ALLOW_INDELS,
            filter_alignments: defaults::FILTER_ALIGNMENTS,
            block_size: defaults::BLOCK_SIZE,
            redundancy: defaults::REDUNDANCY,
            chunk_overlap: defaults::CHUNK_OVERLAP,
            max_chunk_len: defaults::MAX_CHUNK_LEN,
            n_threads: 1,
        };
        opt.derive_lengths();
        opt
    }
}

// ============================================================================
// STAGE-SPECIFIC PARAMETER BUNDLES
// ============================================================================

/// Parameters for splitting sequences into chunk records
#[derive(Debug, Clone, Copy)]
pub struct ChunkingParams {
    pub overlap: usize,
    pub max_chunk_len: usize,
}

/// Parameters for the seeding stage (seed/flank tuple generation)
#[derive(Debug, Clone, Copy)]
pub struct SeedingParams {
    pub seed_len: usize,
    pub flank_len: usize,
    pub min_read_len: usize,
    pub max_read_len: usize,
    pub max_edits: usize,
    pub redundancy: u32,
    pub chunk_overlap: usize,
}

/// Parameters for the extension stage (Landau-Vishkin)
#[derive(Debug, Clone, Copy)]
pub struct ExtensionParams {
    pub seed_len: usize,
    pub max_edits: usize,
    pub model: EditModel,
}

/// Parameters for the join/filter stage
#[derive(Debug, Clone, Copy)]
pub struct JoinParams {
    pub block_size: usize,
    pub max_edits: usize,
    pub filter_alignments: bool,
}

impl BurstOpt {
    /// Recompute `seed_len = min_read_len / (K + 1)` and the flank length.
    ///
    /// With this seed length every read with at most K edits keeps at least
    /// one of its non-overlapping seed windows intact.
    pub fn derive_lengths(&mut self) {
        self.seed_len = self.min_read_len / (self.max_edits + 1);
        self.derive_flank_len();
    }

    /// Recompute `flank_len = max_read_len - seed_len + K`.
    pub fn derive_flank_len(&mut self) {
        self.flank_len = (self.max_read_len + self.max_edits).saturating_sub(self.seed_len);
    }

    /// Size of a seed key in bytes.
    pub fn seed_key_len(&self) -> usize {
        crate::core::compute::encoding::seed_key_len(self.seed_len, self.redundancy)
    }

    // ========================================================================
    // STAGE-SPECIFIC PARAMETER ACCESSORS
    // ========================================================================

    pub fn chunking_params(&self) -> ChunkingParams {
        ChunkingParams {
            overlap: self.chunk_overlap,
            max_chunk_len: self.max_chunk_len,
        }
    }

    pub fn seeding_params(&self) -> SeedingParams {
        SeedingParams {
            seed_len: self.seed_len,
            flank_len: self.flank_len,
            min_read_len: self.min_read_len,
            max_read_len: self.max_read_len,
            max_edits: self.max_edits,
            redundancy: self.redundancy,
            chunk_overlap: self.chunk_overlap,
        }
    }

    pub fn extension_params(&self) -> ExtensionParams {
        ExtensionParams {
            seed_len: self.seed_len,
            max_edits: self.max_edits,
            model: EditModel::from_allow_indels(self.allow_indels),
        }
    }

    pub fn join_params(&self) -> JoinParams {
        JoinParams {
            block_size: self.block_size,
            max_edits: self.max_edits,
            filter_alignments: self.filter_alignments,
        }
    }

    /// Validate parameters for consistency across stages.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.min_read_len < 1 {
            errors.push("min_read_len must be >= 1".to_string());
        }
        if self.min_read_len > self.max_read_len {
            errors.push(format!(
                "min_read_len ({}) exceeds max_read_len ({})",
                self.min_read_len, self.max_read_len
            ));
        }
        if self.seed_len < 1 {
            errors.push(format!(
                "seed_len must be >= 1 (min_read_len {} is too short for {} edits)",
                self.min_read_len, self.max_edits
            ));
        }
        if self.seed_len > self.min_read_len {
            errors.push(format!(
                "seed_len ({}) exceeds min_read_len ({})",
                self.seed_len, self.min_read_len
            ));
        }
        if self.block_size < 1 {
            errors.push("block_size must be >= 1".to_string());
        }
        if !(1..=defaults::MAX_REDUNDANCY).contains(&self.redundancy) {
            errors.push(format!(
                "redundancy must be in [1, {}], got {}",
                defaults::MAX_REDUNDANCY,
                self.redundancy
            ));
        }

        // Chunk geometry: reads must fit in the overlap, and a seed in the
        // first seeded position of a non-first chunk needs its whole left flank.
        if self.max_read_len > self.chunk_overlap {
            errors.push(format!(
                "max_read_len ({}) exceeds chunk overlap ({}); reconvert with a larger overlap",
                self.max_read_len, self.chunk_overlap
            ));
        }
        if 2 * self.flank_len + self.seed_len > self.chunk_overlap + 1 {
            errors.push(format!(
                "flanks ({}) and seed ({}) do not fit in chunk overlap ({})",
                self.flank_len, self.seed_len, self.chunk_overlap
            ));
        }
        if self.chunk_overlap >= self.max_chunk_len {
            errors.push(format!(
                "chunk overlap ({}) must be smaller than max chunk length ({})",
                self.chunk_overlap, self.max_chunk_len
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(BurstError::InvalidConfig(errors.join("; ")))
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct AlignCliOptions {
    /// Reference chunk file (built with 'convert')
    #[arg(value_name = "REF.BR")]
    pub reference: PathBuf,

    /// Read chunk file (built with 'convert')
    #[arg(value_name = "READS.BR")]
    pub reads: PathBuf,

    /// Output alignment record file
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: PathBuf,

    /// Read length; sets both --min-read-len and --max-read-len
    #[arg(short = 'l', long, value_name = "INT")]
    pub read_len: Option<usize>,

    /// Minimum read length
    #[arg(long, value_name = "INT", default_value_t = defaults::MIN_READ_LEN)]
    pub min_read_len: usize,

    /// Maximum read length
    #[arg(long, value_name = "INT", default_value_t = defaults::MAX_READ_LEN)]
    pub max_read_len: usize,

    /// Maximum number of edits (mismatches and indels) per alignment
    #[arg(short = 'k', long, value_name = "INT", default_value_t = defaults::MAX_EDITS)]
    pub max_edits: usize,

    /// Seed length [min_read_len / (k + 1)]
    #[arg(short = 's', long, value_name = "INT")]
    pub seed_len: Option<usize>,

    /// Allow insertions and deletions, not only mismatches
    #[arg(short = 'i', long)]
    pub allow_indels: bool,

    /// Report only the unambiguous best alignment per read
    #[arg(short = 'f', long)]
    pub filter: bool,

    /// Reads and references per join block
    #[arg(short = 'b', long, value_name = "INT", default_value_t = defaults::BLOCK_SIZE)]
    pub block_size: usize,

    /// Copies of each repetitive reference seed
    #[arg(short = 'r', long, value_name = "INT", default_value_t = defaults::REDUNDANCY)]
    pub redundancy: u32,

    /// Chunk overlap the input files were converted with
    #[arg(long, value_name = "INT", default_value_t = defaults::CHUNK_OVERLAP)]
    pub chunk_overlap: usize,
}

impl AlignCliOptions {
    /// Build run options from the command line; `n_threads` is filled in by
    /// the caller once the thread pool is sized.
    pub fn to_opt(&self) -> BurstOpt {
        let mut opt = BurstOpt {
            min_read_len: self.read_len.unwrap_or(self.min_read_len),
            max_read_len: self.read_len.unwrap_or(self.max_read_len),
            max_edits: self.max_edits,
            allow_indels: self.allow_indels,
            filter_alignments: self.filter,
            block_size: self.block_size,
            redundancy: self.redundancy,
            chunk_overlap: self.chunk_overlap,
            ..BurstOpt::default()
        };
        opt.derive_lengths();
        if let Some(seed_len) = self.seed_len {
            opt.seed_len = seed_len;
            opt.derive_flank_len();
        }
        opt
    }
}
