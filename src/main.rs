use clap::{Parser, Subcommand};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use ferrous_burst::burst_opt::{AlignCliOptions, ChunkingParams};
use ferrous_burst::defaults;
use ferrous_burst::pipelines::burst::orchestrator::{self, RecordKind};

#[derive(Parser)]
#[command(name = "ferrous-burst")]
#[command(about = "FerrousBurst - seed-and-extend short read aligner for DNA sequences", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose level: 1=error, 2=warning, 3=message, 4=debug, 5+=trace
    #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY, global = true)]
    verbosity: i32,

    /// Number of threads (default: all cores)
    #[arg(short = 't', long, value_name = "INT", global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a FASTA/FASTQ file into a chunk record file
    Convert {
        /// Input FASTA or FASTQ file (optionally gzip/bgzip compressed)
        #[arg(value_name = "SEQS.FA")]
        input: PathBuf,

        /// Output chunk record file; names are written to <OUTPUT>.map
        #[arg(value_name = "OUTPUT.BR")]
        output: PathBuf,

        /// Bases shared by consecutive chunks of one sequence
        #[arg(long, value_name = "INT", default_value_t = defaults::CHUNK_OVERLAP)]
        chunk_overlap: usize,

        /// Maximum chunk length
        #[arg(long, value_name = "INT", default_value_t = defaults::MAX_CHUNK_LEN)]
        max_chunk_len: usize,
    },

    /// Align reads to a reference
    Align(AlignCliOptions),

    /// Keep only the unambiguous best alignment of each read
    Filter {
        /// Alignment record file or directory of parts
        #[arg(value_name = "ALIGNMENTS")]
        input: PathBuf,

        /// Output alignment record file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Print alignments as tab-separated text
    Print {
        /// Alignment record file or directory of parts
        #[arg(value_name = "ALIGNMENTS")]
        input: PathBuf,
    },

    /// Summarize alignment files
    Stats {
        /// Alignment record file or directory of parts
        #[arg(value_name = "ALIGNMENTS")]
        input: PathBuf,
    },

    /// Show every record of a chunk or alignment file as `key -> value`
    Display {
        /// Record file or directory of parts
        #[arg(value_name = "RECORDS")]
        input: PathBuf,

        /// How to decode record values
        #[arg(long, value_enum, default_value_t = RecordKind::Alignment)]
        kind: RecordKind,
    },

    /// Count the k-mers of a converted sequence file
    CountKmers {
        /// Chunk record file or directory of parts
        #[arg(value_name = "SEQS.BR")]
        input: PathBuf,

        /// K-mer length
        #[arg(value_name = "KMER_LEN")]
        kmer_len: usize,

        /// Chunk overlap the input was converted with
        #[arg(long, value_name = "INT", default_value_t = defaults::CHUNK_OVERLAP)]
        chunk_overlap: usize,

        /// Append every `id:pos` occurrence to each k-mer line
        #[arg(long)]
        show_positions: bool,
    },
}

fn init_logger(verbosity: i32) {
    // Map verbosity (1=error, 2=warning, 3=message, 4=debug, 5+=trace)
    let log_level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Size and build the global rayon pool. Returns the thread count in use.
fn init_thread_pool(threads: Option<usize>) -> usize {
    let mut num_threads = threads.unwrap_or_else(num_cpus::get);

    if num_threads < 1 {
        log::warn!("Invalid thread count {}, using 1 thread", num_threads);
        num_threads = 1;
    }

    let max_threads = num_cpus::get() * 2;
    if num_threads > max_threads {
        log::warn!(
            "Thread count {} exceeds recommended maximum {}, capping at {}",
            num_threads,
            max_threads,
            max_threads
        );
        num_threads = max_threads;
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(_) => {
            log::debug!(
                "Successfully built global Rayon thread pool with {} threads",
                num_threads
            );
        }
        Err(e) => {
            log::warn!(
                "Failed to configure thread pool: {} (may already be initialized)",
                e
            );
        }
    }

    let thread_word = if num_threads == 1 { "thread" } else { "threads" };
    log::info!("Using {} {}", num_threads, thread_word);
    num_threads
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbosity);

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            chunk_overlap,
            max_chunk_len,
        } => {
            log::info!("Converting {} into {}", input.display(), output.display());
            let params = ChunkingParams {
                overlap: chunk_overlap,
                max_chunk_len,
            };
            orchestrator::convert_fasta(&input, &output, params).map(|summary| {
                log::info!("Processed {} sequences", summary.sequences);
            })
        }

        Commands::Align(options) => {
            let mut opt = options.to_opt();
            opt.n_threads = init_thread_pool(cli.threads);
            log::info!(
                "Aligning {} against {}",
                options.reads.display(),
                options.reference.display()
            );
            orchestrator::run_alignment(&opt, &options.reference, &options.reads, &options.output)
                .map(|summary| {
                    log::info!(
                        "Wrote {} alignments to {}",
                        summary.alignments_written,
                        options.output.display()
                    );
                })
        }

        Commands::Filter { input, output } => {
            init_thread_pool(cli.threads);
            orchestrator::filter_alignments(&input, &output).map(|_| ())
        }

        Commands::Print { input } => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            orchestrator::print_alignments(&input, &mut writer)
                .and_then(|_| writer.flush().map_err(anyhow::Error::from))
        }

        Commands::Stats { input } => {
            init_thread_pool(cli.threads);
            orchestrator::alignment_stats(&input).map(|stats| {
                println!("{}", stats);
            })
        }

        Commands::Display { input, kind } => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            orchestrator::display_records(&input, kind, &mut writer)
                .and_then(|_| writer.flush().map_err(anyhow::Error::from))
        }

        Commands::CountKmers {
            input,
            kmer_len,
            chunk_overlap,
            show_positions,
        } => {
            init_thread_pool(cli.threads);
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            orchestrator::count_kmers(&input, kmer_len, chunk_overlap, show_positions, &mut writer)
                .and_then(|_| writer.flush().map_err(anyhow::Error::from))
        }
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
