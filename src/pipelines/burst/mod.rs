//! Seed-and-extend alignment pipeline.
//!
//! ```text
//! chunks ─► seeding ─► shuffle (group by seed) ─► join ─► extension
//!                                                   │
//!                                      finalization (best hits, unique best)
//! ```
//!
//! - `chunking` - overlapping reference chunks
//! - `seeding` - seed keys and payloads for references and reads
//! - `shuffle` - emit sink and in-memory key grouping
//! - `join` - per-key cross product in blocks
//! - `extension` - full alignment around one shared seed
//! - `finalization` - alignment records and best-hit filters
//! - `stats` - alignment file summaries
//! - `kmers` - k-mer census over chunk files
//! - `orchestrator` - convert/align/filter/print/stats/display/count runs

pub mod chunking;
pub mod extension;
pub mod finalization;
pub mod join;
pub mod kmers;
pub mod orchestrator;
pub mod seeding;
pub mod shuffle;
pub mod stats;
