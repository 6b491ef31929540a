//! ferrous-burst: seed-and-extend short-read alignment.
//!
//! Reads and reference chunks are cut into exact seeds, grouped by seed, and
//! every shared seed is extended with a bounded edit-distance (Landau-Vishkin)
//! alignment. See [`pipelines::burst`] for the end-to-end flow.

pub mod burst_opt;
pub mod core;
pub mod defaults;
pub mod error;
pub mod pipelines;
pub mod utils;
