//! Alignment pipelines.
//!
//! - `burst`: seed-and-extend alignment of short reads over key groups

pub mod burst;
