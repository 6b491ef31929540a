//! Seed generation.
//!
//! References and reads are both turned into `(SeedKey, payload)` pairs. The
//! shuffle then brings every payload sharing a key to the same join.

mod generator;
mod types;

pub use generator::SeedGenerator;
pub use types::{encode_payload, SeedKey, SeedTuple};
