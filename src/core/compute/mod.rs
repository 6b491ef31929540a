//! Sequence encodings.

pub mod encoding;
