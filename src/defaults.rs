// src/defaults.rs

// Read geometry
pub const MIN_READ_LEN: usize = 36;
pub const MAX_READ_LEN: usize = 36;
pub const MAX_EDITS: usize = 3;

// Chunking
pub const CHUNK_OVERLAP: usize = 1024;
pub const MAX_CHUNK_LEN: usize = 65535;

// Join
pub const BLOCK_SIZE: usize = 128;
pub const REDUNDANCY: u32 = 1;
pub const MAX_REDUNDANCY: u32 = 256;

// Other Constants
pub const VERBOSITY: i32 = 3;
pub const ALLOW_INDELS: bool = false;
pub const FILTER_ALIGNMENTS: bool = false;
