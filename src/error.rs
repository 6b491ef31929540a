//! Library error type.
//!
//! Budget-exceeded extensions are not errors; they are an ordinary
//! [`Extension`](crate::core::alignment::landau_vishkin::Extension) outcome.

use std::io;

/// Errors returned by the aligner's library API.
#[derive(thiserror::Error, Debug)]
pub enum BurstError {
    /// A read's length falls outside the configured bounds. This means the run
    /// is misconfigured, so it aborts the partition rather than skipping.
    #[error("read {id}: length {len} outside configured range [{min}, {max}]")]
    ReadLength {
        id: u32,
        len: usize,
        min: usize,
        max: usize,
    },

    /// A binary record could not be decoded.
    #[error("malformed {kind} record: {reason}")]
    MalformedRecord { kind: &'static str, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl BurstError {
    pub(crate) fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        BurstError::MalformedRecord {
            kind,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BurstError>;
