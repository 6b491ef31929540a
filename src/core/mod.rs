//! Core reusable components.
//!
//! These know nothing about seeds or key groups: the DNA codec, the bounded
//! edit-distance extender, and the record/sequence file formats.

pub mod alignment;
pub mod compute;
pub mod io;
