//! Bounded edit-distance alignment.
//!
//! The extender works outward from an exact seed along one flank at a time
//! and reports the edit script of the cheapest alignment within budget.

pub mod align_info;
pub mod landau_vishkin;
pub mod workspace; // Per-worker scratch tables and decode buffers
