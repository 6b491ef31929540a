//! Alignment finalization.
//!
//! - `record` - the alignment record and its binary/text forms
//! - `best_hits` - best/second-best state inside one join block
//! - `unique` - global unique-best filter (combiner and reducer)

mod best_hits;
mod record;
mod unique;

pub use best_hits::{BestHit, BestHits};
pub use record::{AlignmentRecord, ALIGNMENT_RECORD_LEN};
pub use unique::{combine_top_two, unique_best};
