//! Best/second-best tracking inside one join block.
//!
//! Each query tuple of the current block keeps its best alignment and, when
//! another alignment ties it, the most recent tie. Keeping a tie around is
//! what lets the global filter recognise an ambiguous read later.

use super::record::AlignmentRecord;

/// Best-hit state for one query tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestHit {
    /// Starts at `k + 1`, so any in-budget alignment replaces it
    pub best_edit_count: u32,
    pub best: Option<AlignmentRecord>,
    pub second: Option<AlignmentRecord>,
    pub has_tie: bool,
}

impl BestHit {
    pub fn new(max_edits: u32) -> Self {
        Self {
            best_edit_count: max_edits.saturating_add(1),
            best: None,
            second: None,
            has_tie: false,
        }
    }

    /// Fewer edits replace the best and clear the tie. A different alignment
    /// with equal edits becomes the second and sets the tie. Anything worse,
    /// or a repeat of the best itself, is dropped.
    pub fn offer(&mut self, candidate: AlignmentRecord) {
        if candidate.edit_count < self.best_edit_count {
            self.best_edit_count = candidate.edit_count;
            self.best = Some(candidate);
            self.has_tie = false;
        } else if candidate.edit_count == self.best_edit_count
            && self.best.is_some_and(|best| best != candidate)
        {
            self.second = Some(candidate);
            self.has_tie = true;
        }
    }

    /// The best alignment, then the second if it ties the best.
    pub fn results(&self) -> impl Iterator<Item = AlignmentRecord> {
        let second = if self.has_tie { self.second } else { None };
        self.best.into_iter().chain(second)
    }
}

/// Best-hit state for every query tuple of one block.
#[derive(Debug, Clone)]
pub struct BestHits {
    max_edits: u32,
    hits: Vec<BestHit>,
}

impl BestHits {
    pub fn new(max_edits: u32) -> Self {
        Self {
            max_edits,
            hits: Vec::new(),
        }
    }

    /// Clear all state and size for a block of `n` query tuples.
    pub fn reset(&mut self, n: usize) {
        self.hits.clear();
        self.hits.resize(n, BestHit::new(self.max_edits));
    }

    #[inline]
    pub fn offer(&mut self, query_index: usize, candidate: AlignmentRecord) {
        self.hits[query_index].offer(candidate);
    }

    pub fn get(&self, query_index: usize) -> &BestHit {
        &self.hits[query_index]
    }
}
