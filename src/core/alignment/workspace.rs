//! Per-worker scratch for the extender.
//!
//! The Landau-Vishkin tables and the flank decode buffers are reused across
//! every extension a worker performs. Nothing in here is global: the reduce
//! phase creates one [`BurstWorkspace`] per rayon worker (`map_init`) and
//! passes it down explicitly.
//!
//! Reuse never leaks between alignments. Every cell of the tables that a
//! k-difference pass reads is written earlier in the same pass, and every
//! returned trace is a freshly built [`AlignInfo`](super::align_info::AlignInfo).

use super::align_info::EditOp;

/// Furthest-row (`L`) and back-pointer (`B`) tables for budgets up to `k`.
///
/// Both are `(2k + 1) x (k + 1)` grids, flattened row-major with the diagonal
/// as the row: cell `(d, e)` lives at `(k + d) * (k + 1) + e`.
#[derive(Debug, Clone)]
pub struct LvTables {
    k: usize,
    furthest: Vec<isize>,
    back: Vec<EditOp>,
}

impl LvTables {
    pub fn new(k: usize) -> Self {
        let cells = Self::cells(k);
        Self {
            k,
            furthest: vec![0; cells],
            back: vec![EditOp::Mismatch; cells],
        }
    }

    #[inline]
    const fn cells(k: usize) -> usize {
        (2 * k + 1) * (k + 1)
    }

    /// Budget the tables are currently laid out for.
    #[inline]
    pub fn budget(&self) -> usize {
        self.k
    }

    /// Re-lay the tables out for budget `k`. Grows the allocation only when
    /// `k` is larger than anything seen before.
    pub fn ensure(&mut self, k: usize) {
        if k == self.k {
            return;
        }
        let cells = Self::cells(k);
        self.furthest.resize(cells, 0);
        self.back.resize(cells, EditOp::Mismatch);
        self.k = k;
    }

    #[inline(always)]
    fn index(&self, d: isize, e: usize) -> usize {
        debug_assert!(d.unsigned_abs() <= self.k && e <= self.k);
        (self.k as isize + d) as usize * (self.k + 1) + e
    }

    #[inline(always)]
    pub(crate) fn furthest(&self, d: isize, e: usize) -> isize {
        self.furthest[self.index(d, e)]
    }

    #[inline(always)]
    pub(crate) fn back(&self, d: isize, e: usize) -> EditOp {
        self.back[self.index(d, e)]
    }

    #[inline(always)]
    pub(crate) fn set(&mut self, d: isize, e: usize, row: isize, back: EditOp) {
        let i = self.index(d, e);
        self.furthest[i] = row;
        self.back[i] = back;
    }
}

/// Everything one worker needs to run extensions without allocating per call.
#[derive(Debug, Clone)]
pub struct BurstWorkspace {
    /// k-difference tables
    pub tables: LvTables,
    /// Decoded reference flank (ASCII)
    pub text: Vec<u8>,
    /// Decoded read flank (ASCII)
    pub pattern: Vec<u8>,
}

impl BurstWorkspace {
    /// Workspace sized for edit budget `k` and flanks up to `flank_len` bases.
    pub fn new(k: usize, flank_len: usize) -> Self {
        Self {
            tables: LvTables::new(k),
            text: Vec::with_capacity(flank_len),
            pattern: Vec::with_capacity(flank_len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_layout() {
        let mut t = LvTables::new(2);
        assert_eq!(t.furthest.len(), 15);
        t.set(-2, 0, 7, EditOp::Deletion);
        t.set(2, 2, 9, EditOp::Insertion);
        assert_eq!(t.furthest(-2, 0), 7);
        assert_eq!(t.back(-2, 0), EditOp::Deletion);
        assert_eq!(t.furthest(2, 2), 9);
        assert_eq!(t.furthest[14], 9);
    }

    #[test]
    fn test_ensure_resizes() {
        let mut t = LvTables::new(1);
        t.ensure(4);
        assert_eq!(t.budget(), 4);
        assert_eq!(t.furthest.len(), 45);
        t.set(4, 4, 3, EditOp::Mismatch);
        assert_eq!(t.furthest(4, 4), 3);

        t.ensure(0);
        assert_eq!(t.budget(), 0);
        t.set(0, 0, 11, EditOp::Mismatch);
        assert_eq!(t.furthest(0, 0), 11);
    }
}
