//! Bounded edit-distance extension (Landau-Vishkin).
//!
//! Two edit models extend a seed outward along one flank:
//!
//! - **k-mismatch**: substitutions only. A position-by-position scan over the
//!   shorter of the two strings. Available over ASCII ([`kmismatch`]) and
//!   directly over packed-4 bytes ([`kmismatch_packed`]); both produce the
//!   same trace for the same bases.
//! - **k-difference**: substitutions and indels. The classic Landau-Vishkin
//!   diagonal scan ([`kdifference`]). Budgets are tried from 0 upward and the
//!   scan stops the first time either string is exhausted, so the returned
//!   trace always has the *minimum* edit count.
//!
//! Both models stop as soon as either string runs out. An alignment may
//! therefore cover only a prefix of the longer input, which is how reads that
//! overhang the true end of a reference sequence are handled.

use super::align_info::{AlignInfo, EditOp};
use super::workspace::{BurstWorkspace, LvTables};
use crate::core::compute::encoding::{decode_into, packed_base_len};

/// Outcome of a single flank extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    /// The flank aligned within budget.
    Aligned(AlignInfo),
    /// Text or pattern was empty: zero length, zero edits.
    Empty,
    /// Every alignment needs more edits than the budget allows.
    BudgetExceeded,
}

impl Extension {
    /// The trace for a successful extension. [`Extension::Empty`] yields the
    /// empty trace; [`Extension::BudgetExceeded`] yields `None`.
    pub fn into_trace(self) -> Option<AlignInfo> {
        match self {
            Extension::Aligned(info) => Some(info),
            Extension::Empty => Some(AlignInfo::empty()),
            Extension::BudgetExceeded => None,
        }
    }

    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self, Extension::BudgetExceeded)
    }
}

/// Which edit model extends flanks. Chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditModel {
    /// Substitutions only, evaluated on packed bytes.
    Mismatch,
    /// Substitutions and indels.
    Difference,
}

impl EditModel {
    pub fn from_allow_indels(allow_indels: bool) -> Self {
        if allow_indels {
            EditModel::Difference
        } else {
            EditModel::Mismatch
        }
    }

    /// Extend one packed-4 flank pair with at most `k` edits.
    ///
    /// The reference flank is the text, the read flank is the pattern. Left
    /// flanks must already be stored reversed.
    pub fn extend(
        self,
        ws: &mut BurstWorkspace,
        ref_flank: &[u8],
        query_flank: &[u8],
        k: usize,
    ) -> Extension {
        match self {
            EditModel::Mismatch => kmismatch_packed(ref_flank, query_flank, k),
            EditModel::Difference => {
                ws.text.clear();
                decode_into(ref_flank, &mut ws.text);
                ws.pattern.clear();
                decode_into(query_flank, &mut ws.pattern);
                kdifference(&mut ws.tables, &ws.text, &ws.pattern, k)
            }
        }
    }
}

// ============================================================================
// K-MISMATCH
// ============================================================================

/// Running state of a mismatch-only scan.
///
/// A mismatched base is counted in the run that follows it, so `dist` sums to
/// the number of positions compared.
struct MismatchScan {
    dist: Vec<usize>,
    run: usize,
    k: usize,
}

impl MismatchScan {
    fn new(k: usize) -> Self {
        Self {
            dist: Vec::with_capacity(k + 1),
            run: 0,
            k,
        }
    }

    #[inline(always)]
    fn matches(&mut self, bases: usize) {
        self.run += bases;
    }

    /// Record one compared position. Returns `false` once the budget is
    /// exceeded.
    #[inline(always)]
    fn compare(&mut self, equal: bool) -> bool {
        if !equal {
            self.dist.push(self.run);
            self.run = 0;
            if self.dist.len() > self.k {
                return false;
            }
        }
        self.run += 1;
        true
    }

    fn finish(mut self, align_len: usize) -> AlignInfo {
        let edit_count = self.dist.len();
        self.dist.push(self.run);
        let mut what = vec![EditOp::Mismatch; edit_count];
        what.push(EditOp::EndOfString);
        AlignInfo {
            align_len,
            edit_count,
            dist: self.dist,
            what,
        }
    }
}

/// Count mismatches between two ASCII strings over their common length.
pub fn kmismatch(text: &[u8], pattern: &[u8], k: usize) -> Extension {
    if text.is_empty() || pattern.is_empty() {
        return Extension::Empty;
    }

    let last = text.len().min(pattern.len());
    let mut scan = MismatchScan::new(k);
    for (t, p) in text[..last].iter().zip(&pattern[..last]) {
        if !scan.compare(t == p) {
            return Extension::BudgetExceeded;
        }
    }

    Extension::Aligned(scan.finish(last))
}

/// [`kmismatch`] computed directly on packed-4 buffers.
///
/// Whole bytes are compared two bases at a time. When the common length is
/// odd, only the high nibble of the final byte is compared: the low nibble is
/// either a pad or a base beyond the end of the shorter string.
pub fn kmismatch_packed(text: &[u8], pattern: &[u8], k: usize) -> Extension {
    let n = packed_base_len(text);
    let m = packed_base_len(pattern);
    if n == 0 || m == 0 {
        return Extension::Empty;
    }

    let last = n.min(m);
    let whole = last / 2;
    let mut scan = MismatchScan::new(k);

    for (&t, &p) in text[..whole].iter().zip(&pattern[..whole]) {
        if t == p {
            scan.matches(2);
            continue;
        }
        let diff = t ^ p;
        if !scan.compare(diff & 0xF0 == 0) || !scan.compare(diff & 0x0F == 0) {
            return Extension::BudgetExceeded;
        }
    }

    if last % 2 == 1 && !scan.compare((text[whole] ^ pattern[whole]) & 0xF0 == 0) {
        return Extension::BudgetExceeded;
    }

    Extension::Aligned(scan.finish(last))
}

// ============================================================================
// K-DIFFERENCE
// ============================================================================

/// Landau-Vishkin k-difference alignment of `pattern` (read) against `text`
/// (reference), both ASCII, anchored at position 0 of each.
///
/// `tables` is re-laid out for `k` if needed; no cell is read before this
/// call writes it.
pub fn kdifference(tables: &mut LvTables, text: &[u8], pattern: &[u8], k: usize) -> Extension {
    if text.is_empty() || pattern.is_empty() {
        return Extension::Empty;
    }

    tables.ensure(k);
    let m = pattern.len() as isize;
    let n = text.len() as isize;

    for e in 0..=k {
        let ei = e as isize;
        for d in -ei..=ei {
            let (mut row, back) = if e == 0 {
                (0, EditOp::Mismatch)
            } else {
                let mut best = (-1isize, EditOp::Mismatch);
                if d.abs() < ei {
                    let up = tables.furthest(d, e - 1) + 1;
                    if up > best.0 {
                        best = (up, EditOp::Mismatch);
                    }
                }
                if d > -(ei - 1) {
                    let left = tables.furthest(d - 1, e - 1);
                    if left > best.0 {
                        best = (left, EditOp::Deletion);
                    }
                }
                if d < ei - 1 {
                    let right = tables.furthest(d + 1, e - 1) + 1;
                    if right > best.0 {
                        best = (right, EditOp::Insertion);
                    }
                }
                best
            };

            while row < m && row + d < n && pattern[row as usize] == text[(row + d) as usize] {
                row += 1;
            }
            tables.set(d, e, row, back);

            if row + d >= n || row >= m {
                return Extension::Aligned(backtrace(tables, e, d, (row + d) as usize));
            }
        }
    }

    Extension::BudgetExceeded
}

/// Rebuild `dist`/`what` by walking the back-pointers from `(d_end, e_end)`.
fn backtrace(tables: &LvTables, e_end: usize, d_end: isize, align_len: usize) -> AlignInfo {
    let mut dist = vec![0usize; e_end + 1];
    let mut what = vec![EditOp::EndOfString; e_end + 1];

    let mut d = d_end;
    for e in (0..=e_end).rev() {
        dist[e] = tables.furthest(d, e) as usize;
        if e < e_end {
            dist[e + 1] -= dist[e];
        }
        if e > 0 {
            let op = tables.back(d, e);
            what[e - 1] = op;
            d += op.diagonal_shift();
        }
    }

    AlignInfo {
        align_len,
        edit_count: e_end,
        dist,
        what,
    }
}
