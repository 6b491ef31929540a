//! Alignment traces produced by the Landau-Vishkin extender.
//!
//! An [`AlignInfo`] is a compact edit script: `dist[i]` is the number of read
//! positions advanced before edit event `i` is applied, and `what[i]` names
//! that event. The final entry is always [`EditOp::EndOfString`].
//!
//! ```text
//! reference: ACGT-ACCTA      dist = [4, 3, 3]
//! read:      ACGTTACGTA      what = [Insertion, Mismatch, EndOfString]
//! ```

use std::fmt;

/// Edit event recorded in a trace.
///
/// The discriminants are the wire/debug codes used in the text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum EditOp {
    /// Substitution: both strings advance one base.
    Mismatch = 0,
    /// Read base with no reference counterpart (gap in the reference row).
    Insertion = 1,
    /// Reference base with no read counterpart (gap in the read row).
    Deletion = -1,
    /// Terminal marker: the shorter string was exhausted.
    EndOfString = 2,
}

impl EditOp {
    #[inline]
    pub const fn code(self) -> i8 {
        self as i8
    }

    /// Diagonal shift from the predecessor cell during backtrace.
    #[inline]
    pub(crate) const fn diagonal_shift(self) -> isize {
        match self {
            EditOp::Deletion => -1,
            EditOp::Insertion => 1,
            EditOp::Mismatch | EditOp::EndOfString => 0,
        }
    }
}

/// Edit script for one extension.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlignInfo {
    /// Reference (text) bases consumed by the alignment.
    pub align_len: usize,
    /// Number of edits (mismatches + indels).
    pub edit_count: usize,
    /// Match-run lengths preceding each event.
    pub dist: Vec<usize>,
    /// Event tags, parallel to `dist`.
    pub what: Vec<EditOp>,
}

impl AlignInfo {
    /// The zero-length, zero-edit trace of an extension with nothing to align.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of entries in the edit script.
    #[inline]
    pub fn trace_len(&self) -> usize {
        self.dist.len()
    }

    /// Iterate `(dist, what)` pairs.
    pub fn events(&self) -> impl Iterator<Item = (usize, EditOp)> + '_ {
        self.dist.iter().copied().zip(self.what.iter().copied())
    }

    /// Read bases covered by the trace.
    pub fn query_len(&self) -> usize {
        // Deletions consume no read base; every other event's base is
        // counted in the run that follows it.
        self.dist.iter().sum()
    }

    /// Decide whether the seed that produced this trace is the leftmost seed
    /// consistent with the alignment.
    ///
    /// The trace must come from the (reversed) left flank, so bucket 0 is the
    /// seed-sized partition adjacent to the seed and bucket `buckets - 1` is
    /// the start of the read. An alignment found from seed partition `j` is
    /// reported only if every partition to its left contains an edit, which
    /// makes partition `j` the first edit-free one.
    ///
    /// Deletions that fall exactly between two buckets cannot be attributed
    /// to either and are skipped.
    pub fn is_leftmost_seed(&self, query_len: usize, seed_len: usize) -> bool {
        debug_assert!(seed_len > 0);
        let buckets = (query_len / seed_len) as isize;

        let mut last_bucket: isize = -1;
        let mut pos = 0usize;

        for (dist, what) in self.events() {
            pos += dist;

            match what {
                EditOp::EndOfString => continue,
                EditOp::Deletion if pos % seed_len == 0 => continue,
                _ => {}
            }

            let bucket = (pos / seed_len) as isize;
            if bucket - last_bucket > 1 {
                return false;
            }
            last_bucket = bucket;
        }

        last_bucket == buckets - 1
    }

    /// Render the alignment as three rows (edit markers, text, pattern) for
    /// debug logging. `text` and `pattern` are the ASCII strings that were
    /// aligned.
    pub fn render(&self, text: &[u8], pattern: &[u8]) -> String {
        let mut markers = String::new();
        let mut text_row = String::new();
        let mut pattern_row = String::new();

        let base = |seq: &[u8], i: usize| seq.get(i).map_or('-', |&b| b as char);
        let mut tpos = 0usize;
        let mut ppos = 0usize;
        // A mismatch or insertion's read base is counted in the next run.
        let mut carried = 0usize;

        for (dist, what) in self.events() {
            let mut matches = dist.saturating_sub(carried);
            if what == EditOp::EndOfString {
                matches = matches.min(pattern.len().saturating_sub(ppos));
            }
            for _ in 0..matches {
                markers.push(' ');
                text_row.push(base(text, tpos));
                pattern_row.push(base(pattern, ppos));
                tpos += 1;
                ppos += 1;
            }

            match what {
                EditOp::EndOfString => break,
                EditOp::Mismatch => {
                    text_row.push(base(text, tpos));
                    pattern_row.push(base(pattern, ppos));
                    tpos += 1;
                    ppos += 1;
                }
                EditOp::Insertion => {
                    text_row.push('-');
                    pattern_row.push(base(pattern, ppos));
                    ppos += 1;
                }
                EditOp::Deletion => {
                    text_row.push(base(text, tpos));
                    pattern_row.push('-');
                    tpos += 1;
                }
            }
            markers.push('*');
            carried = usize::from(matches!(what, EditOp::Mismatch | EditOp::Insertion));
        }

        format!("a: {}\nt: {}\np: {}", markers.trim_end(), text_row, pattern_row)
    }
}

/// `align_len;edit_count;dist...;what...;`
impl fmt::Display for AlignInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};", self.align_len, self.edit_count)?;
        for d in &self.dist {
            write!(f, "{};", d)?;
        }
        for w in &self.what {
            write!(f, "{};", w.code())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(dist: &[usize], what: &[EditOp]) -> AlignInfo {
        AlignInfo {
            align_len: 0,
            edit_count: what.len().saturating_sub(1),
            dist: dist.to_vec(),
            what: what.to_vec(),
        }
    }

    #[test]
    fn test_empty_trace() {
        let a = AlignInfo::empty();
        assert_eq!(a.trace_len(), 0);
        assert_eq!(a.edit_count, 0);
        // No read bases to cover: leftmost only when there are no buckets.
        assert!(a.is_leftmost_seed(0, 5));
        assert!(!a.is_leftmost_seed(5, 5));
    }

    #[test]
    fn test_exact_trace_is_not_leftmost_when_buckets_remain() {
        let a = trace(&[10], &[EditOp::EndOfString]);
        assert!(!a.is_leftmost_seed(10, 5));
    }

    #[test]
    fn test_one_edit_per_bucket_is_leftmost() {
        // Mismatch in bucket 0 (pos 2), mismatch in bucket 1 (pos 7).
        let a = trace(
            &[2, 5, 3],
            &[EditOp::Mismatch, EditOp::Mismatch, EditOp::EndOfString],
        );
        assert!(a.is_leftmost_seed(10, 5));
    }

    #[test]
    fn test_skipped_bucket_is_not_leftmost() {
        // Only bucket 1 has an edit; bucket 0 is edit-free.
        let a = trace(&[7, 3], &[EditOp::Mismatch, EditOp::EndOfString]);
        assert!(!a.is_leftmost_seed(10, 5));
    }

    #[test]
    fn test_boundary_deletion_is_skipped() {
        // Deletion exactly between buckets 0 and 1 does not count for either.
        let a = trace(&[5, 5], &[EditOp::Deletion, EditOp::EndOfString]);
        assert!(!a.is_leftmost_seed(10, 5));
        // Same deletion off the boundary lands in bucket 0.
        let b = trace(&[4, 6], &[EditOp::Deletion, EditOp::EndOfString]);
        assert!(b.is_leftmost_seed(5, 5));
    }

    #[test]
    fn test_display_format() {
        let a = AlignInfo {
            align_len: 10,
            edit_count: 1,
            dist: vec![4, 6],
            what: vec![EditOp::Deletion, EditOp::EndOfString],
        };
        assert_eq!(a.to_string(), "10;1;4;6;-1;2;");
    }

    #[test]
    fn test_render_mismatch() {
        let a = trace(&[2, 2], &[EditOp::Mismatch, EditOp::EndOfString]);
        let out = a.render(b"ACGT", b"ACTT");
        assert_eq!(out, "a:   *\nt: ACGT\np: ACTT");
    }

    #[test]
    fn test_query_len() {
        let a = trace(
            &[3, 2, 4],
            &[EditOp::Deletion, EditOp::Insertion, EditOp::EndOfString],
        );
        assert_eq!(a.query_len(), 9);
    }
}
