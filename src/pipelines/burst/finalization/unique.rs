//! Global unique-best filter.
//!
//! Runs after the join over every alignment of a read, wherever it was
//! found. Partial lists are first shrunk to their top two by
//! [`combine_top_two`]; [`unique_best`] then keeps the best only when no other
//! alignment has the same edit count. The same alignment reported twice, for
//! example by two seeds of one read, is not a tie.

use super::record::AlignmentRecord;

/// The best alignment and, if another alignment ties it, the last such tie.
/// Two records are always enough to tell a tie apart from a unique best.
pub fn combine_top_two(records: impl IntoIterator<Item = AlignmentRecord>) -> Vec<AlignmentRecord> {
    let mut iter = records.into_iter();
    let Some(mut best) = iter.next() else {
        return Vec::new();
    };
    let mut second = None;

    for record in iter {
        if record.edit_count < best.edit_count {
            best = record;
            second = None;
        } else if record.edit_count == best.edit_count && record != best {
            second = Some(record);
        }
    }

    std::iter::once(best).chain(second).collect()
}

/// The best alignment, or `None` when the best edit count is shared.
pub fn unique_best(records: impl IntoIterator<Item = AlignmentRecord>) -> Option<AlignmentRecord> {
    let mut iter = records.into_iter();
    let mut best = iter.next()?;
    let mut unique = true;

    for record in iter {
        if record.edit_count < best.edit_count {
            best = record;
            unique = true;
        } else if record.edit_count == best.edit_count && record != best {
            unique = false;
        }
    }

    unique.then_some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(start: u32, edit_count: u32) -> AlignmentRecord {
        AlignmentRecord {
            ref_id: 3,
            ref_start: start,
            ref_end: start + 30,
            edit_count,
            is_reverse_complement: start % 2 == 1,
        }
    }

    #[test]
    fn test_combiner_keeps_top_two() {
        assert_eq!(
            combine_top_two([rec(0, 2), rec(1, 1), rec(2, 3), rec(3, 1)]),
            vec![rec(1, 1), rec(3, 1)]
        );
        assert_eq!(combine_top_two([rec(0, 2), rec(1, 2), rec(2, 0)]), vec![rec(2, 0)]);
        assert!(combine_top_two([]).is_empty());
    }

    #[test]
    fn test_unique_best() {
        assert_eq!(unique_best([rec(0, 2), rec(1, 1), rec(2, 3)]), Some(rec(1, 1)));
        assert_eq!(unique_best([rec(0, 1), rec(1, 1)]), None);
        // A strictly better alignment after a tie is unique again.
        assert_eq!(unique_best([rec(0, 1), rec(1, 1), rec(2, 0)]), Some(rec(2, 0)));
        assert_eq!(unique_best([]), None);
    }

    #[test]
    fn test_repeated_alignment_is_not_a_tie() {
        assert_eq!(combine_top_two([rec(4, 1), rec(4, 1)]), vec![rec(4, 1)]);
        assert_eq!(unique_best([rec(4, 1), rec(4, 1), rec(8, 2)]), Some(rec(4, 1)));
        assert_eq!(unique_best([rec(4, 1), rec(4, 1), rec(6, 1)]), None);
    }

    #[test]
    fn test_combiner_preserves_reducer_answer() {
        let groups = [
            vec![rec(0, 3), rec(1, 2), rec(2, 2), rec(3, 1)],
            vec![rec(0, 2), rec(1, 2)],
            vec![rec(4, 0)],
        ];
        for records in groups {
            let direct = unique_best(records.clone());
            let combined = unique_best(combine_top_two(records));
            assert_eq!(direct, combined);
        }
    }
}
