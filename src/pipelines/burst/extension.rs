//! Shared-seed extension.
//!
//! Turns one exact seed hit between a read and a reference into a full-length
//! alignment: extend the left flanks (stored reversed, so the scan runs
//! outward from the seed), check that this seed is the leftmost one the
//! alignment could have been found from, then extend the right flanks with
//! whatever edit budget is left.

use crate::burst_opt::ExtensionParams;
use crate::core::alignment::workspace::BurstWorkspace;
use crate::core::compute::encoding::packed_base_len;

use super::finalization::AlignmentRecord;
use super::seeding::SeedTuple;

/// Extend `query` around the seed it shares with `reference`.
///
/// Returns `None` when either flank needs more than the edit budget, or when
/// another seed of the same read would report the same alignment.
pub fn align_shared_seed(
    ws: &mut BurstWorkspace,
    params: &ExtensionParams,
    query: &SeedTuple,
    reference: &SeedTuple,
) -> Option<AlignmentRecord> {
    let mut ref_start = reference.offset as usize;
    let mut ref_end = ref_start + params.seed_len;
    let mut edits = 0usize;

    if !query.left_flank.is_empty() {
        let Some(left) = params
            .model
            .extend(ws, &reference.left_flank, &query.left_flank, params.max_edits)
            .into_trace()
        else {
            log::trace!(
                "read {} @{}: left flank over budget at ref {}:{}",
                query.id,
                query.offset,
                reference.id,
                reference.offset
            );
            return None;
        };

        if !left.is_leftmost_seed(packed_base_len(&query.left_flank), params.seed_len) {
            log::trace!("not the leftmost seed: read {} ref {}", query, reference);
            return None;
        }

        // A left alignment never reaches further back than the reference
        // flank, which starts at or after position 0.
        ref_start = ref_start.checked_sub(left.align_len)?;
        edits = left.edit_count;
    }

    if !query.right_flank.is_empty() {
        let Some(right) = params
            .model
            .extend(
                ws,
                &reference.right_flank,
                &query.right_flank,
                params.max_edits - edits,
            )
            .into_trace()
        else {
            log::trace!(
                "read {} @{}: right flank over budget at ref {}:{}",
                query.id,
                query.offset,
                reference.id,
                reference.offset
            );
            return None;
        };

        ref_end += right.align_len;
        edits += right.edit_count;
    }

    Some(AlignmentRecord {
        ref_id: reference.id,
        ref_start: u32::try_from(ref_start).ok()?,
        ref_end: u32::try_from(ref_end).ok()?,
        edit_count: u32::try_from(edits).ok()?,
        is_reverse_complement: query.is_reverse_complement,
    })
}
