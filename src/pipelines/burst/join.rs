//! Seed join.
//!
//! One key group holds every reference and read occurrence of one seed. The
//! join splits it into reference and query tuples and extends every
//! query/reference pair. Pairs are visited in `block_size × block_size` blocks,
//! query blocks outermost, which keeps a block's tuples hot in cache. The
//! block size changes the visiting order only, never the result set.

use std::ops::AddAssign;

use crate::burst_opt::{ExtensionParams, JoinParams};
use crate::core::alignment::workspace::BurstWorkspace;
use crate::error::Result;

use super::extension::align_shared_seed;
use super::finalization::{AlignmentRecord, BestHits};
use super::seeding::SeedTuple;
use super::shuffle::Emit;

/// Counters for one or more joined groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub groups: usize,
    pub reference_tuples: usize,
    pub query_tuples: usize,
    /// Query/reference pairs extended
    pub extensions: usize,
    /// Alignment records emitted
    pub alignments: usize,
}

impl AddAssign for JoinStats {
    fn add_assign(&mut self, other: Self) {
        self.groups += other.groups;
        self.reference_tuples += other.reference_tuples;
        self.query_tuples += other.query_tuples;
        self.extensions += other.extensions;
        self.alignments += other.alignments;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SeedJoin {
    extension: ExtensionParams,
    join: JoinParams,
}

impl SeedJoin {
    pub fn new(extension: ExtensionParams, join: JoinParams) -> Self {
        Self { extension, join }
    }

    /// Join one key group and emit alignments keyed by read id.
    ///
    /// With filtering on, each query tuple emits only its best alignment
    /// (plus one tie) per query block. A payload that fails to decode aborts
    /// the whole group.
    pub fn join_group<E>(
        &self,
        ws: &mut BurstWorkspace,
        payloads: &[Vec<u8>],
        out: &mut E,
    ) -> Result<JoinStats>
    where
        E: Emit<u32, AlignmentRecord>,
    {
        let mut references = Vec::new();
        let mut queries = Vec::new();
        for raw in payloads {
            let tuple = SeedTuple::from_bytes(raw)?;
            if tuple.is_reference {
                references.push(tuple);
            } else {
                queries.push(tuple);
            }
        }

        let mut stats = JoinStats {
            groups: 1,
            reference_tuples: references.len(),
            query_tuples: queries.len(),
            ..Default::default()
        };
        if references.is_empty() || queries.is_empty() {
            return Ok(stats);
        }

        let block_size = self.join.block_size.max(1);
        let filter = self.join.filter_alignments;
        let max_edits = u32::try_from(self.join.max_edits).unwrap_or(u32::MAX);
        let mut best = BestHits::new(max_edits);

        for query_block in queries.chunks(block_size) {
            if filter {
                best.reset(query_block.len());
            }

            for reference_block in references.chunks(block_size) {
                for (qi, query) in query_block.iter().enumerate() {
                    for reference in reference_block {
                        stats.extensions += 1;
                        let Some(record) = align_shared_seed(ws, &self.extension, query, reference)
                        else {
                            continue;
                        };
                        if filter {
                            best.offer(qi, record);
                        } else {
                            out.emit(query.id, record);
                            stats.alignments += 1;
                        }
                    }
                }
            }

            if filter {
                for (qi, query) in query_block.iter().enumerate() {
                    for record in best.get(qi).results() {
                        out.emit(query.id, record);
                        stats.alignments += 1;
                    }
                }
            }
        }

        Ok(stats)
    }
}
