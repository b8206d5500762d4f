//! Conflict resolution between proposed blocks and committed blocks.
//!
//! Rows never interact. Within a row, a proposal that overlaps (or touches)
//! a committed block of the same type is merged into it; one that overlaps
//! a committed block of another type is cut around it.

pub mod gesture;

pub use gesture::{apply_gesture, drag_candidate, draw_candidates, draw_rows};

use std::collections::BTreeMap;

use blockgrid_protocol::{Block, BlockId, TimeSpan};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::timespan::{SECONDS_PER_MINUTE, Timed, overlaps, union_all};

/// Proposals shorter than this are dropped after resolution.
pub const MIN_PROPOSAL_SECS: f64 = 45.0 * SECONDS_PER_MINUTE;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergePolicy {
    pub min_proposal_secs: f64,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            min_proposal_secs: MIN_PROPOSAL_SECS,
        }
    }
}

/// Outcome of resolving proposals against committed blocks.
///
/// Every input block lands in exactly one place: `unchanged` if no proposal
/// touched it, `modified` (by uid) if it absorbed proposals, `deleted` if its
/// identity did not survive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditResult {
    pub unchanged: Vec<Block>,
    pub modified: Vec<Block>,
    pub deleted: Vec<Block>,
}

impl EditResult {
    pub fn unchanged(blocks: Vec<Block>) -> Self {
        Self {
            unchanged: blocks,
            ..Self::default()
        }
    }

    pub fn is_noop(&self) -> bool {
        self.modified.is_empty() && self.deleted.is_empty()
    }

    /// What the grid shows while the edit is pending.
    pub fn visible(&self) -> impl Iterator<Item = &Block> {
        self.unchanged.iter().chain(&self.modified)
    }

    /// Drop proposals shorter than the policy minimum. Blocks whose uid is in
    /// `protected` (identities that already existed) are kept regardless, as
    /// are blocks that are not proposals. Returns how many were dropped.
    pub fn discard_short_proposals(
        &mut self,
        policy: &MergePolicy,
        protected: &FxHashSet<BlockId>,
    ) -> usize {
        let before = self.modified.len();
        self.modified.retain(|b| {
            !b.gestured || b.duration() >= policy.min_proposal_secs || protected.contains(&b.uid)
        });
        let dropped = before - self.modified.len();
        if dropped > 0 {
            trace!(
                dropped,
                min = policy.min_proposal_secs,
                "discarded short proposals"
            );
        }
        dropped
    }
}

/// Cut `cut` out of `candidate`, leaving up to two fragments.
///
/// The earlier fragment keeps the candidate's uid; the later one gets a fresh
/// uid unless it is the only survivor, in which case it inherits the uid.
/// Empty fragments are not produced, so a candidate entirely inside `cut`
/// disappears.
pub fn split_around(candidate: Block, cut: &impl Timed) -> Vec<Block> {
    let (start, end) = (candidate.start_time, candidate.end_time);
    let before = if cut.start_time() > start {
        Some(TimeSpan::new(start, cut.start_time().min(end)))
    } else {
        None
    };
    let after = if end > cut.end_time() {
        Some(TimeSpan::new(cut.end_time().max(start), end))
    } else {
        None
    };

    match (before, after) {
        (Some(before), Some(after)) => {
            let tail = Block {
                uid: BlockId::new(),
                ..candidate.clone()
            }
            .with_span(after);
            vec![candidate.with_span(before), tail]
        }
        (Some(span), None) | (None, Some(span)) => vec![candidate.with_span(span)],
        (None, None) => Vec::new(),
    }
}

/// Resolve `candidates` against `existing`.
///
/// Existing blocks are visited in order. For each, the pending proposals in
/// its row that overlap it are split by type: same-type proposals are folded
/// into the existing block (which keeps its identity and becomes a proposal
/// itself), other-type proposals are cut around it. Proposals nothing touched
/// pass through. No duration filtering happens here.
pub fn merge_and_split(
    candidates: Vec<Block>,
    existing: impl IntoIterator<Item = Block>,
) -> EditResult {
    let mut pending: BTreeMap<u32, Vec<Block>> = BTreeMap::new();
    for candidate in candidates {
        pending.entry(candidate.row).or_default().push(candidate);
    }

    let mut edit = EditResult::default();
    let mut absorbed: Vec<Block> = Vec::new();

    for block in existing {
        let Some(row) = pending.get_mut(&block.row) else {
            edit.unchanged.push(block);
            continue;
        };

        let (matching, mut next): (Vec<Block>, Vec<Block>) = std::mem::take(row)
            .into_iter()
            .partition(|c| overlaps(c, &block));
        if matching.is_empty() {
            *row = next;
            edit.unchanged.push(block);
            continue;
        }

        let (same, differing): (Vec<Block>, Vec<Block>) = matching
            .into_iter()
            .partition(|c| c.block_type == block.block_type);

        let cut = block.span();
        for candidate in differing {
            next.extend(split_around(candidate, &cut));
        }

        if same.is_empty() {
            edit.unchanged.push(block);
        } else {
            let mut spans = Vec::with_capacity(same.len() + 1);
            spans.push(cut);
            spans.extend(same.iter().map(Block::span));
            let merged = Block {
                gestured: true,
                ..block.clone()
            }
            .with_span(union_all(&spans));
            trace!(uid = %block.uid, absorbed = same.len(), "merged proposals into block");
            absorbed.push(block);
            next.push(merged);
        }
        *row = next;
    }

    edit.modified = pending.into_values().flatten().collect();

    let surviving: FxHashSet<BlockId> = edit.modified.iter().map(|b| b.uid).collect();
    edit.deleted = absorbed
        .into_iter()
        .filter(|b| !surviving.contains(&b.uid))
        .collect();

    debug!(
        unchanged = edit.unchanged.len(),
        modified = edit.modified.len(),
        deleted = edit.deleted.len(),
        "resolved proposals"
    );
    edit
}
