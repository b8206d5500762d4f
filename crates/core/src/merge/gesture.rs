use std::ops::RangeInclusive;

use blockgrid_protocol::{Block, BlockId, BlockType, TimeIndex, TimeSpan};
use rustc_hash::FxHashSet;
use tracing::debug;

use super::{EditResult, MergePolicy, merge_and_split};
use crate::gestures::{DragMode, Gesture};

/// Every row between two rows, inclusive, whichever is larger.
pub fn draw_rows(a: u32, b: u32) -> RangeInclusive<u32> {
    a.min(b)..=a.max(b)
}

/// One proposal per row covered by a draw gesture, spanning the two time
/// indices in chronological order.
pub fn draw_candidates(
    origin: TimeIndex,
    destination: TimeIndex,
    block_type: &BlockType,
) -> Vec<Block> {
    let span = TimeSpan::new(
        origin.seconds.min(destination.seconds),
        origin.seconds.max(destination.seconds),
    );
    draw_rows(origin.row, destination.row)
        .map(|row| Block::proposal(row, block_type.clone(), span))
        .collect()
}

/// Where a dragged block ends up after moving the pointer by `delta` seconds.
///
/// Edge drags cannot push one edge past the other; the block collapses to
/// zero length instead.
pub fn drag_candidate(block: &Block, mode: DragMode, delta: f64, destination_row: u32) -> Block {
    let (start, end, row) = match mode {
        DragMode::Left => (
            (block.start_time + delta).min(block.end_time),
            block.end_time,
            block.row,
        ),
        DragMode::Right => (
            block.start_time,
            (block.end_time + delta).max(block.start_time),
            block.row,
        ),
        DragMode::Both => (
            block.start_time + delta,
            block.end_time + delta,
            destination_row,
        ),
    };
    Block {
        row,
        gestured: true,
        ..block.clone()
    }
    .with_span(TimeSpan::new(start, end))
}

/// The edit a gesture implies for `blocks`. Gestures that do not edit
/// (idle, selection, a draw that has not moved yet) leave every block
/// unchanged.
pub fn apply_gesture(gesture: &Gesture, blocks: &[Block], policy: &MergePolicy) -> EditResult {
    match gesture {
        Gesture::MultiDraw {
            origin,
            destination: Some(destination),
            block_type,
        } => multidraw(*origin, *destination, block_type, blocks, policy),
        Gesture::Drag {
            origin,
            destination,
            drag_mode,
            block,
        } => drag(
            block,
            *drag_mode,
            destination.seconds - origin.seconds,
            destination.row,
            blocks,
            policy,
        ),
        _ => EditResult::unchanged(blocks.to_vec()),
    }
}

fn multidraw(
    origin: TimeIndex,
    destination: TimeIndex,
    block_type: &BlockType,
    blocks: &[Block],
    policy: &MergePolicy,
) -> EditResult {
    let rows = draw_rows(origin.row, destination.row);
    let (in_rows, elsewhere): (Vec<Block>, Vec<Block>) =
        blocks.iter().cloned().partition(|b| rows.contains(&b.row));
    let protected: FxHashSet<BlockId> = in_rows.iter().map(|b| b.uid).collect();

    let mut edit = merge_and_split(draw_candidates(origin, destination, block_type), in_rows);
    edit.unchanged.extend(elsewhere);
    edit.discard_short_proposals(policy, &protected);
    edit
}

fn drag(
    dragged: &Block,
    mode: DragMode,
    delta: f64,
    destination_row: u32,
    blocks: &[Block],
    policy: &MergePolicy,
) -> EditResult {
    let current = blocks
        .iter()
        .find(|b| b.uid == dragged.uid)
        .unwrap_or(dragged);
    let candidate = drag_candidate(current, mode, delta, destination_row);

    let others: Vec<Block> = blocks
        .iter()
        .filter(|b| b.uid != dragged.uid)
        .cloned()
        .collect();
    let protected: FxHashSet<BlockId> = others.iter().map(|b| b.uid).collect();

    let mut edit = merge_and_split(vec![candidate], others);
    edit.discard_short_proposals(policy, &protected);

    // The dragged block may have been dropped as too short or absorbed into a
    // neighbour; either way its old record has to go.
    if !edit.modified.iter().any(|b| b.uid == dragged.uid) {
        debug!(uid = %dragged.uid, "dragged block did not survive");
        edit.deleted.push(current.clone());
    }
    edit
}
