//! Committed blocks indexed by `(row, type)`.
//!
//! Each lane holds one type in one row, ordered by start time. Committed
//! lanes never contain overlapping blocks, so ordering by start also orders
//! by end and overlap queries are two binary searches.

use std::collections::BTreeMap;
use std::ops::Range;

use blockgrid_protocol::{Block, BlockId, BlockType, GridRange, SpanError};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::merge::EditResult;
use crate::timespan::{Timed, overlaps};

type LaneKey = (u32, BlockType);

/// Blocks an insert pushed out of the index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Displaced {
    /// The previous version of the inserted block, if its uid was present.
    pub replaced: Option<Block>,
    /// Same-lane blocks merged into the inserted block.
    pub absorbed: Vec<Block>,
}

#[derive(Debug, Clone, Default)]
pub struct BlockIndex {
    lanes: BTreeMap<LaneKey, Vec<Block>>,
    locations: FxHashMap<BlockId, LaneKey>,
}

impl BlockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from arbitrary blocks, coalescing same-row same-type
    /// overlaps so the lanes start out disjoint. The earliest block of each
    /// overlapping run keeps its identity.
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        let mut grouped: BTreeMap<LaneKey, Vec<Block>> = BTreeMap::new();
        for block in blocks {
            grouped
                .entry((block.row, block.block_type.clone()))
                .or_default()
                .push(block);
        }

        let mut index = Self::new();
        for (key, mut lane) in grouped {
            lane.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
            let mut merged: Vec<Block> = Vec::with_capacity(lane.len());
            for mut block in lane {
                block.gestured = false;
                match merged.last_mut() {
                    Some(last) if overlaps(last, &block) => {
                        last.end_time = last.end_time.max(block.end_time);
                    }
                    _ => merged.push(block),
                }
            }
            for block in &merged {
                index.locations.insert(block.uid, key.clone());
            }
            index.lanes.insert(key, merged);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn get(&self, uid: BlockId) -> Option<&Block> {
        let key = self.locations.get(&uid)?;
        self.lanes.get(key)?.iter().find(|b| b.uid == uid)
    }

    /// All blocks, ordered by row, then type, then start time.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.lanes.values().flatten()
    }

    pub fn to_vec(&self) -> Vec<Block> {
        self.iter().cloned().collect()
    }

    /// Insert or replace (by uid) a block without validating its span.
    ///
    /// Same-type blocks in the row that overlap or touch the new block are
    /// absorbed into it: they leave the index and the new block grows to
    /// cover them, so lanes stay disjoint.
    pub fn insert(&mut self, mut block: Block) -> Displaced {
        let replaced = self.remove(block.uid);
        let key = (block.row, block.block_type.clone());
        let lane = self.lanes.entry(key.clone()).or_default();

        let absorbed: Vec<Block> = lane.drain(lane_bounds(lane, &block)).collect();
        for other in &absorbed {
            block.start_time = block.start_time.min(other.start_time);
            block.end_time = block.end_time.max(other.end_time);
            self.locations.remove(&other.uid);
        }
        if !absorbed.is_empty() {
            debug!(uid = %block.uid, absorbed = absorbed.len(), "coalesced on insert");
        }

        let at = lane.partition_point(|b| b.start_time <= block.start_time);
        self.locations.insert(block.uid, key);
        lane.insert(at, block);
        Displaced { replaced, absorbed }
    }

    pub fn insert_checked(&mut self, block: Block) -> Result<Displaced, SpanError> {
        block.validate()?;
        Ok(self.insert(block))
    }

    pub fn remove(&mut self, uid: BlockId) -> Option<Block> {
        let key = self.locations.remove(&uid)?;
        let lane = self.lanes.get_mut(&key)?;
        let at = lane.iter().position(|b| b.uid == uid)?;
        let removed = lane.remove(at);
        if lane.is_empty() {
            self.lanes.remove(&key);
        }
        Some(removed)
    }

    /// Every block whose row falls in the range and whose span overlaps the
    /// range's time span.
    pub fn query(&self, range: &GridRange) -> Vec<Block> {
        let rows = range.row_span;
        if rows.is_empty() {
            return Vec::new();
        }
        let from = (rows.start_index, BlockType::new(""));
        let to = (rows.end_index, BlockType::new(""));
        self.lanes
            .range(from..to)
            .flat_map(|(_, lane)| &lane[lane_bounds(lane, &range.time_span)])
            .filter(|b| overlaps(*b, &range.time_span))
            .cloned()
            .collect()
    }

    /// Write an edit back: deleted blocks go away, modified blocks replace
    /// their previous versions (by uid) and lose their proposal flag.
    pub fn commit(&mut self, edit: &EditResult) {
        for block in &edit.deleted {
            self.remove(block.uid);
        }
        for block in &edit.modified {
            let mut committed = block.clone();
            committed.gestured = false;
            self.insert(committed);
        }
        debug!(
            deleted = edit.deleted.len(),
            modified = edit.modified.len(),
            total = self.len(),
            "committed edit"
        );
    }
}

/// Positions in a disjoint, start-ordered lane of the blocks that overlap
/// or touch `span`.
fn lane_bounds(lane: &[Block], span: &impl Timed) -> Range<usize> {
    let lo = lane.partition_point(|b| b.end_time < span.start_time());
    let hi = lane.partition_point(|b| b.start_time <= span.end_time());
    lo.min(hi)..hi
}
#[cfg(test)]
mod tests {
    use super::*;
    use blockgrid_protocol::{RowSpan, TimeSpan};

    fn block(row: u32, ty: &str, start: f64, end: f64) -> Block {
        Block::new(row, ty, TimeSpan::new(start, end))
    }

    #[test]
    fn from_blocks_coalesces_same_type_overlaps() {
        let first = block(0, "a", 0.0, 100.0);
        let first_uid = first.uid;
        let index = BlockIndex::from_blocks([
            block(0, "a", 100.0, 200.0),
            first,
            block(0, "b", 50.0, 60.0),
            block(1, "a", 0.0, 10.0),
        ]);
        assert_eq!(index.len(), 3);
        let merged = index.get(first_uid).map(Block::span);
        assert_eq!(merged, Some(TimeSpan::new(0.0, 200.0)));
    }

    #[test]
    fn query_binary_searches_disjoint_lanes() {
        let index = BlockIndex::from_blocks([
            block(0, "a", 0.0, 10.0),
            block(0, "a", 20.0, 30.0),
            block(0, "a", 40.0, 50.0),
            block(0, "b", 20.0, 30.0),
        ]);
        let range = GridRange::new(TimeSpan::new(10.0, 25.0), RowSpan::new(0, 1));
        let mut spans: Vec<_> = index
            .query(&range)
            .iter()
            .filter(|b| b.block_type == "a")
            .map(Block::span)
            .collect();
        spans.sort_by(|x, y| x.start_time.total_cmp(&y.start_time));
        assert_eq!(
            spans,
            vec![TimeSpan::new(0.0, 10.0), TimeSpan::new(20.0, 30.0)]
        );
    }

    #[test]
    fn query_filters_rows_half_open() {
        let index = BlockIndex::from_blocks([
            block(0, "a", 0.0, 10.0),
            block(1, "b", 0.0, 10.0),
            block(2, "c", 0.0, 10.0),
            block(1, "a", 500.0, 600.0),
        ]);
        let range = GridRange::new(TimeSpan::new(0.0, 100.0), RowSpan::new(1, 2));
        let found = index.query(&range);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].block_type, "b");
        assert_eq!(index.query(&GridRange::unbounded()).len(), 4);
    }

    #[test]
    fn insert_replaces_by_uid() {
        let mut index = BlockIndex::new();
        let original = block(0, "a", 0.0, 10.0);
        let uid = original.uid;
        index.insert(original.clone());
        let moved = Block {
            row: 4,
            ..original.with_span(TimeSpan::new(50.0, 60.0))
        };
        let displaced = index.insert(moved);
        assert_eq!(displaced.replaced.map(|b| b.row), Some(0));
        assert!(displaced.absorbed.is_empty());
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(uid).map(|b| b.row), Some(4));
        let row0 = GridRange::new(TimeSpan::unbounded(), RowSpan::new(0, 1));
        assert!(index.query(&row0).is_empty());
    }

    #[test]
    fn insert_checked_rejects_malformed() {
        let mut index = BlockIndex::new();
        let bad = Block::new(0, "a", TimeSpan::new(10.0, 0.0));
        assert!(index.insert_checked(bad).is_err());
        assert!(index.is_empty());
    }

    #[test]
    fn insert_absorbs_overlapping_same_type_blocks() {
        let mut index = BlockIndex::new();
        index.insert(block(0, "a", 10.0, 20.0));
        index.insert(block(0, "a", 30.0, 40.0));
        index.insert(block(0, "b", 15.0, 35.0));
        let wide = block(0, "a", 0.0, 100_000.0);
        let uid = wide.uid;

        let displaced = index.insert_checked(wide).unwrap();
        assert_eq!(displaced.absorbed.len(), 2);
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.get(uid).map(Block::span),
            Some(TimeSpan::new(0.0, 100_000.0))
        );

        let range = GridRange::new(TimeSpan::new(50_000.0, 60_000.0), RowSpan::new(0, 1));
        let hits = index.query(&range);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].uid, uid);
    }

    #[test]
    fn insert_grows_to_cover_touching_blocks() {
        let left = block(0, "a", 0.0, 10.0);
        let right = block(0, "a", 20.0, 30.0);
        let mut index = BlockIndex::from_blocks([left.clone(), right.clone()]);
        let bridge = block(0, "a", 10.0, 20.0);
        let uid = bridge.uid;
        index.insert(bridge);

        assert_eq!(index.len(), 1);
        assert!(index.get(left.uid).is_none());
        assert!(index.get(right.uid).is_none());
        assert_eq!(
            index.get(uid).map(Block::span),
            Some(TimeSpan::new(0.0, 30.0))
        );
    }

    #[test]
    fn commit_applies_edit() {
        let keep = block(0, "a", 0.0, 10.0);
        let gone = block(1, "a", 0.0, 10.0);
        let mut index = BlockIndex::from_blocks([keep.clone(), gone.clone()]);
        let added = Block::proposal(2, "b", TimeSpan::new(0.0, 3600.0));
        let edit = EditResult {
            unchanged: vec![keep.clone()],
            modified: vec![added.clone()],
            deleted: vec![gone.clone()],
        };
        index.commit(&edit);
        assert_eq!(index.len(), 2);
        assert!(index.get(gone.uid).is_none());
        assert_eq!(index.get(added.uid).map(|b| b.gestured), Some(false));
    }
}
