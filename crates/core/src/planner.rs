//! A planner session: committed blocks, the in-flight gesture and the
//! viewport windowing, driven one pointer event at a time.

use std::time::Instant;

use blockgrid_protocol::{
    Block, BlockId, BlockMatch, GridRange, Point, RenderUnit, RowSpan, SpanError, TimeSpan,
};
use tracing::{debug, debug_span};

use crate::config::PlannerConfig;
use crate::coords::{CoordinateMapper, GridMapper};
use crate::gestures::{EventKind, Gesture, GestureResolver, Outcome, PointerEvent};
use crate::merge::{EditResult, MergePolicy, apply_gesture, draw_rows};
use crate::model::{BlockIndex, Displaced, GridExtent};
use crate::throttle::Throttle;
use crate::timespan::{SnapStrategy, snap_to_unit};
use crate::windower::{BlockSource, Viewport, Windower, Windowing};

/// What handling one event did.
#[derive(Debug, Clone, PartialEq)]
pub struct Handled {
    pub outcome: Outcome,
    /// The edit written to the committed set, when the event finished a draw
    /// or drag.
    pub committed: Option<EditResult>,
}

#[derive(Debug)]
pub struct Planner {
    config: PlannerConfig,
    index: BlockIndex,
    resolver: GestureResolver,
    windowing: Windowing,
    mapper: GridMapper,
    policy: MergePolicy,
    throttle: Throttle,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self::with_blocks(config, Vec::new())
    }

    /// Start from existing blocks. Same-type overlaps within a row are
    /// coalesced on the way in.
    pub fn with_blocks(config: PlannerConfig, blocks: impl IntoIterator<Item = Block>) -> Self {
        Self {
            index: BlockIndex::from_blocks(blocks),
            resolver: GestureResolver::new(config.recognizer()),
            windowing: config.windowing(),
            mapper: config.mapper(),
            policy: config.merge_policy(),
            throttle: config.throttle(),
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn blocks(&self) -> &BlockIndex {
        &self.index
    }

    pub fn mapper(&self) -> &GridMapper {
        &self.mapper
    }

    pub fn gesture(&self) -> &Gesture {
        self.resolver.gesture()
    }

    pub fn selected(&self) -> Option<&Block> {
        self.resolver.gesture().selected()
    }

    pub fn extent(&self) -> GridExtent {
        GridExtent::from_blocks(self.index.iter())
    }

    /// Add or replace (by uid) a committed block. Same-type blocks it
    /// overlaps in its row are absorbed into it.
    pub fn insert(&mut self, block: Block) -> Result<Displaced, SpanError> {
        let displaced = self.index.insert_checked(block)?;
        self.refresh_selection();
        Ok(displaced)
    }

    pub fn remove(&mut self, uid: BlockId) -> Option<Block> {
        let removed = self.index.remove(uid);
        if removed.is_some() && self.selected().is_some_and(|b| b.uid == uid) {
            self.resolver.cancel();
        }
        removed
    }

    /// The block drawn at `point`. Rows a draw or drag is editing show the
    /// pending edit, so a release over a dragged block hits its new position.
    pub fn hit_test(&self, point: Point) -> Option<BlockMatch> {
        let index = self.mapper.to_time_index(point);
        let range = GridRange::new(
            TimeSpan::new(index.seconds, index.seconds),
            RowSpan::new(index.row, index.row.saturating_add(1)),
        );
        let blocks = match Overlay::new(&self.index, self.resolver.gesture(), &self.policy) {
            Some(overlay) => overlay.blocks_in(&range),
            None => self.index.query(&range),
        };
        self.mapper.hit_test(point, &blocks)
    }

    /// Build the event for a pointer at `point`: its grid position plus the
    /// block under it.
    pub fn event_at(&self, kind: EventKind, point: Point) -> PointerEvent {
        PointerEvent::new(kind, point, self.mapper.to_time_index(point))
            .with_hit(self.hit_test(point))
    }

    /// Advance the gesture. A release that ends a draw or drag resolves the
    /// gesture against the committed blocks and commits the result.
    pub fn handle(&mut self, event: &PointerEvent) -> Handled {
        let event = self.snapped(event);
        let outcome = self.resolver.handle(&event);

        let finished = outcome.previous.is_active() && !self.resolver.gesture().is_active();
        let committed =
            (finished && edits(&outcome.previous)).then(|| self.commit(&outcome.previous));
        Handled { outcome, committed }
    }

    /// The edit the in-flight gesture would commit right now, resolved
    /// against the committed blocks in the rows it touches. Empty while no
    /// draw or drag is editing.
    pub fn preview(&self) -> EditResult {
        Overlay::new(&self.index, self.resolver.gesture(), &self.policy)
            .map(|overlay| overlay.pending)
            .unwrap_or_default()
    }

    pub fn cancel(&mut self) {
        self.resolver.cancel();
    }

    /// Render units for the viewport. While a draw or drag is in flight the
    /// rows it touches render its preview.
    pub fn render_windows<R>(
        &mut self,
        viewport: &Viewport,
        render_item: impl FnMut(&Block) -> R,
    ) -> Vec<RenderUnit<R>> {
        match Overlay::new(&self.index, self.resolver.gesture(), &self.policy) {
            Some(overlay) => {
                self.windowing
                    .renderable_windows(viewport, &overlay, &self.mapper, render_item)
            }
            None => {
                self.windowing
                    .renderable_windows(viewport, &self.index, &self.mapper, render_item)
            }
        }
    }

    /// Re-render after a scroll, at most once per configured interval.
    pub fn scroll<R>(
        &mut self,
        viewport: &Viewport,
        now: Instant,
        render_item: impl FnMut(&Block) -> R,
    ) -> Option<Vec<RenderUnit<R>>> {
        if !self.throttle.ready(now) {
            return None;
        }
        Some(self.render_windows(viewport, render_item))
    }

    /// Blocks held for the viewport as of the last render.
    pub fn visible_blocks(&self, viewport: &Viewport) -> Vec<Block> {
        self.windowing.visible_items(viewport, &self.index)
    }

    fn snapped(&self, event: &PointerEvent) -> PointerEvent {
        let mut event = event.clone();
        if let Some(unit) = self.config.snap_unit_secs {
            event.index.seconds = snap_to_unit(event.index.seconds, unit, SnapStrategy::Nearest);
        }
        event
    }

    fn commit(&mut self, gesture: &Gesture) -> EditResult {
        let _span = debug_span!("planner_commit", gesture = gesture.name()).entered();
        let affected = affected_rows(gesture)
            .map(|rows| rows_of(&self.index, rows))
            .unwrap_or_default();
        let edit = apply_gesture(gesture, &affected, &self.policy);
        self.index.commit(&edit);
        debug!(
            modified = edit.modified.len(),
            deleted = edit.deleted.len(),
            "planner commit"
        );
        self.refresh_selection();
        edit
    }

    /// A selection made on release still holds the pre-commit block; swap in
    /// its committed version.
    fn refresh_selection(&mut self) {
        let Some(uid) = self.selected().map(|b| b.uid) else {
            return;
        };
        let next = match self.index.get(uid) {
            Some(block) => Gesture::Selection {
                selected: block.clone(),
            },
            None => Gesture::Idle,
        };
        self.resolver.replace(next);
    }
}

/// Committed blocks with the rows a draw or drag is editing swapped for
/// its pending edit.
struct Overlay<'a> {
    index: &'a BlockIndex,
    rows: RowSpan,
    pending: EditResult,
}

impl<'a> Overlay<'a> {
    fn new(index: &'a BlockIndex, gesture: &Gesture, policy: &MergePolicy) -> Option<Self> {
        let rows = affected_rows(gesture)?;
        let pending = apply_gesture(gesture, &rows_of(index, rows), policy);
        Some(Self {
            index,
            rows,
            pending,
        })
    }
}

impl BlockSource for Overlay<'_> {
    fn blocks_in(&self, range: &GridRange) -> Vec<Block> {
        let mut blocks: Vec<Block> = self
            .index
            .query(range)
            .into_iter()
            .filter(|b| !self.rows.contains(b.row))
            .collect();
        blocks.extend(self.pending.blocks_in(range));
        blocks
    }
}

fn rows_of(index: &BlockIndex, rows: RowSpan) -> Vec<Block> {
    index.query(&GridRange::new(TimeSpan::unbounded(), rows))
}

/// Draws that never moved and drags that ended where they started do not
/// edit anything.
fn edits(gesture: &Gesture) -> bool {
    match gesture {
        Gesture::MultiDraw { destination, .. } => destination.is_some(),
        Gesture::Drag {
            origin, destination, ..
        } => origin != destination,
        _ => false,
    }
}

/// Rows whose blocks a gesture can touch.
fn affected_rows(gesture: &Gesture) -> Option<RowSpan> {
    let rows = match gesture {
        Gesture::MultiDraw {
            origin,
            destination: Some(destination),
            ..
        } => draw_rows(origin.row, destination.row),
        Gesture::Drag {
            destination, block, ..
        } => draw_rows(block.row, destination.row),
        _ => return None,
    };
    Some(RowSpan::new(*rows.start(), rows.end().saturating_add(1)))
}
