//! Viewport windowing: limit querying and rendering to the tiles around what
//! is on screen.
//!
//! Two interchangeable strategies share the [`Windower`] interface:
//! [`AllWindower`] always materializes everything, [`TiledWindower`] splits
//! the plane into fixed-size tiles and caches each tile's blocks.

pub mod all;
pub mod cache;
pub mod tiled;

pub use all::AllWindower;
pub use cache::{WindowCache, WindowCacheStats};
pub use tiled::TiledWindower;

use blockgrid_protocol::{Block, GridRange, Point, RenderUnit};
use serde::{Deserialize, Serialize};

use crate::coords::CoordinateMapper;
use crate::merge::EditResult;
use crate::model::BlockIndex;
use crate::timespan::overlaps;

/// Answers "which blocks fall in this range" for a windower.
pub trait BlockSource {
    fn blocks_in(&self, range: &GridRange) -> Vec<Block>;
}

impl<F> BlockSource for F
where
    F: Fn(&GridRange) -> Vec<Block>,
{
    fn blocks_in(&self, range: &GridRange) -> Vec<Block> {
        self(range)
    }
}

impl BlockSource for BlockIndex {
    fn blocks_in(&self, range: &GridRange) -> Vec<Block> {
        self.query(range)
    }
}

/// A pending edit renders as its unchanged plus modified blocks.
impl BlockSource for EditResult {
    fn blocks_in(&self, range: &GridRange) -> Vec<Block> {
        self.visible()
            .filter(|b| range.row_span.contains(b.row) && overlaps(*b, &range.time_span))
            .cloned()
            .collect()
    }
}

/// The visible area of the grid as two opposite corners, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub min: Point,
    pub max: Point,
}

impl Viewport {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_origin(origin: Point, width: f64, height: f64) -> Self {
        Self::new(origin, origin.offset(Point::new(width, height)))
    }

    /// Grow by the viewport's own size on every side, so tiles just off
    /// screen are already populated when scrolling reaches them.
    pub fn expanded(&self) -> Self {
        let size = self.max.delta(self.min);
        Self::new(self.min.delta(size), self.max.offset(size))
    }

    pub fn is_finite(&self) -> bool {
        self.min.x.is_finite()
            && self.min.y.is_finite()
            && self.max.x.is_finite()
            && self.max.y.is_finite()
    }
}

pub trait Windower {
    /// Blocks currently held for the viewport, without querying or rendering
    /// anything new.
    fn visible_items<S>(&self, viewport: &Viewport, source: &S) -> Vec<Block>
    where
        S: BlockSource + ?Sized;

    /// Query the source for each tile covering the viewport and render its
    /// blocks with `render_item`.
    fn renderable_windows<S, M, R>(
        &mut self,
        viewport: &Viewport,
        source: &S,
        mapper: &M,
        render_item: impl FnMut(&Block) -> R,
    ) -> Vec<RenderUnit<R>>
    where
        S: BlockSource + ?Sized,
        M: CoordinateMapper + ?Sized;
}

/// Either strategy, chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum Windowing {
    All(AllWindower),
    Tiled(TiledWindower),
}

impl Windower for Windowing {
    fn visible_items<S>(&self, viewport: &Viewport, source: &S) -> Vec<Block>
    where
        S: BlockSource + ?Sized,
    {
        match self {
            Windowing::All(w) => w.visible_items(viewport, source),
            Windowing::Tiled(w) => w.visible_items(viewport, source),
        }
    }

    fn renderable_windows<S, M, R>(
        &mut self,
        viewport: &Viewport,
        source: &S,
        mapper: &M,
        render_item: impl FnMut(&Block) -> R,
    ) -> Vec<RenderUnit<R>>
    where
        S: BlockSource + ?Sized,
        M: CoordinateMapper + ?Sized,
    {
        match self {
            Windowing::All(w) => w.renderable_windows(viewport, source, mapper, render_item),
            Windowing::Tiled(w) => w.renderable_windows(viewport, source, mapper, render_item),
        }
    }
}
