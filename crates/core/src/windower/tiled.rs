use std::ops::Range;

use blockgrid_protocol::{Block, GridRange, Point, RenderUnit, RowSpan, Size, TimeSpan, WindowKey};
use tracing::{debug, trace};

use super::{BlockSource, Viewport, WindowCache, WindowCacheStats, Windower};
use crate::coords::CoordinateMapper;

/// Splits pixel space into `size` tiles and caches each tile's blocks by
/// [`WindowKey`].
#[derive(Debug, Clone)]
pub struct TiledWindower {
    size: Size,
    cache: WindowCache,
}

impl TiledWindower {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            cache: WindowCache::unbounded(),
        }
    }

    /// Tiles beyond `capacity` are evicted least recently used first.
    pub fn with_capacity(size: Size, capacity: usize) -> Self {
        Self {
            size,
            cache: WindowCache::with_capacity(capacity),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn cache_stats(&self) -> WindowCacheStats {
        self.cache.stats()
    }

    pub fn cached(&self, key: WindowKey) -> Option<&[Block]> {
        self.cache.peek(key)
    }

    /// Drop every cached tile; the next render queries afresh.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Origin of the tile containing `p`. Floors toward negative infinity, so
    /// points left of or above the origin land in negative tiles.
    pub fn window_for_point(&self, p: Point) -> Point {
        Point::new(
            p.x - p.x.rem_euclid(self.size.width),
            p.y - p.y.rem_euclid(self.size.height),
        )
    }

    /// Keys of every tile covering the viewport grown by its own size, in x
    /// then y order. Empty for a degenerate tile size or a non-finite viewport.
    pub fn covering_keys(&self, viewport: &Viewport) -> Vec<WindowKey> {
        if self.size.is_empty() || !viewport.is_finite() {
            return Vec::new();
        }
        let grown = viewport.expanded();
        let xs = tile_range(grown.min.x, grown.max.x, self.size.width);
        let ys = tile_range(grown.min.y, grown.max.y, self.size.height);
        xs.flat_map(|x| ys.clone().map(move |y| WindowKey::new(x, y)))
            .collect()
    }

    /// The time and row range a tile covers, read through `mapper` at its
    /// origin and its opposite corner.
    pub fn window_range<M>(&self, key: WindowKey, mapper: &M) -> GridRange
    where
        M: CoordinateMapper + ?Sized,
    {
        let origin = key.origin(self.size);
        let opposite = origin.offset(Point::new(self.size.width, self.size.height));
        let from = mapper.to_time_index(origin);
        let to = mapper.to_time_index(opposite);
        GridRange::new(
            TimeSpan::new(from.seconds.min(to.seconds), from.seconds.max(to.seconds)),
            RowSpan::new(from.row.min(to.row), from.row.max(to.row)),
        )
    }
}

impl Windower for TiledWindower {
    fn visible_items<S>(&self, viewport: &Viewport, _source: &S) -> Vec<Block>
    where
        S: BlockSource + ?Sized,
    {
        self.covering_keys(viewport)
            .into_iter()
            .filter_map(|key| self.cache.peek(key))
            .flatten()
            .cloned()
            .collect()
    }

    fn renderable_windows<S, M, R>(
        &mut self,
        viewport: &Viewport,
        source: &S,
        mapper: &M,
        mut render_item: impl FnMut(&Block) -> R,
    ) -> Vec<RenderUnit<R>>
    where
        S: BlockSource + ?Sized,
        M: CoordinateMapper + ?Sized,
    {
        let keys = self.covering_keys(viewport);
        let mut units = Vec::with_capacity(keys.len());
        for key in keys {
            let range = self.window_range(key, mapper);
            let blocks = source.blocks_in(&range);
            let count = blocks.len();
            trace!(x = key.x, y = key.y, blocks = count, "rendered window");
            let items = blocks.iter().map(&mut render_item).collect();
            self.cache.store(key, blocks);
            units.push(RenderUnit { key, items });
        }
        let cached = self.cache.len();
        debug!(windows = units.len(), cached, "rendered viewport");
        units
    }
}

/// Tile indices covering `[min, max)`: floor the low edge, ceil the high
/// edge. Always at least the tile containing `min`.
fn tile_range(min: f64, max: f64, step: f64) -> Range<i64> {
    let lo = (min / step).floor() as i64;
    let hi = (max / step).ceil() as i64;
    lo..hi.max(lo + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::GridMapper;
    use crate::model::BlockIndex;
    use crate::timespan::SECONDS_PER_HOUR;
    use std::cell::Cell;

    fn windower() -> TiledWindower {
        TiledWindower::new(Size::new(100.0, 100.0))
    }

    // One pixel per minute, 50px rows.
    fn mapper() -> GridMapper {
        GridMapper::new(1.0 / 60.0, 0.0, 50.0)
    }

    fn viewport() -> Viewport {
        Viewport::from_origin(Point::new(0.0, 0.0), 200.0, 100.0)
    }

    #[test]
    fn point_snaps_to_containing_window() {
        let w = windower();
        let snap = |x, y| w.window_for_point(Point::new(x, y));
        assert_eq!(snap(130.0, 5.0), Point::new(100.0, 0.0));
        assert_eq!(snap(-1.0, -150.0), Point::new(-100.0, -200.0));
        assert_eq!(snap(200.0, 0.0), Point::new(200.0, 0.0));
    }

    #[test]
    fn covering_keys_include_prefetch_margin() {
        let keys = windower().covering_keys(&viewport());
        // Grown to x in [-200, 400), y in [-100, 200).
        assert_eq!(keys.len(), 6 * 3);
        assert_eq!(keys.first(), Some(&WindowKey::new(-2, -1)));
        assert_eq!(keys[1], WindowKey::new(-2, 0));
        assert_eq!(keys.last(), Some(&WindowKey::new(3, 1)));
    }

    #[test]
    fn degenerate_inputs_cover_nothing() {
        let zero = TiledWindower::new(Size::new(0.0, 100.0));
        assert!(zero.covering_keys(&viewport()).is_empty());

        let nan = Viewport::new(Point::new(f64::NAN, 0.0), Point::new(10.0, 10.0));
        assert!(windower().covering_keys(&nan).is_empty());
    }

    #[test]
    fn window_range_reads_mapper_at_both_corners() {
        let range = windower().window_range(WindowKey::new(1, 1), &mapper());
        assert_eq!(range.time_span, TimeSpan::new(6000.0, 12000.0));
        assert_eq!(range.row_span, RowSpan::new(2, 4));
    }

    #[test]
    fn rerender_is_key_stable() {
        let index = BlockIndex::from_blocks([
            Block::new(0, "a", TimeSpan::new(0.0, SECONDS_PER_HOUR)),
            Block::new(3, "a", TimeSpan::new(0.0, SECONDS_PER_HOUR)),
        ]);
        let mut w = windower();
        let first: Vec<_> = w
            .renderable_windows(&viewport(), &index, &mapper(), |b| b.uid)
            .into_iter()
            .map(|u| u.key)
            .collect();
        let second: Vec<_> = w
            .renderable_windows(&viewport(), &index, &mapper(), |b| b.uid)
            .into_iter()
            .map(|u| u.key)
            .collect();
        assert_eq!(first, second);
        assert_eq!(w.cache_stats().entries, first.len());
    }

    #[test]
    fn each_row_lands_in_one_vertical_window() {
        let index = BlockIndex::from_blocks([Block::new(1, "a", TimeSpan::new(60.0, 120.0))]);
        let mut w = windower();
        let units = w.renderable_windows(&viewport(), &index, &mapper(), |b| b.row);
        let holding: Vec<_> = units
            .iter()
            .filter(|u| !u.items.is_empty())
            .map(|u| u.key)
            .collect();
        assert_eq!(holding, vec![WindowKey::new(0, 0)]);
    }

    #[test]
    fn visible_items_reads_cache_without_querying() {
        let queries = Cell::new(0);
        let source = |range: &GridRange| {
            queries.set(queries.get() + 1);
            if range.row_span.contains(0) && range.time_span.start_time <= 0.0 {
                vec![Block::new(0, "a", TimeSpan::new(0.0, 60.0))]
            } else {
                Vec::new()
            }
        };
        let mut w = windower();
        assert!(w.visible_items(&viewport(), &source).is_empty());
        assert_eq!(queries.get(), 0);

        let units = w.renderable_windows(&viewport(), &source, &mapper(), |b| b.uid);
        let rendered = queries.get();
        assert_eq!(rendered, units.len());

        let visible = w.visible_items(&viewport(), &source);
        assert_eq!(queries.get(), rendered);
        assert!(!visible.is_empty());
        assert!(visible.iter().all(|b| b.row == 0));
    }

    #[test]
    fn rerender_overwrites_stale_window() {
        let mut index = BlockIndex::new();
        let mut w = windower();
        w.renderable_windows(&viewport(), &index, &mapper(), |b| b.uid);
        assert_eq!(w.cached(WindowKey::new(0, 0)), Some(&[][..]));

        index.insert(Block::new(0, "a", TimeSpan::new(0.0, 60.0)));
        w.renderable_windows(&viewport(), &index, &mapper(), |b| b.uid);
        assert_eq!(w.cached(WindowKey::new(0, 0)).map(<[Block]>::len), Some(1));
    }

    #[test]
    fn bounded_cache_evicts_offscreen_windows() {
        let index = BlockIndex::new();
        let mut w = TiledWindower::with_capacity(Size::new(100.0, 100.0), 18);
        w.renderable_windows(&viewport(), &index, &mapper(), |b| b.uid);
        let far = Viewport::from_origin(Point::new(10_000.0, 0.0), 200.0, 100.0);
        w.renderable_windows(&far, &index, &mapper(), |b| b.uid);
        let stats = w.cache_stats();
        assert_eq!(stats.entries, 18);
        assert_eq!(stats.evictions, 18);
    }
}
