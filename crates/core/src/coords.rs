//! Conversion between grid pixels and planner time/rows.

use blockgrid_protocol::{Block, BlockMatch, Point, Rect, TimeIndex};
use serde::{Deserialize, Serialize};

use crate::timespan::SECONDS_PER_HOUR;

/// Converts a pixel position on the grid into the time and row under it.
pub trait CoordinateMapper {
    fn to_time_index(&self, point: Point) -> TimeIndex;
}

impl<F> CoordinateMapper for F
where
    F: Fn(Point) -> TimeIndex,
{
    fn to_time_index(&self, point: Point) -> TimeIndex {
        self(point)
    }
}

/// Linear time axis and fixed-height rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridMapper {
    pub pixels_per_second: f64,
    /// The time at pixel x = 0.
    pub origin_seconds: f64,
    pub row_height: f64,
}

impl GridMapper {
    pub fn new(pixels_per_second: f64, origin_seconds: f64, row_height: f64) -> Self {
        Self {
            pixels_per_second,
            origin_seconds,
            row_height,
        }
    }

    /// A scale where each quarter hour is `tick_width` pixels wide.
    pub fn from_ticks(tick_width: f64, row_height: f64, origin_seconds: f64) -> Self {
        let pixels_per_second = tick_width * 4.0 / SECONDS_PER_HOUR;
        Self::new(pixels_per_second, origin_seconds, row_height)
    }

    pub fn seconds_to_pixels(&self, seconds: f64) -> f64 {
        self.pixels_per_second * seconds
    }

    pub fn time_to_x(&self, seconds: f64) -> f64 {
        self.seconds_to_pixels(seconds - self.origin_seconds)
    }

    pub fn x_to_time(&self, x: f64) -> f64 {
        self.origin_seconds + x / self.pixels_per_second
    }

    /// Row under a y position; positions above the grid map to row 0.
    pub fn y_to_row(&self, y: f64) -> u32 {
        let row = (y / self.row_height).floor();
        if row.is_nan() || row <= 0.0 {
            0
        } else if row >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            row as u32
        }
    }

    pub fn block_rect(&self, block: &Block) -> Rect {
        Rect::new(
            self.time_to_x(block.start_time),
            f64::from(block.row) * self.row_height,
            self.seconds_to_pixels(block.duration()),
            self.row_height,
        )
    }

    /// The block drawn at `point`. When several overlap there, the one drawn
    /// last (topmost) wins.
    pub fn hit_test<'a>(
        &self,
        point: Point,
        blocks: impl IntoIterator<Item = &'a Block>,
    ) -> Option<BlockMatch> {
        blocks
            .into_iter()
            .filter_map(|block| {
                let rect = self.block_rect(block);
                rect.contains(point).then(|| BlockMatch {
                    block: block.clone(),
                    rect,
                })
            })
            .last()
    }
}

impl CoordinateMapper for GridMapper {
    fn to_time_index(&self, point: Point) -> TimeIndex {
        TimeIndex::new(self.x_to_time(point.x), self.y_to_row(point.y))
    }
}
