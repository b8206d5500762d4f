use serde::{Deserialize, Serialize};

use crate::types::{Point, Size};

/// Identity of a window tile: the window's origin divided by the window size.
///
/// Integer indices rather than a formatted string, so lookups hash two words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowKey {
    pub x: i64,
    pub y: i64,
}

impl WindowKey {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn origin(&self, size: Size) -> Point {
        Point::new(self.x as f64 * size.width, self.y as f64 * size.height)
    }
}

/// What a windower hands the rendering layer for one tile: the tile key and
/// whatever the item renderer produced for each block in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderUnit<T> {
    pub key: WindowKey,
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_scales_key_by_window_size() {
        let size = Size::new(100.0, 50.0);
        let origin = WindowKey::new(-2, 3).origin(size);
        assert_eq!(origin, Point::new(-200.0, 150.0));
        assert_eq!(WindowKey::new(0, 0).origin(size), Point::default());
    }
}
