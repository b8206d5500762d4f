use blockgrid_protocol::{Block, GridRange, RenderUnit, WindowKey};

use super::{BlockSource, Viewport, Windower};
use crate::coords::CoordinateMapper;

/// Ignores the viewport and always materializes every block. Fine for small
/// datasets where tiling costs more than it saves.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllWindower;

impl AllWindower {
    /// The single unit everything renders into.
    pub const KEY: WindowKey = WindowKey { x: 0, y: 0 };
}

impl Windower for AllWindower {
    fn visible_items<S>(&self, _viewport: &Viewport, source: &S) -> Vec<Block>
    where
        S: BlockSource + ?Sized,
    {
        source.blocks_in(&GridRange::unbounded())
    }

    fn renderable_windows<S, M, R>(
        &mut self,
        _viewport: &Viewport,
        source: &S,
        _mapper: &M,
        render_item: impl FnMut(&Block) -> R,
    ) -> Vec<RenderUnit<R>>
    where
        S: BlockSource + ?Sized,
        M: CoordinateMapper + ?Sized,
    {
        let items = source
            .blocks_in(&GridRange::unbounded())
            .iter()
            .map(render_item)
            .collect();
        vec![RenderUnit {
            key: Self::KEY,
            items,
        }]
    }
}
