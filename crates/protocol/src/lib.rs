pub mod block;
pub mod block_type;
pub mod span;
pub mod types;
pub mod window;

pub use block::{Block, BlockId, BlockMatch};
pub use block_type::BlockType;
pub use span::{GridRange, RowSpan, SpanError, TimeSpan};
pub use types::{Point, Rect, Size, TimeIndex};
pub use window::{RenderUnit, WindowKey};
