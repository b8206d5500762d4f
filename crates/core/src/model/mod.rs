pub mod extent;
pub mod index;

pub use extent::GridExtent;
pub use index::{BlockIndex, Displaced};
