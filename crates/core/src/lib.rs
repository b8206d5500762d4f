//! The non-visual core of a row/time block planner.
//!
//! - [`timespan`]: interval algebra over time spans.
//! - [`merge`]: resolves proposed blocks against committed ones.
//! - [`windower`]: limits queries and rendering to the tiles around the viewport.
//! - [`gestures`]: turns pointer events into draw, drag and selection gestures.
//! - [`planner`]: a session tying them together over a [`model::BlockIndex`].

pub mod config;
pub mod coords;
pub mod describe;
pub mod gestures;
pub mod merge;
pub mod model;
pub mod planner;
pub mod throttle;
pub mod timespan;
pub mod windower;

pub use config::{ConfigError, PlannerConfig};
pub use planner::{Handled, Planner};
