//! Pointer gestures: the transient state of an in-progress interaction and
//! the events that drive it.

pub mod recognizer;

pub use recognizer::{GestureRecognizer, GestureResolver, Outcome, Transition};

use blockgrid_protocol::{Block, BlockMatch, BlockType, Point, TimeIndex};
use serde::{Deserialize, Serialize};

/// Which edge(s) of a block a drag moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragMode {
    /// Move the start, keep the end.
    Left,
    /// Move the end, keep the start.
    Right,
    /// Translate the whole block, possibly into another row.
    Both,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Gesture {
    #[default]
    Idle,
    /// Drag-to-create across rows and time.
    MultiDraw {
        origin: TimeIndex,
        destination: Option<TimeIndex>,
        block_type: BlockType,
    },
    /// Resize or move an existing block.
    Drag {
        origin: TimeIndex,
        destination: TimeIndex,
        drag_mode: DragMode,
        block: Block,
    },
    Selection {
        selected: Block,
    },
}

impl Gesture {
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::Idle => "idle",
            Gesture::MultiDraw { .. } => "multidraw",
            Gesture::Drag { .. } => "drag",
            Gesture::Selection { .. } => "selection",
        }
    }

    /// Draws and drags are in flight; the pointer's default behavior should
    /// be suppressed while one is active.
    pub fn is_active(&self) -> bool {
        matches!(self, Gesture::MultiDraw { .. } | Gesture::Drag { .. })
    }

    pub fn selected(&self) -> Option<&Block> {
        match self {
            Gesture::Selection { selected } => Some(selected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    Click,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::PointerDown,
        EventKind::PointerMove,
        EventKind::PointerUp,
        EventKind::Click,
    ];

    pub(crate) fn slot(self) -> usize {
        match self {
            EventKind::PointerDown => 0,
            EventKind::PointerMove => 1,
            EventKind::PointerUp => 2,
            EventKind::Click => 3,
        }
    }
}

/// A pointer event already translated into grid terms.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: EventKind,
    /// Pointer position in grid pixels, used for edge proximity tests.
    pub point: Point,
    pub index: TimeIndex,
    /// The block under the pointer, if any.
    pub hit: Option<BlockMatch>,
}

impl PointerEvent {
    pub fn new(kind: EventKind, point: Point, index: TimeIndex) -> Self {
        Self {
            kind,
            point,
            index,
            hit: None,
        }
    }

    pub fn with_hit(mut self, hit: Option<BlockMatch>) -> Self {
        self.hit = hit;
        self
    }
}
