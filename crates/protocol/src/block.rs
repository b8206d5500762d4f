use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block_type::BlockType;
use crate::span::{SpanError, TimeSpan};
use crate::types::Rect;

/// Opaque, immutable block identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(Uuid);

impl BlockId {
    /// A freshly generated identity.
    pub fn new() -> Self {
        BlockId(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for BlockId {
    fn from(id: Uuid) -> Self {
        BlockId(id)
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A typed, row-assigned span of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub uid: BlockId,
    /// Horizontal lane the block occupies.
    pub row: u32,
    pub block_type: BlockType,
    pub start_time: f64,
    pub end_time: f64,
    /// Set while the block is an uncommitted proposal produced by a gesture.
    #[serde(default)]
    pub gestured: bool,
}

impl Block {
    /// A committed block with a fresh identity.
    pub fn new(row: u32, block_type: impl Into<BlockType>, span: TimeSpan) -> Self {
        Self {
            uid: BlockId::new(),
            row,
            block_type: block_type.into(),
            start_time: span.start_time,
            end_time: span.end_time,
            gestured: false,
        }
    }

    /// A proposal block with a fresh identity.
    pub fn proposal(row: u32, block_type: impl Into<BlockType>, span: TimeSpan) -> Self {
        Self {
            gestured: true,
            ..Self::new(row, block_type, span)
        }
    }

    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start_time, self.end_time)
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Same identity and fields, new span.
    pub fn with_span(self, span: TimeSpan) -> Self {
        Self {
            start_time: span.start_time,
            end_time: span.end_time,
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), SpanError> {
        self.span().validate()
    }
}

/// The block under the pointer and where it sits on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockMatch {
    pub block: Block,
    pub rect: Rect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_span_keeps_identity() {
        let block = Block::new(3, "a", TimeSpan::new(0.0, 60.0));
        let uid = block.uid;
        let moved = block.with_span(TimeSpan::new(30.0, 120.0));
        assert_eq!(moved.uid, uid);
        assert_eq!(moved.row, 3);
        assert_eq!(moved.span(), TimeSpan::new(30.0, 120.0));
        assert!((moved.duration() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fresh_ids_are_distinct() {
        assert_ne!(BlockId::new(), BlockId::new());
        let a = Block::proposal(0, "a", TimeSpan::new(0.0, 1.0));
        let b = Block::proposal(0, "a", TimeSpan::new(0.0, 1.0));
        assert!(a.gestured);
        assert_ne!(a.uid, b.uid);
    }

    #[test]
    fn gestured_defaults_to_false_when_absent() {
        let json = r#"{
            "uid": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "row": 1,
            "block_type": "b",
            "start_time": 0.0,
            "end_time": 900.0
        }"#;
        let block: Block = serde_json::from_str(json).expect("valid block json");
        assert!(!block.gestured);
        assert_eq!(block.block_type, "b");
    }
}
