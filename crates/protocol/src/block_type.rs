use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The category tag of a block (e.g. `"a"`, `"b"`, `"c"`).
///
/// Blocks of equal type in the same row are merge candidates; blocks of
/// differing type split each other. The set of tags is chosen by the caller.
///
/// Backed by `Arc<str>` because every candidate, fragment and merged block
/// carries a copy of its type.
#[derive(Debug, Clone, Eq)]
pub struct BlockType(Arc<str>);

impl BlockType {
    pub fn new(tag: &str) -> Self {
        BlockType(Arc::from(tag))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for BlockType {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl PartialEq<&str> for BlockType {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Ord for BlockType {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for BlockType {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::hash::Hash for BlockType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (*self.0).hash(state);
    }
}

impl From<&str> for BlockType {
    #[inline]
    fn from(s: &str) -> Self {
        BlockType::new(s)
    }
}

impl From<String> for BlockType {
    #[inline]
    fn from(s: String) -> Self {
        BlockType(Arc::from(s))
    }
}

impl Default for BlockType {
    fn default() -> Self {
        BlockType::new("a")
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// Hand-rolled so serde's `rc` feature stays off.

impl Serialize for BlockType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BlockType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(BlockType::from(s))
    }
}
