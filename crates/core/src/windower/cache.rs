//! Per-tile block cache for the tiled windower.
//!
//! Tiles are keyed by [`WindowKey`]. Storing a key that is already present
//! overwrites it, so a re-render always reflects the latest query. With a
//! capacity set, the least recently stored tile is evicted to make room.
//! Every render stores each tile it covers, so stores track recency; reads
//! through [`WindowCache::peek`] do not.

use blockgrid_protocol::{Block, WindowKey};
use rustc_hash::FxHashMap;
use tracing::trace;

#[derive(Clone, Debug)]
struct CachedWindow {
    blocks: Vec<Block>,
    /// Tick of the last store, for LRU eviction.
    last_used: u64,
}

/// Statistics about window cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowCacheStats {
    pub entries: usize,
    pub evictions: u64,
}

#[derive(Debug, Clone, Default)]
pub struct WindowCache {
    entries: FxHashMap<WindowKey, CachedWindow>,
    capacity: Option<usize>,
    tick: u64,
    evictions: u64,
}

impl WindowCache {
    /// A cache that never evicts.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` tiles. A capacity of zero keeps
    /// nothing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: WindowKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Blocks cached for `key`.
    pub fn peek(&self, key: WindowKey) -> Option<&[Block]> {
        self.entries.get(&key).map(|entry| entry.blocks.as_slice())
    }

    pub fn store(&mut self, key: WindowKey, blocks: Vec<Block>) {
        if self.capacity == Some(0) {
            return;
        }
        self.tick += 1;
        if !self.entries.contains_key(&key)
            && let Some(capacity) = self.capacity
        {
            while self.entries.len() >= capacity {
                self.evict_lru();
            }
        }
        self.entries.insert(
            key,
            CachedWindow {
                blocks,
                last_used: self.tick,
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> WindowCacheStats {
        WindowCacheStats {
            entries: self.entries.len(),
            evictions: self.evictions,
        }
    }

    fn evict_lru(&mut self) {
        let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| *key)
        else {
            return;
        };
        self.entries.remove(&key);
        self.evictions += 1;
        trace!(x = key.x, y = key.y, "evicted window");
    }
}
