//! LRU elevation tile cache
//!
//! Keeps the DEM tile most recently seen for each visible tile, so a tile
//! whose elevation is briefly unavailable from the host (while a new zoom
//! level streams in) keeps drawing with the last data it had.
//!
//! Both `get` and `put` count as a use. When the cache is full, inserting a
//! new key evicts the least recently used one.

use std::collections::{HashMap, VecDeque};

use super::key::TileKey;

/// Minimum and maximum elevation of a resident DEM tile, metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationSummary {
    pub min: f32,
    pub max: f32,
}

impl ElevationSummary {
    /// Summarize raw samples, ignoring non-finite values.
    pub fn from_samples(samples: &[f32]) -> Option<Self> {
        let mut finite = samples.iter().copied().filter(|v| v.is_finite());
        let first = finite.next()?;
        let (min, max) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(Self { min, max })
    }
}

/// A DEM tile backing a visible tile.
///
/// `texture` is `None` when the host knows the tile but has no texture for it
/// yet; such tiles draw with a flat fallback elevation.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationTileEntry<T> {
    /// Identity of the DEM tile (may be coarser than the visible tile)
    pub key: TileKey,
    pub texture: Option<T>,
    /// Edge length of the DEM texture including its one-texel border
    pub texture_size: u32,
}

impl<T> ElevationTileEntry<T> {
    pub fn new(key: TileKey, texture: T, texture_size: u32) -> Self {
        Self {
            key,
            texture: Some(texture),
            texture_size,
        }
    }

    pub fn without_texture(key: TileKey, texture_size: u32) -> Self {
        Self {
            key,
            texture: None,
            texture_size,
        }
    }

    /// Usable DEM samples per edge, excluding the border.
    pub fn dem_size(&self) -> u32 {
        self.texture_size.saturating_sub(2).max(1)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Bounded LRU map from visible tile key to its backing elevation tile.
pub struct ElevationTileCache<T> {
    capacity: usize,
    entries: HashMap<TileKey, ElevationTileEntry<T>>,
    /// Use order, least recent at the front
    order: VecDeque<TileKey>,
    stats: CacheStats,
}

impl<T> ElevationTileCache<T> {
    /// Create a cache holding at most `capacity` tiles (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` is resident. Does not count as a use.
    pub fn contains(&self, key: &TileKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up a tile and mark it most recently used.
    pub fn get(&mut self, key: &TileKey) -> Option<&ElevationTileEntry<T>> {
        if self.entries.contains_key(key) {
            self.touch(key);
            self.stats.hits += 1;
            self.entries.get(key)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Insert or replace a tile and mark it most recently used.
    pub fn put(&mut self, key: TileKey, entry: ElevationTileEntry<T>) {
        if self.entries.contains_key(&key) {
            self.touch(&key);
        } else {
            if self.entries.len() >= self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                    self.stats.evictions += 1;
                    log::trace!("elevation cache evicted {oldest}");
                }
            }
            self.order.push_back(key);
        }
        self.entries.insert(key, entry);
    }

    /// Resident keys from least to most recently used.
    pub fn keys_lru_order(&self) -> impl Iterator<Item = &TileKey> {
        self.order.iter()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn touch(&mut self, key: &TileKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(*key);
    }
}
