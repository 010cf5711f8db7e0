//! Elevation tiles
//!
//! Tile identity, the DEM sub-region mapping between a visible tile and the
//! (possibly coarser) elevation tile backing it, and the bounded LRU cache
//! that keeps backing tiles resident across frames.

pub mod cache;
pub mod key;

pub use cache::{CacheStats, ElevationSummary, ElevationTileCache, ElevationTileEntry};
pub use key::{DemMapping, TileKey, tile_position_matrix};
