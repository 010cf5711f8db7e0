//! Frame planning
//!
//! The CPU half of a terrain frame: refresh the elevation cache from the
//! host's visible tiles, solve the camera matrices and decide which tiles
//! draw with which DEM. Produces a [`FramePlan`] the GPU passes consume.
//!
//! Planning is generic over the host's texture handle, so it runs (and is
//! tested) without a GPU.

use glam::DMat4;

use crate::camera::{
    CameraFrame, FrameMatrices, compute_projection, min_visible_elevation, tile_model,
};
use crate::config::TerrainConfig;
use crate::mesh::{select_grid_level, skirt_height};
use crate::tile::{DemMapping, ElevationSummary, ElevationTileCache, ElevationTileEntry, TileKey};

use super::smoothing_pass::{HeightSource, SmoothingChain};

/// Lng/lat ring of the synthetic overlay region registered with the host at
/// setup. Its draw callbacks are what drive the terrain frame.
pub const OVERLAY_REGION: [[f64; 2]; 5] = [[-1.0, 1.0], [1.0, 1.0], [1.0, -1.0], [-1.0, -1.0], [-1.0, 1.0]];

/// A tile the host currently shows.
#[derive(Debug, Clone)]
pub struct VisibleTile<T> {
    pub key: TileKey,
    /// Tile-local units to world pixels
    pub tile_to_world: DMat4,
    /// DEM tile the host shows for this tile now
    pub elevation: Option<ElevationTileEntry<T>>,
    /// DEM tile the host showed before the current one (while it fades out)
    pub previous_elevation: Option<ElevationTileEntry<T>>,
}

impl<T> VisibleTile<T> {
    /// Tile placed at its standard slippy-map position.
    pub fn new(key: TileKey, world_size: f64) -> Self {
        Self {
            key,
            tile_to_world: key.position_matrix(world_size),
            elevation: None,
            previous_elevation: None,
        }
    }

    pub fn with_elevation(mut self, entry: ElevationTileEntry<T>) -> Self {
        self.elevation = Some(entry);
        self
    }

    pub fn with_previous_elevation(mut self, entry: ElevationTileEntry<T>) -> Self {
        self.previous_elevation = Some(entry);
        self
    }
}

/// What the terrain renderer needs from the map engine hosting it.
pub trait TerrainHost {
    /// Handle to a DEM texture
    type Texture: Clone;

    /// Camera state for the frame about to be drawn.
    fn camera(&self) -> CameraFrame;

    /// Tiles in view, each with its current and previous DEM tile.
    fn visible_tiles(&self) -> Vec<VisibleTile<Self::Texture>>;

    /// Elevation ranges of the DEM tiles currently in view.
    fn elevation_summaries(&self) -> Vec<ElevationSummary>;

    /// Ask for another frame.
    fn request_repaint(&mut self);

    /// Register the overlay region whose draw callbacks drive the renderer.
    fn register_overlay_region(&mut self, _ring: &[[f64; 2]]) {}
}

/// One tile draw of the height pass.
#[derive(Debug, Clone)]
pub struct TileDraw<T> {
    pub key: TileKey,
    /// Model-view-projection for this tile
    pub model: DMat4,
    pub dem: DemMapping,
    /// DEM samples per edge, excluding the border
    pub dem_size: u32,
    /// `None` draws with the flat fallback elevation
    pub texture: Option<T>,
    pub skirt_height: f64,
    pub grid_level: usize,
    pub edge_meters: f64,
}

/// Counters for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame_index: u64,
    pub visible_tiles: usize,
    pub drawn_tiles: usize,
    /// Visible tiles with no resident elevation this frame
    pub skipped_tiles: usize,
    pub smoothing_passes: u32,
}

/// Everything the GPU passes need for one frame.
#[derive(Debug, Clone)]
pub struct FramePlan<T> {
    pub camera: CameraFrame,
    pub matrices: FrameMatrices,
    /// Lowest visible elevation in exaggerated metres
    pub min_elevation: f64,
    pub tile_draws: Vec<TileDraw<T>>,
    /// Texture the contour and water passes read heights from
    pub height_source: HeightSource,
    pub stats: FrameStats,
}

/// Persistent per-renderer frame state.
pub struct FrameState<T> {
    cache: ElevationTileCache<T>,
    frame_index: u64,
}

impl<T: Clone> FrameState<T> {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            cache: ElevationTileCache::new(cache_capacity),
            frame_index: 0,
        }
    }

    pub fn cache(&self) -> &ElevationTileCache<T> {
        &self.cache
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Replace the cache with an empty one of a new capacity.
    pub fn set_cache_capacity(&mut self, capacity: usize) {
        if capacity != self.cache.capacity() {
            log::info!("[FrameState] Elevation cache capacity {} -> {capacity}", self.cache.capacity());
            self.cache = ElevationTileCache::new(capacity);
        }
    }

    /// Cache `entry` for `key`. A textureless entry never replaces resident
    /// data; it only fills an empty slot so the tile draws flat meanwhile.
    fn refresh_entry(&mut self, key: TileKey, entry: &ElevationTileEntry<T>) {
        if entry.texture.is_some() || !self.cache.contains(&key) {
            self.cache.put(key, entry.clone());
        }
    }

    /// Plan a frame. Always requests a repaint, so animation keeps running.
    ///
    /// Returns `None` when the host viewport is empty.
    pub fn prepare<H: TerrainHost<Texture = T>>(
        &mut self,
        host: &mut H,
        config: &TerrainConfig,
        grid_level_count: usize,
    ) -> Option<FramePlan<T>> {
        self.frame_index += 1;

        let visible = host.visible_tiles();
        for tile in &visible {
            // previous first, so the current DEM ends up resident
            for entry in [&tile.previous_elevation, &tile.elevation].into_iter().flatten() {
                self.refresh_entry(tile.key, entry);
            }
        }

        let camera = host.camera();
        let exaggeration = config.exaggeration as f64;
        let min_elevation = min_visible_elevation(&host.elevation_summaries(), exaggeration);
        let matrices = compute_projection(&camera, min_elevation);
        host.request_repaint();

        let Some(matrices) = matrices else {
            log::trace!("[FrameState] Empty viewport, frame {} skipped", self.frame_index);
            return None;
        };

        let mut stats = FrameStats {
            frame_index: self.frame_index,
            visible_tiles: visible.len(),
            ..Default::default()
        };

        let mut tile_draws = Vec::with_capacity(visible.len());
        for tile in &visible {
            let Some(entry) = self.cache.get(&tile.key) else {
                stats.skipped_tiles += 1;
                continue;
            };
            tile_draws.push(TileDraw {
                key: tile.key,
                model: tile_model(&tile.tile_to_world, &matrices.view_projection),
                dem: tile.key.dem_mapping(&entry.key),
                dem_size: entry.dem_size(),
                texture: entry.texture.clone(),
                skirt_height: skirt_height(camera.zoom, exaggeration, entry.texture_size),
                grid_level: select_grid_level(tile.key.z, grid_level_count),
                edge_meters: tile.key.edge_meters(),
            });
        }
        stats.drawn_tiles = tile_draws.len();
        stats.smoothing_passes = config.smoothing_pass_count;

        if stats.skipped_tiles > 0 {
            log::debug!(
                "[FrameState] Frame {}: {} of {} tiles waiting for elevation",
                self.frame_index,
                stats.skipped_tiles,
                stats.visible_tiles
            );
        }

        Some(FramePlan {
            camera,
            matrices,
            min_elevation,
            tile_draws,
            height_source: SmoothingChain::final_source(config.smoothing_pass_count),
            stats,
        })
    }
}
