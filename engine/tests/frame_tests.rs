//! Frame Tests - Planning a Terrain Frame Without a GPU
//!
//! Drives `FrameState::prepare` with a scripted host whose texture handles
//! are plain integers.

use seabed_terrain_engine::camera::CameraFrame;
use seabed_terrain_engine::render::{FrameState, HeightSource, TerrainHost, VisibleTile};
use seabed_terrain_engine::tile::{ElevationSummary, ElevationTileEntry, TileKey};
use seabed_terrain_engine::TerrainConfig;

const CENTER: [f64; 2] = [120.43, 32.03];

struct ScriptedHost {
    camera: CameraFrame,
    tiles: Vec<VisibleTile<u32>>,
    summaries: Vec<ElevationSummary>,
    repaints: usize,
}

impl ScriptedHost {
    fn new(tiles: Vec<VisibleTile<u32>>) -> Self {
        Self {
            camera: CameraFrame::looking_at(CENTER, 9.0, 45.0, 0.0, 36.87, 800.0, 600.0),
            tiles,
            summaries: vec![ElevationSummary { min: -40.0, max: 5.0 }],
            repaints: 0,
        }
    }
}

impl TerrainHost for ScriptedHost {
    type Texture = u32;

    fn camera(&self) -> CameraFrame {
        self.camera
    }

    fn visible_tiles(&self) -> Vec<VisibleTile<u32>> {
        self.tiles.clone()
    }

    fn elevation_summaries(&self) -> Vec<ElevationSummary> {
        self.summaries.clone()
    }

    fn request_repaint(&mut self) {
        self.repaints += 1;
    }
}

fn tile(x: u32, y: u32) -> VisibleTile<u32> {
    VisibleTile::new(TileKey::new(9, x, y), 512.0 * 2f64.powi(9))
}

fn entry(key: TileKey, texture: u32) -> ElevationTileEntry<u32> {
    ElevationTileEntry::new(key, texture, 66)
}

// ============================================================================
// Tile Selection
// ============================================================================

#[test]
fn test_tiles_without_elevation_are_skipped() {
    let a = TileKey::new(9, 427, 208);
    let b = TileKey::new(9, 428, 208);
    let mut host = ScriptedHost::new(vec![
        tile(427, 208).with_elevation(entry(a, 1)),
        tile(428, 208).with_elevation(entry(b, 2)),
        tile(429, 208),
    ]);
    let mut state = FrameState::<u32>::new(16);

    let plan = state.prepare(&mut host, &TerrainConfig::default(), 3).expect("plan");

    assert_eq!(plan.stats.visible_tiles, 3);
    assert_eq!(plan.stats.drawn_tiles, 2);
    assert_eq!(plan.stats.skipped_tiles, 1);
    assert_eq!(plan.tile_draws.len(), 2);
    assert_eq!(host.repaints, 1);
}

#[test]
fn test_empty_viewport_still_requests_repaint() {
    let mut host = ScriptedHost::new(vec![tile(427, 208)]);
    host.camera = CameraFrame::looking_at(CENTER, 9.0, 45.0, 0.0, 36.87, 800.0, 0.0);
    let mut state = FrameState::<u32>::new(16);

    assert!(state.prepare(&mut host, &TerrainConfig::default(), 3).is_none());
    assert_eq!(host.repaints, 1);
    assert_eq!(state.frame_index(), 1);
}

#[test]
fn test_cached_elevation_outlives_host_entry() {
    let key = TileKey::new(9, 427, 208);
    let mut host = ScriptedHost::new(vec![tile(427, 208).with_elevation(entry(key, 7))]);
    let mut state = FrameState::<u32>::new(16);
    let config = TerrainConfig::default();
    state.prepare(&mut host, &config, 3).expect("first frame");

    host.tiles = vec![tile(427, 208)];
    let plan = state.prepare(&mut host, &config, 3).expect("second frame");

    assert_eq!(plan.stats.drawn_tiles, 1);
    assert_eq!(plan.tile_draws[0].texture, Some(7));
    assert_eq!(plan.stats.frame_index, 2);
}

#[test]
fn test_current_elevation_wins_over_previous() {
    let key = TileKey::new(9, 427, 208);
    let coarse = TileKey::new(8, 213, 104);
    let mut host = ScriptedHost::new(vec![tile(427, 208)
        .with_previous_elevation(entry(coarse, 3))
        .with_elevation(entry(key, 4))]);
    let mut state = FrameState::<u32>::new(16);

    let plan = state.prepare(&mut host, &TerrainConfig::default(), 3).expect("plan");

    assert_eq!(plan.tile_draws[0].texture, Some(4));
    assert_eq!(state.cache().len(), 1);
}

#[test]
fn test_coarser_previous_elevation_maps_into_quadrant() {
    let coarse = TileKey::new(8, 213, 104);
    let mut host = ScriptedHost::new(vec![tile(427, 208).with_previous_elevation(entry(coarse, 3))]);
    let mut state = FrameState::<u32>::new(16);

    let plan = state.prepare(&mut host, &TerrainConfig::default(), 3).expect("plan");

    let draw = &plan.tile_draws[0];
    assert_eq!(draw.dem.scale, 0.5);
    assert_eq!(draw.dem.top_left, [0.5, 0.0]);
}

#[test]
fn test_missing_texture_draws_with_fallback() {
    let key = TileKey::new(9, 427, 208);
    let mut host = ScriptedHost::new(vec![
        tile(427, 208).with_elevation(ElevationTileEntry::without_texture(key, 66)),
    ]);
    let mut state = FrameState::<u32>::new(16);

    let plan = state.prepare(&mut host, &TerrainConfig::default(), 3).expect("plan");

    assert_eq!(plan.stats.drawn_tiles, 1);
    assert_eq!(plan.tile_draws[0].texture, None);
}

#[test]
fn test_textureless_current_keeps_previous_data() {
    let key = TileKey::new(9, 427, 208);
    let coarse = TileKey::new(8, 213, 104);
    let mut host = ScriptedHost::new(vec![tile(427, 208)
        .with_previous_elevation(entry(coarse, 3))
        .with_elevation(ElevationTileEntry::without_texture(key, 66))]);
    let mut state = FrameState::<u32>::new(16);

    let plan = state.prepare(&mut host, &TerrainConfig::default(), 3).expect("plan");

    assert_eq!(plan.tile_draws[0].texture, Some(3));
    assert_eq!(plan.tile_draws[0].dem.scale, 0.5);
}

#[test]
fn test_textureless_update_keeps_cached_texture() {
    let key = TileKey::new(9, 427, 208);
    let mut host = ScriptedHost::new(vec![tile(427, 208).with_elevation(entry(key, 7))]);
    let mut state = FrameState::<u32>::new(16);
    let config = TerrainConfig::default();
    state.prepare(&mut host, &config, 3).expect("first frame");

    host.tiles = vec![tile(427, 208).with_elevation(ElevationTileEntry::without_texture(key, 66))];
    let plan = state.prepare(&mut host, &config, 3).expect("second frame");

    assert_eq!(plan.tile_draws[0].texture, Some(7));
}

#[test]
fn test_textured_update_replaces_fallback() {
    let key = TileKey::new(9, 427, 208);
    let mut host = ScriptedHost::new(vec![
        tile(427, 208).with_elevation(ElevationTileEntry::without_texture(key, 66)),
    ]);
    let mut state = FrameState::<u32>::new(16);
    let config = TerrainConfig::default();
    let plan = state.prepare(&mut host, &config, 3).expect("first frame");
    assert_eq!(plan.tile_draws[0].texture, None);

    host.tiles = vec![tile(427, 208).with_elevation(entry(key, 9))];
    let plan = state.prepare(&mut host, &config, 3).expect("second frame");

    assert_eq!(plan.tile_draws[0].texture, Some(9));
}

// ============================================================================
// Frame Settings
// ============================================================================

#[test]
fn test_height_source_follows_smoothing_count() {
    let mut host = ScriptedHost::new(vec![]);
    let mut state = FrameState::<u32>::new(16);
    let mut config = TerrainConfig::default();

    config.smoothing_pass_count = 0;
    let plan = state.prepare(&mut host, &config, 3).expect("plan");
    assert_eq!(plan.height_source, HeightSource::Raw);

    config.smoothing_pass_count = 3;
    let plan = state.prepare(&mut host, &config, 3).expect("plan");
    assert_eq!(plan.height_source, HeightSource::SmoothingPrimary);
    assert_eq!(plan.stats.smoothing_passes, 3);
}

#[test]
fn test_seabed_lowers_min_elevation() {
    let mut host = ScriptedHost::new(vec![]);
    let mut state = FrameState::<u32>::new(16);
    let config = TerrainConfig {
        exaggeration: 2.0,
        ..Default::default()
    };

    let plan = state.prepare(&mut host, &config, 3).expect("plan");

    assert!(plan.min_elevation < -80.0, "min elevation {}", plan.min_elevation);
}

#[test]
fn test_capacity_change_clears_cache() {
    let key = TileKey::new(9, 427, 208);
    let mut host = ScriptedHost::new(vec![tile(427, 208).with_elevation(entry(key, 1))]);
    let mut state = FrameState::<u32>::new(16);
    state.prepare(&mut host, &TerrainConfig::default(), 3).expect("plan");
    assert_eq!(state.cache().len(), 1);

    state.set_cache_capacity(8);

    assert!(state.cache().is_empty());
    assert_eq!(state.cache().capacity(), 8);
}
