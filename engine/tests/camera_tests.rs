//! Camera Tests - Clip Planes and Frame Matrices
//!
//! Tests for the minimum-visible-elevation fold, the far plane that follows
//! seabed relief, and agreement between per-tile and mercator matrices.

use glam::DVec3;
use seabed_terrain_engine::camera::{
    CameraFrame, compute_projection, far_plane_distance, min_visible_elevation, tile_model,
};
use seabed_terrain_engine::mercator::lng_lat_to_mercator;
use seabed_terrain_engine::tile::{ElevationSummary, TileKey};

const CENTER: [f64; 2] = [120.4, 32.0];

fn camera(pitch_deg: f64) -> CameraFrame {
    CameraFrame::looking_at(CENTER, 10.0, pitch_deg, 15.0, 36.87, 1024.0, 768.0)
}

fn summary(min: f32) -> ElevationSummary {
    ElevationSummary { min, max: min + 10.0 }
}

// ============================================================================
// Minimum Visible Elevation
// ============================================================================

#[test]
fn test_min_elevation_uses_lowest_tile_with_margin() {
    let summaries = [summary(-5.0), summary(-12.0), summary(3.0)];
    assert_eq!(min_visible_elevation(&summaries, 2.0), -84.0);
}

#[test]
fn test_min_elevation_zero_when_nothing_below_sea_level() {
    let summaries = [summary(0.0), summary(4.0), summary(120.0)];
    assert_eq!(min_visible_elevation(&summaries, 2.0), 0.0);
}

#[test]
fn test_min_elevation_zero_without_tiles() {
    assert_eq!(min_visible_elevation(&[] as &[ElevationSummary], 30.0), 0.0);
}

// ============================================================================
// Far Plane
// ============================================================================

#[test]
fn test_far_plane_top_down_is_one_percent_past_ground() {
    let frame = camera(0.0);
    let far = far_plane_distance(&frame, 0.0);
    let expected = frame.camera_to_center_distance() * 1.01;
    assert!((far - expected).abs() < 1e-6 * expected, "far {far}, expected {expected}");
}

#[test]
fn test_seabed_pushes_far_plane_out() {
    let frame = camera(45.0);
    let sea_level = far_plane_distance(&frame, 0.0);
    let deep = far_plane_distance(&frame, -3000.0);
    assert!(deep > sea_level);
}

#[test]
fn test_steep_pitch_clamps_to_horizon() {
    let frame = camera(85.0);
    let far = far_plane_distance(&frame, 0.0);
    let camera_to_sea_level = frame.position.z * frame.world_size / frame.pitch.cos();
    let horizon = camera_to_sea_level / frame.horizon_shift;
    assert!((far - horizon).abs() < 1e-6 * horizon);
}

// ============================================================================
// Frame Matrices
// ============================================================================

#[test]
fn test_center_projects_to_screen_center() {
    for pitch in [0.0, 30.0, 60.0] {
        let matrices = compute_projection(&camera(pitch), 0.0).unwrap();
        let [x, y] = lng_lat_to_mercator(CENTER[0], CENTER[1]);
        let ndc = matrices.mercator_matrix.project_point3(DVec3::new(x, y, 0.0));
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6, "pitch {pitch}: {ndc:?}");
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}

#[test]
fn test_tile_model_agrees_with_mercator_matrix() {
    let frame = camera(40.0);
    let matrices = compute_projection(&frame, -500.0).unwrap();
    let tile = TileKey::new(10, 875, 420);
    let model = tile_model(&tile.position_matrix(frame.world_size), &matrices.view_projection);

    let tiles = tile.tiles_per_axis() as f64;
    let elevation_m = -40.0;
    let from_tile = model.project_point3(DVec3::new(4096.0, 4096.0, elevation_m));
    let from_mercator = matrices.mercator_matrix.project_point3(DVec3::new(
        (tile.x as f64 + 0.5) / tiles,
        (tile.y as f64 + 0.5) / tiles,
        elevation_m * frame.pixels_per_meter / frame.world_size,
    ));
    assert!((from_tile - from_mercator).length() < 1e-7);
}

#[test]
fn test_zero_height_viewport_skips_matrices() {
    let mut frame = camera(30.0);
    frame.height = 0.0;
    assert!(compute_projection(&frame, -84.0).is_none());
}

#[test]
fn test_near_plane_ignores_elevation() {
    let frame = camera(30.0);
    let shallow = compute_projection(&frame, 0.0).unwrap();
    let deep = compute_projection(&frame, -5000.0).unwrap();
    assert_eq!(shallow.near, deep.near);
    assert!(deep.far > shallow.far);
}
