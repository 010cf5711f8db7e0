//! Clip-plane and matrix solver
//!
//! Derives the frame's view-projection from a [`CameraFrame`]. The far plane
//! is computed against the lowest visible elevation instead of sea level, so
//! seabed relief stays inside the frustum. Each tile's model matrix is the
//! product of one shared view-projection with that tile's placement; tiles
//! never get independent projections, which keeps depth consistent across
//! tile borders.

use glam::{DMat4, DVec3, Mat4};

use super::frame::CameraFrame;
use crate::tile::ElevationSummary;

/// Conservative DEM error subtracted from the lowest elevation (metres).
pub const MAX_DEM_ERROR_METERS: f64 = 30.0;

/// Matrices for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameMatrices {
    /// World pixels (z in metres) to clip space
    pub view_projection: DMat4,
    /// Normalized mercator (z in mercator units) to clip space
    pub mercator_matrix: DMat4,
    pub near: f64,
    pub far: f64,
}

impl FrameMatrices {
    /// Clip space back to normalized mercator.
    pub fn inverse_mercator(&self) -> DMat4 {
        self.mercator_matrix.inverse()
    }

    pub fn mercator_matrix_f32(&self) -> Mat4 {
        self.mercator_matrix.as_mat4()
    }
}

/// Lowest visible elevation in exaggerated metres, or 0 when nothing visible
/// is below sea level.
///
/// Starts from 0, so tiles that lie entirely above sea level never move the
/// far plane.
pub fn min_visible_elevation<'a>(
    summaries: impl IntoIterator<Item = &'a ElevationSummary>,
    exaggeration: f64,
) -> f64 {
    let min = summaries
        .into_iter()
        .map(|s| s.min as f64)
        .fold(0.0, f64::min);
    if min == 0.0 {
        0.0
    } else {
        (min - MAX_DEM_ERROR_METERS) * exaggeration
    }
}

/// Distance to the far plane in pixels.
///
/// Uses the law of sines to find how far the top screen edge meets the plane
/// at `min_elevation`, then clamps to the horizon.
pub fn far_plane_distance(camera: &CameraFrame, min_elevation: f64) -> f64 {
    let fov_above_center = camera.fov_above_center();
    let min_elevation_px = min_elevation * camera.pixels_per_meter;
    let camera_to_sea_level =
        (camera.position.z * camera.world_size - min_elevation_px) / camera.pitch.cos();
    let top_half = fov_above_center.sin() * camera_to_sea_level
        / (std::f64::consts::FRAC_PI_2 - camera.pitch - fov_above_center)
            .max(0.01)
            .sin();
    let furthest = camera.pitch.sin() * top_half + camera_to_sea_level;
    let horizon = camera_to_sea_level * (1.0 / camera.horizon_shift);
    (furthest * 1.01).min(horizon)
}

/// World pixels (z in metres) to camera space.
///
/// Camera space has y up, so the mercator y axis (growing south) is flipped.
pub fn world_to_camera(camera: &CameraFrame) -> DMat4 {
    let inverse_rotation = DMat4::from_quat(camera.orientation.conjugate());
    let translation = DMat4::from_translation(-camera.position * camera.world_size);
    let flip_y = DMat4::from_scale(DVec3::new(1.0, -1.0, 1.0));
    let meters_to_pixels = DMat4::from_scale(DVec3::new(1.0, 1.0, camera.pixels_per_meter));
    flip_y * inverse_rotation * translation * meters_to_pixels
}

/// Build the frame matrices. Returns `None` for an empty viewport.
pub fn compute_projection(camera: &CameraFrame, min_elevation: f64) -> Option<FrameMatrices> {
    if !camera.has_viewport() {
        return None;
    }

    let near = camera.height / 50.0;
    let far = far_plane_distance(camera, min_elevation);

    let mut projection = DMat4::perspective_rh(camera.fov, camera.width / camera.height, near, far);
    // skew the frustum towards the offset vanishing point
    projection.z_axis.x = -camera.center_offset.x * 2.0 / camera.width;
    projection.z_axis.y = camera.center_offset.y * 2.0 / camera.height;

    let view_projection = projection * world_to_camera(camera);
    let mercator_matrix = view_projection
        * DMat4::from_scale(DVec3::new(
            camera.world_size,
            camera.world_size,
            camera.world_size / camera.pixels_per_meter,
        ));

    Some(FrameMatrices {
        view_projection,
        mercator_matrix,
        near,
        far,
    })
}

/// A tile's model-view-projection: shared view-projection times the tile's
/// own tile-local-to-world transform.
pub fn tile_model(tile_to_world: &DMat4, view_projection: &DMat4) -> DMat4 {
    *view_projection * *tile_to_world
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(pitch: f64) -> CameraFrame {
        CameraFrame::looking_at([10.0, 20.0], 11.0, pitch, 30.0, 36.87, 800.0, 600.0)
    }

    #[test]
    fn test_empty_viewport_has_no_projection() {
        let mut frame = camera(0.0);
        frame.height = 0.0;
        assert!(compute_projection(&frame, 0.0).is_none());
    }

    #[test]
    fn test_near_plane_tracks_height() {
        let matrices = compute_projection(&camera(45.0), 0.0).unwrap();
        assert!((matrices.near - 12.0).abs() < 1e-12);
        assert!(matrices.far > matrices.near);
    }

    #[test]
    fn test_inverse_mercator_round_trip() {
        let matrices = compute_projection(&camera(50.0), -300.0).unwrap();
        let p = DVec3::new(0.53, 0.44, 0.0);
        let clip = matrices.mercator_matrix.project_point3(p);
        let back = matrices.inverse_mercator().project_point3(clip);
        assert!((back - p).length() < 1e-7);
    }
}
