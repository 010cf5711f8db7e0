//! Camera snapshot
//!
//! Everything the solver needs from the host's map camera for one frame.
//! Positions are in normalized mercator units; `position.z` is the camera
//! altitude in the same units.

use glam::{DQuat, DVec2, DVec3};

use crate::mercator::{lng_lat_to_mercator, mercator_z_from_altitude};

/// Raster tile size the world size is measured in.
pub const TILE_SIZE_PX: f64 = 512.0;

/// Fraction of the camera-to-sea-level distance where the horizon clamps the far plane.
pub const DEFAULT_HORIZON_SHIFT: f64 = 0.1;

/// Camera state for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrame {
    /// Camera position (mercator x, y and altitude)
    pub position: DVec3,
    /// Camera rotation; identity looks straight down with north up
    pub orientation: DQuat,
    /// Pitch away from straight down (radians)
    pub pitch: f64,
    /// Vertical field of view (radians)
    pub fov: f64,
    /// Viewport size in pixels
    pub width: f64,
    pub height: f64,
    /// Map zoom level (fractional)
    pub zoom: f64,
    /// World width in pixels at `zoom`
    pub world_size: f64,
    /// Pixels per metre at the map centre
    pub pixels_per_meter: f64,
    /// Offset of the vanishing point from the viewport centre (pixels)
    pub center_offset: DVec2,
    pub horizon_shift: f64,
}

impl CameraFrame {
    /// Orbit camera looking at `center` (lng/lat degrees) the way a slippy map
    /// frames it: `bearing` clockwise from north, `pitch` away from nadir.
    pub fn looking_at(
        center: [f64; 2],
        zoom: f64,
        pitch_deg: f64,
        bearing_deg: f64,
        fov_deg: f64,
        width: f64,
        height: f64,
    ) -> Self {
        let pitch = pitch_deg.to_radians();
        let fov = fov_deg.to_radians();
        let world_size = TILE_SIZE_PX * 2f64.powf(zoom);
        let pixels_per_meter = mercator_z_from_altitude(1.0, center[1]) * world_size;
        let orientation = orientation_from_pitch_bearing(pitch, bearing_deg.to_radians());

        let [cx, cy] = lng_lat_to_mercator(center[0], center[1]);
        let distance = 0.5 / (fov / 2.0).tan() * height / world_size;
        let forward = orientation * DVec3::NEG_Z;
        let position = DVec3::new(cx, cy, 0.0) - forward * distance;

        Self {
            position,
            orientation,
            pitch,
            fov,
            width,
            height,
            zoom,
            world_size,
            pixels_per_meter,
            center_offset: DVec2::ZERO,
            horizon_shift: DEFAULT_HORIZON_SHIFT,
        }
    }

    /// Distance from the camera to the point it orbits, in pixels.
    pub fn camera_to_center_distance(&self) -> f64 {
        0.5 / (self.fov / 2.0).tan() * self.height
    }

    /// Vertical field of view between the view axis and the top edge.
    pub fn fov_above_center(&self) -> f64 {
        self.fov * (0.5 + self.center_offset.y / self.height)
    }

    pub fn has_viewport(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn forward(&self) -> DVec3 {
        self.orientation * DVec3::NEG_Z
    }
}

/// Rotate about z by `-bearing`, then about the local x axis by `-pitch`.
pub fn orientation_from_pitch_bearing(pitch: f64, bearing: f64) -> DQuat {
    DQuat::from_rotation_z(-bearing) * DQuat::from_rotation_x(-pitch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_down_camera_sits_above_center() {
        let camera = CameraFrame::looking_at([0.0, 0.0], 4.0, 0.0, 0.0, 36.87, 600.0, 400.0);
        assert!((camera.position.x - 0.5).abs() < 1e-12);
        assert!((camera.position.y - 0.5).abs() < 1e-12);
        let altitude_px = camera.position.z * camera.world_size;
        assert!((altitude_px - camera.camera_to_center_distance()).abs() < 1e-6);
    }

    #[test]
    fn test_pitched_camera_looks_north() {
        let camera = CameraFrame::looking_at([0.0, 0.0], 4.0, 60.0, 0.0, 36.87, 600.0, 400.0);
        // forward tilts towards negative mercator y
        assert!(camera.forward().y < 0.0);
        assert!(camera.position.y > 0.5);
    }
}
