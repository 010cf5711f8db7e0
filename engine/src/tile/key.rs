//! Tile identity and DEM sub-region mapping.

use glam::{DMat4, DVec3};

use crate::mercator::{lat_from_mercator_y, meters_per_mercator_unit};
use crate::mesh::TILE_EXTENT;

/// A map tile: zoom level, column, row and world wrap.
///
/// `wrap` counts whole-world copies east (positive) or west (negative) of the
/// primary world, so the same canonical tile can be drawn more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub z: u8,
    pub x: u32,
    pub y: u32,
    pub wrap: i32,
}

impl TileKey {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y, wrap: 0 }
    }

    pub fn with_wrap(self, wrap: i32) -> Self {
        Self { wrap, ..self }
    }

    /// The same tile in the primary world.
    pub fn canonical(&self) -> Self {
        Self { wrap: 0, ..*self }
    }

    pub fn tiles_per_axis(&self) -> u32 {
        1u32 << self.z
    }

    /// Column including whole-world wraps.
    pub fn unwrapped_x(&self) -> f64 {
        self.x as f64 + self.tiles_per_axis() as f64 * self.wrap as f64
    }

    /// Latitude at the tile's vertical centre, degrees.
    pub fn center_lat(&self) -> f64 {
        lat_from_mercator_y((self.y as f64 + 0.5) / self.tiles_per_axis() as f64)
    }

    /// Ground length of one tile edge at its centre latitude, metres.
    pub fn edge_meters(&self) -> f64 {
        meters_per_mercator_unit(self.center_lat()) / self.tiles_per_axis() as f64
    }

    /// Where this tile's area lies inside the DEM tile `dem`.
    ///
    /// A DEM tile from a coarser zoom covers this tile with a sub-rectangle:
    /// `scale = 2^(dem.z - self.z)` and the top-left corner is the fractional
    /// part of the scaled tile coordinates.
    pub fn dem_mapping(&self, dem: &TileKey) -> DemMapping {
        let scale = 2f64.powi(dem.z as i32 - self.z as i32);
        DemMapping {
            top_left: [
                (self.x as f64 * scale).rem_euclid(1.0) as f32,
                (self.y as f64 * scale).rem_euclid(1.0) as f32,
            ],
            scale: scale as f32,
        }
    }

    /// Tile-local units (0..TILE_EXTENT, z in metres) to world pixels.
    pub fn position_matrix(&self, world_size: f64) -> DMat4 {
        let scale = world_size / self.tiles_per_axis() as f64;
        DMat4::from_translation(DVec3::new(
            self.unwrapped_x() * scale,
            self.y as f64 * scale,
            0.0,
        )) * DMat4::from_scale(DVec3::new(
            scale / TILE_EXTENT as f64,
            scale / TILE_EXTENT as f64,
            1.0,
        ))
    }
}

/// Tile-to-world transform of `key` at its standard slippy-map position.
pub fn tile_position_matrix(key: &TileKey, world_size: f64) -> DMat4 {
    key.position_matrix(world_size)
}

impl std::fmt::Display for TileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.wrap == 0 {
            write!(f, "{}/{}/{}", self.z, self.x, self.y)
        } else {
            write!(f, "{}/{}/{}@{}", self.z, self.x, self.y, self.wrap)
        }
    }
}

/// Sub-rectangle of a DEM tile covering a visible tile, in DEM uv units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemMapping {
    pub top_left: [f32; 2],
    pub scale: f32,
}

impl DemMapping {
    pub const IDENTITY: DemMapping = DemMapping {
        top_left: [0.0, 0.0],
        scale: 1.0,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_zoom_maps_whole_tile() {
        let key = TileKey::new(12, 3301, 1700);
        assert_eq!(key.dem_mapping(&key), DemMapping::IDENTITY);
    }

    #[test]
    fn test_coarser_dem_maps_quadrant() {
        let visible = TileKey::new(11, 5, 6);
        let dem = TileKey::new(10, 2, 3);
        let mapping = visible.dem_mapping(&dem);
        assert_eq!(mapping.scale, 0.5);
        assert_eq!(mapping.top_left, [0.5, 0.0]);
    }

    #[test]
    fn test_position_matrix_corners() {
        let key = TileKey::new(1, 1, 0);
        let m = key.position_matrix(512.0);
        let origin = m.transform_point3(DVec3::ZERO);
        let corner = m.transform_point3(DVec3::new(TILE_EXTENT as f64, TILE_EXTENT as f64, 7.0));
        assert_eq!(origin, DVec3::new(256.0, 0.0, 0.0));
        assert_eq!(corner, DVec3::new(512.0, 256.0, 7.0));
    }

    #[test]
    fn test_wrap_shifts_by_world() {
        let key = TileKey::new(0, 0, 0).with_wrap(-1);
        assert_eq!(key.unwrapped_x(), -1.0);
        assert_eq!(key.canonical(), TileKey::new(0, 0, 0));
    }
}
