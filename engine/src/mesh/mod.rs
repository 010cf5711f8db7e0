//! Tile grid meshes
//!
//! One regular grid per level of detail, shared by every tile drawn at that
//! level. Elevation is applied in the vertex shader, so the meshes are flat.

pub mod grid;

pub use grid::{
    GridLevels, GridMesh, GridVertex, LEVEL_ZOOM_BREAKS, TILE_EXTENT, select_grid_level, skirt_height,
};
