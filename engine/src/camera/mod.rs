//! Camera Module
//!
//! A per-frame camera snapshot taken from the host map view, and the solver
//! that turns it into view-projection matrices with a far plane pushed deep
//! enough for relief below sea level.

pub mod frame;
pub mod solver;

pub use frame::{CameraFrame, DEFAULT_HORIZON_SHIFT, TILE_SIZE_PX};
pub use solver::{
    FrameMatrices, MAX_DEM_ERROR_METERS, compute_projection, far_plane_distance,
    min_visible_elevation, tile_model, world_to_camera,
};
