//! Seabed Terrain Engine
//!
//! Renders a tiled elevation dataset (including relief below sea level) as a
//! shaded, contour-banded terrain surface with an animated water layer, drawn
//! into a host map engine's frame.
//!
//! # Modules
//!
//! - [`tile`] - Tile keys and the LRU elevation tile cache
//! - [`mesh`] - Level-of-detail grid meshes with seam-hiding skirts
//! - [`camera`] - Camera snapshot and clip-plane / matrix solver
//! - [`render`] - The multi-pass wgpu pipeline and its orchestrator
//! - [`config`] - Typed, serde-backed tunables
//! - [`assets`] - Textures, region of interest and props handed over at setup
//!
//! # Example
//!
//! ```ignore
//! use seabed_terrain_engine::{TerrainConfig, TerrainRenderer, GpuContext};
//!
//! let mut renderer = TerrainRenderer::new(TerrainConfig::default())?;
//! renderer.setup(&gpu, &assets, &mut host)?;
//!
//! // every frame, from the host's render callback
//! let outcome = renderer.render(&gpu, &mut frame, &mut host);
//! ```

pub mod assets;
pub mod camera;
pub mod config;
pub mod error;
pub mod mercator;
pub mod mesh;
pub mod render;
pub mod tile;

pub use assets::{PropAsset, PropMesh, PropPlacement, PropVertex, RegionOfInterest, TerrainAssets};
pub use camera::{CameraFrame, FrameMatrices};
pub use config::{RgbColor, TerrainConfig};
pub use error::{TerrainError, TerrainResult};
pub use mesh::{GridMesh, GridVertex, TILE_EXTENT};
pub use render::{
    FrameContext, FrameOutcome, FrameStats, GpuContext, TerrainHost, TerrainRenderer, VisibleTile,
};
pub use tile::{ElevationSummary, ElevationTileCache, ElevationTileEntry, TileKey};
