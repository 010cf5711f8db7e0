//! Render Module
//!
//! The wgpu side of the terrain renderer: one struct per pass, the offscreen
//! targets that wire them together, and [`TerrainRenderer`] which runs them
//! in order every frame. Frame planning ([`frame`]) is GPU-free.

pub mod composite_pass;
pub mod contour_pass;
pub mod frame;
pub mod gpu_context;
pub mod height_pass;
pub mod mask_pass;
pub mod overlay_pass;
pub mod render_pass;
pub mod renderer;
pub mod shader_loader;
pub mod smoothing_pass;
pub mod targets;
pub mod uniforms;
pub mod water_pass;

pub use composite_pass::{CompositePass, composite_pixel};
pub use contour_pass::ContourPass;
pub use frame::{
    FramePlan, FrameState, FrameStats, OVERLAY_REGION, TerrainHost, TileDraw, VisibleTile,
};
pub use gpu_context::{DEPTH_FORMAT, GpuContext};
pub use height_pass::{DemTexture, HeightPass};
pub use mask_pass::MaskPass;
pub use overlay_pass::OverlayPass;
pub use render_pass::{FrameContext, TerrainPassKind};
pub use renderer::{FrameOutcome, IdleReason, TerrainRenderer};
pub use shader_loader::create_shader_module;
pub use smoothing_pass::{HeightSource, SmoothingChain, SmoothingPass};
pub use targets::{HEIGHT_FORMAT, LAYER_FORMAT, MASK_FORMAT, RenderTarget, RenderTargets};
pub use uniforms::{NO_DATA_ELEVATION, NO_DATA_THRESHOLD};
pub use water_pass::{WaterNormalPass, WaterSurfacePass};
