//! Terrain Renderer
//!
//! Owns the configuration, the frame state (elevation cache) and every pass,
//! and runs the fixed pass sequence once per host frame:
//!
//! height -> smoothing x k -> mask -> contour -> water normal -> water
//! surface -> composite -> depth restore + props
//!
//! Until [`TerrainRenderer::setup`] has succeeded every frame is an idle
//! no-op that only asks the host for another frame.

use crate::assets::TerrainAssets;
use crate::config::TerrainConfig;
use crate::error::TerrainResult;

use super::composite_pass::CompositePass;
use super::contour_pass::ContourPass;
use super::frame::{FrameState, FrameStats, OVERLAY_REGION, TerrainHost};
use super::gpu_context::GpuContext;
use super::height_pass::{DemTexture, HeightPass};
use super::mask_pass::MaskPass;
use super::overlay_pass::OverlayPass;
use super::render_pass::FrameContext;
use super::smoothing_pass::SmoothingPass;
use super::targets::RenderTargets;
use super::water_pass::{WaterNormalPass, WaterSurfacePass};

/// Why a frame drew nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleReason {
    /// Setup has not completed
    NotReady,
    /// The host viewport has no area yet
    ZeroViewport,
    /// Offscreen targets could not be allocated for the output size
    TargetsUnavailable,
}

/// Result of one [`TerrainRenderer::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Idle(IdleReason),
    Rendered(FrameStats),
}

impl FrameOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, FrameOutcome::Rendered(_))
    }
}

/// Every pass of the terrain frame.
struct TerrainPasses {
    height: HeightPass,
    smoothing: SmoothingPass,
    mask: MaskPass,
    contour: ContourPass,
    water_normal: WaterNormalPass,
    water_surface: WaterSurfacePass,
    composite: CompositePass,
    overlay: OverlayPass,
}

/// The terrain renderer a host map engine drives.
pub struct TerrainRenderer {
    config: TerrainConfig,
    frame_state: FrameState<DemTexture>,
    passes: Option<TerrainPasses>,
    targets: Option<RenderTargets>,
    last_stats: Option<FrameStats>,
    /// Grid levels the height pass meshes were built from
    built_grid_levels: Option<Vec<u32>>,
}

/// Undo edits to grid levels made after the meshes were built.
///
/// Returns whether `config` had to be changed.
fn pin_grid_levels(config: &mut TerrainConfig, built: Option<&[u32]>) -> bool {
    match built {
        Some(built) if config.grid_levels != built => {
            log::warn!(
                "[TerrainRenderer] Grid levels changed after setup; keeping {built:?}"
            );
            config.grid_levels = built.to_vec();
            true
        }
        _ => false,
    }
}

impl TerrainRenderer {
    /// Create an unready renderer. Fails on an invalid configuration.
    pub fn new(config: TerrainConfig) -> TerrainResult<Self> {
        config.validate()?;
        Ok(Self {
            frame_state: FrameState::new(config.cache_capacity),
            config,
            passes: None,
            targets: None,
            last_stats: None,
            built_grid_levels: None,
        })
    }

    /// Build every pipeline and upload the assets.
    ///
    /// Registers the overlay region with the host first. Any wgpu validation
    /// error is returned and leaves the renderer unready for good.
    pub fn setup<H: TerrainHost>(&mut self, ctx: &GpuContext, assets: &TerrainAssets, host: &mut H) -> TerrainResult<()> {
        host.register_overlay_region(&OVERLAY_REGION);

        let region = assets.region_or_world();

        ctx.begin_validation();
        let passes = TerrainPasses {
            height: HeightPass::new(ctx, &self.config),
            smoothing: SmoothingPass::new(ctx),
            mask: MaskPass::new(ctx, &region),
            contour: ContourPass::new(ctx, &assets.palette, &self.config),
            water_normal: WaterNormalPass::new(ctx, &assets.water_normals, &region),
            water_surface: WaterSurfacePass::new(ctx),
            composite: CompositePass::new(ctx, &self.config),
            overlay: OverlayPass::new(ctx, &assets.props),
        };
        ctx.finish_validation("terrain pipelines")?;

        if ctx.width > 0 && ctx.height > 0 {
            ctx.begin_validation();
            let targets = RenderTargets::new(ctx.device, ctx.width, ctx.height);
            ctx.finish_validation("render targets")?;
            self.targets = Some(targets?);
        }

        log::info!(
            "[TerrainRenderer] Ready: {} grid levels, {} prop meshes, {}x{} output",
            passes.height.level_count(),
            passes.overlay.prop_count(),
            ctx.width,
            ctx.height
        );
        self.passes = Some(passes);
        self.built_grid_levels = Some(self.config.grid_levels.clone());
        Ok(())
    }

    /// Match the offscreen targets to the output size in `ctx`.
    pub fn resize(&mut self, ctx: &GpuContext) -> TerrainResult<()> {
        let (width, height) = ctx.dimensions();
        if width == 0 || height == 0 {
            self.targets = None;
            return Ok(());
        }
        if self.targets.as_ref().is_some_and(|t| t.matches(width, height)) {
            return Ok(());
        }
        log::info!("[TerrainRenderer] Resizing targets to {width}x{height}");
        self.targets = None;
        self.targets = Some(RenderTargets::new(ctx.device, width, height)?);
        Ok(())
    }

    /// Draw one frame into the host's colour and depth attachments.
    pub fn render<H: TerrainHost<Texture = DemTexture>>(
        &mut self,
        ctx: &GpuContext,
        frame: &mut FrameContext,
        host: &mut H,
    ) -> FrameOutcome {
        if self.passes.is_none() {
            host.request_repaint();
            return FrameOutcome::Idle(IdleReason::NotReady);
        }

        // apply step: the host may have edited the config since last frame
        pin_grid_levels(&mut self.config, self.built_grid_levels.as_deref());
        self.frame_state.set_cache_capacity(self.config.cache_capacity);

        if let Err(e) = self.resize(ctx) {
            log::error!("[TerrainRenderer] {e}");
            host.request_repaint();
            return FrameOutcome::Idle(IdleReason::TargetsUnavailable);
        }

        let (Some(passes), Some(targets)) = (self.passes.as_mut(), self.targets.as_ref()) else {
            host.request_repaint();
            return FrameOutcome::Idle(IdleReason::ZeroViewport);
        };

        let Some(plan) = self
            .frame_state
            .prepare(host, &self.config, passes.height.level_count())
        else {
            return FrameOutcome::Idle(IdleReason::ZeroViewport);
        };

        let config = &self.config;
        let encoder = &mut *frame.encoder;

        let dem_bind_groups = passes.height.prepare(ctx, &plan, config);
        passes
            .height
            .render(encoder, targets, &plan, &dem_bind_groups, config);
        passes
            .smoothing
            .render(ctx, encoder, targets, config.smoothing_pass_count);
        passes
            .mask
            .render(ctx, encoder, targets, &plan.matrices, config);
        passes
            .contour
            .render(ctx, encoder, targets, plan.height_source, config);
        passes
            .water_normal
            .render(ctx, encoder, targets, &plan.matrices, config, frame.time);
        passes.water_surface.render(
            ctx,
            encoder,
            targets,
            plan.height_source,
            &plan.camera,
            &plan.matrices,
            config,
            frame.time,
        );
        passes
            .composite
            .render(ctx, encoder, targets, frame.color_view, config);
        passes.overlay.render(
            ctx,
            encoder,
            targets,
            frame.color_view,
            frame.depth_view,
            &plan.matrices,
            config,
            plan.stats.frame_index,
        );

        log::trace!(
            "[TerrainRenderer] Frame {}: {} drawn, {} skipped, far {:.1}",
            plan.stats.frame_index,
            plan.stats.drawn_tiles,
            plan.stats.skipped_tiles,
            plan.matrices.far
        );

        self.last_stats = Some(plan.stats);
        FrameOutcome::Rendered(plan.stats)
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Mutable access for a GUI; changes apply on the next frame.
    ///
    /// Grid levels are fixed at setup; edits to them here are ignored.
    pub fn config_mut(&mut self) -> &mut TerrainConfig {
        &mut self.config
    }

    /// Replace the configuration after validating it.
    pub fn set_config(&mut self, mut config: TerrainConfig) -> TerrainResult<()> {
        config.validate()?;
        pin_grid_levels(&mut config, self.built_grid_levels.as_deref());
        self.frame_state.set_cache_capacity(config.cache_capacity);
        self.config = config;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.passes.is_some()
    }

    /// Statistics of the last rendered frame.
    pub fn last_stats(&self) -> Option<FrameStats> {
        self.last_stats
    }

    /// Elevation tiles currently resident.
    pub fn cached_tile_count(&self) -> usize {
        self.frame_state.cache().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_levels_free_before_setup() {
        let mut config = TerrainConfig {
            grid_levels: vec![16, 48],
            ..Default::default()
        };
        assert!(!pin_grid_levels(&mut config, None));
        assert_eq!(config.grid_levels, vec![16, 48]);
    }

    #[test]
    fn test_grid_levels_pinned_after_setup() {
        let mut config = TerrainConfig {
            grid_levels: vec![16, 48],
            ..Default::default()
        };
        assert!(pin_grid_levels(&mut config, Some(&[32, 64, 128])));
        assert_eq!(config.grid_levels, vec![32, 64, 128]);
        assert!(!pin_grid_levels(&mut config, Some(&[32, 64, 128])));
    }

    #[test]
    fn test_set_config_before_setup_takes_new_levels() {
        let mut renderer = TerrainRenderer::new(TerrainConfig::default()).unwrap();
        let config = TerrainConfig {
            grid_levels: vec![16, 48],
            cache_capacity: 12,
            ..Default::default()
        };
        renderer.set_config(config).unwrap();
        assert_eq!(renderer.config().grid_levels, vec![16, 48]);
        assert_eq!(renderer.config().cache_capacity, 12);
        assert!(!renderer.is_ready());
    }
}
