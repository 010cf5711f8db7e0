//! Smoothing Pass Module
//!
//! Optional blur of the height buffer, `k` passes ping-ponging between two
//! scratch targets:
//!
//! - pass 0 reads the raw height buffer and writes primary
//! - pass i >= 1 reads secondary and writes primary when i is even,
//!   reads primary and writes secondary when i is odd
//!
//! After `k >= 1` passes the result is in primary for odd `k` and secondary
//! for even `k`. With `k = 0` downstream passes read the raw height buffer.

use super::gpu_context::{GpuContext, loaded_texture_entry};
use super::render_pass::{TerrainPassKind, begin_target_pass};
use super::shader_loader::{create_shader_module, embedded};
use super::targets::{HEIGHT_FORMAT, RenderTargets};
use super::uniforms::NO_DATA_ELEVATION;

/// Which height texture a pass reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeightSource {
    /// The height pass output
    Raw,
    SmoothingPrimary,
    SmoothingSecondary,
}

/// Ping-pong bookkeeping for the smoothing passes.
pub struct SmoothingChain;

impl SmoothingChain {
    /// Scratch target holding the result after `passes` passes, by parity.
    pub fn scratch_for_passes(passes: u32) -> HeightSource {
        if passes % 2 == 1 {
            HeightSource::SmoothingPrimary
        } else {
            HeightSource::SmoothingSecondary
        }
    }

    /// Height texture downstream passes read after `passes` passes.
    pub fn final_source(passes: u32) -> HeightSource {
        if passes == 0 {
            HeightSource::Raw
        } else {
            Self::scratch_for_passes(passes)
        }
    }

    /// (source, destination) of pass `index`.
    pub fn step(index: u32) -> (HeightSource, HeightSource) {
        match index {
            0 => (HeightSource::Raw, HeightSource::SmoothingPrimary),
            i if i % 2 == 0 => (HeightSource::SmoothingSecondary, HeightSource::SmoothingPrimary),
            _ => (HeightSource::SmoothingPrimary, HeightSource::SmoothingSecondary),
        }
    }
}

impl RenderTargets {
    /// View of a height texture.
    pub fn height_view(&self, source: HeightSource) -> &wgpu::TextureView {
        match source {
            HeightSource::Raw => &self.height.view,
            HeightSource::SmoothingPrimary => &self.smoothing_primary.view,
            HeightSource::SmoothingSecondary => &self.smoothing_secondary.view,
        }
    }
}

/// Smoothing pass renderer
pub struct SmoothingPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl SmoothingPass {
    pub fn new(ctx: &GpuContext) -> Self {
        let shader = create_shader_module(ctx.device, "Smoothing Shader", embedded::SMOOTHING);

        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Smoothing Bind Group Layout"),
                entries: &[loaded_texture_entry(0, wgpu::ShaderStages::FRAGMENT)],
            });

        let pipeline = ctx.create_fullscreen_pipeline(
            "Smoothing",
            &shader,
            &[&bind_group_layout],
            wgpu::ColorTargetState {
                format: HEIGHT_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            },
            None,
        );

        log::info!("[SmoothingPass] Initialized");

        Self {
            pipeline,
            bind_group_layout,
        }
    }

    /// Encode `passes` smoothing passes.
    pub fn render(&self, ctx: &GpuContext, encoder: &mut wgpu::CommandEncoder, targets: &RenderTargets, passes: u32) {
        let clear = wgpu::Color {
            r: NO_DATA_ELEVATION as f64,
            g: 0.0,
            b: 0.0,
            a: 0.0,
        };

        for index in 0..passes {
            let (source, destination) = SmoothingChain::step(index);
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Smoothing Bind Group"),
                layout: &self.bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(targets.height_view(source)),
                }],
            });

            let mut pass = begin_target_pass(
                encoder,
                TerrainPassKind::Smoothing,
                targets.height_view(destination),
                Some(clear),
                None,
            );
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}
