//! Composite Pass Module
//!
//! Blends the water layer over the contour layer and alpha-blends the result
//! into the host's colour output. The host's existing content is kept.

use crate::config::TerrainConfig;

use super::gpu_context::{GpuContext, loaded_texture_entry, uniform_entry};
use super::render_pass::TerrainPassKind;
use super::shader_loader::{create_shader_module, embedded};
use super::targets::RenderTargets;
use super::uniforms::CompositeUniforms;

/// CPU mirror of the composite shader for one pixel.
///
/// Water only contributes where it exists (alpha above zero); there the
/// result is `mix(contour, water, mix_weight)`.
pub fn composite_pixel(contour: [f32; 4], water: [f32; 4], mix_weight: f32) -> [f32; 4] {
    let weight = if water[3] > 0.0 { mix_weight } else { 0.0 };
    std::array::from_fn(|i| contour[i] * (1.0 - weight) + water[i] * weight)
}

/// Composite pass renderer
pub struct CompositePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
}

impl CompositePass {
    pub fn new(ctx: &GpuContext, config: &TerrainConfig) -> Self {
        let shader = create_shader_module(ctx.device, "Composite Shader", embedded::COMPOSITE);

        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Composite Bind Group Layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::FRAGMENT, None),
                    loaded_texture_entry(1, wgpu::ShaderStages::FRAGMENT),
                    loaded_texture_entry(2, wgpu::ShaderStages::FRAGMENT),
                ],
            });

        let pipeline = ctx.create_fullscreen_pipeline(
            "Composite",
            &shader,
            &[&bind_group_layout],
            wgpu::ColorTargetState {
                format: ctx.target_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            },
            None,
        );

        let uniform_buffer =
            ctx.create_uniform_buffer("Composite Uniforms", &CompositeUniforms::from_config(config));

        log::info!("[CompositePass] Initialized for {:?}", ctx.target_format);

        Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
        }
    }

    /// Encode the composite into `output`.
    pub fn render(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        output: &wgpu::TextureView,
        config: &TerrainConfig,
    ) {
        ctx.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&CompositeUniforms::from_config(config)),
        );

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&targets.contour.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&targets.water.view),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(TerrainPassKind::Composite.name()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_water_keeps_contour() {
        let contour = [0.2, 0.4, 0.6, 1.0];
        assert_eq!(composite_pixel(contour, [0.9, 0.9, 0.9, 0.0], 0.8), contour);
    }

    #[test]
    fn test_full_weight_is_exact_water() {
        let water = [0.0, 0.2, 0.9, 0.8];
        assert_eq!(composite_pixel([0.1, 0.5, 0.3, 1.0], water, 1.0), water);
    }

    #[test]
    fn test_half_weight_averages() {
        let out = composite_pixel([0.0, 0.0, 0.0, 1.0], [1.0, 0.5, 0.0, 1.0], 0.5);
        assert_eq!(out, [0.5, 0.25, 0.0, 1.0]);
    }
}
