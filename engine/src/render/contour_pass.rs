//! Contour Pass Module
//!
//! Fullscreen shading of the height buffer inside the mask: palette bands,
//! iso-lines every `contour_interval` metres and a diffuse hillshade. Writes
//! the contour layer the composite pass blends under the water.

use crate::config::TerrainConfig;

use super::gpu_context::{
    GpuContext, filtering_sampler_entry, loaded_texture_entry, sampled_texture_entry, uniform_entry,
};
use super::render_pass::{TerrainPassKind, begin_target_pass};
use super::shader_loader::{create_shader_module, embedded};
use super::smoothing_pass::HeightSource;
use super::targets::{LAYER_FORMAT, RenderTargets};
use super::uniforms::ContourUniforms;

/// Contour pass renderer
pub struct ContourPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    _palette_texture: wgpu::Texture,
    palette_view: wgpu::TextureView,
    palette_sampler: wgpu::Sampler,
}

impl ContourPass {
    pub fn new(ctx: &GpuContext, palette: &image::RgbaImage, config: &TerrainConfig) -> Self {
        let shader = create_shader_module(ctx.device, "Contour Shader", embedded::CONTOUR);

        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Contour Bind Group Layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::FRAGMENT, None),
                    loaded_texture_entry(1, wgpu::ShaderStages::FRAGMENT),
                    loaded_texture_entry(2, wgpu::ShaderStages::FRAGMENT),
                    sampled_texture_entry(3, wgpu::ShaderStages::FRAGMENT),
                    filtering_sampler_entry(4, wgpu::ShaderStages::FRAGMENT),
                ],
            });

        let pipeline = ctx.create_fullscreen_pipeline(
            "Contour",
            &shader,
            &[&bind_group_layout],
            wgpu::ColorTargetState {
                format: LAYER_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            },
            None,
        );

        let uniform_buffer = ctx.create_uniform_buffer("Contour Uniforms", &ContourUniforms::from_config(config));
        let (palette_texture, palette_view) = ctx.create_rgba_texture("Palette Texture", palette);
        let palette_sampler = ctx.create_linear_sampler("Palette Sampler", wgpu::AddressMode::ClampToEdge);

        log::info!(
            "[ContourPass] Initialized (palette {}x{})",
            palette.width(),
            palette.height()
        );

        Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            _palette_texture: palette_texture,
            palette_view,
            palette_sampler,
        }
    }

    /// Encode the contour pass reading heights from `source`.
    pub fn render(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        source: HeightSource,
        config: &TerrainConfig,
    ) {
        ctx.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&ContourUniforms::from_config(config)),
        );

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Contour Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(targets.height_view(source)),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&targets.mask.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&self.palette_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.palette_sampler),
                },
            ],
        });

        let mut pass = begin_target_pass(
            encoder,
            TerrainPassKind::Contour,
            &targets.contour.view,
            Some(wgpu::Color::TRANSPARENT),
            None,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
