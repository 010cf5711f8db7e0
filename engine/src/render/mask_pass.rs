//! Mask Pass Module
//!
//! Rasterizes the region of interest at sea level into a coverage mask, read
//! by the contour and water passes. With the depth test on, pixels no tile
//! reached (terrain depth still 1.0) stay uncovered.

use crate::assets::RegionOfInterest;
use crate::camera::FrameMatrices;
use crate::config::TerrainConfig;

use super::gpu_context::{GpuContext, depth_texture_entry, uniform_entry};
use super::render_pass::{TerrainPassKind, begin_target_pass};
use super::shader_loader::{create_shader_module, embedded};
use super::targets::{MASK_FORMAT, RenderTargets};
use super::uniforms::{MaskUniforms, flag};

fn region_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x2,
        }],
    }
}

/// Mask pass renderer
pub struct MaskPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl MaskPass {
    pub fn new(ctx: &GpuContext, region: &RegionOfInterest) -> Self {
        let shader = create_shader_module(ctx.device, "Mask Shader", embedded::MASK);

        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Mask Bind Group Layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT, None),
                    depth_texture_entry(1, wgpu::ShaderStages::FRAGMENT),
                ],
            });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Mask Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Mask Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[region_vertex_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: MASK_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // region winding is whatever the host triangulated
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        let uniform_buffer = ctx.create_uniform_buffer(
            "Mask Uniforms",
            &MaskUniforms {
                matrix: glam::Mat4::IDENTITY.to_cols_array_2d(),
                depth_test: 1.0,
                _pad: [0.0; 3],
            },
        );
        let vertex_buffer = ctx.create_vertex_buffer("Region Vertices", &region.vertices);
        let index_buffer = ctx.create_index_buffer("Region Indices", &region.indices);

        log::info!(
            "[MaskPass] Initialized ({} region vertices, {} triangles)",
            region.vertices.len(),
            region.indices.len() / 3
        );

        Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            vertex_buffer,
            index_buffer,
            index_count: region.indices.len() as u32,
        }
    }

    /// Encode the mask pass. Clears the mask to uncovered first.
    pub fn render(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        matrices: &FrameMatrices,
        config: &TerrainConfig,
    ) {
        let uniforms = MaskUniforms {
            matrix: matrices.mercator_matrix_f32().to_cols_array_2d(),
            depth_test: flag(config.mask_depth_test),
            _pad: [0.0; 3],
        };
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mask Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&targets.depth.view),
                },
            ],
        });

        let mut pass = begin_target_pass(
            encoder,
            TerrainPassKind::Mask,
            &targets.mask.view,
            Some(wgpu::Color::TRANSPARENT),
            None,
        );
        if self.index_count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
