//! Water Passes
//!
//! Two passes build the water layer:
//!
//! 1. [`WaterNormalPass`] draws the region's bounding quad at sea level and
//!    blends two scrolling normal maps into an animated ripple normal.
//! 2. [`WaterSurfacePass`] shades every masked pixel below the water
//!    threshold with fresnel, specular and depth-based colour and opacity.

use crate::assets::RegionOfInterest;
use crate::camera::{CameraFrame, FrameMatrices};
use crate::config::TerrainConfig;

use super::gpu_context::{
    GpuContext, depth_texture_entry, filtering_sampler_entry, loaded_texture_entry, sampled_texture_entry,
    uniform_entry,
};
use super::render_pass::{TerrainPassKind, begin_target_pass};
use super::shader_loader::{create_shader_module, embedded};
use super::smoothing_pass::HeightSource;
use super::targets::{LAYER_FORMAT, RenderTargets};
use super::uniforms::{WaterNormalUniforms, WaterSurfaceUniforms};

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Ripple normal pass renderer
pub struct WaterNormalPass {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    quad_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    bounds: [f32; 4],
    _normal_textures: [wgpu::Texture; 2],
}

impl WaterNormalPass {
    pub fn new(ctx: &GpuContext, normal_maps: &[image::RgbaImage; 2], region: &RegionOfInterest) -> Self {
        let shader = create_shader_module(ctx.device, "Water Normal Shader", embedded::WATER_NORMAL);

        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Water Normal Bind Group Layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT, None),
                    sampled_texture_entry(1, wgpu::ShaderStages::FRAGMENT),
                    sampled_texture_entry(2, wgpu::ShaderStages::FRAGMENT),
                    filtering_sampler_entry(3, wgpu::ShaderStages::FRAGMENT),
                ],
            });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Water Normal Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Water Normal Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x2,
                        }],
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: LAYER_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
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

        let bounds = region.bounds();
        let uniform_buffer = ctx.create_uniform_buffer(
            "Water Normal Uniforms",
            &WaterNormalUniforms {
                matrix: glam::Mat4::IDENTITY.to_cols_array_2d(),
                sampler_params: [1.0; 4],
                bounds,
                time: 0.0,
                _pad: [0.0; 3],
            },
        );
        let quad_buffer = ctx.create_vertex_buffer("Water Quad Vertices", &region.bbox_quad());
        let index_buffer = ctx.create_index_buffer("Water Quad Indices", &QUAD_INDICES);

        let (texture_1, view_1) = ctx.create_rgba_texture("Water Normal Map 1", &normal_maps[0]);
        let (texture_2, view_2) = ctx.create_rgba_texture("Water Normal Map 2", &normal_maps[1]);
        let sampler = ctx.create_linear_sampler("Water Normal Sampler", wgpu::AddressMode::Repeat);

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Water Normal Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view_1),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&view_2),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        log::info!("[WaterNormalPass] Initialized over bounds {:?}", bounds);

        Self {
            pipeline,
            bind_group,
            uniform_buffer,
            quad_buffer,
            index_buffer,
            bounds,
            _normal_textures: [texture_1, texture_2],
        }
    }

    /// Encode the ripple normal pass at animation time `time` (seconds).
    pub fn render(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        matrices: &FrameMatrices,
        config: &TerrainConfig,
        time: f32,
    ) {
        let uniforms = WaterNormalUniforms {
            matrix: matrices.mercator_matrix_f32().to_cols_array_2d(),
            sampler_params: config.water_sampler_params,
            bounds: self.bounds,
            time,
            _pad: [0.0; 3],
        };
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut pass = begin_target_pass(
            encoder,
            TerrainPassKind::WaterNormal,
            &targets.water_normal.view,
            Some(wgpu::Color::TRANSPARENT),
            None,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
    }
}

/// Water shading pass renderer
pub struct WaterSurfacePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
}

impl WaterSurfacePass {
    pub fn new(ctx: &GpuContext) -> Self {
        let shader = create_shader_module(ctx.device, "Water Surface Shader", embedded::WATER_SURFACE);

        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Water Surface Bind Group Layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::FRAGMENT, None),
                    loaded_texture_entry(1, wgpu::ShaderStages::FRAGMENT),
                    loaded_texture_entry(2, wgpu::ShaderStages::FRAGMENT),
                    loaded_texture_entry(3, wgpu::ShaderStages::FRAGMENT),
                    depth_texture_entry(4, wgpu::ShaderStages::FRAGMENT),
                ],
            });

        let pipeline = ctx.create_fullscreen_pipeline(
            "Water Surface",
            &shader,
            &[&bind_group_layout],
            wgpu::ColorTargetState {
                format: LAYER_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            },
            None,
        );

        let uniform_buffer = ctx.create_empty_uniform_buffer(
            "Water Surface Uniforms",
            std::mem::size_of::<WaterSurfaceUniforms>() as u64,
        );

        log::info!("[WaterSurfacePass] Initialized");

        Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
        }
    }

    /// Encode the water shading pass reading heights from `source`.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        source: HeightSource,
        camera: &CameraFrame,
        matrices: &FrameMatrices,
        config: &TerrainConfig,
        time: f32,
    ) {
        let (width, height) = targets.dimensions();
        let [lx, ly, lz] = config.light_position;
        let uniforms = WaterSurfaceUniforms {
            inverse_matrix: matrices.inverse_mercator().as_mat4().to_cols_array_2d(),
            camera_position: [
                camera.position.x as f32,
                camera.position.y as f32,
                camera.position.z as f32,
                1.0,
            ],
            light: [lx, ly, lz, config.specular_power],
            shallow_color: config.shallow_color.to_unit_rgba(1.0),
            deep_color: config.deep_color.to_unit_rgba(1.0),
            elevation_range: config.elevation_range,
            threshold: config.water_threshold,
            time,
            screen_size: [width as f32, height as f32],
            _pad: [0.0; 2],
        };
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Water Surface Bind Group"),
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
                    resource: wgpu::BindingResource::TextureView(&targets.water_normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&targets.depth.view),
                },
            ],
        });

        let mut pass = begin_target_pass(
            encoder,
            TerrainPassKind::WaterSurface,
            &targets.water.view,
            Some(wgpu::Color::TRANSPARENT),
            None,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
