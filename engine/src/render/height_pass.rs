//! Height Pass Module
//!
//! Reconstructs a screen-space height buffer from the visible tiles: every
//! tile draws the grid mesh for its level with its own DEM texture and model
//! matrix. Per-tile uniforms live in one buffer addressed by dynamic offset.
//!
//! Output: elevation and normal in the `Rgba32Float` height target, terrain
//! depth in the depth target. Uncovered pixels keep elevation 9999.

use std::sync::Arc;

use crate::config::TerrainConfig;
use crate::mesh::{GridLevels, GridVertex, TILE_EXTENT};

use super::frame::FramePlan;
use super::gpu_context::{
    DEPTH_FORMAT, GpuContext, aligned_uniform_stride, loaded_texture_entry, uniform_entry,
};
use super::render_pass::{TerrainPassKind, begin_target_pass};
use super::shader_loader::{create_shader_module, embedded};
use super::targets::{HEIGHT_FORMAT, RenderTargets};
use super::uniforms::{NO_DATA_ELEVATION, TileUniforms, flag};

/// Handle to a host DEM texture (`R32Float`, one-texel border).
pub type DemTexture = Arc<wgpu::TextureView>;

const INITIAL_TILE_CAPACITY: u64 = 64;

/// GPU buffers for one grid level.
struct GridLevelBuffers {
    subdivisions: u32,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    /// Indices before the skirt strips
    interior_index_count: u32,
    line_index_buffer: wgpu::Buffer,
    line_index_count: u32,
}

/// Height pass renderer
pub struct HeightPass {
    pipeline: wgpu::RenderPipeline,
    wireframe_pipeline: wgpu::RenderPipeline,
    tile_layout: wgpu::BindGroupLayout,
    dem_layout: wgpu::BindGroupLayout,
    tile_buffer: wgpu::Buffer,
    tile_bind_group: wgpu::BindGroup,
    tile_stride: u64,
    tile_capacity: u64,
    levels: Vec<GridLevelBuffers>,
    /// 1x1 flat DEM for tiles whose elevation has no texture yet
    fallback_dem: wgpu::Texture,
    fallback_bind_group: wgpu::BindGroup,
    fallback_elevation: f32,
}

impl HeightPass {
    pub fn new(ctx: &GpuContext, config: &TerrainConfig) -> Self {
        let shader = create_shader_module(ctx.device, "Height Shader", embedded::HEIGHT);
        let tile_size = std::mem::size_of::<TileUniforms>() as u64;

        let tile_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Height Tile Bind Group Layout"),
                entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX, Some(tile_size))],
            });
        let dem_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Height DEM Bind Group Layout"),
                entries: &[loaded_texture_entry(0, wgpu::ShaderStages::VERTEX)],
            });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Height Pipeline Layout"),
                bind_group_layouts: &[&tile_layout, &dem_layout],
                push_constant_ranges: &[],
            });

        let pipeline = Self::create_pipeline(ctx, &shader, &pipeline_layout, wgpu::PrimitiveTopology::TriangleList);
        let wireframe_pipeline =
            Self::create_pipeline(ctx, &shader, &pipeline_layout, wgpu::PrimitiveTopology::LineList);

        let tile_stride = aligned_uniform_stride(ctx.device, tile_size);
        let (tile_buffer, tile_bind_group) =
            Self::create_tile_buffer(ctx, &tile_layout, tile_stride, INITIAL_TILE_CAPACITY);

        let levels = GridLevels::build(TILE_EXTENT, &config.grid_levels)
            .iter()
            .map(|mesh| {
                let subdivisions = mesh.subdivisions;
                let lines = mesh.wireframe_indices();
                GridLevelBuffers {
                    subdivisions,
                    vertex_buffer: ctx.create_vertex_buffer(&format!("Grid {subdivisions} Vertices"), &mesh.vertices),
                    index_buffer: ctx.create_index_buffer(&format!("Grid {subdivisions} Indices"), &mesh.indices),
                    index_count: mesh.index_count(),
                    interior_index_count: mesh.skirt_index_offset,
                    line_index_buffer: ctx.create_index_buffer(&format!("Grid {subdivisions} Lines"), &lines),
                    line_index_count: lines.len() as u32,
                }
            })
            .collect::<Vec<_>>();

        let fallback_elevation = config.elevation_range[0];
        let (fallback_dem, fallback_view) =
            ctx.create_elevation_texture("Fallback DEM", 1, &[fallback_elevation]);
        let fallback_bind_group = Self::create_dem_bind_group(ctx.device, &dem_layout, &fallback_view);

        log::info!(
            "[HeightPass] Initialized with grid levels {:?}",
            levels.iter().map(|l| l.subdivisions).collect::<Vec<_>>()
        );

        Self {
            pipeline,
            wireframe_pipeline,
            tile_layout,
            dem_layout,
            tile_buffer,
            tile_bind_group,
            tile_stride,
            tile_capacity: INITIAL_TILE_CAPACITY,
            levels,
            fallback_dem,
            fallback_bind_group,
            fallback_elevation,
        }
    }

    fn create_pipeline(
        ctx: &GpuContext,
        shader: &wgpu::ShaderModule,
        layout: &wgpu::PipelineLayout,
        topology: wgpu::PrimitiveTopology,
    ) -> wgpu::RenderPipeline {
        ctx.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(match topology {
                    wgpu::PrimitiveTopology::LineList => "Height Wireframe Pipeline",
                    _ => "Height Pipeline",
                }),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[GridVertex::desc()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: HEIGHT_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // skirts face both ways
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn create_tile_buffer(
        ctx: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = ctx.create_empty_uniform_buffer("Height Tile Uniforms", stride * capacity);
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Height Tile Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<TileUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_dem_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Height DEM Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            }],
        })
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Write per-tile uniforms and build the DEM bind groups for a frame.
    pub fn prepare(
        &mut self,
        ctx: &GpuContext,
        plan: &FramePlan<DemTexture>,
        config: &TerrainConfig,
    ) -> Vec<Option<wgpu::BindGroup>> {
        let count = plan.tile_draws.len() as u64;
        if count > self.tile_capacity {
            let capacity = count.next_power_of_two();
            log::debug!("[HeightPass] Growing tile uniforms {} -> {capacity}", self.tile_capacity);
            let (buffer, bind_group) = Self::create_tile_buffer(ctx, &self.tile_layout, self.tile_stride, capacity);
            self.tile_buffer = buffer;
            self.tile_bind_group = bind_group;
            self.tile_capacity = capacity;
        }

        let fallback_elevation = config.elevation_range[0];
        if fallback_elevation != self.fallback_elevation {
            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &self.fallback_dem,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::bytes_of(&fallback_elevation),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4),
                    rows_per_image: Some(1),
                },
                wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
            );
            self.fallback_elevation = fallback_elevation;
        }

        if plan.tile_draws.is_empty() {
            return Vec::new();
        }

        let stride = self.tile_stride as usize;
        let mut bytes = vec![0u8; stride * plan.tile_draws.len()];
        for (i, draw) in plan.tile_draws.iter().enumerate() {
            let uniforms = TileUniforms {
                matrix: draw.model.as_mat4().to_cols_array_2d(),
                dem_top_left: draw.dem.top_left,
                dem_scale: draw.dem.scale,
                dem_size: draw.dem_size as f32,
                exaggeration: config.exaggeration,
                skirt_height: draw.skirt_height as f32,
                use_skirt: flag(config.use_skirt),
                extent: TILE_EXTENT as f32,
                grid_offset: config.grid_offset,
                tile_meters: draw.edge_meters as f32,
                _pad: 0.0,
            };
            let offset = i * stride;
            bytes[offset..offset + std::mem::size_of::<TileUniforms>()]
                .copy_from_slice(bytemuck::bytes_of(&uniforms));
        }
        ctx.queue.write_buffer(&self.tile_buffer, 0, &bytes);

        plan.tile_draws
            .iter()
            .map(|draw| {
                draw.texture
                    .as_ref()
                    .map(|view| Self::create_dem_bind_group(ctx.device, &self.dem_layout, view))
            })
            .collect()
    }

    /// Encode the height pass.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        plan: &FramePlan<DemTexture>,
        dem_bind_groups: &[Option<wgpu::BindGroup>],
        config: &TerrainConfig,
    ) {
        let wireframe = config.wireframe;
        let clear = wgpu::Color {
            r: NO_DATA_ELEVATION as f64,
            g: 0.0,
            b: 0.0,
            a: 0.0,
        };
        let mut pass = begin_target_pass(
            encoder,
            TerrainPassKind::Height,
            &targets.height.view,
            Some(clear),
            Some(&targets.depth.view),
        );

        pass.set_pipeline(if wireframe {
            &self.wireframe_pipeline
        } else {
            &self.pipeline
        });

        for (i, (draw, dem_group)) in plan.tile_draws.iter().zip(dem_bind_groups).enumerate() {
            let Some(level) = self.levels.get(draw.grid_level).or(self.levels.last()) else {
                return;
            };
            let offset = (i as u64 * self.tile_stride) as u32;
            pass.set_bind_group(0, &self.tile_bind_group, &[offset]);
            pass.set_bind_group(1, dem_group.as_ref().unwrap_or(&self.fallback_bind_group), &[]);
            pass.set_vertex_buffer(0, level.vertex_buffer.slice(..));
            if wireframe {
                pass.set_index_buffer(level.line_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..level.line_index_count, 0, 0..1);
            } else {
                let count = if config.use_skirt {
                    level.index_count
                } else {
                    level.interior_index_count
                };
                pass.set_index_buffer(level.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..count, 0, 0..1);
            }
        }
    }
}
