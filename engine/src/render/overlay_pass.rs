//! Overlay Pass Module
//!
//! Runs last, on the host's own colour and depth attachments:
//!
//! 1. Depth restore: a fullscreen draw copies the terrain depth into the
//!    host depth buffer (colour writes masked off).
//! 2. Props: textured meshes placed in mercator space, depth-tested
//!    against the restored terrain.

use crate::assets::{PropAsset, PropPlacement, PropVertex};
use crate::camera::FrameMatrices;
use crate::config::TerrainConfig;

use super::gpu_context::{
    GpuContext, aligned_uniform_stride, depth_texture_entry, filtering_sampler_entry, sampled_texture_entry,
    uniform_entry,
};
use super::render_pass::TerrainPassKind;
use super::shader_loader::{create_shader_module, embedded};
use super::targets::RenderTargets;
use super::uniforms::{PropFrameUniforms, PropInstanceUniforms};

/// GPU copy of one prop mesh.
struct PropDraw {
    placement: PropPlacement,
    local_transform: glam::Mat4,
    spinning: bool,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    texture_bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

/// Overlay pass renderer
pub struct OverlayPass {
    restore_pipeline: wgpu::RenderPipeline,
    restore_layout: wgpu::BindGroupLayout,
    prop_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_stride: u64,
    prop_bind_group: wgpu::BindGroup,
    props: Vec<PropDraw>,
}

impl OverlayPass {
    pub fn new(ctx: &GpuContext, props: &[PropAsset]) -> Self {
        let restore_shader = create_shader_module(ctx.device, "Depth Restore Shader", embedded::DEPTH_RESTORE);
        let restore_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Depth Restore Bind Group Layout"),
                entries: &[depth_texture_entry(0, wgpu::ShaderStages::FRAGMENT)],
            });
        let restore_pipeline = ctx.create_fullscreen_pipeline(
            "Depth Restore",
            &restore_shader,
            &[&restore_layout],
            wgpu::ColorTargetState {
                format: ctx.target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::empty(),
            },
            Some(wgpu::DepthStencilState {
                format: ctx.depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
        );

        let prop_shader = create_shader_module(ctx.device, "Prop Shader", embedded::PROP);
        let instance_size = std::mem::size_of::<PropInstanceUniforms>() as u64;
        let prop_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Prop Bind Group Layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT, None),
                    uniform_entry(1, wgpu::ShaderStages::VERTEX, Some(instance_size)),
                ],
            });
        let texture_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Prop Texture Bind Group Layout"),
                entries: &[
                    sampled_texture_entry(0, wgpu::ShaderStages::FRAGMENT),
                    filtering_sampler_entry(1, wgpu::ShaderStages::FRAGMENT),
                ],
            });
        let prop_pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Prop Pipeline Layout"),
                bind_group_layouts: &[&prop_layout, &texture_layout],
                push_constant_ranges: &[],
            });
        let prop_pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Prop Pipeline"),
                layout: Some(&prop_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &prop_shader,
                    entry_point: Some("vs_main"),
                    buffers: &[PropVertex::desc()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &prop_shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.target_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: ctx.depth_format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        let frame_buffer = ctx.create_empty_uniform_buffer(
            "Prop Frame Uniforms",
            std::mem::size_of::<PropFrameUniforms>() as u64,
        );
        let mesh_count = props.iter().map(|p| p.meshes.len()).sum::<usize>().max(1) as u64;
        let instance_stride = aligned_uniform_stride(ctx.device, instance_size);
        let instance_buffer = ctx.create_empty_uniform_buffer("Prop Instance Uniforms", instance_stride * mesh_count);
        let prop_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Prop Bind Group"),
            layout: &prop_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &instance_buffer,
                        offset: 0,
                        size: wgpu::BufferSize::new(instance_size),
                    }),
                },
            ],
        });

        let sampler = ctx.create_linear_sampler("Prop Sampler", wgpu::AddressMode::Repeat);
        let props = props
            .iter()
            .flat_map(|prop| prop.meshes.iter().map(move |mesh| (prop.placement, mesh)))
            .filter(|(_, mesh)| !mesh.indices.is_empty() && mesh.texture.width() > 0 && mesh.texture.height() > 0)
            .map(|(placement, mesh)| {
                let (texture, view) = ctx.create_rgba_texture(&format!("Prop {} Texture", mesh.name), &mesh.texture);
                let texture_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Prop Texture Bind Group"),
                    layout: &texture_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                    ],
                });
                PropDraw {
                    placement,
                    vertex_buffer: ctx.create_vertex_buffer(&format!("Prop {} Vertices", mesh.name), &mesh.vertices),
                    index_buffer: ctx.create_index_buffer(&format!("Prop {} Indices", mesh.name), &mesh.indices),
                    index_count: mesh.indices.len() as u32,
                    texture_bind_group,
                    _texture: texture,
                    local_transform: mesh.local_transform,
                    spinning: mesh.spinning,
                }
            })
            .collect::<Vec<_>>();

        log::info!("[OverlayPass] Initialized with {} prop meshes", props.len());

        Self {
            restore_pipeline,
            restore_layout,
            prop_pipeline,
            frame_buffer,
            instance_buffer,
            instance_stride,
            prop_bind_group,
            props,
        }
    }

    pub fn prop_count(&self) -> usize {
        self.props.len()
    }

    /// Encode depth restore and props into the host attachments.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        matrices: &FrameMatrices,
        config: &TerrainConfig,
        frame_index: u64,
    ) {
        let [lx, ly, lz] = config.light_position;
        let frame_uniforms = PropFrameUniforms {
            matrix: matrices.mercator_matrix_f32().to_cols_array_2d(),
            light: [lx, ly, lz, 0.0],
        };
        ctx.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame_uniforms));

        if !self.props.is_empty() {
            let stride = self.instance_stride as usize;
            let mut bytes = vec![0u8; stride * self.props.len()];
            for (i, prop) in self.props.iter().enumerate() {
                let (model, normal) = prop.placement.matrices(&prop.local_transform, prop.spinning, frame_index);
                let uniforms = PropInstanceUniforms {
                    model: model.as_mat4().to_cols_array_2d(),
                    normal: normal.as_mat4().to_cols_array_2d(),
                };
                let offset = i * stride;
                bytes[offset..offset + std::mem::size_of::<PropInstanceUniforms>()]
                    .copy_from_slice(bytemuck::bytes_of(&uniforms));
            }
            ctx.queue.write_buffer(&self.instance_buffer, 0, &bytes);
        }

        let restore_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Depth Restore Bind Group"),
            layout: &self.restore_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&targets.depth.view),
            }],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(TerrainPassKind::Overlay.name()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.restore_pipeline);
        pass.set_bind_group(0, &restore_bind_group, &[]);
        pass.draw(0..3, 0..1);

        if self.props.is_empty() {
            return;
        }
        pass.set_pipeline(&self.prop_pipeline);
        for (i, prop) in self.props.iter().enumerate() {
            let offset = (i as u64 * self.instance_stride) as u32;
            pass.set_bind_group(0, &self.prop_bind_group, &[offset]);
            pass.set_bind_group(1, &prop.texture_bind_group, &[]);
            pass.set_vertex_buffer(0, prop.vertex_buffer.slice(..));
            pass.set_index_buffer(prop.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..prop.index_count, 0, 0..1);
        }
    }
}
