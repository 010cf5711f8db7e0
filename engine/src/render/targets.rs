//! Offscreen render targets
//!
//! Every intermediate image of the terrain frame, sized to the host output.
//! A pass only ever reads targets written by earlier passes, so no texture is
//! bound as input and attachment at once.

use crate::error::{TerrainError, TerrainResult};

use super::gpu_context::DEPTH_FORMAT;

pub const HEIGHT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
pub const MASK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;
pub const LAYER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// One offscreen texture and its default view.
pub struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

impl RenderTarget {
    fn new(device: &wgpu::Device, label: &str, format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view, format }
    }
}

/// All intermediate targets of a terrain frame.
pub struct RenderTargets {
    /// Elevation in r, surface normal in gba
    pub height: RenderTarget,
    pub depth: RenderTarget,
    pub smoothing_primary: RenderTarget,
    pub smoothing_secondary: RenderTarget,
    pub mask: RenderTarget,
    pub water_normal: RenderTarget,
    pub contour: RenderTarget,
    pub water: RenderTarget,
    width: u32,
    height_px: u32,
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> TerrainResult<Self> {
        let max = device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(TerrainError::RenderTarget {
                name: "height",
                message: format!("{width}x{height} outside 1..={max}"),
            });
        }

        log::debug!("[RenderTargets] Allocating {width}x{height} terrain targets");

        Ok(Self {
            height: RenderTarget::new(device, "Terrain Height Target", HEIGHT_FORMAT, width, height),
            depth: RenderTarget::new(device, "Terrain Depth Target", DEPTH_FORMAT, width, height),
            smoothing_primary: RenderTarget::new(device, "Smoothing Primary Target", HEIGHT_FORMAT, width, height),
            smoothing_secondary: RenderTarget::new(device, "Smoothing Secondary Target", HEIGHT_FORMAT, width, height),
            mask: RenderTarget::new(device, "Mask Target", MASK_FORMAT, width, height),
            water_normal: RenderTarget::new(device, "Water Normal Target", LAYER_FORMAT, width, height),
            contour: RenderTarget::new(device, "Contour Target", LAYER_FORMAT, width, height),
            water: RenderTarget::new(device, "Water Target", LAYER_FORMAT, width, height),
            width,
            height_px: height,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height_px)
    }

    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height_px == height
    }
}
