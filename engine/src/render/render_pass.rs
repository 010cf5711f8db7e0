//! Render Pass Abstraction
//!
//! The terrain frame is a fixed sequence of passes, each reading only what
//! earlier passes wrote. [`TerrainPassKind`] names them in execution order;
//! [`FrameContext`] carries the host's encoder and output for one frame.

use wgpu::{CommandEncoder, TextureView};

/// Terrain passes in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TerrainPassKind {
    /// Per-tile elevation into the height and depth buffers
    Height = 0,
    /// Optional ping-pong smoothing of the height buffer
    Smoothing = 100,
    /// Region-of-interest coverage
    Mask = 200,
    /// Colour ramp, contour lines and hillshade
    Contour = 300,
    /// Animated ripple normals over the region bounds
    WaterNormal = 400,
    /// Fresnel and specular water shading
    WaterSurface = 500,
    /// Blend of contour and water into the host target
    Composite = 600,
    /// Terrain depth written back into the host depth buffer, then props
    Overlay = 700,
}

impl TerrainPassKind {
    pub const ALL: [TerrainPassKind; 8] = [
        TerrainPassKind::Height,
        TerrainPassKind::Smoothing,
        TerrainPassKind::Mask,
        TerrainPassKind::Contour,
        TerrainPassKind::WaterNormal,
        TerrainPassKind::WaterSurface,
        TerrainPassKind::Composite,
        TerrainPassKind::Overlay,
    ];

    /// Unique name for this pass (for debugging/profiling)
    pub fn name(self) -> &'static str {
        match self {
            TerrainPassKind::Height => "Height Pass",
            TerrainPassKind::Smoothing => "Smoothing Pass",
            TerrainPassKind::Mask => "Mask Pass",
            TerrainPassKind::Contour => "Contour Pass",
            TerrainPassKind::WaterNormal => "Water Normal Pass",
            TerrainPassKind::WaterSurface => "Water Surface Pass",
            TerrainPassKind::Composite => "Composite Pass",
            TerrainPassKind::Overlay => "Overlay Pass",
        }
    }
}

/// Frame context for a single render frame
pub struct FrameContext<'a> {
    pub encoder: &'a mut CommandEncoder,
    /// Host colour output the composite and overlay land in
    pub color_view: &'a TextureView,
    /// Host depth buffer the terrain depth is restored into
    pub depth_view: &'a TextureView,
    /// Seconds since the host started (drives the water animation)
    pub time: f32,
}

/// Begin a pass on an offscreen colour target, optionally with depth.
///
/// `clear` of `None` keeps the target's contents.
pub fn begin_target_pass<'e>(
    encoder: &'e mut CommandEncoder,
    kind: TerrainPassKind,
    view: &TextureView,
    clear: Option<wgpu::Color>,
    depth: Option<&TextureView>,
) -> wgpu::RenderPass<'e> {
    let load = match clear {
        Some(color) => wgpu::LoadOp::Clear(color),
        None => wgpu::LoadOp::Load,
    };
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(kind.name()),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: depth.map(|view| wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_order_is_sorted() {
        let mut sorted = TerrainPassKind::ALL;
        sorted.sort();
        assert_eq!(sorted, TerrainPassKind::ALL);
    }
}
