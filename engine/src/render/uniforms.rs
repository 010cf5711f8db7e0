//! Uniform Structs for GPU Shaders
//!
//! GPU-compatible uniform buffer structures that must match the WGSL layout
//! in `shaders/` exactly. Padding uses scalar fields to avoid vec3 alignment
//! surprises.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

use crate::config::TerrainConfig;

/// Height cleared into pixels no tile covers. Shaders treat anything above
/// `NO_DATA_THRESHOLD` as empty.
pub const NO_DATA_ELEVATION: f32 = 9999.0;
pub const NO_DATA_THRESHOLD: f32 = 9000.0;

/// Per-tile height pass uniforms, bound with a dynamic offset.
///
/// WGSL layout (112 bytes):
///   offset   0: matrix (mat4x4<f32>)       = 64 bytes
///   offset  64: dem_top_left (vec2<f32>)   = 8 bytes
///   offset  72: dem_scale (f32)            = 4 bytes
///   offset  76: dem_size (f32)             = 4 bytes
///   offset  80: exaggeration (f32)         = 4 bytes
///   offset  84: skirt_height (f32)         = 4 bytes
///   offset  88: use_skirt (f32)            = 4 bytes
///   offset  92: extent (f32)               = 4 bytes
///   offset  96: grid_offset (vec2<f32>)    = 8 bytes
///   offset 104: tile_meters (f32)          = 4 bytes
///   offset 108: _pad (f32)                 = 4 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct TileUniforms {
    pub matrix: [[f32; 4]; 4],
    pub dem_top_left: [f32; 2],
    pub dem_scale: f32,
    /// DEM samples per edge, excluding the border
    pub dem_size: f32,
    pub exaggeration: f32,
    pub skirt_height: f32,
    pub use_skirt: f32,
    pub extent: f32,
    pub grid_offset: [f32; 2],
    /// Ground length of the tile edge (metres), for slope normals
    pub tile_meters: f32,
    pub _pad: f32,
}

/// Mask pass uniforms.
///
/// WGSL layout (80 bytes):
///   offset  0: matrix (mat4x4<f32>)  = 64 bytes
///   offset 64: depth_test (f32)      = 4 bytes
///   offset 68: _pad0.._pad2 (f32)    = 12 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MaskUniforms {
    pub matrix: [[f32; 4]; 4],
    pub depth_test: f32,
    pub _pad: [f32; 3],
}

/// Contour pass uniforms.
///
/// WGSL layout (80 bytes):
///   offset  0: shallow_color (vec4<f32>)    = 16 bytes
///   offset 16: deep_color (vec4<f32>)       = 16 bytes
///   offset 32: sun (vec4<f32>)              = 16 bytes (xyz direction, w diffuse power)
///   offset 48: elevation_range (vec2<f32>)  = 8 bytes
///   offset 56: interval (f32)               = 4 bytes
///   offset 60: with_contour (f32)           = 4 bytes
///   offset 64: with_lighting (f32)          = 4 bytes
///   offset 68: _pad0.._pad2 (f32)           = 12 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ContourUniforms {
    pub shallow_color: [f32; 4],
    pub deep_color: [f32; 4],
    pub sun: [f32; 4],
    pub elevation_range: [f32; 2],
    pub interval: f32,
    pub with_contour: f32,
    pub with_lighting: f32,
    pub _pad: [f32; 3],
}

/// Water normal pass uniforms.
///
/// WGSL layout (112 bytes):
///   offset  0: matrix (mat4x4<f32>)        = 64 bytes
///   offset 64: sampler_params (vec4<f32>)  = 16 bytes
///   offset 80: bounds (vec4<f32>)          = 16 bytes (min x, min y, max x, max y)
///   offset 96: time (f32)                  = 4 bytes
///   offset 100: _pad0.._pad2 (f32)         = 12 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WaterNormalUniforms {
    pub matrix: [[f32; 4]; 4],
    pub sampler_params: [f32; 4],
    pub bounds: [f32; 4],
    pub time: f32,
    pub _pad: [f32; 3],
}

/// Water surface pass uniforms.
///
/// WGSL layout (160 bytes):
///   offset   0: inverse_matrix (mat4x4<f32>)   = 64 bytes
///   offset  64: camera_position (vec4<f32>)    = 16 bytes
///   offset  80: light (vec4<f32>)              = 16 bytes (xyz position, w specular power)
///   offset  96: shallow_color (vec4<f32>)      = 16 bytes
///   offset 112: deep_color (vec4<f32>)         = 16 bytes
///   offset 128: elevation_range (vec2<f32>)    = 8 bytes
///   offset 136: threshold (f32)                = 4 bytes
///   offset 140: time (f32)                     = 4 bytes
///   offset 144: screen_size (vec2<f32>)        = 8 bytes
///   offset 152: _pad (vec2<f32>)               = 8 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WaterSurfaceUniforms {
    pub inverse_matrix: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub light: [f32; 4],
    pub shallow_color: [f32; 4],
    pub deep_color: [f32; 4],
    pub elevation_range: [f32; 2],
    pub threshold: f32,
    pub time: f32,
    pub screen_size: [f32; 2],
    pub _pad: [f32; 2],
}

/// Composite pass uniforms.
///
/// WGSL layout (16 bytes):
///   offset 0: mix_weight (f32)      = 4 bytes
///   offset 4: _pad0.._pad2 (f32)    = 12 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CompositeUniforms {
    pub mix_weight: f32,
    pub _pad: [f32; 3],
}

/// Per-frame prop uniforms.
///
/// WGSL layout (80 bytes):
///   offset  0: matrix (mat4x4<f32>)   = 64 bytes (mercator to clip)
///   offset 64: light (vec4<f32>)      = 16 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PropFrameUniforms {
    pub matrix: [[f32; 4]; 4],
    pub light: [f32; 4],
}

/// Per-instance prop uniforms, bound with a dynamic offset.
///
/// WGSL layout (128 bytes):
///   offset  0: model (mat4x4<f32>)    = 64 bytes
///   offset 64: normal (mat4x4<f32>)   = 64 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PropInstanceUniforms {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

const_assert_eq!(std::mem::size_of::<TileUniforms>(), 112);
const_assert_eq!(std::mem::size_of::<MaskUniforms>(), 80);
const_assert_eq!(std::mem::size_of::<ContourUniforms>(), 80);
const_assert_eq!(std::mem::size_of::<WaterNormalUniforms>(), 112);
const_assert_eq!(std::mem::size_of::<WaterSurfaceUniforms>(), 160);
const_assert_eq!(std::mem::size_of::<CompositeUniforms>(), 16);
const_assert_eq!(std::mem::size_of::<PropFrameUniforms>(), 80);
const_assert_eq!(std::mem::size_of::<PropInstanceUniforms>(), 128);

impl ContourUniforms {
    pub fn from_config(config: &TerrainConfig) -> Self {
        let sun = config.sun_direction();
        Self {
            shallow_color: config.shallow_color.to_unit_rgba(1.0),
            deep_color: config.deep_color.to_unit_rgba(1.0),
            sun: [sun.x, sun.y, sun.z, config.diffuse_power],
            elevation_range: config.elevation_range,
            interval: config.contour_interval,
            with_contour: flag(config.with_contour),
            with_lighting: flag(config.with_lighting),
            _pad: [0.0; 3],
        }
    }
}

impl CompositeUniforms {
    pub fn from_config(config: &TerrainConfig) -> Self {
        Self {
            mix_weight: config.mix_weight,
            _pad: [0.0; 3],
        }
    }
}

/// Boolean as the 0.0 / 1.0 the shaders compare against 0.5.
pub fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contour_uniforms_scale_colors() {
        let uniforms = ContourUniforms::from_config(&TerrainConfig::default());
        assert!((uniforms.shallow_color[0] - 182.0 / 255.0).abs() < 1e-6);
        assert_eq!(uniforms.deep_color[3], 1.0);
        assert_eq!(uniforms.with_contour, 1.0);
        assert!((uniforms.sun[3] - 1.1).abs() < 1e-6);
    }
}
