//! Setup-time assets
//!
//! Images and geometry the host hands over once: the palette ramp, the two
//! water normal maps, the region of interest and optional props. Encoded
//! images are decoded here; nothing is read from disk.

use glam::{DMat4, DVec3, Mat4};

use crate::error::{TerrainError, TerrainResult};
use crate::mercator::{lng_lat_to_mercator, mercator_x_from_lng, mercator_y_from_lat};

/// Spin per frame of props flagged as spinning, in radians.
pub const PROP_SPIN_PER_FRAME: f64 = 0.05;

fn decode(name: &'static str, bytes: &[u8]) -> TerrainResult<image::RgbaImage> {
    image::load_from_memory(bytes)
        .map(|decoded| decoded.to_rgba8())
        .map_err(|e| TerrainError::Asset {
            name,
            message: e.to_string(),
        })
}

/// Everything the renderer needs at setup besides the GPU.
#[derive(Debug, Clone)]
pub struct TerrainAssets {
    /// Colour ramp sampled by normalized elevation along x
    pub palette: image::RgbaImage,
    pub water_normals: [image::RgbaImage; 2],
    /// `None` covers the whole mercator square
    pub region: Option<RegionOfInterest>,
    pub props: Vec<PropAsset>,
}

impl TerrainAssets {
    pub fn new(palette: image::RgbaImage, water_normals: [image::RgbaImage; 2]) -> Self {
        Self {
            palette,
            water_normals,
            region: None,
            props: Vec::new(),
        }
    }

    /// Decode PNG/JPEG bytes for the palette and both normal maps.
    pub fn from_encoded(palette: &[u8], water_normal_1: &[u8], water_normal_2: &[u8]) -> TerrainResult<Self> {
        Ok(Self::new(
            decode("palette", palette)?,
            [
                decode("water normal 1", water_normal_1)?,
                decode("water normal 2", water_normal_2)?,
            ],
        ))
    }

    /// Linear deep-to-shallow palette and flat normal maps.
    pub fn placeholder(deep: [u8; 3], shallow: [u8; 3]) -> Self {
        let palette = image::RgbaImage::from_fn(256, 1, |x, _| {
            let t = x as f32 / 255.0;
            let channel = |i: usize| (deep[i] as f32 + (shallow[i] as f32 - deep[i] as f32) * t).round() as u8;
            image::Rgba([channel(0), channel(1), channel(2), 255])
        });
        let flat = image::RgbaImage::from_pixel(1, 1, image::Rgba([128, 128, 255, 255]));
        Self::new(palette, [flat.clone(), flat])
    }

    pub fn with_region(mut self, region: RegionOfInterest) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_prop(mut self, prop: PropAsset) -> Self {
        self.props.push(prop);
        self
    }

    /// The region to mask with, falling back to the whole world.
    pub fn region_or_world(&self) -> RegionOfInterest {
        self.region.clone().unwrap_or_else(RegionOfInterest::whole_world)
    }
}

/// Triangulated region of interest in mercator coordinates (0..1).
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOfInterest {
    pub vertices: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl RegionOfInterest {
    /// Region from mercator vertices and triangle indices.
    pub fn from_mercator(vertices: Vec<[f32; 2]>, indices: Vec<u32>) -> TerrainResult<Self> {
        if indices.len() % 3 != 0 {
            return Err(TerrainError::invalid_config(format!(
                "region has {} indices, not a triangle list",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(TerrainError::invalid_config(format!(
                "region index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }
        Ok(Self { vertices, indices })
    }

    /// Region from lng/lat vertices and triangle indices.
    pub fn from_lng_lat(vertices: &[[f64; 2]], indices: Vec<u32>) -> TerrainResult<Self> {
        let mercator = vertices
            .iter()
            .map(|&[lng, lat]| {
                let [x, y] = lng_lat_to_mercator(lng, lat);
                [x as f32, y as f32]
            })
            .collect();
        Self::from_mercator(mercator, indices)
    }

    /// Fan-triangulate a convex lng/lat ring. A closing vertex equal to the
    /// first is dropped.
    pub fn from_convex_ring(ring: &[[f64; 2]]) -> TerrainResult<Self> {
        let open = match ring {
            [first, .., last] if first == last => &ring[..ring.len() - 1],
            _ => ring,
        };
        if open.len() < 3 {
            return Err(TerrainError::invalid_config(format!(
                "region ring needs at least 3 distinct vertices, got {}",
                open.len()
            )));
        }
        let indices = (1..open.len() as u32 - 1).flat_map(|i| [0, i, i + 1]).collect();
        Self::from_lng_lat(open, indices)
    }

    /// The whole mercator square.
    pub fn whole_world() -> Self {
        Self {
            vertices: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// `[min x, min y, max x, max y]` in mercator units.
    pub fn bounds(&self) -> [f32; 4] {
        self.vertices.iter().fold(
            [f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY],
            |[x0, y0, x1, y1], &[x, y]| [x0.min(x), y0.min(y), x1.max(x), y1.max(y)],
        )
    }

    /// Corners of the bounding box, counter-clockwise from the min corner.
    pub fn bbox_quad(&self) -> [[f32; 2]; 4] {
        let [x0, y0, x1, y1] = self.bounds();
        [[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
    }
}

/// Prop vertex (32 bytes).
///
/// | Offset | Field    | Type     |
/// |--------|----------|----------|
/// | 0      | position | [f32; 3] |
/// | 12     | normal   | [f32; 3] |
/// | 24     | uv       | [f32; 2] |
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PropVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl PropVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PropVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

static_assertions::assert_eq_size!(PropVertex, [u8; 32]);

/// One textured mesh of a prop.
#[derive(Debug, Clone)]
pub struct PropMesh {
    pub name: String,
    pub vertices: Vec<PropVertex>,
    pub indices: Vec<u32>,
    pub texture: image::RgbaImage,
    /// Mesh-to-model transform from the source scene graph
    pub local_transform: Mat4,
    /// Rotates about its local Z every frame
    pub spinning: bool,
}

impl PropMesh {
    pub fn new(name: impl Into<String>, vertices: Vec<PropVertex>, indices: Vec<u32>, texture: image::RgbaImage) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            texture,
            local_transform: Mat4::IDENTITY,
            spinning: false,
        }
    }

    pub fn with_local_transform(mut self, transform: Mat4) -> Self {
        self.local_transform = transform;
        self
    }

    pub fn spinning(mut self) -> Self {
        self.spinning = true;
        self
    }

    /// Decode an encoded texture for a mesh.
    pub fn decode_texture(bytes: &[u8]) -> TerrainResult<image::RgbaImage> {
        decode("prop texture", bytes)
    }
}

/// Where a prop stands.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PropPlacement {
    pub lng: f64,
    pub lat: f64,
    /// Uniform scale in mercator units per model unit
    pub scale: f64,
    /// Rotation about the vertical axis
    pub heading_deg: f64,
}

impl PropPlacement {
    /// Model matrix of a mesh placed here, before any spin.
    ///
    /// Models are Y-up; the X rotation stands them on the mercator plane.
    pub fn base_matrix(&self, local_transform: &Mat4) -> DMat4 {
        DMat4::from_translation(DVec3::new(
            mercator_x_from_lng(self.lng),
            mercator_y_from_lat(self.lat),
            0.0,
        )) * DMat4::from_scale(DVec3::splat(self.scale))
            * DMat4::from_rotation_x(0.5 * std::f64::consts::PI)
            * DMat4::from_rotation_y(self.heading_deg.to_radians())
            * local_transform.as_dmat4()
    }

    /// Model and normal matrix of a mesh at `frame`.
    pub fn mesh_matrices(&self, mesh: &PropMesh, frame: u64) -> (DMat4, DMat4) {
        self.matrices(&mesh.local_transform, mesh.spinning, frame)
    }

    pub fn matrices(&self, local_transform: &Mat4, spinning: bool, frame: u64) -> (DMat4, DMat4) {
        let mut model = self.base_matrix(local_transform);
        if spinning {
            model *= DMat4::from_rotation_z(frame as f64 * PROP_SPIN_PER_FRAME);
        }
        let normal = model.inverse().transpose();
        (model, normal)
    }
}

/// A prop: one placement, several meshes.
#[derive(Debug, Clone)]
pub struct PropAsset {
    pub placement: PropPlacement,
    pub meshes: Vec<PropMesh>,
}

impl PropAsset {
    pub fn new(placement: PropPlacement, meshes: Vec<PropMesh>) -> Self {
        Self { placement, meshes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convex_ring_fan() {
        let ring = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]];
        let region = RegionOfInterest::from_convex_ring(&ring).unwrap();
        assert_eq!(region.vertices.len(), 4);
        assert_eq!(region.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_region_rejects_bad_indices() {
        assert!(RegionOfInterest::from_mercator(vec![[0.0, 0.0]; 3], vec![0, 1]).is_err());
        assert!(RegionOfInterest::from_mercator(vec![[0.0, 0.0]; 3], vec![0, 1, 3]).is_err());
        assert!(RegionOfInterest::from_convex_ring(&[[0.0, 0.0], [1.0, 1.0]]).is_err());
    }

    #[test]
    fn test_whole_world_bounds() {
        let world = RegionOfInterest::whole_world();
        assert_eq!(world.bounds(), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(world.bbox_quad()[2], [1.0, 1.0]);
    }

    #[test]
    fn test_decode_failure_is_asset_error() {
        let err = TerrainAssets::from_encoded(b"not an image", &[], &[]).unwrap_err();
        assert!(matches!(err, TerrainError::Asset { name: "palette", .. }));
    }

    #[test]
    fn test_prop_normal_matrix_is_inverse_transpose() {
        let placement = PropPlacement {
            lng: 120.5,
            lat: 32.0,
            scale: 5e-6,
            heading_deg: 45.0,
        };
        let mesh = PropMesh::new("hull", Vec::new(), Vec::new(), image::RgbaImage::new(1, 1)).spinning();
        let (model, normal) = placement.mesh_matrices(&mesh, 10);
        let product = normal.transpose() * model;
        assert!(product.abs_diff_eq(DMat4::IDENTITY, 1e-6));
        let origin = model.transform_point3(DVec3::ZERO);
        assert!((origin.x - mercator_x_from_lng(120.5)).abs() < 1e-12);
    }
}
