//! Grid mesh builder
//!
//! A tile grid is `n` cells per side over `0..extent`, surrounded by one ring
//! of padding vertices. Padding vertices are clamped onto the tile edge and
//! flagged as skirt; the height shader pushes them down by the skirt height,
//! which hangs a curtain under every tile edge and hides cracks between
//! neighbours sampled at different resolutions.
//!
//! Index layout: interior cells first, then the four skirt strips starting at
//! `skirt_index_offset`, so a caller can draw interior-only.

use bytemuck::{Pod, Zeroable};

/// Tile-local coordinate range of a grid mesh.
pub const TILE_EXTENT: u32 = 8192;

/// Zoom levels at which the next finer grid level takes over.
pub const LEVEL_ZOOM_BREAKS: [u8; 2] = [10, 13];

/// Grid vertex (12 bytes).
///
/// | Offset | Field    | Type        |
/// |--------|----------|-------------|
/// | 0      | position | [f32; 2]    |
/// | 8      | skirt    | u32 (0 / 1) |
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GridVertex {
    /// Tile-local position, clamped to `[0, extent]`
    pub position: [f32; 2],
    /// 1 for padding-ring vertices
    pub skirt: u32,
}

static_assertions::assert_eq_size!(GridVertex, [u8; 12]);

impl GridVertex {
    pub fn is_skirt(&self) -> bool {
        self.skirt != 0
    }

    /// wgpu vertex buffer layout descriptor.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position: vec2<f32>
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // skirt: u32
                wgpu::VertexAttribute {
                    offset: 8,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Uint32,
                },
            ],
        }
    }
}

/// An immutable tile grid for one subdivision level.
#[derive(Clone, Debug, PartialEq)]
pub struct GridMesh {
    pub vertices: Vec<GridVertex>,
    pub indices: Vec<u32>,
    /// First index of the skirt strips
    pub skirt_index_offset: u32,
    pub subdivisions: u32,
    pub extent: u32,
}

impl GridMesh {
    /// Build a grid of `subdivisions` cells per side (at least one).
    ///
    /// Produces `(n + 3)^2` vertices, `6 n^2` interior indices and
    /// `24 (n + 2)` skirt indices.
    pub fn build(extent: u32, subdivisions: u32) -> Self {
        let n = subdivisions.max(1);
        let size = n + 3;
        let step = extent as f64 / n as f64;
        let bound = extent as f64;

        let mut vertices = Vec::with_capacity((size * size) as usize);
        for j in 0..size {
            for i in 0..size {
                let x = (i as f64 - 1.0) * step;
                let y = (j as f64 - 1.0) * step;
                let skirt = i == 0 || j == 0 || i == size - 1 || j == size - 1;
                vertices.push(GridVertex {
                    position: [
                        x.round().clamp(0.0, bound) as f32,
                        y.round().clamp(0.0, bound) as f32,
                    ],
                    skirt: skirt as u32,
                });
            }
        }

        let mut indices = Vec::with_capacity((6 * n * n + 24 * (n + 2)) as usize);
        let mut quad = |i: u32, j: u32| {
            let index = j * size + i;
            indices.extend_from_slice(&[
                index + 1,
                index,
                index + size,
                index + size,
                index + size + 1,
                index + 1,
            ]);
        };

        for j in 1..size - 2 {
            for i in 1..size - 2 {
                quad(i, j);
            }
        }
        let skirt_index_offset = 6 * n * n;

        for j in [0, size - 2] {
            for i in 0..size - 1 {
                quad(i, j);
                quad(j, i);
            }
        }

        Self {
            vertices,
            indices,
            skirt_index_offset,
            subdivisions: n,
            extent,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn interior_triangle_count(&self) -> u32 {
        self.skirt_index_offset / 3
    }

    /// Edge list covering every triangle, for wireframe drawing.
    pub fn wireframe_indices(&self) -> Vec<u32> {
        let mut lines = Vec::with_capacity(self.indices.len() * 2);
        for tri in self.indices.chunks_exact(3) {
            lines.extend_from_slice(&[tri[0], tri[1], tri[1], tri[2], tri[2], tri[0]]);
        }
        lines
    }
}

/// The grid meshes of every level of detail, coarsest first.
#[derive(Debug, Clone)]
pub struct GridLevels {
    meshes: Vec<GridMesh>,
}

impl GridLevels {
    pub fn build(extent: u32, subdivisions: &[u32]) -> Self {
        Self {
            meshes: subdivisions
                .iter()
                .map(|&n| GridMesh::build(extent, n))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Mesh for a tile at `zoom`, `None` when no level was built.
    pub fn select(&self, zoom: u8) -> Option<&GridMesh> {
        self.meshes.get(select_grid_level(zoom, self.meshes.len()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridMesh> {
        self.meshes.iter()
    }
}

/// Pick the grid level for a tile zoom.
///
/// `level_count` is the number of built levels, coarsest first.
pub fn select_grid_level(zoom: u8, level_count: usize) -> usize {
    let level = LEVEL_ZOOM_BREAKS.iter().filter(|&&z| zoom >= z).count();
    level.min(level_count.saturating_sub(1))
}

/// Depth of the seam curtain below tile edges, in exaggerated metres.
///
/// About 9 m at zoom 22 growing to roughly 20 km at zoom 0. Low exaggeration
/// on 514-texel DEM tiles gets a reduced factor so the curtain stays hidden.
pub fn skirt_height(zoom: f64, exaggeration: f64, tile_size: u32) -> f64 {
    if exaggeration == 0.0 {
        return 0.0;
    }
    let factor = if exaggeration < 1.0 && tile_size == 514 {
        0.25 / exaggeration
    } else {
        1.0
    };
    10.0 * 1.5f64.powf(22.0 - zoom) * exaggeration.max(1.0) * factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cell_grid() {
        let mesh = GridMesh::build(TILE_EXTENT, 1);
        assert_eq!(mesh.vertices.len(), 16);
        assert_eq!(mesh.skirt_index_offset, 6);
        // only the 4 centre vertices are interior
        assert_eq!(mesh.vertices.iter().filter(|v| !v.is_skirt()).count(), 4);
    }

    #[test]
    fn test_wireframe_has_three_edges_per_triangle() {
        let mesh = GridMesh::build(TILE_EXTENT, 4);
        assert_eq!(mesh.wireframe_indices().len(), mesh.indices.len() * 2);
    }

    #[test]
    fn test_level_selection() {
        assert_eq!(select_grid_level(3, 3), 0);
        assert_eq!(select_grid_level(10, 3), 1);
        assert_eq!(select_grid_level(12, 3), 1);
        assert_eq!(select_grid_level(16, 3), 2);
        assert_eq!(select_grid_level(16, 1), 0);
    }

    #[test]
    fn test_grid_levels_select_by_zoom() {
        let levels = GridLevels::build(TILE_EXTENT, &[8, 16, 32]);
        assert_eq!(levels.len(), 3);
        assert_eq!(levels.select(4).map(|m| m.subdivisions), Some(8));
        assert_eq!(levels.select(11).map(|m| m.subdivisions), Some(16));
        assert_eq!(levels.select(18).map(|m| m.subdivisions), Some(32));
        assert!(GridLevels::build(TILE_EXTENT, &[]).select(5).is_none());
    }

    #[test]
    fn test_skirt_height_values() {
        assert_eq!(skirt_height(12.0, 0.0, 514), 0.0);
        assert!((skirt_height(22.0, 1.0, 514) - 10.0).abs() < 1e-9);
        // exaggeration below one on 514 tiles: factor 0.25 / e, max(e, 1) = 1
        assert!((skirt_height(22.0, 0.5, 514) - 5.0).abs() < 1e-9);
        assert!((skirt_height(22.0, 0.5, 512) - 10.0).abs() < 1e-9);
        assert!((skirt_height(21.0, 3.0, 514) - 45.0).abs() < 1e-9);
    }
}
