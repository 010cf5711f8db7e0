//! Grid Mesh Tests - Vertex Layout, Skirts and Levels
//!
//! Tests for the tile grid builder: counts, skirt flagging against the
//! unclamped layout, index ranges and level-of-detail selection.

use seabed_terrain_engine::mesh::{GridLevels, GridMesh, GridVertex, TILE_EXTENT, select_grid_level, skirt_height};

// ============================================================================
// Counts and Determinism
// ============================================================================

#[test]
fn test_vertex_count_includes_padding_ring() {
    for n in [1, 2, 7, 32, 128] {
        let mesh = GridMesh::build(TILE_EXTENT, n);
        assert_eq!(mesh.vertices.len() as u32, (n + 3) * (n + 3), "n = {n}");
    }
}

#[test]
fn test_index_counts() {
    let n = 16;
    let mesh = GridMesh::build(TILE_EXTENT, n);
    assert_eq!(mesh.skirt_index_offset, 6 * n * n);
    assert_eq!(mesh.interior_triangle_count(), 2 * n * n);
    assert_eq!(mesh.index_count(), 6 * n * n + 24 * (n + 2));
}

#[test]
fn test_build_is_deterministic() {
    let a = GridMesh::build(TILE_EXTENT, 64);
    let b = GridMesh::build(TILE_EXTENT, 64);
    assert_eq!(a, b);
}

#[test]
fn test_zero_subdivisions_builds_one_cell() {
    let mesh = GridMesh::build(TILE_EXTENT, 0);
    assert_eq!(mesh.subdivisions, 1);
    assert_eq!(mesh.vertices.len(), 16);
}

// ============================================================================
// Skirt Tests
// ============================================================================

#[test]
fn test_skirt_flag_matches_unclamped_layout() {
    let n = 10;
    let mesh = GridMesh::build(TILE_EXTENT, n);
    let size = n + 3;
    let step = TILE_EXTENT as f64 / n as f64;

    for (index, vertex) in mesh.vertices.iter().enumerate() {
        let i = index as u32 % size;
        let j = index as u32 / size;
        let x = (i as f64 - 1.0) * step;
        let y = (j as f64 - 1.0) * step;
        let outside = x < 0.0 || y < 0.0 || x > TILE_EXTENT as f64 || y > TILE_EXTENT as f64;
        assert_eq!(vertex.is_skirt(), outside, "vertex ({i}, {j})");
    }
}

#[test]
fn test_positions_clamped_to_extent() {
    let mesh = GridMesh::build(TILE_EXTENT, 12);
    for vertex in &mesh.vertices {
        for c in vertex.position {
            assert!((0.0..=TILE_EXTENT as f32).contains(&c));
        }
    }
}

#[test]
fn test_interior_triangles_avoid_skirt() {
    let mesh = GridMesh::build(TILE_EXTENT, 8);
    let (interior, skirt) = mesh.indices.split_at(mesh.skirt_index_offset as usize);

    assert!(interior.iter().all(|&i| !mesh.vertices[i as usize].is_skirt()));
    for triangle in skirt.chunks_exact(3) {
        assert!(
            triangle.iter().any(|&i| mesh.vertices[i as usize].is_skirt()),
            "skirt triangle {triangle:?} has no skirt vertex"
        );
    }
}

#[test]
fn test_indices_in_range() {
    let mesh = GridMesh::build(TILE_EXTENT, 5);
    let count = mesh.vertices.len() as u32;
    assert!(mesh.indices.iter().all(|&i| i < count));
    assert!(mesh.wireframe_indices().iter().all(|&i| i < count));
}

#[test]
fn test_vertex_layout_size() {
    assert_eq!(std::mem::size_of::<GridVertex>(), 12);
    assert_eq!(GridVertex::desc().array_stride, 12);
}

#[test]
fn test_skirt_height_shrinks_with_zoom() {
    let coarse = skirt_height(8.0, 30.0, 512);
    let fine = skirt_height(16.0, 30.0, 512);
    assert!(coarse > fine);
    assert!((coarse / fine - 1.5f64.powi(8)).abs() < 1e-9);
}

// ============================================================================
// Level Selection
// ============================================================================

#[test]
fn test_level_selection_clamps_to_built_levels() {
    assert_eq!(select_grid_level(22, 2), 1);
    assert_eq!(select_grid_level(22, 0), 0);
}

#[test]
fn test_default_levels_pick_finer_grid_when_zooming_in() {
    let levels = GridLevels::build(TILE_EXTENT, &[32, 64, 128]);
    let subdivisions: Vec<u32> = [5u8, 11, 15]
        .iter()
        .filter_map(|&z| levels.select(z).map(|m| m.subdivisions))
        .collect();
    assert_eq!(subdivisions, vec![32, 64, 128]);
}
