//! Render Tests - Uniform Layouts, Pass Wiring and Shaders
//!
//! Tests for the GPU-facing pieces that can be checked without a device:
//! uniform struct layouts against the WGSL declarations, smoothing ping-pong
//! parity, composite blending and shader validation with naga.

use std::mem::{offset_of, size_of};

use seabed_terrain_engine::TerrainConfig;
use seabed_terrain_engine::render::shader_loader::embedded;
use seabed_terrain_engine::render::uniforms::{
    CompositeUniforms, ContourUniforms, MaskUniforms, PropFrameUniforms, PropInstanceUniforms, TileUniforms,
    WaterNormalUniforms, WaterSurfaceUniforms,
};
use seabed_terrain_engine::render::{HeightSource, SmoothingChain, TerrainPassKind, composite_pixel};

fn parse(name: &str, source: &str) -> naga::Module {
    naga::front::wgsl::parse_str(source).unwrap_or_else(|e| panic!("{name} failed to parse: {}", e.emit_to_string(source)))
}

/// Size of the uniform-space global named `var` in a shader.
fn uniform_size(source: &str, var: &str) -> u32 {
    let module = parse(var, source);
    let (_, global) = module
        .global_variables
        .iter()
        .find(|(_, g)| g.space == naga::AddressSpace::Uniform && g.name.as_deref() == Some(var))
        .unwrap_or_else(|| panic!("no uniform named {var}"));
    module.types[global.ty].inner.size(module.to_ctx())
}

// ============================================================================
// Uniform Layout Tests
// ============================================================================

#[test]
fn test_uniform_sizes_match_wgsl() {
    let cases = [
        (embedded::HEIGHT, "tile", size_of::<TileUniforms>()),
        (embedded::MASK, "mask", size_of::<MaskUniforms>()),
        (embedded::CONTOUR, "contour", size_of::<ContourUniforms>()),
        (embedded::WATER_NORMAL, "water", size_of::<WaterNormalUniforms>()),
        (embedded::WATER_SURFACE, "surface", size_of::<WaterSurfaceUniforms>()),
        (embedded::COMPOSITE, "composite", size_of::<CompositeUniforms>()),
        (embedded::PROP, "frame", size_of::<PropFrameUniforms>()),
        (embedded::PROP, "instance", size_of::<PropInstanceUniforms>()),
    ];
    for (source, var, rust_size) in cases {
        assert_eq!(uniform_size(source, var) as usize, rust_size, "uniform `{var}`");
    }
}

#[test]
fn test_tile_uniform_offsets() {
    assert_eq!(offset_of!(TileUniforms, dem_top_left), 64);
    assert_eq!(offset_of!(TileUniforms, exaggeration), 80);
    assert_eq!(offset_of!(TileUniforms, grid_offset), 96);
    assert_eq!(offset_of!(TileUniforms, tile_meters), 104);
}

#[test]
fn test_water_surface_uniform_offsets() {
    assert_eq!(offset_of!(WaterSurfaceUniforms, camera_position), 64);
    assert_eq!(offset_of!(WaterSurfaceUniforms, elevation_range), 128);
    assert_eq!(offset_of!(WaterSurfaceUniforms, screen_size), 144);
}

#[test]
fn test_composite_uniforms_follow_config() {
    let config = TerrainConfig {
        mix_weight: 0.8,
        ..Default::default()
    };
    assert_eq!(CompositeUniforms::from_config(&config).mix_weight, 0.8);
}

// ============================================================================
// Smoothing Parity Tests
// ============================================================================

#[test]
fn test_scratch_parity_for_first_passes() {
    assert_eq!(SmoothingChain::scratch_for_passes(0), HeightSource::SmoothingSecondary);
    assert_eq!(SmoothingChain::scratch_for_passes(1), HeightSource::SmoothingPrimary);
    assert_eq!(SmoothingChain::scratch_for_passes(2), HeightSource::SmoothingSecondary);
    assert_eq!(SmoothingChain::scratch_for_passes(3), HeightSource::SmoothingPrimary);
}

#[test]
fn test_no_smoothing_reads_raw_heights() {
    assert_eq!(SmoothingChain::final_source(0), HeightSource::Raw);
}

#[test]
fn test_steps_land_in_final_source() {
    for passes in 1..8 {
        let (_, last) = SmoothingChain::step(passes - 1);
        assert_eq!(last, SmoothingChain::final_source(passes), "{passes} passes");
    }
}

#[test]
fn test_each_step_reads_previous_output() {
    let mut previous = HeightSource::Raw;
    for index in 0..6 {
        let (source, destination) = SmoothingChain::step(index);
        assert_eq!(source, previous, "step {index}");
        assert_ne!(source, destination);
        previous = destination;
    }
}

// ============================================================================
// Composite Tests
// ============================================================================

#[test]
fn test_mix_zero_is_pure_contour() {
    let contour = [0.1, 0.5, 0.3, 1.0];
    let water = [0.0, 0.2, 0.9, 0.8];
    assert_eq!(composite_pixel(contour, water, 0.0), contour);
}

#[test]
fn test_mix_one_is_pure_water() {
    let contour = [0.1, 0.5, 0.3, 1.0];
    let water = [0.0, 0.2, 0.9, 0.8];
    assert_eq!(composite_pixel(contour, water, 1.0), water);
}

// ============================================================================
// Pass Order and Shader Tests
// ============================================================================

#[test]
fn test_pass_names_are_unique() {
    let mut names: Vec<&str> = TerrainPassKind::ALL.iter().map(|k| k.name()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), TerrainPassKind::ALL.len());
}

#[test]
fn test_all_shaders_validate() {
    for (name, source) in embedded::ALL {
        let module = parse(name, source);
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        if let Err(e) = validator.validate(&module) {
            panic!("{name} failed validation: {}", e.emit_to_string(source));
        }
    }
}

#[test]
fn test_all_shaders_have_both_stages() {
    for (name, source) in embedded::ALL {
        let module = parse(name, source);
        let stages: Vec<naga::ShaderStage> = module.entry_points.iter().map(|ep| ep.stage).collect();
        assert!(stages.contains(&naga::ShaderStage::Vertex), "{name} has no vertex stage");
        assert!(stages.contains(&naga::ShaderStage::Fragment), "{name} has no fragment stage");
    }
}
