//! Shader Loading Utilities
//!
//! All terrain shaders are WGSL files under `shaders/`, embedded at compile
//! time so the renderer has no file I/O at setup.

/// Create a wgpu shader module from WGSL source.
pub fn create_shader_module(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

/// Embedded shaders that are compiled into the binary.
pub mod embedded {
    pub const HEIGHT: &str = include_str!("../../../shaders/height.wgsl");
    pub const SMOOTHING: &str = include_str!("../../../shaders/smoothing.wgsl");
    pub const MASK: &str = include_str!("../../../shaders/mask.wgsl");
    pub const CONTOUR: &str = include_str!("../../../shaders/contour.wgsl");
    pub const WATER_NORMAL: &str = include_str!("../../../shaders/water_normal.wgsl");
    pub const WATER_SURFACE: &str = include_str!("../../../shaders/water_surface.wgsl");
    pub const COMPOSITE: &str = include_str!("../../../shaders/composite.wgsl");
    pub const DEPTH_RESTORE: &str = include_str!("../../../shaders/depth_restore.wgsl");
    pub const PROP: &str = include_str!("../../../shaders/prop.wgsl");

    /// Every embedded shader with its file name.
    pub const ALL: [(&str, &str); 9] = [
        ("height.wgsl", HEIGHT),
        ("smoothing.wgsl", SMOOTHING),
        ("mask.wgsl", MASK),
        ("contour.wgsl", CONTOUR),
        ("water_normal.wgsl", WATER_NORMAL),
        ("water_surface.wgsl", WATER_SURFACE),
        ("composite.wgsl", COMPOSITE),
        ("depth_restore.wgsl", DEPTH_RESTORE),
        ("prop.wgsl", PROP),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_shader_has_entry_points() {
        for (name, source) in embedded::ALL {
            assert!(source.contains("fn vs_main"), "{name} has no vertex entry");
            assert!(source.contains("fn fs_main"), "{name} has no fragment entry");
        }
    }
}
