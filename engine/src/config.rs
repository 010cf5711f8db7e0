//! Terrain Configuration
//!
//! Every tunable the pipeline reads each frame, as one serde-backed struct.
//! The host can load it from JSON, tweak it through `config_mut()` between
//! frames, and the next frame picks the new values up.
//!
//! Colours accept `"rgb(r, g, b)"`, `"#rrggbb"` or a `[r, g, b]` array.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{TerrainError, TerrainResult};

/// Upper bound on separable smoothing passes per frame.
pub const MAX_SMOOTHING_PASSES: u32 = 32;

/// Rendering parameters for the terrain and water layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    // Relief
    /// Vertical exaggeration applied to elevations (0 flattens the terrain)
    pub exaggeration: f32,
    /// Drop seam-hiding skirts below tile edges
    pub use_skirt: bool,
    /// Sub-texel offset into the padded DEM texture (texels)
    pub grid_offset: [f32; 2],
    /// Grid subdivisions per level of detail, coarsest first
    pub grid_levels: Vec<u32>,
    /// Draw the height pass as a line list instead of triangles
    pub wireframe: bool,

    // Sun (contour lighting)
    /// Sun altitude above the horizon (degrees)
    pub sun_altitude_deg: f32,
    /// Sun azimuth, clockwise from north (degrees)
    pub sun_azimuth_deg: f32,
    /// Exponent applied to the diffuse term
    pub diffuse_power: f32,

    // Contour layer
    /// Draw contour bands and lines
    pub with_contour: bool,
    /// Apply hillshade lighting to the contour layer
    pub with_lighting: bool,
    /// Elevation step between contour lines (metres)
    pub contour_interval: f32,
    /// Elevation window mapped onto the colour ramp (metres)
    pub elevation_range: [f32; 2],
    /// Ramp colour at the top of the elevation window
    pub shallow_color: RgbColor,
    /// Ramp colour at the bottom of the elevation window
    pub deep_color: RgbColor,

    // Water layer
    /// Elevation below which a pixel is water (metres)
    pub water_threshold: f32,
    /// Ripple tiling and period for the two normal maps: [tile1, period1, tile2, period2]
    pub water_sampler_params: [f32; 4],
    /// Specular light position in mercator space
    pub light_position: [f32; 3],
    /// Specular exponent
    pub specular_power: f32,

    // Frame
    /// Number of height smoothing passes (0 = none)
    pub smoothing_pass_count: u32,
    /// Weight of the water layer over the contour layer in the composite
    pub mix_weight: f32,
    /// Discard mask fragments that cover no terrain
    pub mask_depth_test: bool,
    /// Elevation tiles kept resident
    pub cache_capacity: usize,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            exaggeration: 30.0,
            use_skirt: true,
            grid_offset: [1.5, 1.5],
            grid_levels: vec![32, 64, 128],
            wireframe: false,

            sun_altitude_deg: 45.0,
            sun_azimuth_deg: 135.0,
            diffuse_power: 1.1,

            with_contour: true,
            with_lighting: true,
            contour_interval: 1.0,
            elevation_range: [-15.514, 4.3745],
            shallow_color: RgbColor([182, 153, 124]),
            deep_color: RgbColor([22, 26, 33]),

            water_threshold: -1.0,
            water_sampler_params: [13.6, -11.5, 1.56, -22.4],
            light_position: [-0.03, 0.1, 0.86],
            specular_power: 40.0,

            smoothing_pass_count: 0,
            mix_weight: 0.5,
            mask_depth_test: true,
            cache_capacity: 100,
        }
    }
}

impl TerrainConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> TerrainResult<Self> {
        let config: TerrainConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> TerrainResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> TerrainResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check ranges that the shaders and the cache rely on.
    pub fn validate(&self) -> TerrainResult<()> {
        let finite = [
            ("exaggeration", self.exaggeration),
            ("sun_altitude_deg", self.sun_altitude_deg),
            ("sun_azimuth_deg", self.sun_azimuth_deg),
            ("diffuse_power", self.diffuse_power),
            ("contour_interval", self.contour_interval),
            ("water_threshold", self.water_threshold),
            ("specular_power", self.specular_power),
            ("mix_weight", self.mix_weight),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(TerrainError::invalid_config(format!("{name} must be finite")));
            }
        }

        let [_, period_1, _, period_2] = self.water_sampler_params;
        if self.water_sampler_params.iter().any(|v| !v.is_finite()) {
            return Err(TerrainError::invalid_config("water_sampler_params must be finite"));
        }
        if period_1 == 0.0 || period_2 == 0.0 {
            return Err(TerrainError::invalid_config(
                "water_sampler_params periods (y, w) must be non-zero",
            ));
        }
        if self.exaggeration < 0.0 {
            return Err(TerrainError::invalid_config("exaggeration must not be negative"));
        }
        if self.contour_interval <= 0.0 {
            return Err(TerrainError::invalid_config("contour_interval must be positive"));
        }
        if !(0.0..=1.0).contains(&self.mix_weight) {
            return Err(TerrainError::invalid_config("mix_weight must lie in [0, 1]"));
        }
        if self.elevation_range[0] >= self.elevation_range[1] {
            return Err(TerrainError::invalid_config(format!(
                "elevation_range [{}, {}] is empty",
                self.elevation_range[0], self.elevation_range[1]
            )));
        }
        if self.specular_power < 0.0 || self.diffuse_power < 0.0 {
            return Err(TerrainError::invalid_config("light exponents must not be negative"));
        }
        if self.smoothing_pass_count > MAX_SMOOTHING_PASSES {
            return Err(TerrainError::invalid_config(format!(
                "smoothing_pass_count {} exceeds {MAX_SMOOTHING_PASSES}",
                self.smoothing_pass_count
            )));
        }
        if self.cache_capacity == 0 {
            return Err(TerrainError::invalid_config("cache_capacity must be at least 1"));
        }
        if self.grid_levels.is_empty() {
            return Err(TerrainError::invalid_config("grid_levels must not be empty"));
        }
        if self.grid_levels.iter().any(|&n| n == 0) || !self.grid_levels.is_sorted() {
            return Err(TerrainError::invalid_config(
                "grid_levels must be positive and ascending",
            ));
        }
        Ok(())
    }

    /// Unit vector towards the sun. x east, y north, z up.
    pub fn sun_direction(&self) -> Vec3 {
        let altitude = self.sun_altitude_deg.to_radians();
        let azimuth = self.sun_azimuth_deg.to_radians();
        Vec3::new(
            azimuth.sin() * altitude.cos(),
            azimuth.cos() * altitude.cos(),
            altitude.sin(),
        )
        .normalize()
    }
}

/// An 8-bit RGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ColorValue", into = "ColorValue")]
pub struct RgbColor(pub [u8; 3]);

impl RgbColor {
    /// Channels scaled to [0, 1].
    pub fn to_unit(self) -> [f32; 3] {
        self.0.map(|c| c as f32 / 255.0)
    }

    /// Channels scaled to [0, 1] with an explicit alpha.
    pub fn to_unit_rgba(self, alpha: f32) -> [f32; 4] {
        let [r, g, b] = self.to_unit();
        [r, g, b, alpha]
    }
}

impl FromStr for RgbColor {
    type Err = TerrainError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = || TerrainError::MalformedColor(input.to_string());
        let text = input.trim();

        if let Some(hex) = text.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(malformed());
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| malformed());
            return Ok(RgbColor([channel(0)?, channel(2)?, channel(4)?]));
        }

        let body = text
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(malformed)?;
        let channels = body
            .split(',')
            .map(|part| part.trim().parse::<u8>().map_err(|_| malformed()))
            .collect::<Result<Vec<_>, _>>()?;
        match channels.as_slice() {
            &[r, g, b] => Ok(RgbColor([r, g, b])),
            _ => Err(malformed()),
        }
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "rgb({r}, {g}, {b})")
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ColorValue {
    Channels([u8; 3]),
    Text(String),
}

impl TryFrom<ColorValue> for RgbColor {
    type Error = TerrainError;

    fn try_from(value: ColorValue) -> Result<Self, Self::Error> {
        match value {
            ColorValue::Channels(channels) => Ok(RgbColor(channels)),
            ColorValue::Text(text) => text.parse(),
        }
    }
}

impl From<RgbColor> for ColorValue {
    fn from(color: RgbColor) -> Self {
        ColorValue::Text(color.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TerrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_rgb_function() {
        let color: RgbColor = "rgb(182, 153, 124)".parse().unwrap();
        assert_eq!(color, RgbColor([182, 153, 124]));
    }

    #[test]
    fn test_parse_hex() {
        let color: RgbColor = "#161a21".parse().unwrap();
        assert_eq!(color, RgbColor([0x16, 0x1a, 0x21]));
    }

    #[test]
    fn test_malformed_colors() {
        for bad in ["rgb(1, 2)", "rgb(1, 2, 300)", "#12345", "blue", "rgb(1,2,3"] {
            assert!(
                matches!(bad.parse::<RgbColor>(), Err(TerrainError::MalformedColor(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_json_partial_document() {
        let config = TerrainConfig::from_json_str(
            r##"{ "exaggeration": 2.5, "deep_color": "#000000", "shallow_color": [1, 2, 3] }"##,
        )
        .unwrap();
        assert_eq!(config.exaggeration, 2.5);
        assert_eq!(config.deep_color, RgbColor([0, 0, 0]));
        assert_eq!(config.shallow_color, RgbColor([1, 2, 3]));
        assert_eq!(config.cache_capacity, 100);
    }

    #[test]
    fn test_json_round_trip_keeps_colors() {
        let config = TerrainConfig::default();
        let json = config.to_json_string().unwrap();
        assert!(json.contains("rgb(182, 153, 124)"));
        assert_eq!(TerrainConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = TerrainConfig {
            mix_weight: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TerrainError::InvalidConfig(_))));

        config.mix_weight = 0.5;
        config.grid_levels = vec![64, 32];
        assert!(config.validate().is_err());

        config.grid_levels = vec![32];
        config.elevation_range = [4.0, -4.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_water_periods() {
        let mut config = TerrainConfig::default();
        config.water_sampler_params[1] = 0.0;
        assert!(matches!(config.validate(), Err(TerrainError::InvalidConfig(_))));

        config.water_sampler_params = [13.6, -11.5, 1.56, 0.0];
        assert!(config.validate().is_err());

        config.water_sampler_params = [13.6, f32::NAN, 1.56, -22.4];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sun_direction_default() {
        let sun = TerrainConfig::default().sun_direction();
        assert!((sun.length() - 1.0).abs() < 1e-5);
        // azimuth 135 is south-east, altitude 45 is above the horizon
        assert!(sun.x > 0.0 && sun.y < 0.0 && sun.z > 0.0);
    }
}
