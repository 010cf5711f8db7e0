//! Error types for the terrain renderer.
//!
//! Only setup and configuration can fail. A visible tile without elevation
//! data is not an error; it is counted in [`FrameStats`](crate::FrameStats)
//! and skipped for that frame.

/// Errors surfaced by setup and configuration.
#[derive(thiserror::Error, Debug)]
pub enum TerrainError {
    /// A shader module or pipeline failed wgpu validation at setup.
    #[error("setup failed while building {stage}: {message}")]
    Setup { stage: &'static str, message: String },

    /// An offscreen render target cannot be created at the requested size.
    #[error("render target `{name}` unavailable: {message}")]
    RenderTarget { name: &'static str, message: String },

    /// A colour value in the configuration did not parse.
    #[error("malformed colour value `{0}`")]
    MalformedColor(String),

    /// A numeric configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An image handed over at setup could not be decoded.
    #[error("asset `{name}` could not be decoded: {message}")]
    Asset { name: &'static str, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TerrainError {
    pub fn setup<T: ToString>(stage: &'static str, message: T) -> Self {
        TerrainError::Setup {
            stage,
            message: message.to_string(),
        }
    }

    pub fn invalid_config<T: ToString>(message: T) -> Self {
        TerrainError::InvalidConfig(message.to_string())
    }

    /// Whether the error means the pipeline can never become ready.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TerrainError::Setup { .. } | TerrainError::RenderTarget { .. } | TerrainError::Asset { .. }
        )
    }
}

/// Result type alias for terrain operations
pub type TerrainResult<T> = Result<T, TerrainError>;
