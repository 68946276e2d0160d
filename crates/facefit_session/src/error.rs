//! Error types for the try-on session

use facefit_render::RenderError;
use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Landmark detector or camera could not start; not retried
    #[error("Detector initialization failed: {0}")]
    DetectorInit(String),

    /// Draw or surface failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for SessionError {
    fn from(e: toml::de::Error) -> Self {
        SessionError::Config(e.to_string())
    }
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
