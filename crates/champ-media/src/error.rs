//! Error types for pipeline stages.
//!
//! Every stage reports failures through [`MediaError`]; the pipeline boundary
//! collapses them into the documented default for that stage.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while turning a video into a score.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to open video: {0}")]
    OpenFailed(String),

    #[error("Frame decode failed: {0}")]
    DecodeFailed(String),

    #[error("Landmark detection failed: {0}")]
    LandmarkFailed(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid normalization statistics: {0}")]
    InvalidStats(String),

    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Unsupported model format: {0}")]
    UnsupportedModel(String),

    #[error("Model inference failed: {0}")]
    InferenceFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    pub fn open_failed(message: impl Into<String>) -> Self {
        Self::OpenFailed(message.into())
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::DecodeFailed(message.into())
    }

    pub fn landmark_failed(message: impl Into<String>) -> Self {
        Self::LandmarkFailed(message.into())
    }

    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::ShapeMismatch(message.into())
    }

    pub fn inference_failed(message: impl Into<String>) -> Self {
        Self::InferenceFailed(message.into())
    }

    pub fn model_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ModelNotFound(path.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
