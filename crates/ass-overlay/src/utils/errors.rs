//! Error types for subtitle overlay rendering

use std::string::String;

use thiserror::Error;

/// Overlay error types
#[derive(Error, Debug)]
pub enum OverlayError {
    /// Subtitle engine could not be loaded or initialized
    #[error("Subtitle engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Engine rejected a script buffer as unparseable
    #[error("Engine failed to load subtitles: {0}")]
    ScriptRejected(String),

    /// Renderer allocation failed (warm-up or reinitialization)
    #[error("Renderer initialization failed: {0}")]
    RendererInitFailed(String),

    /// User cancelled the warm-up wait before the renderer became ready
    #[error("Renderer warm-up wait was cancelled")]
    WarmupCancelled,

    /// Background warm-up worker could not be started or has shut down
    #[error("Warm-up worker unavailable: {0}")]
    WorkerUnavailable(String),

    /// Invalid dimensions provided
    #[error("Invalid dimensions: dimensions must be positive and non-zero")]
    InvalidDimensions,

    /// Invalid buffer size
    #[error("Invalid buffer size: expected {expected} bytes, got {actual}")]
    InvalidBufferSize {
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },

    /// File extension does not name a supported tag-image format
    #[error("Unsupported tag-image format: {0}")]
    UnsupportedFormat(String),

    /// Attachment entry does not start with a `filename:` header
    #[error("Malformed attachment header: {0}")]
    AttachmentHeader(String),

    /// Attachment body is not valid uuencoded data
    #[error("Malformed attachment data: {0}")]
    AttachmentData(String),

    /// Image bytes could not be decoded to pixels
    #[error("Image decode failed: {0}")]
    ImageDecode(String),

    /// Engine refused a tag-image registration
    #[error("Tag image rejected by engine: {0}")]
    TagImageRejected(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl OverlayError {
    /// Check if error only affects a single item and can be skipped
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat(_)
                | Self::AttachmentHeader(_)
                | Self::AttachmentData(_)
                | Self::ImageDecode(_)
                | Self::TagImageRejected(_)
                | Self::Io(_)
        )
    }

    /// Check if error leaves the provider unusable
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::EngineUnavailable(_)
                | Self::ScriptRejected(_)
                | Self::RendererInitFailed(_)
                | Self::WorkerUnavailable(_)
        )
    }
}

impl From<std::io::Error> for OverlayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<image::ImageError> for OverlayError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageDecode(err.to_string())
    }
}
