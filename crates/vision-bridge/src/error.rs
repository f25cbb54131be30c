//! Error types for the VisionBridge core.

/// All errors that can occur while validating an image reference or
/// invoking the remote vision model.
#[derive(thiserror::Error, Debug)]
pub enum VisionError {
    #[error("Image file not found: {0}")]
    NotFound(String),

    #[error("Unsupported image format: {found}. Supported formats: {supported}")]
    UnsupportedFormat { found: String, supported: String },

    #[error("Image file too large: {size} bytes, maximum supported: {max} bytes")]
    TooLarge { size: u64, max: u64 },

    /// Credential missing or rejected by the remote service.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Network-level failure: timeout, connection reset, DNS.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The remote service returned a well-formed error response.
    #[error("Remote vision service error: {0}")]
    Remote(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VisionError>;
