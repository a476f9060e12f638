//! Error types for styled QR rendering.
//!
//! Encoding, logo decoding and painting each get their own enum so the
//! orchestrator can recover from them separately. [`Error`] wraps all of them
//! for the one-shot helpers.

use thiserror::Error;

use crate::matrix::EcLevel;

/// Result type alias used by the helper functions.
pub type Result<T> = std::result::Result<T, Error>;

/// The payload could not be turned into a module matrix.
///
/// Ways to handle this error:
///
/// - Pick a lower error correction level.
/// - Shorten the payload.
/// - Propagate the error upward to the caller/user.
///
/// The renderer never downgrades the level on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Payload exceeds the capacity of the largest symbol at this level.
    #[error("payload too long for error correction level {level}")]
    DataTooLong { level: EcLevel },

    /// The encoder refused the payload for another reason.
    #[error("encoder rejected payload: {0}")]
    Rejected(String),

    /// A matrix handed to the renderer is not a valid symbol.
    #[error("malformed module matrix: {0}")]
    MalformedMatrix(String),
}

/// The logo asset could not be turned into pixels.
///
/// Never fatal: the render completes without a logo.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Only `data:<mime>;base64,<payload>` URIs are understood.
    #[error("unsupported data URI")]
    UnsupportedDataUri,

    #[error("invalid base64 in data URI: {0}")]
    Base64(String),

    #[error("image decode failed: {0}")]
    Image(String),

    /// The image source went away before completing.
    #[error("decode was cancelled by the image source")]
    Cancelled,
}

/// Painting or exporting a surface failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("invalid style: {0}")]
    InvalidStyle(String),

    #[error("cannot allocate a {width}x{height} surface")]
    SurfaceAllocation { width: u32, height: u32 },

    #[error("export failed: {0}")]
    Export(String),
}

/// Top-level error for the convenience helpers.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Style configuration could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_error_names_the_level() {
        let err = EncodeError::DataTooLong { level: EcLevel::High };
        assert_eq!(err.to_string(), "payload too long for error correction level H");
    }

    #[test]
    fn top_level_error_wraps_sources() {
        let err: Error = DecodeError::UnsupportedDataUri.into();
        assert!(matches!(err, Error::Decode(DecodeError::UnsupportedDataUri)));
        assert_eq!(err.to_string(), "Decode error: unsupported data URI");
    }
}
