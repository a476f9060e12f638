//! Logo assets and the asynchronous decode seam.
//!
//! The raster backend needs pixels, so it goes through a [`LogoDecoder`]; the
//! vector backend only embeds the asset by reference via
//! [`LogoSource::to_data_uri`].

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::{self, FutureExt, LocalBoxFuture};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Where a logo's encoded bytes come from.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoSource {
    /// `data:<mime>;base64,<payload>`, as produced by a browser file reader.
    DataUri(String),
    /// Raw encoded image bytes (PNG, JPEG, ...).
    Bytes(Vec<u8>),
}

impl LogoSource {
    /// Returns the encoded image bytes.
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>, DecodeError> {
        match self {
            LogoSource::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            LogoSource::DataUri(uri) => {
                let rest = uri.strip_prefix("data:").ok_or(DecodeError::UnsupportedDataUri)?;
                let (header, payload) = rest.split_once(',').ok_or(DecodeError::UnsupportedDataUri)?;
                if !header.ends_with(";base64") {
                    return Err(DecodeError::UnsupportedDataUri);
                }
                STANDARD
                    .decode(payload.trim())
                    .map(Cow::Owned)
                    .map_err(|err| DecodeError::Base64(err.to_string()))
            }
        }
    }

    /// A reference suitable for an SVG `href`. Data URIs pass through as-is;
    /// bytes are base64-encoded with a sniffed MIME type.
    pub fn to_data_uri(&self) -> String {
        match self {
            LogoSource::DataUri(uri) => uri.clone(),
            LogoSource::Bytes(bytes) => {
                let mime = image::guess_format(bytes)
                    .map(|format| format.to_mime_type())
                    .unwrap_or("application/octet-stream");
                format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
            }
        }
    }
}

/// Decodes a logo into straight-alpha RGBA pixels.
///
/// The returned future completes exactly once, with the image or an error.
/// Renders run on a single thread, so futures need not be `Send`.
pub trait LogoDecoder {
    fn decode(&self, source: &LogoSource) -> LocalBoxFuture<'static, Result<RgbaImage, DecodeError>>;
}

/// Decoder backed by the `image` crate. Resolves on first poll.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageDecoder;

impl ImageDecoder {
    pub fn decode_now(source: &LogoSource) -> Result<RgbaImage, DecodeError> {
        let bytes = source.bytes()?;
        let image = image::load_from_memory(&bytes).map_err(|err| DecodeError::Image(err.to_string()))?;
        Ok(image.to_rgba8())
    }
}

impl LogoDecoder for ImageDecoder {
    fn decode(&self, source: &LogoSource) -> LocalBoxFuture<'static, Result<RgbaImage, DecodeError>> {
        future::ready(Self::decode_now(source)).boxed_local()
    }
}
