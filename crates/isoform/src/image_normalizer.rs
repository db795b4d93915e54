//! Photo normalization.
//!
//! Photos are downscaled to a bounded width and re-encoded as JPEG so they can
//! be embedded in the form snapshot, AI prompts and exported reports as a
//! self-contained data URI.

use std::fmt;
use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ImageConfig;
use crate::error::{Error, Result};

/// An embeddable `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataUri(String);

impl DataUri {
    /// Wrap already-encoded bytes of the given mime type.
    #[must_use]
    pub fn encode(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    /// The full URI.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into mime type and base64 payload.
    ///
    /// Returns `None` for anything that is not a base64 data URI with a
    /// non-empty payload.
    #[must_use]
    pub fn parts(&self) -> Option<(&str, &str)> {
        let rest = self.0.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime = header.strip_suffix(";base64")?;
        if payload.is_empty() {
            return None;
        }
        let mime = if mime.is_empty() { "image/jpeg" } else { mime };
        Some((mime, payload))
    }
}

impl From<String> for DataUri {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Width and height after capping the width at `max_width`, aspect preserved.
#[must_use]
pub fn scaled_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let scaled = (u64::from(height) * u64::from(max_width) + u64::from(width) / 2) / u64::from(width);
    let scaled = u32::try_from(scaled).unwrap_or(u32::MAX).max(1);
    (max_width, scaled)
}

/// Downscales and re-encodes photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageNormalizer {
    max_width: u32,
    quality: u8,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::from_config(&ImageConfig::default())
    }
}

impl ImageNormalizer {
    /// Build a normalizer from configuration.
    #[must_use]
    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            max_width: config.max_width.max(1),
            quality: config.jpeg_quality.clamp(1, 100),
        }
    }

    /// Decode `raw`, cap its width and return it as a JPEG data URI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageDecode`] if `raw` is not a readable image and
    /// [`Error::ImageEncode`] if JPEG encoding fails.
    pub fn normalize(&self, raw: &[u8]) -> Result<DataUri> {
        let decoded =
            image::load_from_memory(raw).map_err(|e| Error::image_decode(e.to_string()))?;
        let (width, height) = decoded.dimensions();
        let (new_width, new_height) = scaled_dimensions(width, height, self.max_width);

        let resized = if (new_width, new_height) == (width, height) {
            decoded
        } else {
            decoded.resize_exact(new_width, new_height, FilterType::Triangle)
        };
        let rgb = resized.to_rgb8();

        let mut buffer = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut buffer, self.quality)
            .encode_image(&rgb)
            .map_err(|e| Error::ImageEncode {
                message: e.to_string(),
            })?;
        let bytes = buffer.into_inner();

        debug!(
            from = %format!("{width}x{height}"),
            to = %format!("{new_width}x{new_height}"),
            bytes = bytes.len(),
            "Normalized photo"
        );
        Ok(DataUri::encode("image/jpeg", &bytes))
    }
}
