//! Deterministic PNG encoding.
//!
//! Uses fixed compression settings so the same atlas always encodes to the
//! same bytes, which makes the reported BLAKE3 hash stable.

use std::io::Write;

use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use spritemerge_spec::CompressionPreset;
use thiserror::Error;

use crate::raster::RasterImage;

/// Errors from PNG operations.
#[derive(Debug, Error)]
pub enum PngError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding error: {0}")]
    Encoding(#[from] png::EncodingError),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// PNG export configuration for deterministic output.
#[derive(Debug, Clone)]
pub struct PngConfig {
    /// Compression level. Use a fixed value for determinism.
    pub compression: Compression,
    /// Filter type. Use a fixed value for determinism.
    pub filter: FilterType,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            compression: Compression::Default,
            filter: FilterType::NoFilter,
        }
    }
}

impl PngConfig {
    /// Create config optimized for file size.
    pub fn best_compression() -> Self {
        Self {
            compression: Compression::Best,
            filter: FilterType::Paeth,
        }
    }

    /// Create config optimized for speed.
    pub fn fast() -> Self {
        Self {
            compression: Compression::Fast,
            filter: FilterType::NoFilter,
        }
    }

    /// Map a config-file preset to encoder settings.
    pub fn from_preset(preset: CompressionPreset) -> Self {
        match preset {
            CompressionPreset::Fast => Self::fast(),
            CompressionPreset::Default => Self::default(),
            CompressionPreset::Best => Self::best_compression(),
        }
    }
}

/// Write an RGBA image to any writer.
pub fn write_rgba_to_writer<W: Write>(
    image: &RasterImage,
    writer: W,
    config: &PngConfig,
) -> Result<(), PngError> {
    if image.is_empty() {
        return Err(PngError::InvalidDimensions(format!(
            "cannot encode a {}x{} image",
            image.width(),
            image.height()
        )));
    }

    let mut encoder = Encoder::new(writer, image.width(), image.height());
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    encoder.set_compression(config.compression);
    encoder.set_filter(config.filter);

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(image.as_bytes())?;
    png_writer.finish()?;

    Ok(())
}

/// Compute the BLAKE3 hash of PNG data.
pub fn hash_png(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Encode to a `Vec<u8>` and return it with its hash.
pub fn encode_rgba_with_hash(
    image: &RasterImage,
    config: &PngConfig,
) -> Result<(Vec<u8>, String), PngError> {
    let mut data = Vec::new();
    write_rgba_to_writer(image, &mut data, config)?;
    let hash = hash_png(&data);
    Ok((data, hash))
}

/// Decode PNG bytes for assertions in this crate's tests.
#[cfg(test)]
pub(crate) fn decode_png(data: &[u8]) -> RasterImage {
    let rgba = image::load_from_memory_with_format(data, image::ImageFormat::Png)
        .unwrap()
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    RasterImage::from_rgba8(width, height, rgba.into_raw()).unwrap()
}
