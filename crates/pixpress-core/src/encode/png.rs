//! PNG encoding.
//!
//! PNG output is lossless, so quality only picks how hard the deflate stage
//! works: lower quality means the user cares more about size.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use std::io::Cursor;

use super::{validate_rgb, EncodeError, OutputFormat};

/// Map an encoder quality in `0.0..=1.0` to a deflate effort.
pub fn png_compression(quality: f32) -> CompressionType {
    if quality < 0.4 {
        CompressionType::Best
    } else if quality < 0.7 {
        CompressionType::Default
    } else {
        CompressionType::Fast
    }
}

/// Encode RGB pixel data to PNG bytes with adaptive row filtering.
pub fn encode_png(
    pixels: &[u8],
    width: u32,
    height: u32,
    compression: CompressionType,
) -> Result<Vec<u8>, EncodeError> {
    validate_rgb(pixels, width, height)?;

    let mut buffer = Cursor::new(Vec::new());
    PngEncoder::new_with_quality(&mut buffer, compression, FilterType::Adaptive)
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed {
            format: OutputFormat::Png,
            message: e.to_string(),
        })?;

    Ok(buffer.into_inner())
}
