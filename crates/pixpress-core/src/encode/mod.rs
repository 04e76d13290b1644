//! Image encoding for Pixpress.
//!
//! This module provides functionality for:
//! - Encoding RGB pixel data to JPEG, PNG and WebP
//! - Mapping the abstract `[0, 1]` quality parameter onto each encoder's knob
//!
//! # Examples
//!
//! ```ignore
//! use pixpress_core::encode::{encode, OutputFormat};
//!
//! let pixels = vec![128u8; 100 * 100 * 3]; // Gray image
//! let bytes = encode(OutputFormat::Jpeg, &pixels, 100, 100, 0.5).unwrap();
//! println!("Encoded {} bytes", bytes.len());
//! ```

mod format;
mod jpeg;
mod png;
mod webp;

use thiserror::Error;

pub use format::{extension_for_mime, OutputFormat, DEFAULT_EXTENSION};
pub use jpeg::{encode_jpeg, jpeg_quality};
pub use png::{encode_png, png_compression};
pub use webp::{encode_webp, webp_quality};

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: OutputFormat,
        message: String,
    },
}

/// Encode RGB pixels in `format` at encoder quality `quality` (`0.0..=1.0`).
///
/// Values outside `0.0..=1.0` are clamped.
pub fn encode(
    format: OutputFormat,
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: f32,
) -> Result<Vec<u8>, EncodeError> {
    let quality = if quality.is_nan() { 0.0 } else { quality.clamp(0.0, 1.0) };
    match format {
        OutputFormat::Jpeg => encode_jpeg(pixels, width, height, jpeg_quality(quality)),
        OutputFormat::Png => encode_png(pixels, width, height, png_compression(quality)),
        OutputFormat::WebP => encode_webp(pixels, width, height, webp_quality(quality)),
    }
}

/// Check that `pixels` is a packed RGB buffer of `width x height`.
pub(crate) fn validate_rgb(pixels: &[u8], width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}
