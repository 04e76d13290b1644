//! WebP encoding.
//!
//! Lossy VP8 through libwebp, driven by the same `0.0..=1.0` quality knob as
//! JPEG.

use webp::Encoder;

use super::{validate_rgb, EncodeError, OutputFormat};

/// Map an encoder quality in `0.0..=1.0` to libwebp's `0..=100` scale.
pub fn webp_quality(quality: f32) -> f32 {
    (quality * 100.0).clamp(0.0, 100.0)
}

/// Encode RGB pixel data to lossy WebP bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - libwebp quality (0-100); out of range values are clamped
pub fn encode_webp(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: f32,
) -> Result<Vec<u8>, EncodeError> {
    validate_rgb(pixels, width, height)?;

    let memory = Encoder::from_rgb(pixels, width, height)
        .encode_simple(false, quality.clamp(0.0, 100.0))
        .map_err(|e| EncodeError::EncodingFailed {
            format: OutputFormat::WebP,
            message: format!("{e:?}"),
        })?;

    Ok(memory.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy(width: u32, height: u32) -> Vec<u8> {
        (0..(width * height * 3) as usize)
            .map(|i| ((i * 131 + i / 7) % 256) as u8)
            .collect()
    }

    #[test]
    fn test_webp_quality_tiers() {
        assert!((webp_quality(0.3) - 30.0).abs() < 1e-4);
        assert_eq!(webp_quality(0.5), 50.0);
        assert_eq!(webp_quality(0.0), 0.0);
        assert_eq!(webp_quality(1.0), 100.0);
        assert_eq!(webp_quality(4.0), 100.0);
    }

    #[test]
    fn test_encode_webp_is_lossy_vp8() {
        let webp = encode_webp(&noisy(32, 24), 32, 24, 30.0).unwrap();

        assert_eq!(&webp[0..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
        assert_eq!(&webp[12..16], b"VP8 ");

        let decoded = image::load_from_memory(&webp).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let pixels = noisy(64, 64);
        let low = encode_webp(&pixels, 64, 64, webp_quality(0.3)).unwrap();
        let high = encode_webp(&pixels, 64, 64, webp_quality(0.9)).unwrap();
        assert!(low.len() < high.len(), "low={} high={}", low.len(), high.len());
    }

    #[test]
    fn test_encode_webp_invalid_pixel_data() {
        let result = encode_webp(&[0; 5], 2, 1, 50.0);
        assert!(matches!(result, Err(EncodeError::InvalidPixelData { .. })));
    }
}
