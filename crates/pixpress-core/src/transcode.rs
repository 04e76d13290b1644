//! The Transcoder: one source, one option combination, one encoded variant.
//!
//! ```text
//! bytes ──decode──▶ DecodedImage ──draw──▶ Surface ──encode──▶ EncodedImage
//!                    (once per image)       (pooled)
//! ```

use log::debug;
use thiserror::Error;

use crate::config::{ResizeMode, TranscodeConfig};
use crate::decode::{
    calculate_fit_dimensions, decode_image, fit_within_box, DecodeError, DecodeLimits,
    DecodedImage,
};
use crate::encode::{encode, EncodeError, OutputFormat};
use crate::options::{CombinationKey, QualityLevel, ResolutionSpec};
use crate::source::SourceImage;
use crate::surface::Surface;

/// Why a single combination produced no output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscodeError {
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("Cancelled before it started")]
    Cancelled,

    #[error("Timed out before it started")]
    TimedOut,
}

/// One encoded variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

/// Resolve the output size for `resolution` given the source's natural size.
pub fn target_dimensions(
    natural: (u32, u32),
    resolution: ResolutionSpec,
    config: &TranscodeConfig,
) -> (u32, u32) {
    let (width, height) = match resolution.dimensions() {
        None => natural,
        Some(preset) => match config.resize_mode {
            ResizeMode::Stretch => preset,
            ResizeMode::Fit => fit_within_box(natural.0, natural.1, preset.0, preset.1),
        },
    };

    match config.max_edge {
        Some(max_edge) => calculate_fit_dimensions(width, height, max_edge),
        None => (width, height),
    }
}

/// Reject output sizes the decoder itself would refuse to produce.
fn check_target(width: u32, height: u32, limits: DecodeLimits) -> Result<(), EncodeError> {
    let too_large = EncodeError::InvalidDimensions { width, height };
    if width > limits.max_dimension || height > limits.max_dimension {
        return Err(too_large);
    }
    let bytes = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|n| n.checked_mul(3));
    match bytes {
        Some(n) if n <= limits.max_alloc => Ok(()),
        _ => Err(too_large),
    }
}

/// Transcode an already decoded image into `surface`.
///
/// The batch orchestrator decodes each source once and calls this for every
/// combination.
pub fn transcode_decoded(
    image: &DecodedImage,
    key: CombinationKey,
    config: &TranscodeConfig,
    surface: &mut Surface,
) -> Result<EncodedImage, EncodeError> {
    let (width, height) = target_dimensions(image.dimensions(), key.resolution, config);
    check_target(width, height, config.decode_limits)?;
    surface.draw(image, width, height, config.filter)?;

    let bytes = encode(
        key.format,
        surface.pixels(),
        width,
        height,
        key.quality.encoder_quality(),
    )?;
    debug!("{key}: {width}x{height}, {} bytes", bytes.len());

    Ok(EncodedImage {
        format: key.format,
        width,
        height,
        bytes,
    })
}

/// Decode `source` and produce one variant.
///
/// # Errors
///
/// `TranscodeError::Decode` if the source is not a readable image, and
/// `TranscodeError::Encode` if resampling or encoding fails.
pub fn transcode(
    source: &SourceImage,
    resolution: ResolutionSpec,
    quality: QualityLevel,
    format: OutputFormat,
    config: &TranscodeConfig,
) -> Result<EncodedImage, TranscodeError> {
    let image = decode_image(source.bytes(), config.decode_limits)?;
    let mut surface = Surface::new();
    let key = CombinationKey::new(resolution, quality, format);
    Ok(transcode_decoded(&image, key, config, &mut surface)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::test_images::gradient_bytes;
    use image::ImageFormat;

    fn decoded_dimensions(encoded: &EncodedImage) -> (u32, u32) {
        let img = image::load_from_memory(&encoded.bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_target_dimensions_stretch() {
        let config = TranscodeConfig::default();
        assert_eq!(
            target_dimensions((1000, 1000), ResolutionSpec::Hd, &config),
            (1280, 720)
        );
        assert_eq!(
            target_dimensions((1000, 1000), ResolutionSpec::Original, &config),
            (1000, 1000)
        );
    }

    #[test]
    fn test_target_dimensions_fit() {
        let config = TranscodeConfig {
            resize_mode: ResizeMode::Fit,
            ..TranscodeConfig::default()
        };
        assert_eq!(
            target_dimensions((4000, 3000), ResolutionSpec::FullHd, &config),
            (1440, 1080)
        );
        // No upscaling in fit mode
        assert_eq!(
            target_dimensions((300, 200), ResolutionSpec::FullHd, &config),
            (300, 200)
        );
    }

    #[test]
    fn test_target_dimensions_max_edge() {
        let config = TranscodeConfig {
            max_edge: Some(1920),
            ..TranscodeConfig::default()
        };
        assert_eq!(
            target_dimensions((4000, 2000), ResolutionSpec::Original, &config),
            (1920, 960)
        );
        assert_eq!(
            target_dimensions((4000, 2000), ResolutionSpec::Hd, &config),
            (1280, 720)
        );
    }

    #[test]
    fn test_transcode_preset_dimensions() {
        let source = SourceImage::new(gradient_bytes(100, 100, ImageFormat::Png));
        let config = TranscodeConfig::default();
        let out = transcode(
            &source,
            ResolutionSpec::Custom {
                width: 64,
                height: 36,
            },
            QualityLevel::Medium,
            OutputFormat::Jpeg,
            &config,
        )
        .unwrap();
        assert_eq!((out.width, out.height), (64, 36));
        assert_eq!(decoded_dimensions(&out), (64, 36));
        assert_eq!(out.format, OutputFormat::Jpeg);
    }

    #[test]
    fn test_transcode_original_keeps_natural_dimensions() {
        let source = SourceImage::new(gradient_bytes(37, 23, ImageFormat::Png));
        let out = transcode(
            &source,
            ResolutionSpec::Original,
            QualityLevel::High,
            OutputFormat::Png,
            &TranscodeConfig::default(),
        )
        .unwrap();
        assert_eq!(decoded_dimensions(&out), (37, 23));
    }

    #[test]
    fn test_transcode_decode_error() {
        let source = SourceImage::new(b"definitely not an image".to_vec());
        let err = transcode(
            &source,
            ResolutionSpec::Hd,
            QualityLevel::Low,
            OutputFormat::Jpeg,
            &TranscodeConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TranscodeError::Decode(_)));
    }

    #[test]
    fn test_transcode_zero_dimension_is_encode_error() {
        let source = SourceImage::new(gradient_bytes(8, 8, ImageFormat::Png));
        let err = transcode(
            &source,
            ResolutionSpec::Custom {
                width: 0,
                height: 10,
            },
            QualityLevel::Low,
            OutputFormat::Jpeg,
            &TranscodeConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TranscodeError::Encode(EncodeError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_transcode_oversized_target_is_encode_error() {
        let source = SourceImage::new(gradient_bytes(8, 8, ImageFormat::Png));
        let err = transcode(
            &source,
            "300000x300000".parse().unwrap(),
            QualityLevel::Low,
            OutputFormat::Jpeg,
            &TranscodeConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TranscodeError::Encode(EncodeError::InvalidDimensions {
                width: 300_000,
                height: 300_000,
            })
        );
    }

    #[test]
    fn test_check_target_alloc_limit() {
        let limits = DecodeLimits {
            max_dimension: 10_000,
            max_alloc: 3 * 100 * 100,
        };
        assert!(check_target(100, 100, limits).is_ok());
        assert!(check_target(100, 101, limits).is_err());
        assert!(check_target(10_001, 1, limits).is_err());
        assert!(check_target(u32::MAX, u32::MAX, DecodeLimits {
            max_dimension: u32::MAX,
            max_alloc: u64::MAX,
        })
        .is_err());
    }

    #[test]
    fn test_scale_quality_is_honored() {
        let bytes = gradient_bytes(96, 96, ImageFormat::Png);
        let image = decode_image(&bytes, Default::default()).unwrap();
        let config = TranscodeConfig::default();
        let mut surface = Surface::new();

        let mut size_at = |q| {
            let key = CombinationKey::new(
                ResolutionSpec::Original,
                QualityLevel::Scale(q),
                OutputFormat::Jpeg,
            );
            transcode_decoded(&image, key, &config, &mut surface)
                .unwrap()
                .byte_len()
        };
        assert!(size_at(10) < size_at(95));
    }

    #[test]
    fn test_transcode_decoded_reuses_surface() {
        let bytes = gradient_bytes(50, 50, ImageFormat::Png);
        let image = decode_image(&bytes, Default::default()).unwrap();
        let config = TranscodeConfig::default();
        let mut surface = Surface::new();

        for resolution in [ResolutionSpec::Sd, ResolutionSpec::Svga] {
            let key = CombinationKey::new(resolution, QualityLevel::Medium, OutputFormat::WebP);
            let out = transcode_decoded(&image, key, &config, &mut surface).unwrap();
            assert_eq!(Some((out.width, out.height)), resolution.dimensions());
            assert_eq!((surface.width(), surface.height()), (out.width, out.height));
        }
    }
}
