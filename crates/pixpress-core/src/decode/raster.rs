//! Raster image decoding with EXIF orientation handling and decode limits.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageError, ImageReader, Limits};
use serde::{Deserialize, Serialize};

use super::{DecodeError, DecodedImage, Orientation};

/// Upper bounds applied while decoding untrusted uploads.
///
/// A file that declares huge dimensions fails fast with
/// [`DecodeError::LimitsExceeded`] instead of allocating its way into an
/// out-of-memory abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecodeLimits {
    /// Maximum width and height in pixels.
    #[serde(rename = "maxDecodeDimension")]
    pub max_dimension: u32,
    /// Maximum bytes the decoder may allocate.
    #[serde(rename = "maxDecodeAlloc")]
    pub max_alloc: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_dimension: 16_384,
            max_alloc: 512 * 1024 * 1024,
        }
    }
}

impl DecodeLimits {
    fn to_image_limits(self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);
        limits.max_alloc = Some(self.max_alloc);
        limits
    }
}

/// Decode an image of any supported raster format, applying EXIF orientation.
///
/// The format is sniffed from the content, never from a file name or MIME
/// type. The returned dimensions are the oriented ("natural") dimensions, the
/// same ones a browser reports for the image.
///
/// # Errors
///
/// * `DecodeError::Empty` for a zero-length input
/// * `DecodeError::InvalidFormat` if no decoder recognizes the bytes
/// * `DecodeError::LimitsExceeded` if the image is larger than `limits`
/// * `DecodeError::CorruptedFile` if decoding starts but fails
pub fn decode_image(bytes: &[u8], limits: DecodeLimits) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let orientation = extract_orientation(bytes);

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }
    reader.limits(limits.to_image_limits());

    let img = reader.decode().map_err(map_image_error)?;

    let rgb_img = apply_orientation(img, orientation).into_rgb8();
    Ok(DecodedImage::from_rgb_image(rgb_img))
}

fn map_image_error(err: ImageError) -> DecodeError {
    match err {
        ImageError::Limits(e) => DecodeError::LimitsExceeded(e.to_string()),
        ImageError::Unsupported(_) => DecodeError::InvalidFormat,
        other => DecodeError::CorruptedFile(other.to_string()),
    }
}

/// Extract EXIF orientation from the file bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    let Ok(exif) = Reader::new().read_from_container(&mut cursor) else {
        return Orientation::Normal;
    };
    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(Orientation::from)
        .unwrap_or_default()
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
pub(crate) mod test_images {
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    /// Gradient test image encoded in the given container format.
    pub fn gradient_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([
                ((x * 255) / width.max(1)) as u8,
                ((y * 255) / height.max(1)) as u8,
                128,
            ])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    /// Insert an EXIF APP1 segment carrying `orientation` right after the
    /// JPEG SOI marker.
    pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"MM\x00\x2a\x00\x00\x00\x08"); // big-endian header, IFD0 at 8
        tiff.extend_from_slice(&1u16.to_be_bytes()); // one entry
        tiff.extend_from_slice(&0x0112u16.to_be_bytes()); // Orientation
        tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_be_bytes()); // no IFD1

        let segment_len = (2 + 6 + tiff.len()) as u16;
        let mut out = Vec::with_capacity(jpeg.len() + segment_len as usize + 2);
        out.extend_from_slice(&jpeg[..2]);
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(b"Exif\x00\x00");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&jpeg[2..]);
        out
    }
}
