//! Resampling kernels and target-size geometry.
//!
//! The kernels write into a caller-owned buffer so that a drawing surface can
//! be reused across transcodes without reallocating.

use super::{DecodedImage, FilterType};
use crate::encode::EncodeError;

/// Bytes of a packed RGB buffer of `width x height`, or `None` on overflow.
pub fn rgb_buffer_len(width: u32, height: u32) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(usize::try_from(height).ok()?)?
        .checked_mul(3)
}

/// Resample `src` to `width x height` into `dst`, replacing its contents.
///
/// `dst` ends up holding exactly `width * height * 3` RGB bytes.
///
/// # Errors
///
/// * `EncodeError::InvalidDimensions` for a zero or unaddressable target size
/// * `EncodeError::InvalidPixelData` if `src.pixels` does not match its
///   declared dimensions
pub fn resample_into(
    src: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
    dst: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let target_len = match rgb_buffer_len(width, height) {
        Some(len) if len > 0 => len,
        _ => return Err(EncodeError::InvalidDimensions { width, height }),
    };
    let expected = rgb_buffer_len(src.width, src.height).ok_or(EncodeError::InvalidDimensions {
        width: src.width,
        height: src.height,
    })?;
    if expected == 0 || src.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: src.pixels.len(),
        });
    }

    dst.clear();

    // Fast path: if dimensions match, just copy
    if src.width == width && src.height == height {
        dst.extend_from_slice(&src.pixels);
        return Ok(());
    }

    match filter {
        FilterType::Bilinear => bilinear_into(src, width, height, target_len, dst),
        FilterType::Nearest | FilterType::Lanczos3 => {
            let view = src.as_rgb_view().ok_or(EncodeError::InvalidPixelData {
                expected,
                actual: src.pixels.len(),
            })?;
            let resized = image::imageops::resize(&view, width, height, filter.to_image_filter());
            dst.extend_from_slice(resized.as_raw());
        }
    }
    Ok(())
}

/// Per-axis sample position: the two neighbouring source indices and the
/// weight of the second one.
#[derive(Clone, Copy)]
struct Tap {
    i0: usize,
    i1: usize,
    t: f32,
}

fn axis_taps(src_len: u32, dst_len: u32) -> Vec<Tap> {
    let scale = src_len as f32 / dst_len as f32;
    let last = src_len.saturating_sub(1) as f32;
    (0..dst_len)
        .map(|d| {
            // Pixel centres line up the way a canvas drawImage does
            let s = ((d as f32 + 0.5) * scale - 0.5).clamp(0.0, last);
            let i0 = s.floor() as usize;
            let i1 = (i0 + 1).min(last as usize);
            Tap {
                i0,
                i1,
                t: s - i0 as f32,
            }
        })
        .collect()
}

/// Single-pass bilinear resample with edge clamping.
fn bilinear_into(src: &DecodedImage, width: u32, height: u32, len: usize, dst: &mut Vec<u8>) {
    let xs = axis_taps(src.width, width);
    let ys = axis_taps(src.height, height);
    let stride = src.width as usize * 3;
    dst.reserve(len);

    for ty in &ys {
        let row0 = &src.pixels[ty.i0 * stride..ty.i0 * stride + stride];
        let row1 = &src.pixels[ty.i1 * stride..ty.i1 * stride + stride];
        for tx in &xs {
            let (a, b) = (tx.i0 * 3, tx.i1 * 3);
            for c in 0..3 {
                let top = row0[a + c] as f32 * (1.0 - tx.t) + row0[b + c] as f32 * tx.t;
                let bottom = row1[a + c] as f32 * (1.0 - tx.t) + row1[b + c] as f32 * tx.t;
                let v = top * (1.0 - ty.t) + bottom * ty.t;
                dst.push(v.round().clamp(0.0, 255.0) as u8);
            }
        }
    }
}

/// Calculate dimensions to fit within max_edge while preserving aspect ratio.
///
/// Images already inside the bound keep their size.
pub fn calculate_fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    fit_within_box(width, height, max_edge, max_edge)
}

/// Scale `width x height` down to fit inside `box_w x box_h`, keeping aspect
/// ratio and never upscaling.
pub fn fit_within_box(width: u32, height: u32, box_w: u32, box_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    if width <= box_w && height <= box_h {
        return (width, height);
    }

    let scale = (box_w as f64 / width as f64).min(box_h as f64 / height as f64);
    let new_width = ((width as f64 * scale).round() as u32).clamp(1, box_w.max(1));
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, box_h.max(1));
    (new_width, new_height)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the resampled buffer always matches the requested size.
        #[test]
        fn prop_resample_output_length(
            (sw, sh) in (1u32..=24, 1u32..=24),
            (dw, dh) in (1u32..=24, 1u32..=24),
        ) {
            let src = DecodedImage::new(sw, sh, vec![90u8; (sw * sh * 3) as usize]);
            let mut out = Vec::new();
            resample_into(&src, dw, dh, FilterType::Bilinear, &mut out).unwrap();
            prop_assert_eq!(out.len(), (dw * dh * 3) as usize);
        }

        /// Property: fitting never exceeds the box and never upscales.
        #[test]
        fn prop_fit_within_box_bounds(
            (w, h) in (1u32..=8000, 1u32..=8000),
            (bw, bh) in (1u32..=4000, 1u32..=4000),
        ) {
            let (fw, fh) = fit_within_box(w, h, bw, bh);
            prop_assert!(fw >= 1 && fh >= 1);
            prop_assert!(fw <= bw && fh <= bh);
            prop_assert!(fw <= w && fh <= h);
        }
    }
}
