//! Single-image transcoding and download naming bindings.
//!
//! # Example
//!
//! ```typescript
//! import { transcode, download_file_name } from '@pixpress/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const out = transcode(bytes, '720p', 'medium', 'image/jpeg');
//! const name = download_file_name(0, '720p', 'medium', out.mime);
//! ```

use crate::types::{parse_key, JsEncodedImage};
use pixpress_core::transcode::transcode as transcode_source;
use pixpress_core::{download, encode, SourceImage, TranscodeConfig};
use wasm_bindgen::prelude::*;

/// Transcode one image with default settings.
///
/// `resolution`, `quality` and `format` take the same keys used everywhere
/// else: `720p` / `1280x720`, `low` / `balanced` / `85`, `image/webp`.
///
/// # Errors
///
/// Returns an error string for an unknown option key, an unreadable image,
/// or a failed encode.
#[wasm_bindgen]
pub fn transcode(
    bytes: &[u8],
    resolution: &str,
    quality: &str,
    format: &str,
) -> Result<JsEncodedImage, JsValue> {
    let key = parse_key(resolution, quality, format).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let source = SourceImage::new(bytes);
    transcode_source(
        &source,
        key.resolution,
        key.quality,
        key.format,
        &TranscodeConfig::default(),
    )
    .map(JsEncodedImage::from)
    .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// File name for a variant of the `image_index`-th upload (zero-based).
///
/// # Errors
///
/// Returns an error string for an unknown option key.
#[wasm_bindgen]
pub fn download_file_name(
    image_index: usize,
    resolution: &str,
    quality: &str,
    format: &str,
) -> Result<String, JsValue> {
    let key = parse_key(resolution, quality, format).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(download::download_file_name(image_index, &key))
}

/// File extension for a MIME type; `jpg` for anything unrecognized.
#[wasm_bindgen]
pub fn extension_for_mime(mime: &str) -> String {
    encode::extension_for_mime(mime).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/webp"), "webp");
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("image/heic"), "jpg");
    }
}
