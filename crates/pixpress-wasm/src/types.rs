//! WASM-compatible wrapper types for transcoding results.
//!
//! Encoded variants cross the boundary as [`JsEncodedImage`]. Batch results
//! are flattened into plain serde views and handed to JavaScript as ordinary
//! objects through `serde-wasm-bindgen`.

use pixpress_core::session::SessionImage;
use pixpress_core::{
    CombinationKey, EncodedImage, OptionParseError, OutputFormat, QualityLevel, ResolutionSpec,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// One encoded variant.
///
/// The bytes live in WASM memory until `bytes()` copies them out.
#[wasm_bindgen]
pub struct JsEncodedImage {
    width: u32,
    height: u32,
    format: OutputFormat,
    bytes: Vec<u8>,
}

#[wasm_bindgen]
impl JsEncodedImage {
    /// Output width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// MIME type of the encoded bytes, e.g. `image/webp`
    #[wasm_bindgen(getter)]
    pub fn mime(&self) -> String {
        self.format.mime().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }

    /// Encoded file contents as a `Uint8Array` (copied).
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

impl From<EncodedImage> for JsEncodedImage {
    fn from(img: EncodedImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            format: img.format,
            bytes: img.bytes,
        }
    }
}

/// Parse the three option keys JavaScript passes around as strings.
pub(crate) fn parse_key(
    resolution: &str,
    quality: &str,
    format: &str,
) -> Result<CombinationKey, OptionParseError> {
    Ok(CombinationKey::new(
        resolution.parse::<ResolutionSpec>()?,
        quality.parse::<QualityLevel>()?,
        format.parse::<OutputFormat>()?,
    ))
}

/// Plain-object view of one combination outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CombinationView {
    pub key: String,
    pub resolution: String,
    pub quality: String,
    pub format: &'static str,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub byte_length: Option<usize>,
    pub error: Option<String>,
}

/// Plain-object view of one uploaded image and its latest results.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageView {
    pub image_id: String,
    pub original_byte_length: usize,
    /// False until a batch has published results for this image.
    pub processed: bool,
    pub compression_ratio: Option<f64>,
    pub smallest: Option<String>,
    pub combinations: Vec<CombinationView>,
}

impl From<&SessionImage> for ImageView {
    fn from(img: &SessionImage) -> Self {
        let source = img.source();
        let mut view = ImageView {
            image_id: source.id().to_string(),
            original_byte_length: source.original_byte_length(),
            processed: false,
            compression_ratio: None,
            smallest: None,
            combinations: Vec::new(),
        };
        let Some(results) = img.results() else {
            return view;
        };

        view.processed = true;
        view.compression_ratio = results.compression_ratio();
        view.smallest = results.smallest().map(|(key, _)| key.to_string());
        view.combinations = results
            .iter()
            .map(|(key, outcome)| {
                let encoded = outcome.as_ref().ok();
                CombinationView {
                    key: key.to_string(),
                    resolution: key.resolution.key(),
                    quality: key.quality.key(),
                    format: key.format.mime(),
                    width: encoded.map(|e| e.width),
                    height: encoded.map(|e| e.height),
                    byte_length: encoded.map(EncodedImage::byte_len),
                    error: outcome.as_ref().err().map(ToString::to_string),
                }
            })
            .collect();
        view
    }
}
