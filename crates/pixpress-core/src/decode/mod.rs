//! Image decoding and resampling for Pixpress.
//!
//! This module provides functionality for:
//! - Decoding uploaded raster images (JPEG, PNG, WebP, GIF, BMP)
//! - Applying EXIF orientation so dimensions match what a browser shows
//! - Bounding decode work with configurable limits
//! - Resampling pixel data into reusable buffers
//!
//! # Architecture
//!
//! Decoding is synchronous. On native targets the batch orchestrator calls it
//! from rayon workers; in the browser it runs inside a Web Worker via the WASM
//! bindings.
//!
//! # Examples
//!
//! ```ignore
//! use pixpress_core::decode::{decode_image, DecodeLimits};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_image(&bytes, DecodeLimits::default()).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod raster;
mod resize;
mod types;

#[cfg(test)]
pub(crate) use raster::test_images;
pub use raster::{decode_image, DecodeLimits};
pub use resize::{calculate_fit_dimensions, fit_within_box, resample_into, rgb_buffer_len};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation};
