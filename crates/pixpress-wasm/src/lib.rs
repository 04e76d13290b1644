//! Pixpress WASM - WebAssembly bindings for Pixpress
//!
//! This crate exposes the pixpress-core transcoding pipeline to
//! JavaScript/TypeScript. Batches run sequentially; call it from a Web Worker
//! to keep the page responsive.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types and plain-object result views
//! - `transcode` - Single-image transcoding and download naming
//! - `session` - Upload set, batch runs and downloads
//!
//! # Usage
//!
//! ```typescript
//! import init, { transcode, JsSession } from '@pixpress/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const out = transcode(bytes, '1080p', 'high', 'image/webp');
//! console.log(`Encoded ${out.width}x${out.height}, ${out.byte_length} bytes`);
//! ```

use log::info;
use wasm_bindgen::prelude::*;

mod session;
mod transcode;
mod types;

// Re-export public types
pub use session::JsSession;
pub use transcode::{download_file_name, extension_for_mime, transcode};
pub use types::JsEncodedImage;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
    info!("pixpress-wasm {} ready", version());
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
