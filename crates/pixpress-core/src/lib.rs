//! Pixpress Core - Image transcoding library
//!
//! This crate provides the core functionality for Pixpress: decoding uploaded
//! images, resampling them to preset resolutions, re-encoding them as JPEG,
//! PNG or WebP, and running whole batches of option combinations with
//! per-image compression statistics.

pub mod batch;
pub mod config;
pub mod decode;
pub mod download;
pub mod encode;
pub mod options;
pub mod session;
pub mod source;
pub mod surface;
pub mod transcode;

pub use batch::{compression_ratio, run_batch, CancelToken, CombinationOutcome, ImageResults};
pub use config::{ResizeMode, TranscodeConfig};
pub use decode::{DecodeError, DecodeLimits, FilterType};
pub use download::{download_file_name, DownloadItem};
pub use encode::{extension_for_mime, EncodeError, OutputFormat};
pub use options::{
    CombinationKey, InvalidSelectionError, OptionParseError, QualityLevel, ResolutionSpec,
    Selection,
};
pub use session::{BatchSummary, Session};
pub use source::{ImageId, SourceImage};
pub use transcode::{transcode, transcode_decoded, EncodedImage, TranscodeError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_parse_from_ui_strings() {
        let selection = Selection::new(
            ["original", "1280x720"].map(|s| s.parse::<ResolutionSpec>().unwrap()),
            ["balanced", "40"].map(|s| s.parse::<QualityLevel>().unwrap()),
            ["image/webp"].map(|s| s.parse::<OutputFormat>().unwrap()),
        );
        let keys: Vec<String> = selection.combinations().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            [
                "original-medium-image/webp",
                "original-40-image/webp",
                "720p-medium-image/webp",
                "720p-40-image/webp",
            ]
        );
    }
}
