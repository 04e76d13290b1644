//! Transcoding configuration.
//!
//! There is no configuration file: the browser builds a plain object and the
//! WASM layer deserializes it. Every field has a default so `{}` is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decode::{DecodeLimits, FilterType};

/// How a fixed-size preset is applied to the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Use the preset dimensions verbatim, ignoring aspect ratio.
    #[default]
    Stretch,
    /// Scale to fit inside the preset box, keeping aspect ratio; never upscale.
    Fit,
}

/// Settings shared by every transcode in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscodeConfig {
    /// Resampling filter.
    pub filter: FilterType,
    /// How presets are applied.
    pub resize_mode: ResizeMode,
    /// Optional cap on the longest output edge, applied after the preset.
    pub max_edge: Option<u32>,
    /// Bounds for decoding untrusted uploads.
    #[serde(flatten)]
    pub decode_limits: DecodeLimits,
    /// Combinations not started within this budget are recorded as timed out.
    pub batch_timeout_ms: Option<u64>,
    /// Idle drawing surfaces kept for reuse.
    pub surface_pool_size: usize,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            filter: FilterType::Bilinear,
            resize_mode: ResizeMode::Stretch,
            max_edge: None,
            decode_limits: DecodeLimits::default(),
            batch_timeout_ms: None,
            surface_pool_size: 4,
        }
    }
}

impl TranscodeConfig {
    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config: TranscodeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TranscodeConfig::default());
        assert_eq!(config.batch_timeout(), None);
    }

    #[test]
    fn test_camel_case_fields() {
        let json = r#"{
            "filter": "nearest",
            "resizeMode": "fit",
            "maxEdge": 1920,
            "maxDecodeDimension": 8000,
            "batchTimeoutMs": 2500
        }"#;
        let config: TranscodeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.filter, FilterType::Nearest);
        assert_eq!(config.resize_mode, ResizeMode::Fit);
        assert_eq!(config.max_edge, Some(1920));
        assert_eq!(config.decode_limits.max_dimension, 8000);
        assert_eq!(config.decode_limits.max_alloc, DecodeLimits::default().max_alloc);
        assert_eq!(config.batch_timeout(), Some(Duration::from_millis(2500)));
    }
}
