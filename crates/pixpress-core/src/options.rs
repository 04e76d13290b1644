//! User-selectable transcoding options and the keys built from them.
//!
//! Each option type has a short string key used in file names and at the
//! JavaScript boundary. Inside Rust, combinations are always the typed
//! [`CombinationKey`] triple.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::OutputFormat;

/// Failure to parse an option key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionParseError {
    #[error("Unknown resolution: {0:?} (expected original, a preset name or WIDTHxHEIGHT)")]
    Resolution(String),

    #[error("Unknown quality: {0:?} (expected low, medium, high or 0-100)")]
    Quality(String),

    #[error("Unknown output format: {0:?}")]
    Format(String),
}

/// Target output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResolutionSpec {
    /// Keep the source's natural dimensions.
    Original,
    /// 3840x2160.
    Uhd4k,
    /// 1920x1080.
    FullHd,
    /// 1280x720.
    Hd,
    /// 854x480.
    Sd,
    /// 800x600.
    Svga,
    /// Any other fixed size.
    Custom { width: u32, height: u32 },
}

impl ResolutionSpec {
    /// Built-in choices, largest first.
    pub const PRESETS: [ResolutionSpec; 6] = [
        ResolutionSpec::Original,
        ResolutionSpec::Uhd4k,
        ResolutionSpec::FullHd,
        ResolutionSpec::Hd,
        ResolutionSpec::Sd,
        ResolutionSpec::Svga,
    ];

    /// Fixed `(width, height)`, or `None` for [`ResolutionSpec::Original`].
    pub fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            ResolutionSpec::Original => None,
            ResolutionSpec::Uhd4k => Some((3840, 2160)),
            ResolutionSpec::FullHd => Some((1920, 1080)),
            ResolutionSpec::Hd => Some((1280, 720)),
            ResolutionSpec::Sd => Some((854, 480)),
            ResolutionSpec::Svga => Some((800, 600)),
            ResolutionSpec::Custom { width, height } => Some((width, height)),
        }
    }

    /// Short key used in combination keys and file names.
    pub fn key(self) -> String {
        match self {
            ResolutionSpec::Original => "original".to_string(),
            ResolutionSpec::Uhd4k => "4k".to_string(),
            ResolutionSpec::FullHd => "1080p".to_string(),
            ResolutionSpec::Hd => "720p".to_string(),
            ResolutionSpec::Sd => "480p".to_string(),
            ResolutionSpec::Svga => "800x600".to_string(),
            ResolutionSpec::Custom { width, height } => format!("{width}x{height}"),
        }
    }

    /// Fold a custom size onto the matching preset, if any.
    fn normalized(self) -> Self {
        if let ResolutionSpec::Custom { width, height } = self {
            for preset in Self::PRESETS {
                if preset.dimensions() == Some((width, height)) {
                    return preset;
                }
            }
        }
        self
    }
}

impl fmt::Display for ResolutionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for ResolutionSpec {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let spec = match key.as_str() {
            "original" => ResolutionSpec::Original,
            "4k" | "2160p" => ResolutionSpec::Uhd4k,
            "1080p" => ResolutionSpec::FullHd,
            "720p" => ResolutionSpec::Hd,
            "480p" => ResolutionSpec::Sd,
            _ => {
                let (w, h) = key
                    .split_once('x')
                    .ok_or_else(|| OptionParseError::Resolution(s.to_string()))?;
                let parse = |v: &str| {
                    v.trim()
                        .parse::<u32>()
                        .map_err(|_| OptionParseError::Resolution(s.to_string()))
                };
                ResolutionSpec::Custom {
                    width: parse(w)?,
                    height: parse(h)?,
                }
                .normalized()
            }
        };
        Ok(spec)
    }
}

impl TryFrom<String> for ResolutionSpec {
    type Error = OptionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResolutionSpec> for String {
    fn from(value: ResolutionSpec) -> Self {
        value.key()
    }
}

/// Compression quality: a named tier or a slider value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QualityLevel {
    Low,
    Medium,
    High,
    /// Slider position in `0..=100`; larger values are clamped.
    Scale(u8),
}

impl QualityLevel {
    /// Slider level, clamped to `0..=100`.
    pub fn scale(value: u8) -> Self {
        QualityLevel::Scale(value.min(100))
    }

    /// The same level with any slider value clamped, so equal keys compare
    /// equal.
    pub fn normalized(self) -> Self {
        match self {
            QualityLevel::Scale(v) => QualityLevel::scale(v),
            other => other,
        }
    }

    /// Encoder quality parameter in `0.0..=1.0`.
    pub fn encoder_quality(self) -> f32 {
        match self {
            QualityLevel::Low => 0.3,
            QualityLevel::Medium => 0.5,
            QualityLevel::High => 0.7,
            QualityLevel::Scale(v) => f32::from(v.min(100)) / 100.0,
        }
    }

    /// Short key used in combination keys and file names.
    pub fn key(self) -> String {
        match self {
            QualityLevel::Low => "low".to_string(),
            QualityLevel::Medium => "medium".to_string(),
            QualityLevel::High => "high".to_string(),
            QualityLevel::Scale(v) => v.min(100).to_string(),
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for QualityLevel {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(QualityLevel::Low),
            "medium" | "balanced" => Ok(QualityLevel::Medium),
            "high" => Ok(QualityLevel::High),
            other => match other.parse::<u8>() {
                Ok(v) if v <= 100 => Ok(QualityLevel::Scale(v)),
                _ => Err(OptionParseError::Quality(s.to_string())),
            },
        }
    }
}

impl TryFrom<String> for QualityLevel {
    type Error = OptionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QualityLevel> for String {
    fn from(value: QualityLevel) -> Self {
        value.key()
    }
}

/// One transcoding variant: the (resolution, quality, format) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombinationKey {
    pub resolution: ResolutionSpec,
    pub quality: QualityLevel,
    pub format: OutputFormat,
}

impl CombinationKey {
    pub fn new(resolution: ResolutionSpec, quality: QualityLevel, format: OutputFormat) -> Self {
        Self {
            resolution,
            quality: quality.normalized(),
            format,
        }
    }
}

impl fmt::Display for CombinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.resolution, self.quality, self.format)
    }
}

/// Batch invoked with an empty option set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidSelectionError {
    #[error("No resolution selected")]
    EmptyResolutions,
    #[error("No quality level selected")]
    EmptyQualities,
    #[error("No output format selected")]
    EmptyFormats,
}

/// The option sets chosen for a batch run.
///
/// Each set is deduplicated on construction, keeping first-seen order, so the
/// cartesian product never yields the same key twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSelection")]
pub struct Selection {
    resolutions: Vec<ResolutionSpec>,
    qualities: Vec<QualityLevel>,
    formats: Vec<OutputFormat>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawSelection {
    resolutions: Vec<ResolutionSpec>,
    qualities: Vec<QualityLevel>,
    formats: Vec<OutputFormat>,
}

impl From<RawSelection> for Selection {
    fn from(raw: RawSelection) -> Self {
        Selection::new(raw.resolutions, raw.qualities, raw.formats)
    }
}

fn dedup_in_order<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

impl Selection {
    pub fn new(
        resolutions: impl IntoIterator<Item = ResolutionSpec>,
        qualities: impl IntoIterator<Item = QualityLevel>,
        formats: impl IntoIterator<Item = OutputFormat>,
    ) -> Self {
        Self {
            resolutions: dedup_in_order(resolutions.into_iter().collect()),
            qualities: dedup_in_order(qualities.into_iter().map(QualityLevel::normalized).collect()),
            formats: dedup_in_order(formats.into_iter().collect()),
        }
    }

    pub fn resolutions(&self) -> &[ResolutionSpec] {
        &self.resolutions
    }

    pub fn qualities(&self) -> &[QualityLevel] {
        &self.qualities
    }

    pub fn formats(&self) -> &[OutputFormat] {
        &self.formats
    }

    /// Reject a selection with any empty set.
    pub fn validate(&self) -> Result<(), InvalidSelectionError> {
        if self.resolutions.is_empty() {
            return Err(InvalidSelectionError::EmptyResolutions);
        }
        if self.qualities.is_empty() {
            return Err(InvalidSelectionError::EmptyQualities);
        }
        if self.formats.is_empty() {
            return Err(InvalidSelectionError::EmptyFormats);
        }
        Ok(())
    }

    /// Number of combinations per image.
    pub fn len(&self) -> usize {
        self.resolutions.len() * self.qualities.len() * self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product: resolution outer, quality middle, format inner.
    pub fn combinations(&self) -> impl Iterator<Item = CombinationKey> + '_ {
        self.resolutions.iter().flat_map(move |&resolution| {
            self.qualities.iter().flat_map(move |&quality| {
                self.formats
                    .iter()
                    .map(move |&format| CombinationKey::new(resolution, quality, format))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_dimensions() {
        assert_eq!(ResolutionSpec::Original.dimensions(), None);
        assert_eq!(ResolutionSpec::Hd.dimensions(), Some((1280, 720)));
        assert_eq!(ResolutionSpec::Uhd4k.dimensions(), Some((3840, 2160)));
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!("720p".parse::<ResolutionSpec>().unwrap(), ResolutionSpec::Hd);
        assert_eq!("original".parse::<ResolutionSpec>().unwrap(), ResolutionSpec::Original);
        // The original page's WxH labels fold onto presets
        assert_eq!("1920x1080".parse::<ResolutionSpec>().unwrap(), ResolutionSpec::FullHd);
        assert_eq!("800x600".parse::<ResolutionSpec>().unwrap(), ResolutionSpec::Svga);
        assert_eq!(
            "640x480".parse::<ResolutionSpec>().unwrap(),
            ResolutionSpec::Custom {
                width: 640,
                height: 480
            }
        );
        assert!("huge".parse::<ResolutionSpec>().is_err());
        assert!("12xabc".parse::<ResolutionSpec>().is_err());
    }

    #[test]
    fn test_resolution_key_round_trip() {
        for spec in ResolutionSpec::PRESETS {
            assert_eq!(spec.key().parse::<ResolutionSpec>().unwrap(), spec);
        }
    }

    #[test]
    fn test_quality_tiers_map_to_constants() {
        assert_eq!(QualityLevel::Low.encoder_quality(), 0.3);
        assert_eq!(QualityLevel::Medium.encoder_quality(), 0.5);
        assert_eq!(QualityLevel::High.encoder_quality(), 0.7);
    }

    #[test]
    fn test_quality_scale_is_normalized() {
        assert_eq!(QualityLevel::Scale(0).encoder_quality(), 0.0);
        assert_eq!(QualityLevel::Scale(100).encoder_quality(), 1.0);
        assert_eq!(QualityLevel::Scale(200).encoder_quality(), 1.0);
        assert!((QualityLevel::Scale(85).encoder_quality() - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_quality_parse() {
        assert_eq!("medium".parse::<QualityLevel>().unwrap(), QualityLevel::Medium);
        assert_eq!("balanced".parse::<QualityLevel>().unwrap(), QualityLevel::Medium);
        assert!("high-compression".parse::<QualityLevel>().is_err());
        assert_eq!("75".parse::<QualityLevel>().unwrap(), QualityLevel::Scale(75));
        assert!("101".parse::<QualityLevel>().is_err());
        assert!("best".parse::<QualityLevel>().is_err());
    }

    #[test]
    fn test_combination_key_display() {
        let key = CombinationKey::new(ResolutionSpec::Hd, QualityLevel::Medium, OutputFormat::Jpeg);
        assert_eq!(key.to_string(), "720p-medium-image/jpeg");
    }

    #[test]
    fn test_selection_order_is_resolution_quality_format() {
        let selection = Selection::new(
            [ResolutionSpec::FullHd, ResolutionSpec::Hd],
            [QualityLevel::Low, QualityLevel::High],
            [OutputFormat::Jpeg, OutputFormat::WebP],
        );
        let keys: Vec<String> = selection.combinations().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            [
                "1080p-low-image/jpeg",
                "1080p-low-image/webp",
                "1080p-high-image/jpeg",
                "1080p-high-image/webp",
                "720p-low-image/jpeg",
                "720p-low-image/webp",
                "720p-high-image/jpeg",
                "720p-high-image/webp",
            ]
        );
        assert_eq!(selection.len(), 8);
    }

    #[test]
    fn test_selection_dedups() {
        let selection = Selection::new(
            [ResolutionSpec::Hd, ResolutionSpec::Hd],
            [QualityLevel::Low],
            [OutputFormat::Png, OutputFormat::Png, OutputFormat::Jpeg],
        );
        assert_eq!(selection.resolutions(), &[ResolutionSpec::Hd]);
        assert_eq!(selection.formats(), &[OutputFormat::Png, OutputFormat::Jpeg]);
        assert_eq!(selection.combinations().count(), 2);
    }

    #[test]
    fn test_selection_dedups_clamped_scale() {
        let selection = Selection::new(
            [ResolutionSpec::Original],
            [QualityLevel::Scale(150), QualityLevel::Scale(100)],
            [OutputFormat::Jpeg],
        );
        assert_eq!(selection.qualities(), &[QualityLevel::Scale(100)]);
        assert_eq!(selection.combinations().count(), 1);

        let key = CombinationKey::new(
            ResolutionSpec::Original,
            QualityLevel::Scale(255),
            OutputFormat::Jpeg,
        );
        assert_eq!(key.quality, QualityLevel::scale(100));
    }

    #[test]
    fn test_selection_validate() {
        let empty_res = Selection::new([], [QualityLevel::Low], [OutputFormat::Jpeg]);
        assert_eq!(
            empty_res.validate(),
            Err(InvalidSelectionError::EmptyResolutions)
        );
        let empty_q = Selection::new([ResolutionSpec::Hd], [], [OutputFormat::Jpeg]);
        assert_eq!(empty_q.validate(), Err(InvalidSelectionError::EmptyQualities));
        let empty_f = Selection::new([ResolutionSpec::Hd], [QualityLevel::Low], []);
        assert_eq!(empty_f.validate(), Err(InvalidSelectionError::EmptyFormats));
        assert!(empty_f.is_empty());
    }

    #[test]
    fn test_selection_deserializes_from_keys() {
        let json = r#"{
            "resolutions": ["720p", "720p", "original"],
            "qualities": ["medium"],
            "formats": ["image/jpeg"]
        }"#;
        let selection: Selection = serde_json::from_str(json).unwrap();
        assert_eq!(
            selection.resolutions(),
            &[ResolutionSpec::Hd, ResolutionSpec::Original]
        );
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_selection_rejects_unknown_keys() {
        let json = r#"{"resolutions": ["giant"], "qualities": [], "formats": []}"#;
        assert!(serde_json::from_str::<Selection>(json).is_err());
    }
}
