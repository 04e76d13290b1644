//! Output formats offered for download.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::options::OptionParseError;

/// Extension used when a MIME type is not one we encode.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// One of the encodings a variant can be produced in.
///
/// Formats are identified by MIME type both in combination keys and at the
/// JavaScript boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    /// Lossy 8-bit JPEG.
    Jpeg,
    /// Lossless PNG.
    Png,
    /// Lossy VP8 WebP.
    WebP,
}

impl OutputFormat {
    /// All supported formats, in the order the UI lists them.
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::WebP];

    /// MIME type, e.g. `image/jpeg`.
    pub fn mime(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    /// Canonical file extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }

    /// Look a format up by MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(OutputFormat::Jpeg),
            "image/png" => Some(OutputFormat::Png),
            "image/webp" => Some(OutputFormat::WebP),
            _ => None,
        }
    }
}

/// File extension for a MIME type, falling back to [`DEFAULT_EXTENSION`].
pub fn extension_for_mime(mime: &str) -> &'static str {
    OutputFormat::from_mime(mime)
        .map(OutputFormat::extension)
        .unwrap_or(DEFAULT_EXTENSION)
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for OutputFormat {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(format) = OutputFormat::from_mime(s) {
            return Ok(format);
        }
        // Bare names are accepted too ("jpeg", "png", "webp")
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            _ => Err(OptionParseError::Format(s.to_string())),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = OptionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputFormat> for String {
    fn from(value: OutputFormat) -> Self {
        value.mime().to_string()
    }
}
