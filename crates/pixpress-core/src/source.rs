//! Uploaded source images.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique identifier of an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(u64);

impl ImageId {
    fn next() -> Self {
        ImageId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img-{}", self.0)
    }
}

impl FromStr for ImageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("img-").unwrap_or(s).parse().map(ImageId)
    }
}

/// The raw bytes of one uploaded file.
///
/// Immutable once created; clones share the same buffer.
#[derive(Debug, Clone)]
pub struct SourceImage {
    id: ImageId,
    bytes: Arc<[u8]>,
}

impl SourceImage {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: ImageId::next(),
            bytes: bytes.into(),
        }
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the uploaded file, the baseline for the compression ratio.
    pub fn original_byte_length(&self) -> usize {
        self.bytes.len()
    }
}
