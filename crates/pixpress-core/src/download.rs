//! Download offers for encoded variants.

use crate::batch::ImageResults;
use crate::options::CombinationKey;

/// File name offered for one variant.
///
/// `image_index` is zero-based; names are one-based, e.g.
/// `compressed-image-1-720p-medium.jpg`.
pub fn download_file_name(image_index: usize, key: &CombinationKey) -> String {
    format!(
        "compressed-image-{}-{}-{}.{}",
        image_index + 1,
        key.resolution.key(),
        key.quality.key(),
        key.format.extension()
    )
}

/// A variant ready to be saved by the browser, borrowing the encoded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadItem<'a> {
    pub image_index: usize,
    pub key: CombinationKey,
    pub mime: &'static str,
    pub bytes: &'a [u8],
}

impl DownloadItem<'_> {
    pub fn file_name(&self) -> String {
        download_file_name(self.image_index, &self.key)
    }
}

/// One item per successful combination of `results`, in enumeration order.
pub fn downloads_for(
    image_index: usize,
    results: &ImageResults,
) -> impl Iterator<Item = DownloadItem<'_>> {
    results.successes().map(move |(&key, encoded)| DownloadItem {
        image_index,
        key,
        mime: key.format.mime(),
        bytes: &encoded.bytes,
    })
}
