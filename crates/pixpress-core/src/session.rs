//! The set of uploaded images and their most recent results.

use std::ops::Range;

use log::info;
use serde::Serialize;

use crate::batch::{run_batch_with_pool, CancelToken, ImageResults};
use crate::config::TranscodeConfig;
use crate::download::{downloads_for, DownloadItem};
use crate::options::{InvalidSelectionError, Selection};
use crate::source::{ImageId, SourceImage};
use crate::surface::SurfacePool;
use crate::transcode::TranscodeError;

/// One uploaded image and its published results.
#[derive(Debug, Clone)]
pub struct SessionImage {
    source: SourceImage,
    results: Option<ImageResults>,
}

impl SessionImage {
    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    /// Results of the last run that completed for this image.
    pub fn results(&self) -> Option<&ImageResults> {
        self.results.as_ref()
    }
}

/// Counts from one [`Session::run_batch`] or [`Session::run_range`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Images the batch ran over.
    pub images: usize,
    /// Images whose results were replaced.
    pub published: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub timed_out: usize,
}

impl BatchSummary {
    /// Add the counts of a later step of the same run.
    pub fn merge(&mut self, other: BatchSummary) {
        self.images += other.images;
        self.published += other.published;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.cancelled += other.cancelled;
        self.timed_out += other.timed_out;
    }
}

/// Uploaded images, shared configuration and a surface pool reused across runs.
#[derive(Debug)]
pub struct Session {
    config: TranscodeConfig,
    pool: SurfacePool,
    images: Vec<SessionImage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(TranscodeConfig::default())
    }
}

impl Session {
    pub fn new(config: TranscodeConfig) -> Self {
        Self {
            pool: SurfacePool::new(config.surface_pool_size),
            config,
            images: Vec::new(),
        }
    }

    pub fn config(&self) -> &TranscodeConfig {
        &self.config
    }

    /// Replace the configuration for later runs. Published results stay.
    pub fn set_config(&mut self, config: TranscodeConfig) {
        if config.surface_pool_size != self.config.surface_pool_size {
            self.pool = SurfacePool::new(config.surface_pool_size);
        }
        self.config = config;
    }

    /// Add an upload. Bytes are not validated until a batch decodes them.
    pub fn add_image(&mut self, bytes: impl Into<Vec<u8>>) -> ImageId {
        let source = SourceImage::new(bytes.into());
        let id = source.id();
        self.images.push(SessionImage {
            source,
            results: None,
        });
        id
    }

    /// Remove an image and its results. Returns false if the id is unknown.
    pub fn remove_image(&mut self, id: ImageId) -> bool {
        let before = self.images.len();
        self.images.retain(|img| img.source.id() != id);
        self.images.len() != before
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn images(&self) -> &[SessionImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn results(&self, id: ImageId) -> Option<&ImageResults> {
        self.images
            .iter()
            .find(|img| img.source.id() == id)
            .and_then(SessionImage::results)
    }

    /// Run `selection` over every image and publish the results.
    ///
    /// Each image's previous results are replaced in one assignment. Images
    /// whose run was cut short by `cancel` or the batch timeout keep what
    /// they had.
    ///
    /// # Errors
    ///
    /// `InvalidSelectionError` for an empty option set; existing results are
    /// left untouched.
    pub fn run_batch(
        &mut self,
        selection: &Selection,
        cancel: &CancelToken,
    ) -> Result<BatchSummary, InvalidSelectionError> {
        self.run_range(0..self.images.len(), selection, cancel)
    }

    /// Run `selection` over the images at `range` only, clamped to the
    /// current image count.
    ///
    /// Callers that cannot be interrupted mid-call step through the images
    /// one range at a time and check `cancel` in between.
    ///
    /// # Errors
    ///
    /// `InvalidSelectionError` for an empty option set.
    pub fn run_range(
        &mut self,
        range: Range<usize>,
        selection: &Selection,
        cancel: &CancelToken,
    ) -> Result<BatchSummary, InvalidSelectionError> {
        let end = range.end.min(self.images.len());
        let start = range.start.min(end);
        let slots = &mut self.images[start..end];

        let sources: Vec<SourceImage> = slots.iter().map(|img| img.source.clone()).collect();
        let outcomes = run_batch_with_pool(&sources, selection, &self.config, cancel, &self.pool)?;

        let mut summary = BatchSummary {
            images: outcomes.len(),
            ..BatchSummary::default()
        };
        for (slot, results) in slots.iter_mut().zip(outcomes) {
            for (_, outcome) in results.iter() {
                match outcome {
                    Ok(_) => summary.succeeded += 1,
                    Err(TranscodeError::Cancelled) => summary.cancelled += 1,
                    Err(TranscodeError::TimedOut) => summary.timed_out += 1,
                    Err(_) => summary.failed += 1,
                }
            }
            if !results.was_cut_short() {
                slot.results = Some(results);
                summary.published += 1;
            }
        }

        info!(
            "Published {}/{} image(s): {} ok, {} failed, {} cancelled, {} timed out",
            summary.published,
            summary.images,
            summary.succeeded,
            summary.failed,
            summary.cancelled,
            summary.timed_out
        );
        Ok(summary)
    }

    /// Every successful variant of every image, in image then enumeration
    /// order. Items borrow the encoded bytes.
    pub fn downloads(&self) -> impl Iterator<Item = DownloadItem<'_>> {
        self.images
            .iter()
            .enumerate()
            .filter_map(|(index, img)| img.results().map(|res| downloads_for(index, res)))
            .flatten()
    }

    /// The variant offered under `file_name`.
    pub fn download(&self, file_name: &str) -> Option<DownloadItem<'_>> {
        self.downloads().find(|item| item.file_name() == file_name)
    }
}
