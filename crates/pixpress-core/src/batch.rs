//! Batch orchestration over the cartesian product of selected options.
//!
//! For every image the orchestrator decodes once, runs every combination of
//! the selection through the transcoder, and only then builds that image's
//! [`ImageResults`]. Failures are recorded under their combination key; the
//! only error returned from [`run_batch`] is an invalid (empty) selection.
//!
//! With the `parallel` feature, images and the combinations within each
//! image run on the rayon pool. Results are keyed, so completion order does
//! not matter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};
use web_time::Instant;

use crate::config::TranscodeConfig;
use crate::decode::{decode_image, DecodeError, DecodedImage};
use crate::options::{CombinationKey, InvalidSelectionError, Selection};
use crate::source::{ImageId, SourceImage};
use crate::surface::SurfacePool;
use crate::transcode::{transcode_decoded, EncodedImage, TranscodeError};

/// Result of one combination.
pub type CombinationOutcome = Result<EncodedImage, TranscodeError>;

/// Cooperative cancellation flag for an in-flight batch.
///
/// Combinations that have not started when the token trips are recorded as
/// [`TranscodeError::Cancelled`]; ones already running finish normally.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Percentage saved by the smallest variant relative to the original file.
///
/// Negative when the variant is larger; exactly 100 only for a zero-byte
/// variant. `None` for a zero-byte original.
pub fn compression_ratio(original_bytes: usize, smallest_bytes: usize) -> Option<f64> {
    if original_bytes == 0 {
        return None;
    }
    let original = original_bytes as f64;
    Some((original - smallest_bytes as f64) / original * 100.0)
}

/// Every combination's outcome for one image from the most recent run.
#[derive(Debug, Clone)]
pub struct ImageResults {
    image_id: ImageId,
    original_byte_length: usize,
    entries: Vec<(CombinationKey, CombinationOutcome)>,
    smallest: Option<usize>,
    ratio: Option<f64>,
}

impl ImageResults {
    fn new(source: &SourceImage, entries: Vec<(CombinationKey, CombinationOutcome)>) -> Self {
        // Ties keep the first combination in enumeration order
        let smallest = entries
            .iter()
            .enumerate()
            .filter_map(|(i, (_, outcome))| outcome.as_ref().ok().map(|img| (i, img.byte_len())))
            .min_by_key(|&(i, len)| (len, i))
            .map(|(i, _)| i);

        let ratio = smallest.and_then(|i| {
            let len = entries[i].1.as_ref().map_or(0, EncodedImage::byte_len);
            compression_ratio(source.original_byte_length(), len)
        });

        Self {
            image_id: source.id(),
            original_byte_length: source.original_byte_length(),
            entries,
            smallest,
            ratio,
        }
    }

    pub fn image_id(&self) -> ImageId {
        self.image_id
    }

    pub fn original_byte_length(&self) -> usize {
        self.original_byte_length
    }

    /// Number of combination keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &CombinationKey) -> Option<&CombinationOutcome> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, outcome)| outcome)
    }

    /// All entries in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&CombinationKey, &CombinationOutcome)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn successes(&self) -> impl Iterator<Item = (&CombinationKey, &EncodedImage)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_ref().ok().map(|img| (k, img)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&CombinationKey, &TranscodeError)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_ref().err().map(|err| (k, err)))
    }

    /// The smallest successful variant.
    pub fn smallest(&self) -> Option<(&CombinationKey, &EncodedImage)> {
        let (key, outcome) = &self.entries[self.smallest?];
        outcome.as_ref().ok().map(|img| (key, img))
    }

    /// Compression ratio against the smallest variant, if any succeeded.
    pub fn compression_ratio(&self) -> Option<f64> {
        self.ratio
    }

    /// True if any combination was skipped by cancellation or the batch
    /// deadline. Such results are partial and never replace earlier ones.
    pub fn was_cut_short(&self) -> bool {
        self.failures().any(|(_, err)| {
            matches!(err, TranscodeError::Cancelled | TranscodeError::TimedOut)
        })
    }

    /// The decode failure, when the source could not be read at all.
    pub fn decode_error(&self) -> Option<&DecodeError> {
        self.failures().find_map(|(_, err)| match err {
            TranscodeError::Decode(e) => Some(e),
            _ => None,
        })
    }
}

/// Shared, read-only state for one batch run.
struct BatchContext<'a> {
    config: &'a TranscodeConfig,
    cancel: &'a CancelToken,
    deadline: Option<Instant>,
    pool: &'a SurfacePool,
}

impl BatchContext<'_> {
    /// Reason a not-yet-started unit of work must be skipped.
    fn skip_reason(&self) -> Option<TranscodeError> {
        if self.cancel.is_cancelled() {
            return Some(TranscodeError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(TranscodeError::TimedOut),
            _ => None,
        }
    }

    fn run_one(&self, image: &DecodedImage, key: CombinationKey) -> CombinationOutcome {
        if let Some(reason) = self.skip_reason() {
            return Err(reason);
        }
        let mut surface = self.pool.checkout();
        transcode_decoded(image, key, self.config, &mut surface).map_err(|err| {
            warn!("{key} failed: {err}");
            TranscodeError::from(err)
        })
    }

    fn process_image(&self, source: &SourceImage, keys: &[CombinationKey]) -> ImageResults {
        let fail_all = |err: TranscodeError| -> Vec<(CombinationKey, CombinationOutcome)> {
            keys.iter().map(|&key| (key, Err(err.clone()))).collect()
        };

        let entries = if let Some(reason) = self.skip_reason() {
            fail_all(reason)
        } else {
            match decode_image(source.bytes(), self.config.decode_limits) {
                Ok(decoded) => {
                    let outcomes = map_maybe_parallel(keys, |&key| self.run_one(&decoded, key));
                    keys.iter().copied().zip(outcomes).collect()
                }
                Err(err) => {
                    warn!("{} could not be decoded: {err}", source.id());
                    fail_all(TranscodeError::Decode(err))
                }
            }
        };

        ImageResults::new(source, entries)
    }
}

#[cfg(feature = "parallel")]
fn map_maybe_parallel<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    use rayon::prelude::*;
    items.par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_maybe_parallel<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    F: Fn(&T) -> R,
{
    items.iter().map(f).collect()
}

/// Run every selected combination for every image.
///
/// Returns one [`ImageResults`] per input image, in input order.
///
/// # Errors
///
/// `InvalidSelectionError` if any option set is empty; nothing is transcoded
/// in that case.
pub fn run_batch(
    images: &[SourceImage],
    selection: &Selection,
    config: &TranscodeConfig,
    cancel: &CancelToken,
) -> Result<Vec<ImageResults>, InvalidSelectionError> {
    let pool = SurfacePool::new(config.surface_pool_size);
    run_batch_with_pool(images, selection, config, cancel, &pool)
}

pub(crate) fn run_batch_with_pool(
    images: &[SourceImage],
    selection: &Selection,
    config: &TranscodeConfig,
    cancel: &CancelToken,
    pool: &SurfacePool,
) -> Result<Vec<ImageResults>, InvalidSelectionError> {
    selection.validate()?;
    if images.is_empty() {
        return Ok(Vec::new());
    }

    let keys: Vec<CombinationKey> = selection.combinations().collect();
    info!(
        "Batch: {} image(s) x {} combination(s)",
        images.len(),
        keys.len()
    );

    let ctx = BatchContext {
        config,
        cancel,
        deadline: config.batch_timeout().map(|timeout| Instant::now() + timeout),
        pool,
    };
    let started = Instant::now();
    let results = map_maybe_parallel(images, |source| ctx.process_image(source, &keys));
    info!("Batch finished in {:?}", started.elapsed());

    Ok(results)
}
