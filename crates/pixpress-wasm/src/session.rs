//! Session bindings: uploads, batch runs and downloads from JavaScript.
//!
//! A run can go in one call with `run`, or one image at a time with `start`
//! and `step`. Calls into WASM are synchronous, so `cancel` only takes effect
//! between steps: yield to the event loop after each `step` to let a cancel
//! click through. `cancel` with no run in progress does nothing.
//!
//! # Example
//!
//! ```typescript
//! import { JsSession } from '@pixpress/wasm';
//!
//! const session = new JsSession({ resizeMode: 'fit', maxEdge: 1920 });
//! for (const file of files) {
//!   session.addImage(new Uint8Array(await file.arrayBuffer()));
//! }
//! session.start({
//!   resolutions: ['original', '720p'],
//!   qualities: ['medium'],
//!   formats: ['image/webp'],
//! });
//! while (session.step()) {
//!   await new Promise((resolve) => setTimeout(resolve));
//! }
//! console.log(session.summary());
//! for (const name of session.downloadNames()) {
//!   const blob = new Blob([session.downloadBytes(name)]);
//! }
//! ```

use crate::types::ImageView;
use log::debug;
use pixpress_core::{BatchSummary, CancelToken, ImageId, Selection, Session, TranscodeConfig};
use wasm_bindgen::prelude::*;

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// A run that has been started but not stepped to the end.
struct PendingRun {
    selection: Selection,
    cancel: CancelToken,
    next: usize,
    summary: BatchSummary,
}

/// Uploaded images plus their latest results, held in WASM memory.
#[wasm_bindgen]
pub struct JsSession {
    inner: Session,
    pending: Option<PendingRun>,
    last_summary: BatchSummary,
}

#[wasm_bindgen]
impl JsSession {
    /// Create a session. `config` may be omitted; missing fields use defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsSession, JsValue> {
        Ok(JsSession::with_config(parse_config(config)?))
    }

    /// Replace the configuration used by later runs.
    pub fn configure(&mut self, config: JsValue) -> Result<(), JsValue> {
        self.inner.set_config(parse_config(config)?);
        Ok(())
    }

    /// Add an upload and return its id. Abandons a run in progress.
    #[wasm_bindgen(js_name = addImage)]
    pub fn add_image(&mut self, bytes: Vec<u8>) -> String {
        self.abandon_run();
        self.inner.add_image(bytes).to_string()
    }

    /// Remove an upload. Returns false for an unknown id.
    #[wasm_bindgen(js_name = removeImage)]
    pub fn remove_image(&mut self, id: &str) -> bool {
        let Ok(id) = id.parse::<ImageId>() else {
            return false;
        };
        let removed = self.inner.remove_image(id);
        if removed {
            self.abandon_run();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.abandon_run();
        self.inner.clear();
    }

    #[wasm_bindgen(getter, js_name = imageCount)]
    pub fn image_count(&self) -> usize {
        self.inner.len()
    }

    /// Run a batch to completion and return its summary counts.
    ///
    /// `selection` is `{ resolutions, qualities, formats }`, each an array of
    /// option keys. The run gets a fresh cancel token, so an earlier `cancel`
    /// never affects it.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed selection or an empty option set.
    pub fn run(&mut self, selection: JsValue) -> Result<JsValue, JsValue> {
        let summary = self.run_selection(parse_selection(selection)?).map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&summary).map_err(to_js_error)
    }

    /// Begin a run that `step` advances one image at a time.
    ///
    /// Replaces any run already in progress.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed selection or an empty option set.
    pub fn start(&mut self, selection: JsValue) -> Result<(), JsValue> {
        self.start_selection(parse_selection(selection)?)
            .map_err(to_js_error)
    }

    /// Process the next image of the current run. Returns true while images
    /// remain.
    ///
    /// After `cancel`, the next step marks every remaining image cancelled
    /// and ends the run.
    pub fn step(&mut self) -> Result<bool, JsValue> {
        self.step_run().map_err(to_js_error)
    }

    /// Cancel the run in progress. Does nothing when no run is in progress.
    pub fn cancel(&self) {
        if let Some(run) = &self.pending {
            run.cancel.cancel();
        }
    }

    #[wasm_bindgen(getter, js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Counts of the run in progress, or of the last finished run.
    pub fn summary(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.current_summary()).map_err(to_js_error)
    }

    /// One plain object per image with its latest results.
    pub fn results(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.image_views()).map_err(to_js_error)
    }

    /// File names of every successful variant, in image then enumeration order.
    #[wasm_bindgen(js_name = downloadNames)]
    pub fn download_names(&self) -> js_sys::Array {
        self.file_names().into_iter().map(JsValue::from).collect()
    }

    /// Encoded bytes for a name returned by `downloadNames`.
    #[wasm_bindgen(js_name = downloadBytes)]
    pub fn download_bytes(&self, file_name: &str) -> Option<Vec<u8>> {
        self.inner
            .download(file_name)
            .map(|item| item.bytes.to_vec())
    }
}

fn parse_config(config: JsValue) -> Result<TranscodeConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        Ok(TranscodeConfig::default())
    } else {
        serde_wasm_bindgen::from_value(config).map_err(to_js_error)
    }
}

fn parse_selection(selection: JsValue) -> Result<Selection, JsValue> {
    serde_wasm_bindgen::from_value(selection).map_err(to_js_error)
}

impl JsSession {
    pub(crate) fn with_config(config: TranscodeConfig) -> Self {
        Self {
            inner: Session::new(config),
            pending: None,
            last_summary: BatchSummary::default(),
        }
    }

    fn start_selection(&mut self, selection: Selection) -> Result<(), String> {
        selection.validate().map_err(|e| e.to_string())?;
        debug!(
            "Starting {} combination(s) over {} image(s)",
            selection.len(),
            self.inner.len()
        );
        self.pending = Some(PendingRun {
            selection,
            cancel: CancelToken::new(),
            next: 0,
            summary: BatchSummary::default(),
        });
        Ok(())
    }

    fn step_run(&mut self) -> Result<bool, String> {
        let Some(run) = self.pending.as_mut() else {
            return Ok(false);
        };

        let end = if run.cancel.is_cancelled() {
            self.inner.len()
        } else {
            run.next + 1
        };
        let step = self
            .inner
            .run_range(run.next..end, &run.selection, &run.cancel)
            .map_err(|e| e.to_string())?;
        run.summary.merge(step);
        run.next = end;

        if run.next < self.inner.len() {
            return Ok(true);
        }
        self.last_summary = run.summary;
        self.pending = None;
        Ok(false)
    }

    fn run_selection(&mut self, selection: Selection) -> Result<BatchSummary, String> {
        self.start_selection(selection)?;
        while self.step_run()? {}
        Ok(self.last_summary)
    }

    fn abandon_run(&mut self) {
        if let Some(run) = self.pending.take() {
            debug!("Abandoning run after {} image(s)", run.next);
            self.last_summary = run.summary;
        }
    }

    fn current_summary(&self) -> BatchSummary {
        self.pending
            .as_ref()
            .map_or(self.last_summary, |run| run.summary)
    }

    fn image_views(&self) -> Vec<ImageView> {
        self.inner.images().iter().map(ImageView::from).collect()
    }

    fn file_names(&self) -> Vec<String> {
        self.inner
            .downloads()
            .map(|item| item.file_name())
            .collect()
    }
}
