//! Progress-callback trait for per-sheet events.
//!
//! Inject an [`Arc<dyn PlaceCardProgressCallback>`] via
//! [`crate::config::PlaceCardConfigBuilder::progress_callback`] to receive
//! events while the pipeline renders, converts and merges sheets. The CLI uses
//! it to drive a terminal progress bar; library callers can forward events
//! anywhere they like.
//!
//! # Example
//!
//! ```rust
//! use place_cards::{PlaceCardConfig, PlaceCardProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     converted: AtomicUsize,
//! }
//!
//! impl PlaceCardProgressCallback for CountingCallback {
//!     fn on_sheet_complete(&self, sheet: usize, total_sheets: usize) {
//!         self.converted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Sheet {}/{} done", sheet, total_sheets);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { converted: AtomicUsize::new(0) });
//!
//! let config = PlaceCardConfig::builder()
//!     .progress_callback(counter as Arc<dyn PlaceCardProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each sheet.
///
/// Implementations must be `Send + Sync`: with `concurrency > 1` the sheet
/// events arrive from several tasks at once. All methods default to no-ops.
pub trait PlaceCardProgressCallback: Send + Sync {
    /// Called once, after the spreadsheet has been read and batched.
    ///
    /// # Arguments
    /// * `total_sheets` — number of sheets (pages) that will be produced
    /// * `total_guests` — number of guest rows in the spreadsheet
    fn on_run_start(&self, total_sheets: usize, total_guests: usize) {
        let _ = (total_sheets, total_guests);
    }

    /// Called before a sheet is rendered.
    ///
    /// # Arguments
    /// * `sheet`        — 1-indexed sheet number
    /// * `total_sheets` — total sheets in the run
    fn on_sheet_start(&self, sheet: usize, total_sheets: usize) {
        let _ = (sheet, total_sheets);
    }

    /// Called when a sheet's PDF page has been written.
    fn on_sheet_complete(&self, sheet: usize, total_sheets: usize) {
        let _ = (sheet, total_sheets);
    }

    /// Called when a sheet fails to render or convert. The run aborts after this.
    fn on_sheet_error(&self, sheet: usize, total_sheets: usize, error: &str) {
        let _ = (sheet, total_sheets, error);
    }

    /// Called once before the page PDFs are merged.
    fn on_merge_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called once after the merged document has been written.
    fn on_run_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PlaceCardProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PlaceCardConfig`].
pub type ProgressCallback = Arc<dyn PlaceCardProgressCallback>;
