//! Result type of a successful run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Guest rows read from the spreadsheet.
    pub guests: usize,
    /// Sheets rendered, i.e. pages in the merged PDF.
    pub sheets: usize,
    /// Cards on the last sheet filled with copies of its last guest.
    pub padded_cards: usize,
    /// The merged PDF.
    pub output_path: PathBuf,
    /// Intermediate files, when they were kept.
    pub work_dir: Option<PathBuf>,
    /// Wall-clock time of the whole run.
    pub duration_ms: u64,
}
