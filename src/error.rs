//! Error types for the place-cards library.
//!
//! Two error types reflect the two boundaries of the pipeline:
//!
//! * [`PlaceCardError`] — **Fatal**: the run cannot produce a merged document
//!   (missing spreadsheet, unknown food choice, converter failure, …).
//!   Returned as `Err(PlaceCardError)` from [`crate::make_place_cards`].
//!
//! * [`ConversionError`] — what a [`crate::pipeline::export::PageConverter`]
//!   reports for a single SVG → PDF conversion. The pipeline wraps it in
//!   [`PlaceCardError::Conversion`] together with the sheet number.
//!
//! There is no partial-success mode: either every sheet makes it into the
//! merged PDF or nothing is written.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// All fatal errors returned by the place-cards library.
#[derive(Debug, Error)]
pub enum PlaceCardError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Spreadsheet or template was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The spreadsheet could not be parsed (bad CSV, missing header, …).
    #[error("Could not read spreadsheet '{path}': {detail}")]
    Spreadsheet { path: PathBuf, detail: String },

    /// The spreadsheet parsed but contains no guest rows.
    #[error("Spreadsheet '{path}' has no guests; nothing to print")]
    NoGuests { path: PathBuf },

    /// A guest's food choice has no color in the configured color map.
    #[error("Unknown food choice '{food}' for guest '{guest}'\nKnown choices: {known}")]
    UnknownFoodChoice {
        food: String,
        guest: String,
        known: String,
    },

    // ── Template errors ───────────────────────────────────────────────────
    /// The (preprocessed) SVG template is not a valid Tera template.
    #[error("Template '{path}' could not be parsed: {detail}")]
    TemplateParse { path: PathBuf, detail: String },

    /// Rendering the template for one sheet failed.
    #[error("Rendering sheet {sheet} failed: {detail}")]
    TemplateRender { sheet: usize, detail: String },

    // ── Conversion / merge errors ─────────────────────────────────────────
    /// The external converter failed for one sheet.
    #[error("Converting sheet {sheet} to PDF failed: {source}")]
    Conversion {
        sheet: usize,
        #[source]
        source: ConversionError,
    },

    /// A page PDF could not be read or the merged document could not be built.
    #[error("Merging pages failed: {detail}")]
    Merge { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or populate the working directory.
    #[error("Working directory '{path}' is unusable: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed, or a color map file was malformed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single SVG → PDF conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The converter executable could not be started.
    #[error("could not run '{program}': {source}\nInstall Inkscape or point --inkscape at it.")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The converter ran but exited unsuccessfully.
    #[error("'{program}' exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The converter reported success but produced no usable file.
    #[error("converter produced no output at '{path}'")]
    MissingOutput { path: PathBuf },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_food_display() {
        let e = PlaceCardError::UnknownFoodChoice {
            food: "tofu".into(),
            guest: "Ada".into(),
            known: "kids, pork, salmon, veggie".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("tofu"), "got: {msg}");
        assert!(msg.contains("Ada"), "got: {msg}");
        assert!(msg.contains("salmon"), "got: {msg}");
    }

    #[test]
    fn conversion_display_carries_sheet_and_cause() {
        let e = PlaceCardError::Conversion {
            sheet: 2,
            source: ConversionError::MissingOutput {
                path: PathBuf::from("/tmp/pdf/place_cards-2.pdf"),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("sheet 2"), "got: {msg}");
        assert!(msg.contains("place_cards-2.pdf"), "got: {msg}");
    }

    #[test]
    fn spawn_error_hints_at_flag() {
        let e = ConversionError::Spawn {
            program: "inkscape".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(e.to_string().contains("--inkscape"));
    }

    #[test]
    fn stderr_suffix_only_when_present() {
        assert_eq!(stderr_suffix(""), "");
        assert_eq!(stderr_suffix("boom"), ": boom");
    }
}
