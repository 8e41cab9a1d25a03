//! Page conversion: page SVG → one-page PDF via an external converter.
//!
//! ## Why a trait?
//!
//! The only converter that renders Inkscape-authored SVG faithfully is
//! Inkscape itself, which we drive as a subprocess. [`PageConverter`] is the
//! narrow seam around that process: tests plug in a fake that writes PDFs
//! directly, and other tools (rsvg-convert, a headless browser) can be
//! swapped in without touching the pipeline.
//!
//! Conversion is blocking; the pipeline calls it from `spawn_blocking`.

use crate::error::ConversionError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Converts one SVG file into one PDF file.
pub trait PageConverter: Send + Sync {
    /// Write the PDF rendering of `source` to `output`.
    ///
    /// Must return `Err` when no usable PDF was produced; the pipeline never
    /// checks the file itself.
    fn convert(&self, source: &Path, output: &Path) -> Result<(), ConversionError>;
}

/// Which command-line dialect the Inkscape executable speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportSyntax {
    /// Inkscape ≥ 1.0: `--export-type=pdf --export-filename=OUT IN`. (default)
    #[default]
    Modern,
    /// Inkscape 0.92: `--export-pdf=OUT IN`.
    Legacy,
}

/// [`PageConverter`] backed by the Inkscape command-line interface.
#[derive(Debug, Clone)]
pub struct InkscapeConverter {
    executable: PathBuf,
    syntax: ExportSyntax,
}

impl InkscapeConverter {
    pub fn new(executable: impl Into<PathBuf>, syntax: ExportSyntax) -> Self {
        Self {
            executable: executable.into(),
            syntax,
        }
    }

    /// Arguments for one conversion. Paths must already be absolute:
    /// Inkscape resolves relative paths against its own working directory.
    pub fn arguments(&self, source: &Path, output: &Path) -> Vec<String> {
        let source = source.display().to_string();
        let output = output.display().to_string();
        match self.syntax {
            ExportSyntax::Modern => vec![
                "--export-type=pdf".to_string(),
                format!("--export-filename={output}"),
                source,
            ],
            ExportSyntax::Legacy => vec![format!("--export-pdf={output}"), source],
        }
    }

    fn program(&self) -> String {
        self.executable.display().to_string()
    }
}

impl PageConverter for InkscapeConverter {
    fn convert(&self, source: &Path, output: &Path) -> Result<(), ConversionError> {
        let source = absolute(source);
        let output = absolute(output);
        let args = self.arguments(&source, &output);
        debug!("Running {} {}", self.program(), args.join(" "));

        let result = Command::new(&self.executable)
            .args(&args)
            .output()
            .map_err(|e| ConversionError::Spawn {
                program: self.program(),
                source: e,
            })?;

        if !result.status.success() {
            return Err(ConversionError::Failed {
                program: self.program(),
                status: result.status,
                stderr: tail(&String::from_utf8_lossy(&result.stderr), 400),
            });
        }

        // Inkscape prints warnings (missing fonts, …) on stderr even on success.
        let stderr = String::from_utf8_lossy(&result.stderr);
        if !stderr.trim().is_empty() {
            warn!("{}: {}", self.program(), tail(&stderr, 400));
        }

        ensure_output(&output)
    }
}

/// Error unless `output` exists and is non-empty.
pub fn ensure_output(output: &Path) -> Result<(), ConversionError> {
    match std::fs::metadata(output) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(ConversionError::MissingOutput {
            path: output.to_path_buf(),
        }),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Last `max` bytes of `text`, trimmed, on a char boundary.
fn tail(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("\u{2026}{}", &text[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_arguments() {
        let ink = InkscapeConverter::new("inkscape", ExportSyntax::Modern);
        let args = ink.arguments(Path::new("/w/svg/a.svg"), Path::new("/w/pdf/a.pdf"));
        assert_eq!(
            args,
            vec![
                "--export-type=pdf",
                "--export-filename=/w/pdf/a.pdf",
                "/w/svg/a.svg"
            ]
        );
    }

    #[test]
    fn legacy_arguments() {
        let ink = InkscapeConverter::new("inkscape", ExportSyntax::Legacy);
        let args = ink.arguments(Path::new("/w/svg/a.svg"), Path::new("/w/pdf/a.pdf"));
        assert_eq!(args, vec!["--export-pdf=/w/pdf/a.pdf", "/w/svg/a.svg"]);
    }

    #[test]
    fn missing_executable_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let ink = InkscapeConverter::new(
            dir.path().join("no-such-inkscape"),
            ExportSyntax::Modern,
        );
        let err = ink
            .convert(&dir.path().join("a.svg"), &dir.path().join("a.pdf"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::Spawn { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        // `false` ignores its arguments and exits 1.
        let ink = InkscapeConverter::new("false", ExportSyntax::Modern);
        let err = ink
            .convert(&dir.path().join("a.svg"), &dir.path().join("a.pdf"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::Failed { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn success_without_output_is_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        // `true` exits 0 and writes nothing.
        let ink = InkscapeConverter::new("true", ExportSyntax::Modern);
        let err = ink
            .convert(&dir.path().join("a.svg"), &dir.path().join("a.pdf"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::MissingOutput { .. }), "got: {err}");
    }

    #[test]
    fn empty_file_is_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::write(&path, b"").unwrap();
        assert!(ensure_output(&path).is_err());
        std::fs::write(&path, b"%PDF-1.5").unwrap();
        assert!(ensure_output(&path).is_ok());
    }

    #[test]
    fn tail_keeps_the_end() {
        assert_eq!(tail("  short  ", 10), "short");
        assert_eq!(tail("abcdefghij", 3), "\u{2026}hij");
    }
}
