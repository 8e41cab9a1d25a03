//! Working directory for intermediate page files.
//!
//! A run writes `svg/place_cards-N.svg` and `pdf/place_cards-N.pdf` under its
//! working directory. [`WorkDir`] owns that directory for the duration of the
//! run and cleans it up when dropped, on the error path as well as on
//! success, unless the caller asked to keep the files.

use crate::error::PlaceCardError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

const SVG_DIR: &str = "svg";
const PDF_DIR: &str = "pdf";

/// Where the working directory came from, which decides what cleanup removes.
enum Root {
    /// Fresh temp directory; removed entirely.
    Temp(TempDir),
    /// Caller-supplied directory. Only our sub-directories are removed, plus
    /// the directory itself if this run created it.
    Given { path: PathBuf, created: bool },
}

/// Scoped owner of the intermediate files of one run.
pub struct WorkDir {
    root: Option<Root>,
    keep: bool,
}

impl WorkDir {
    /// Create (or adopt) the working directory and its `svg/` and `pdf/`
    /// sub-directories.
    pub fn acquire(requested: Option<&Path>, keep: bool) -> Result<Self, PlaceCardError> {
        let root = match requested {
            None => {
                let temp = tempfile::Builder::new()
                    .prefix("place-cards-")
                    .tempdir()
                    .map_err(|source| PlaceCardError::WorkDir {
                        path: std::env::temp_dir(),
                        source,
                    })?;
                Root::Temp(temp)
            }
            Some(path) => {
                let created = !path.exists();
                std::fs::create_dir_all(path).map_err(|source| PlaceCardError::WorkDir {
                    path: path.to_path_buf(),
                    source,
                })?;
                Root::Given {
                    path: path.to_path_buf(),
                    created,
                }
            }
        };

        // Built before the sub-directories so a failure below still cleans up.
        let dir = Self {
            root: Some(root),
            keep,
        };
        for sub in [SVG_DIR, PDF_DIR] {
            let path = dir.path().join(sub);
            std::fs::create_dir_all(&path)
                .map_err(|source| PlaceCardError::WorkDir { path, source })?;
        }
        debug!("Working directory: {}", dir.path().display());
        Ok(dir)
    }

    pub fn path(&self) -> &Path {
        match &self.root {
            Some(Root::Temp(temp)) => temp.path(),
            Some(Root::Given { path, .. }) => path,
            None => Path::new(""),
        }
    }

    /// Path of the rendered SVG for 1-indexed `sheet`.
    pub fn svg_path(&self, sheet: usize) -> PathBuf {
        self.path().join(SVG_DIR).join(page_file_name(sheet, "svg"))
    }

    /// Path of the converted PDF for 1-indexed `sheet`.
    pub fn pdf_path(&self, sheet: usize) -> PathBuf {
        self.path().join(PDF_DIR).join(page_file_name(sheet, "pdf"))
    }

    /// Release the directory. Returns its path if it was kept.
    pub fn finish(mut self) -> Option<PathBuf> {
        self.release()
    }

    fn release(&mut self) -> Option<PathBuf> {
        let root = self.root.take()?;
        if self.keep {
            let path = match root {
                Root::Temp(temp) => temp.keep(),
                Root::Given { path, .. } => path,
            };
            info!("Kept intermediate files in {}", path.display());
            return Some(path);
        }

        match root {
            Root::Temp(temp) => {
                let path = temp.path().to_path_buf();
                if let Err(e) = temp.close() {
                    warn!("Could not remove {}: {}", path.display(), e);
                }
            }
            Root::Given { path, created } => {
                let result = if created {
                    std::fs::remove_dir_all(&path)
                } else {
                    [SVG_DIR, PDF_DIR]
                        .iter()
                        .try_for_each(|sub| remove_if_present(&path.join(sub)))
                };
                if let Err(e) = result {
                    warn!("Could not clean up {}: {}", path.display(), e);
                }
            }
        }
        None
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        self.release();
    }
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn page_file_name(sheet: usize, ext: &str) -> String {
    format!("place_cards-{sheet}.{ext}")
}
