//! Guest input: read the spreadsheet into [`GuestRecord`]s.
//!
//! The spreadsheet is a CSV export with a header row. Columns are addressed by
//! header name (`Name`, `Table`, `Food`), so column order does not matter and
//! extra columns (RSVP status, notes, …) are ignored.

use crate::error::PlaceCardError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One guest, one row of the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestRecord {
    #[serde(rename = "Name")]
    pub name: String,
    /// Kept as text: tables are often labelled ("12", "Head", "A3").
    #[serde(rename = "Table")]
    pub table: String,
    #[serde(rename = "Food")]
    pub food: String,
}

/// Make sure `path` exists and is readable, mapping failures to input errors.
///
/// Used for both the spreadsheet and the template.
pub fn check_readable(path: &Path) -> Result<PathBuf, PlaceCardError> {
    if !path.exists() {
        return Err(PlaceCardError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(_) => Ok(path.to_path_buf()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(PlaceCardError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(PlaceCardError::InputNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// Read every guest row from the CSV file at `path`.
pub fn read_guests(path: &Path) -> Result<Vec<GuestRecord>, PlaceCardError> {
    let path = check_readable(path)?;
    let file = std::fs::File::open(&path).map_err(|_| PlaceCardError::InputNotFound {
        path: path.clone(),
    })?;
    let guests = parse_guests(file).map_err(|detail| PlaceCardError::Spreadsheet {
        path: path.clone(),
        detail,
    })?;
    info!("Read {} guests from {}", guests.len(), path.display());
    Ok(guests)
}

/// Parse guest rows from any CSV source.
pub fn parse_guests<R: std::io::Read>(source: R) -> Result<Vec<GuestRecord>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source);

    let headers = reader.headers().map_err(describe_csv_error)?.clone();
    let missing: Vec<&str> = ["Name", "Table", "Food"]
        .into_iter()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(format!(
            "missing column(s) {} (found: {})",
            missing.join(", "),
            headers.iter().collect::<Vec<_>>().join(", ")
        ));
    }

    let mut guests = Vec::new();
    for row in reader.deserialize::<GuestRecord>() {
        let guest = row.map_err(describe_csv_error)?;
        debug!("Guest {:?} at table {} ({})", guest.name, guest.table, guest.food);
        guests.push(guest);
    }
    Ok(guests)
}

fn describe_csv_error(e: csv::Error) -> String {
    match e.position() {
        Some(pos) => format!("line {}: {}", pos.line(), e),
        None => e.to_string(),
    }
}
