//! # place-cards
//!
//! Generate printable place cards for an event from a guest spreadsheet and
//! an SVG template drawn in Inkscape.
//!
//! ## Pipeline Overview
//!
//! ```text
//! guests.csv ──┐
//!              ├─ 1. Read     Name / Table / Food rows
//!              ├─ 2. Batch    one group per template sheet, last one padded
//!              ├─ 3. Map      food choice → card color
//! template.svg ┤
//!              ├─ 4. Prepare  marker colors → {{ colors.i }} slots
//!              ├─ 5. Render   one SVG per sheet (Tera)
//!              ├─ 6. Convert  SVG → PDF (Inkscape subprocess)
//!              └─ 7. Merge    one multi-page PDF (lopdf)
//! ```
//!
//! ## Template conventions
//!
//! The template holds one card per position `i` (six by default). Each card's
//! background uses a distinct marker color (`#ff0000`, `#00ff00`, `#0000ff`,
//! `#800000`, `#008000`, `#000080`), replaced with the guest's food color at
//! render time. Text uses `{{ names.i }}` and `{{ tables.i }}`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use place_cards::{make_place_cards, PlaceCardConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PlaceCardConfig::builder()
//!         .template_path("template.svg")
//!         .build()?;
//!     let summary = make_place_cards("guests.csv", &config).await?;
//!     println!("{} pages → {}", summary.sheets, summary.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `place-cards` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ColorMap, PlaceCardConfig, PlaceCardConfigBuilder};
pub use error::{ConversionError, PlaceCardError};
pub use generate::{make_place_cards, make_place_cards_sync};
pub use output::RunSummary;
pub use pipeline::export::{ExportSyntax, InkscapeConverter, PageConverter};
pub use pipeline::fields::Sheet;
pub use pipeline::guests::GuestRecord;
pub use progress::{NoopProgressCallback, PlaceCardProgressCallback, ProgressCallback};
