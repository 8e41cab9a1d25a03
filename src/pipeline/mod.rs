//! Pipeline stages for place-card generation.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! guests ──▶ batch ──▶ fields ──▶ render ──▶ export ──▶ merge
//! (CSV)      (sheets)  (colors)   (Tera)     (Inkscape) (lopdf)
//!                                   ▲
//!                               template
//!                              (markers)
//! ```
//!
//! 1. [`guests`]   — read and validate the spreadsheet
//! 2. [`batch`]    — group guests per sheet, padding the last sheet
//! 3. [`fields`]   — names / tables / colors arrays per sheet
//! 4. [`template`] — turn marker colors into `{{ colors.i }}` slots
//! 5. [`render`]   — render one SVG per sheet
//! 6. [`export`]   — SVG → PDF through the external converter
//! 7. [`merge`]    — concatenate page PDFs in sheet order
//!
//! [`workdir`] owns the directory the intermediate files live in.

pub mod batch;
pub mod export;
pub mod fields;
pub mod guests;
pub mod merge;
pub mod render;
pub mod template;
pub mod workdir;
