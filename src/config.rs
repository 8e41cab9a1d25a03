//! Configuration types for place-card generation.
//!
//! Everything a run needs besides the spreadsheet path lives in
//! [`PlaceCardConfig`], built via its [`PlaceCardConfigBuilder`]. The food
//! color table ([`ColorMap`]) and the template marker colors are part of the
//! configuration rather than constants, so a new menu or a new template
//! layout does not require a rebuild.

use crate::error::PlaceCardError;
use crate::pipeline::export::{ExportSyntax, PageConverter};
use crate::progress::ProgressCallback;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Number of place cards laid out on one template sheet.
pub const DEFAULT_CARDS_PER_SHEET: usize = 6;

/// Marker literals in the stock template, one per card position.
pub const DEFAULT_MARKER_COLORS: [&str; 6] = [
    "#ff0000", "#00ff00", "#0000ff", "#800000", "#008000", "#000080",
];

static RE_HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap());

/// Whether `s` is a CSS/SVG hex color literal (`#rgb`, `#rrggbb`, `#rrggbbaa`).
pub fn is_hex_color(s: &str) -> bool {
    RE_HEX_COLOR.is_match(s)
}

/// Configuration for one place-card run.
///
/// # Example
/// ```rust
/// use place_cards::{ColorMap, PlaceCardConfig};
///
/// let config = PlaceCardConfig::builder()
///     .template_path("wedding.svg")
///     .keep_output(true)
///     .color_map(ColorMap::default().with("vegan", "#88cc88"))
///     .build()
///     .unwrap();
/// assert_eq!(config.cards_per_sheet, 6);
/// ```
#[derive(Clone)]
pub struct PlaceCardConfig {
    /// SVG template. Default: `template.svg`.
    pub template_path: PathBuf,

    /// Merged output PDF. If None, the spreadsheet path with a `.pdf` extension.
    pub output_path: Option<PathBuf>,

    /// Directory for intermediate SVG/PDF files. If None, a fresh temp directory.
    pub output_dir: Option<PathBuf>,

    /// Keep the intermediate files after the run. Default: false.
    pub keep_output: bool,

    /// Converter executable. Default: `inkscape` (looked up on `PATH`).
    pub inkscape_path: PathBuf,

    /// Command-line dialect of the converter. Default: [`ExportSyntax::Modern`].
    pub inkscape_syntax: ExportSyntax,

    /// Pre-constructed converter. Takes precedence over `inkscape_path`.
    pub converter: Option<Arc<dyn PageConverter>>,

    /// Cards per template sheet. Default: 6.
    ///
    /// Must match the number of card positions in the template, i.e. the
    /// number of marker colors.
    pub cards_per_sheet: usize,

    /// Template marker colors, in card-position order.
    pub marker_colors: Vec<String>,

    /// Food choice → card color.
    pub color_map: ColorMap,

    /// Sheets rendered and converted at the same time. Default: 1.
    ///
    /// Each conversion is a separate Inkscape process, so raising this mostly
    /// helps on multi-core machines with long guest lists. Merge order is
    /// unaffected.
    pub concurrency: usize,

    /// Optional per-sheet progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PlaceCardConfig {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from("template.svg"),
            output_path: None,
            output_dir: None,
            keep_output: false,
            inkscape_path: PathBuf::from("inkscape"),
            inkscape_syntax: ExportSyntax::default(),
            converter: None,
            cards_per_sheet: DEFAULT_CARDS_PER_SHEET,
            marker_colors: DEFAULT_MARKER_COLORS.iter().map(|c| c.to_string()).collect(),
            color_map: ColorMap::default(),
            concurrency: 1,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PlaceCardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceCardConfig")
            .field("template_path", &self.template_path)
            .field("output_path", &self.output_path)
            .field("output_dir", &self.output_dir)
            .field("keep_output", &self.keep_output)
            .field("inkscape_path", &self.inkscape_path)
            .field("inkscape_syntax", &self.inkscape_syntax)
            .field("converter", &self.converter.as_ref().map(|_| "<dyn PageConverter>"))
            .field("cards_per_sheet", &self.cards_per_sheet)
            .field("marker_colors", &self.marker_colors)
            .field("color_map", &self.color_map)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl PlaceCardConfig {
    /// Create a new builder for `PlaceCardConfig`.
    pub fn builder() -> PlaceCardConfigBuilder {
        PlaceCardConfigBuilder {
            config: Self::default(),
        }
    }

    /// The merged-PDF path for `spreadsheet`: the configured one, or the
    /// spreadsheet path with its extension replaced by `.pdf`.
    pub fn resolve_output_path(&self, spreadsheet: &Path) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| default_output_path(spreadsheet))
    }
}

/// `guests.csv` → `guests.pdf`, `guests` → `guests.pdf`.
pub fn default_output_path(spreadsheet: &Path) -> PathBuf {
    spreadsheet.with_extension("pdf")
}

/// Builder for [`PlaceCardConfig`].
#[derive(Debug)]
pub struct PlaceCardConfigBuilder {
    config: PlaceCardConfig,
}

impl PlaceCardConfigBuilder {
    pub fn template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.template_path = path.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = Some(path.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn keep_output(mut self, keep: bool) -> Self {
        self.config.keep_output = keep;
        self
    }

    pub fn inkscape_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.inkscape_path = path.into();
        self
    }

    pub fn inkscape_syntax(mut self, syntax: ExportSyntax) -> Self {
        self.config.inkscape_syntax = syntax;
        self
    }

    pub fn converter(mut self, converter: Arc<dyn PageConverter>) -> Self {
        self.config.converter = Some(converter);
        self
    }

    pub fn cards_per_sheet(mut self, n: usize) -> Self {
        self.config.cards_per_sheet = n.max(1);
        self
    }

    pub fn marker_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.marker_colors = colors.into_iter().map(Into::into).collect();
        self
    }

    pub fn color_map(mut self, map: ColorMap) -> Self {
        self.config.color_map = map;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PlaceCardConfig, PlaceCardError> {
        let c = &self.config;
        if c.cards_per_sheet == 0 {
            return Err(PlaceCardError::InvalidConfig(
                "Cards per sheet must be ≥ 1".into(),
            ));
        }
        if c.marker_colors.is_empty() {
            return Err(PlaceCardError::InvalidConfig(
                "At least one marker color is required".into(),
            ));
        }
        for (i, marker) in c.marker_colors.iter().enumerate() {
            if !is_hex_color(marker) {
                return Err(PlaceCardError::InvalidConfig(format!(
                    "Marker color '{marker}' is not a hex color"
                )));
            }
            let duplicate = c.marker_colors[..i]
                .iter()
                .any(|m| m.eq_ignore_ascii_case(marker));
            if duplicate {
                return Err(PlaceCardError::InvalidConfig(format!(
                    "Marker color '{marker}' is listed twice"
                )));
            }
        }
        if c.marker_colors.len() != c.cards_per_sheet {
            return Err(PlaceCardError::InvalidConfig(format!(
                "{} marker colors given for {} cards per sheet",
                c.marker_colors.len(),
                c.cards_per_sheet
            )));
        }
        if c.color_map.is_empty() {
            return Err(PlaceCardError::InvalidConfig(
                "The food color map is empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Color map ────────────────────────────────────────────────────────────

/// Food choice → card color.
///
/// Keys are stored lower-cased and trimmed, so lookups are case-insensitive.
/// A `BTreeMap` keeps `known_choices()` stable for error messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct ColorMap {
    colors: BTreeMap<String, String>,
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::empty()
            .with("salmon", "#ffaaaa")
            .with("pork", "#5f8dd3")
            .with("kids", "#ddafe9")
            .with("veggie", "#5fd38d")
    }
}

impl From<BTreeMap<String, String>> for ColorMap {
    fn from(raw: BTreeMap<String, String>) -> Self {
        raw.into_iter()
            .fold(Self::empty(), |map, (food, color)| map.with(food, color))
    }
}

impl From<ColorMap> for BTreeMap<String, String> {
    fn from(map: ColorMap) -> Self {
        map.colors
    }
}

impl ColorMap {
    /// A map with no entries.
    pub fn empty() -> Self {
        Self {
            colors: BTreeMap::new(),
        }
    }

    /// Add or replace one food choice.
    pub fn with(mut self, food: impl AsRef<str>, color: impl Into<String>) -> Self {
        self.insert(food, color);
        self
    }

    pub fn insert(&mut self, food: impl AsRef<str>, color: impl Into<String>) {
        self.colors.insert(normalise_food(food.as_ref()), color.into());
    }

    /// Color for `food`, ignoring case and surrounding whitespace.
    pub fn get(&self, food: &str) -> Option<&str> {
        self.colors.get(&normalise_food(food)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Comma-separated list of the known food choices.
    pub fn known_choices(&self) -> String {
        self.colors.keys().cloned().collect::<Vec<_>>().join(", ")
    }

    /// Merge `other` on top of `self`; entries in `other` win.
    pub fn extend(&mut self, other: ColorMap) {
        self.colors.extend(other.colors);
    }

    /// Load a JSON object `{"food": "#color", …}`, validating every color.
    pub fn from_json_file(path: &Path) -> Result<Self, PlaceCardError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PlaceCardError::InputNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => PlaceCardError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => PlaceCardError::InvalidConfig(format!("{}: {e}", path.display())),
        })?;
        Self::from_json_str(&text)
            .map_err(|e| PlaceCardError::InvalidConfig(format!("{}: {e}", path.display())))
    }

    fn from_json_str(text: &str) -> Result<Self, String> {
        let map: ColorMap = serde_json::from_str(text).map_err(|e| e.to_string())?;
        if let Some((food, color)) = map.colors.iter().find(|(_, c)| !is_hex_color(c)) {
            return Err(format!("color '{color}' for '{food}' is not a hex color"));
        }
        Ok(map)
    }
}

fn normalise_food(food: &str) -> String {
    food.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_is_case_insensitive() {
        let map = ColorMap::default();
        assert_eq!(map.get("salmon"), Some("#ffaaaa"));
        assert_eq!(map.get("Salmon"), Some("#ffaaaa"));
        assert_eq!(map.get("  VEGGIE "), Some("#5fd38d"));
        assert_eq!(map.get("tofu"), None);
    }

    #[test]
    fn known_choices_are_sorted() {
        assert_eq!(ColorMap::default().known_choices(), "kids, pork, salmon, veggie");
    }

    #[test]
    fn json_keys_are_normalised() {
        let map = ColorMap::from_json_str(r##"{"Vegan": "#88cc88", "FISH": "#abc"}"##).unwrap();
        assert_eq!(map.get("vegan"), Some("#88cc88"));
        assert_eq!(map.get("fish"), Some("#abc"));
    }

    #[test]
    fn json_rejects_non_hex_colors() {
        let err = ColorMap::from_json_str(r#"{"vegan": "green"}"#).unwrap_err();
        assert!(err.contains("green"), "got: {err}");
    }

    #[test]
    fn extend_overrides_entries() {
        let mut map = ColorMap::default();
        map.extend(ColorMap::empty().with("salmon", "#000000").with("vegan", "#111111"));
        assert_eq!(map.get("salmon"), Some("#000000"));
        assert_eq!(map.get("vegan"), Some("#111111"));
        assert_eq!(map.len(), 5);
    }

    #[test]
    fn hex_color_shapes() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#FF0000"));
        assert!(is_hex_color("#ff000080"));
        assert!(!is_hex_color("ff0000"));
        assert!(!is_hex_color("#ff00"));
        assert!(!is_hex_color("red"));
    }

    #[test]
    fn default_output_path_swaps_extension() {
        assert_eq!(
            default_output_path(Path::new("party/guests.csv")),
            PathBuf::from("party/guests.pdf")
        );
        assert_eq!(default_output_path(Path::new("guests")), PathBuf::from("guests.pdf"));
    }

    #[test]
    fn builder_defaults_match_stock_template() {
        let config = PlaceCardConfig::builder().build().unwrap();
        assert_eq!(config.cards_per_sheet, 6);
        assert_eq!(config.marker_colors.len(), 6);
        assert_eq!(config.template_path, PathBuf::from("template.svg"));
        assert_eq!(config.inkscape_path, PathBuf::from("inkscape"));
        assert!(!config.keep_output);
    }

    #[test]
    fn builder_rejects_marker_count_mismatch() {
        let err = PlaceCardConfig::builder().cards_per_sheet(4).build().unwrap_err();
        assert!(matches!(err, PlaceCardError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_duplicate_markers() {
        let err = PlaceCardConfig::builder()
            .cards_per_sheet(2)
            .marker_colors(["#ff0000", "#FF0000"])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("twice"), "got: {err}");
    }

    #[test]
    fn builder_accepts_custom_layout() {
        let config = PlaceCardConfig::builder()
            .cards_per_sheet(2)
            .marker_colors(["#ff0000", "#00ff00"])
            .build()
            .unwrap();
        assert_eq!(config.cards_per_sheet, 2);
    }

    #[test]
    fn builder_rejects_empty_color_map() {
        let err = PlaceCardConfig::builder()
            .color_map(ColorMap::empty())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("empty"), "got: {err}");
    }
}
