//! Page rendering: preprocessed SVG template + [`Sheet`] → page SVG.
//!
//! The template is parsed once with Tera (Jinja2 syntax) and rendered per
//! sheet. Autoescaping is on for the `.svg` template name, so a guest called
//! `Tom & Jerry` still yields well-formed XML.

use crate::error::PlaceCardError;
use crate::pipeline::fields::Sheet;
use std::path::Path;
use tera::{Context, Tera};
use tracing::debug;

const TEMPLATE_NAME: &str = "place_cards.svg";

/// A parsed template, ready to render sheets.
pub struct SheetRenderer {
    tera: Tera,
}

impl SheetRenderer {
    /// Parse a preprocessed template. `origin` is only used in error messages.
    pub fn new(preprocessed: &str, origin: &Path) -> Result<Self, PlaceCardError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".svg"]);
        tera.add_raw_template(TEMPLATE_NAME, preprocessed)
            .map_err(|e| PlaceCardError::TemplateParse {
                path: origin.to_path_buf(),
                detail: error_chain(&e),
            })?;
        Ok(Self { tera })
    }

    /// Render the page SVG for `sheet` (1-indexed `sheet_num`, for errors).
    pub fn render(&self, sheet: &Sheet, sheet_num: usize) -> Result<String, PlaceCardError> {
        let context = Context::from_serialize(sheet).map_err(|e| {
            PlaceCardError::TemplateRender {
                sheet: sheet_num,
                detail: error_chain(&e),
            }
        })?;
        let svg = self
            .tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|e| PlaceCardError::TemplateRender {
                sheet: sheet_num,
                detail: error_chain(&e),
            })?;
        debug!("Rendered sheet {} → {} bytes", sheet_num, svg.len());
        Ok(svg)
    }
}

/// Tera puts the useful part ("Variable `names.7` not found") in the source chain.
fn error_chain(e: &tera::Error) -> String {
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Sheet {
        Sheet {
            names: vec!["Ada".into(), "Tom & Jerry".into()],
            tables: vec!["3".into(), "Head".into()],
            colors: vec!["#ffaaaa".into(), "#5fd38d".into()],
        }
    }

    const TEMPLATE: &str = r#"<svg><g style="fill:{{ colors.0 }}"><text>{{ names.0 }} / {{ tables.0 }}</text></g><g style="fill:{{ colors.1 }}"><text>{{ names.1 }} / {{ tables.1 }}</text></g></svg>"#;

    #[test]
    fn substitutes_all_fields_by_position() {
        let renderer = SheetRenderer::new(TEMPLATE, Path::new("t.svg")).unwrap();
        let svg = renderer.render(&sheet(), 1).unwrap();
        assert!(svg.contains(r#"fill:#ffaaaa"><text>Ada / 3<"#), "got: {svg}");
        assert!(svg.contains("fill:#5fd38d"), "got: {svg}");
        assert!(svg.contains("Head"), "got: {svg}");
    }

    #[test]
    fn names_are_xml_escaped() {
        let renderer = SheetRenderer::new(TEMPLATE, Path::new("t.svg")).unwrap();
        let svg = renderer.render(&sheet(), 1).unwrap();
        assert!(svg.contains("Tom &amp; Jerry"), "got: {svg}");
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = SheetRenderer::new(TEMPLATE, Path::new("t.svg")).unwrap();
        assert_eq!(
            renderer.render(&sheet(), 1).unwrap(),
            renderer.render(&sheet(), 1).unwrap()
        );
    }

    #[test]
    fn broken_template_is_a_parse_error() {
        let err = SheetRenderer::new("<svg>{{ names.0 </svg>", Path::new("bad.svg"))
            .err()
            .expect("parse should fail");
        assert!(matches!(err, PlaceCardError::TemplateParse { .. }));
    }

    #[test]
    fn slot_beyond_sheet_is_a_render_error() {
        let renderer = SheetRenderer::new("{{ names.5 }}", Path::new("t.svg")).unwrap();
        let err = renderer.render(&sheet(), 4).unwrap_err();
        match err {
            PlaceCardError::TemplateRender { sheet, .. } => assert_eq!(sheet, 4),
            other => panic!("unexpected error: {other}"),
        }
    }
}
