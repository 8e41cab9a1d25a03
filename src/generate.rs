//! Run entry points: spreadsheet + template → merged place-card PDF.
//!
//! ## Failure model
//!
//! All inputs are validated and every sheet is mapped to colors before the
//! first file is written, so a bad spreadsheet fails fast with nothing on
//! disk. After that, the first failing sheet aborts the run; the merged PDF
//! is only written once every page exists. The [`WorkDir`] guard removes the
//! intermediate files on every exit path unless `keep_output` is set.

use crate::config::PlaceCardConfig;
use crate::error::PlaceCardError;
use crate::output::RunSummary;
use crate::pipeline::export::{InkscapeConverter, PageConverter};
use crate::pipeline::fields::Sheet;
use crate::pipeline::render::SheetRenderer;
use crate::pipeline::workdir::WorkDir;
use crate::pipeline::{batch, fields, guests, merge, template};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Generate the place cards for every guest in `spreadsheet`.
///
/// # Arguments
/// * `spreadsheet` — CSV file with `Name`, `Table` and `Food` columns
/// * `config` — template, output and converter settings
///
/// # Errors
/// Any failure is fatal; see [`PlaceCardError`]. No merged PDF is written
/// unless every sheet converted successfully.
pub async fn make_place_cards(
    spreadsheet: impl AsRef<Path>,
    config: &PlaceCardConfig,
) -> Result<RunSummary, PlaceCardError> {
    let total_start = Instant::now();
    let spreadsheet = spreadsheet.as_ref();
    info!("Starting place cards for {}", spreadsheet.display());

    // ── Step 1: Read inputs ──────────────────────────────────────────────
    let guest_list = guests::read_guests(spreadsheet)?;
    if guest_list.is_empty() {
        return Err(PlaceCardError::NoGuests {
            path: spreadsheet.to_path_buf(),
        });
    }
    let template_path = guests::check_readable(&config.template_path)?;
    let template_source = read_template(&template_path).await?;
    let output_path = config.resolve_output_path(spreadsheet);

    // ── Step 2: Batch and map every sheet up front ───────────────────────
    let batches = batch::batch(&guest_list, config.cards_per_sheet);
    let sheets = fields::map_sheets(&batches, &config.color_map)?;
    let padded_cards = batch::padding_for(guest_list.len(), config.cards_per_sheet);
    info!(
        "{} guests → {} sheets ({} padding cards)",
        guest_list.len(),
        sheets.len(),
        padded_cards
    );

    // ── Step 3: Prepare the template ─────────────────────────────────────
    let preprocessed = template::preprocess_template(&template_source, &config.marker_colors);
    let renderer = Arc::new(SheetRenderer::new(&preprocessed, &template_path)?);
    let converter = resolve_converter(config);

    // ── Step 4: Render and convert ───────────────────────────────────────
    let work_dir = WorkDir::acquire(config.output_dir.as_deref(), config.keep_output)?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(sheets.len(), guest_list.len());
    }
    let page_pdfs = process_sheets(&renderer, &converter, &work_dir, sheets, config).await?;

    // ── Step 5: Merge ────────────────────────────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_merge_start(page_pdfs.len());
    }
    let merge_target = output_path.clone();
    let page_count = tokio::task::spawn_blocking(move || merge::merge_pdfs(&page_pdfs, &merge_target))
        .await
        .map_err(|e| PlaceCardError::Internal(format!("Merge task panicked: {e}")))??;

    let kept = work_dir.finish();
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(page_count);
    }

    let summary = RunSummary {
        guests: guest_list.len(),
        sheets: page_count,
        padded_cards,
        output_path,
        work_dir: kept,
        duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Place cards complete: {} pages → {} in {}ms",
        summary.sheets,
        summary.output_path.display(),
        summary.duration_ms
    );
    Ok(summary)
}

/// Synchronous wrapper around [`make_place_cards`].
///
/// Creates a temporary tokio runtime internally.
pub fn make_place_cards_sync(
    spreadsheet: impl AsRef<Path>,
    config: &PlaceCardConfig,
) -> Result<RunSummary, PlaceCardError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PlaceCardError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(make_place_cards(spreadsheet, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// The configured converter, or Inkscape at `inkscape_path`.
fn resolve_converter(config: &PlaceCardConfig) -> Arc<dyn PageConverter> {
    match config.converter {
        Some(ref converter) => Arc::clone(converter),
        None => Arc::new(InkscapeConverter::new(
            config.inkscape_path.clone(),
            config.inkscape_syntax,
        )),
    }
}

async fn read_template(path: &Path) -> Result<String, PlaceCardError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PlaceCardError::InputNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => PlaceCardError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => PlaceCardError::TemplateParse {
                path: path.to_path_buf(),
                detail: e.to_string(),
            },
        })
}

/// Render and convert every sheet, `config.concurrency` at a time.
///
/// Returns the page PDFs in sheet order. After the first failure no new
/// sheet is started, but sheets already in flight run to completion before
/// the error is returned, so no converter outlives the working directory.
async fn process_sheets(
    renderer: &Arc<SheetRenderer>,
    converter: &Arc<dyn PageConverter>,
    work_dir: &WorkDir,
    sheets: Vec<Sheet>,
    config: &PlaceCardConfig,
) -> Result<Vec<PathBuf>, PlaceCardError> {
    let total = sheets.len();
    let aborted = Arc::new(AtomicBool::new(false));
    let mut outcomes = pin!(stream::iter(sheets.into_iter().enumerate().map(|(idx, sheet)| {
        let sheet_num = idx + 1;
        let svg_path = work_dir.svg_path(sheet_num);
        let pdf_path = work_dir.pdf_path(sheet_num);
        let renderer = Arc::clone(renderer);
        let converter = Arc::clone(converter);
        let callback = config.progress_callback.clone();
        let aborted = Arc::clone(&aborted);
        async move {
            if aborted.load(Ordering::SeqCst) {
                debug!("Sheet {sheet_num} skipped after an earlier failure");
                return None;
            }
            if let Some(ref cb) = callback {
                cb.on_sheet_start(sheet_num, total);
            }
            let result = tokio::task::spawn_blocking(move || {
                process_sheet(&renderer, converter.as_ref(), &sheet, sheet_num, &svg_path, &pdf_path)
                    .map(|()| pdf_path)
            })
            .await
            .map_err(|e| PlaceCardError::Internal(format!("Sheet {sheet_num} task panicked: {e}")))
            .and_then(|r| r);
            if let Some(ref cb) = callback {
                match &result {
                    Ok(_) => cb.on_sheet_complete(sheet_num, total),
                    Err(e) => cb.on_sheet_error(sheet_num, total, &e.to_string()),
                }
            }
            if result.is_err() {
                aborted.store(true, Ordering::SeqCst);
            }
            Some(result)
        }
    }))
    .buffered(config.concurrency.max(1)));

    let mut pages = Vec::with_capacity(total);
    let mut first_error = None;
    while let Some(outcome) = outcomes.next().await {
        match outcome {
            Some(Ok(pdf)) => pages.push(pdf),
            Some(Err(e)) if first_error.is_none() => first_error = Some(e),
            Some(Err(e)) => debug!("Further sheet failure: {e}"),
            None => {}
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(pages),
    }
}

/// Render one sheet to `svg_path` and convert it to `pdf_path`.
fn process_sheet(
    renderer: &SheetRenderer,
    converter: &dyn PageConverter,
    sheet: &Sheet,
    sheet_num: usize,
    svg_path: &Path,
    pdf_path: &Path,
) -> Result<(), PlaceCardError> {
    let svg = renderer.render(sheet, sheet_num)?;
    std::fs::write(svg_path, svg).map_err(|source| PlaceCardError::OutputWriteFailed {
        path: svg_path.to_path_buf(),
        source,
    })?;

    converter
        .convert(svg_path, pdf_path)
        .map_err(|source| PlaceCardError::Conversion {
            sheet: sheet_num,
            source,
        })?;
    debug!("Sheet {} → {}", sheet_num, pdf_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;
    use crate::pipeline::merge::tests::{page_labels, write_label_pdf};
    use std::sync::Mutex;

    const TEMPLATE: &str = r##"<svg>
<rect style="fill:#ff0000"/><text>{{ names.0 }}|{{ tables.0 }}</text>
<rect style="fill:#00ff00"/><text>{{ names.1 }}|{{ tables.1 }}</text>
</svg>"##;

    /// Writes a PDF whose page label is the rendered SVG's text content.
    struct LabelConverter {
        seen: Mutex<Vec<String>>,
    }

    impl PageConverter for LabelConverter {
        fn convert(&self, source: &Path, output: &Path) -> Result<(), ConversionError> {
            let svg = std::fs::read_to_string(source).unwrap();
            self.seen.lock().unwrap().push(svg.clone());
            let label: String = svg
                .split("<text>")
                .skip(1)
                .filter_map(|t| t.split("</text>").next())
                .collect::<Vec<_>>()
                .join(",");
            write_label_pdf(output, &label, false);
            Ok(())
        }
    }

    struct FailingConverter;

    impl PageConverter for FailingConverter {
        fn convert(&self, _source: &Path, output: &Path) -> Result<(), ConversionError> {
            Err(ConversionError::MissingOutput {
                path: output.to_path_buf(),
            })
        }
    }

    fn setup(rows: &[&str]) -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("guests.csv");
        let mut text = String::from("Name,Table,Food\n");
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        std::fs::write(&csv, text).unwrap();
        let template = dir.path().join("template.svg");
        std::fs::write(&template, TEMPLATE).unwrap();
        (dir, csv, template)
    }

    fn two_up(template: &Path, converter: Arc<dyn PageConverter>) -> PlaceCardConfig {
        PlaceCardConfig::builder()
            .template_path(template)
            .cards_per_sheet(2)
            .marker_colors(["#ff0000", "#00ff00"])
            .converter(converter)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn three_guests_two_up_make_two_pages() {
        let (dir, csv, template) = setup(&["Ada,1,salmon", "Alan,2,Pork", "Grace,3,kids"]);
        let converter = Arc::new(LabelConverter {
            seen: Mutex::new(Vec::new()),
        });
        let config = two_up(&template, converter.clone());

        let summary = make_place_cards(&csv, &config).await.unwrap();

        assert_eq!(summary.guests, 3);
        assert_eq!(summary.sheets, 2);
        assert_eq!(summary.padded_cards, 1);
        assert_eq!(summary.output_path, dir.path().join("guests.pdf"));
        assert_eq!(summary.work_dir, None);

        let labels = page_labels(&summary.output_path);
        assert!(labels[0].contains("(Ada|1,Alan|2)"), "got: {}", labels[0]);
        assert!(labels[1].contains("(Grace|3,Grace|3)"), "got: {}", labels[1]);

        let seen = converter.seen.lock().unwrap();
        assert!(seen[0].contains("fill:#ffaaaa"), "got: {}", seen[0]);
        assert!(seen[0].contains("fill:#5f8dd3"), "got: {}", seen[0]);
    }

    #[tokio::test]
    async fn conversion_failure_aborts_without_output() {
        let (dir, csv, template) = setup(&["Ada,1,salmon"]);
        let work = dir.path().join("work");
        let mut config = two_up(&template, Arc::new(FailingConverter));
        config.output_dir = Some(work.clone());

        let err = make_place_cards(&csv, &config).await.unwrap_err();

        assert!(matches!(err, PlaceCardError::Conversion { sheet: 1, .. }), "got: {err}");
        assert!(!dir.path().join("guests.pdf").exists());
        assert!(!work.exists(), "working directory should be cleaned up");
    }

    #[tokio::test]
    async fn empty_spreadsheet_is_rejected() {
        let (_dir, csv, template) = setup(&[]);
        let config = two_up(&template, Arc::new(FailingConverter));
        let err = make_place_cards(&csv, &config).await.unwrap_err();
        assert!(matches!(err, PlaceCardError::NoGuests { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn missing_template_is_input_not_found() {
        let (dir, csv, _template) = setup(&["Ada,1,salmon"]);
        let config = two_up(&dir.path().join("nope.svg"), Arc::new(FailingConverter));
        let err = make_place_cards(&csv, &config).await.unwrap_err();
        assert!(matches!(err, PlaceCardError::InputNotFound { .. }), "got: {err}");
    }

    /// Fails sheet 1 at once; every other sheet takes a while and is recorded
    /// once its output is written.
    struct SlowAfterFirst {
        finished: Mutex<Vec<PathBuf>>,
    }

    impl PageConverter for SlowAfterFirst {
        fn convert(&self, source: &Path, output: &Path) -> Result<(), ConversionError> {
            if source.ends_with("place_cards-1.svg") {
                return Err(ConversionError::MissingOutput {
                    path: output.to_path_buf(),
                });
            }
            std::thread::sleep(std::time::Duration::from_millis(300));
            write_label_pdf(output, "late", false);
            self.finished.lock().unwrap().push(output.to_path_buf());
            Ok(())
        }
    }

    #[tokio::test]
    async fn in_flight_sheets_finish_before_failure_returns() {
        let (dir, csv, template) = setup(&["Ada,1,salmon", "Alan,2,pork", "Grace,3,kids", "Linus,4,veggie"]);
        let work = dir.path().join("work");
        let converter = Arc::new(SlowAfterFirst {
            finished: Mutex::new(Vec::new()),
        });
        let mut config = two_up(&template, converter.clone());
        config.output_dir = Some(work.clone());
        config.concurrency = 2;

        let err = make_place_cards(&csv, &config).await.unwrap_err();

        assert!(matches!(err, PlaceCardError::Conversion { sheet: 1, .. }), "got: {err}");
        let finished = converter.finished.lock().unwrap();
        assert_eq!(finished.len(), 1, "sheet 2 was in flight and must have completed");
        assert!(finished[0].ends_with("place_cards-2.pdf"));
        assert!(!work.exists(), "working directory should be cleaned up");
        assert!(!dir.path().join("guests.pdf").exists());
    }
}
