//! CLI binary for place-cards.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PlaceCardConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use place_cards::{
    make_place_cards, ColorMap, ExportSyntax, PlaceCardConfig, PlaceCardProgressCallback,
    ProgressCallback, RunSummary,
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a progress bar over sheets plus one log line
/// per finished sheet.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-sheet wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_run_start` tells us how many sheets there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading guest list…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} sheets  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
    }

    /// Clear a bar that is still spinning so it does not linger above the
    /// error report.
    fn dismiss(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    fn elapsed_secs(&self, sheet: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&sheet))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl PlaceCardProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_sheets: usize, total_guests: usize) {
        self.activate_bar(total_sheets);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{total_guests} guests → {total_sheets} sheets"))
        ));
    }

    fn on_sheet_start(&self, sheet: usize, _total: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(sheet, Instant::now());
        }
        self.bar.set_message(format!("sheet {sheet}"));
    }

    fn on_sheet_complete(&self, sheet: usize, total: usize) {
        let elapsed = self.elapsed_secs(sheet);
        self.bar.println(format!(
            "  {} Sheet {:>3}/{:<3}  {}",
            green("✓"),
            sheet,
            total,
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_sheet_error(&self, sheet: usize, total: usize, error: &str) {
        let elapsed = self.elapsed_secs(sheet);
        self.bar.println(format!(
            "  {} Sheet {:>3}/{:<3}  {}  {}",
            red("✗"),
            sheet,
            total,
            red(error.lines().next().unwrap_or(error)),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.abandon();
    }

    fn on_merge_start(&self, total_pages: usize) {
        self.bar.set_prefix("Merging");
        self.bar.set_message(format!("{total_pages} pages"));
    }

    fn on_run_complete(&self, total_pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages merged",
            green("✔"),
            bold(&total_pages.to_string())
        );
    }
}

const AFTER_HELP: &str = r##"EXAMPLES:
  # Basic run: guests.csv + ./template.svg → guests.pdf
  place-cards guests.csv

  # Custom template and output
  place-cards guests.csv -t wedding.svg -o cards.pdf

  # Keep the intermediate SVG/PDF files for inspection
  place-cards guests.csv --keep --output_dir build/

  # Inkscape 0.92 or a non-standard install
  place-cards guests.csv --inkscape /opt/inkscape/bin/inkscape --inkscape-syntax legacy

  # Extra menu choices
  place-cards guests.csv --colors menu.json

SPREADSHEET:
  A CSV file with a header row containing Name, Table and Food.
  Other columns are ignored. Food is matched case-insensitively.

COLOR MAP (--colors):
  A JSON object mapping food choices to hex colors, merged over the defaults:
    {"vegan": "#88cc88", "salmon": "#ff9999"}
  Defaults: salmon #ffaaaa, pork #5f8dd3, kids #ddafe9, veggie #5fd38d

TEMPLATE:
  One card per position i = 0..5. Card i's colored area uses the marker color
  #ff0000, #00ff00, #0000ff, #800000, #008000, #000080 (in that order), and its
  text uses {{ names.i }} and {{ tables.i }}.

ENVIRONMENT VARIABLES:
  PLACE_CARDS_TEMPLATE    Default for --template
  PLACE_CARDS_INKSCAPE    Default for --inkscape
  PLACE_CARDS_COLORS      Default for --colors
  RUST_LOG                Override log filtering (e.g. place_cards=debug)
"##;

/// Generate printable place cards from a guest spreadsheet.
#[derive(Parser, Debug)]
#[command(
    name = "place-cards",
    version,
    about = "Process a template SVG file to make place cards for everyone",
    long_about = "Reads guest names, table numbers and food choices from a CSV spreadsheet, \
fills them into an Inkscape SVG template six cards at a time, converts every sheet to PDF \
with Inkscape and merges the sheets into a single printable PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// A .csv file of names, food choices, and table numbers for all guests.
    spreadsheet_path: PathBuf,

    /// The template filename.
    #[arg(short, long = "template", env = "PLACE_CARDS_TEMPLATE", default_value = "template.svg")]
    template_path: PathBuf,

    /// The merged output file; defaults to the spreadsheet name with .pdf.
    #[arg(short, long = "output", env = "PLACE_CARDS_OUTPUT")]
    output_path: Option<PathBuf>,

    /// Keep the files in the output directory.
    #[arg(long = "keep")]
    keep_output: bool,

    /// The directory to place generated SVGs and PDFs; defaults to a tmp directory.
    #[arg(long = "output_dir", visible_alias = "output-dir", env = "PLACE_CARDS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Path to the Inkscape executable.
    #[arg(long = "inkscape", env = "PLACE_CARDS_INKSCAPE", default_value = "inkscape")]
    inkscape_path: PathBuf,

    /// Inkscape command-line dialect: modern (1.x) or legacy (0.92).
    #[arg(long, env = "PLACE_CARDS_INKSCAPE_SYNTAX", value_enum, default_value = "modern")]
    inkscape_syntax: SyntaxArg,

    /// JSON file of extra/overriding food colors.
    #[arg(long, env = "PLACE_CARDS_COLORS")]
    colors: Option<PathBuf>,

    /// Cards per template sheet.
    #[arg(long, env = "PLACE_CARDS_PER_SHEET", default_value_t = 6,
          value_parser = clap::value_parser!(u16).range(1..))]
    cards_per_sheet: u16,

    /// Comma-separated marker colors, one per card position.
    #[arg(long, env = "PLACE_CARDS_MARKERS", value_delimiter = ',')]
    markers: Vec<String>,

    /// Number of sheets converted in parallel.
    #[arg(short = 'j', long, env = "PLACE_CARDS_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PLACE_CARDS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PLACE_CARDS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PLACE_CARDS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum SyntaxArg {
    Modern,
    Legacy,
}

impl From<SyntaxArg> for ExportSyntax {
    fn from(v: SyntaxArg) -> Self {
        match v {
            SyntaxArg::Modern => ExportSyntax::Modern,
            SyntaxArg::Legacy => ExportSyntax::Legacy,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config and run ─────────────────────────────────────────────
    let cli_progress = show_progress.then(CliProgressCallback::new_dynamic);
    let progress_cb = cli_progress.clone().map(|cb| cb as ProgressCallback);

    let outcome = run(&cli, progress_cb).await;
    if let (Err(_), Some(cb)) = (&outcome, &cli_progress) {
        cb.dismiss();
    }
    let summary = outcome?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

async fn run(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RunSummary> {
    let config = build_config(cli, progress)?;
    make_place_cards(&cli.spreadsheet_path, &config)
        .await
        .context("Making place cards failed")
}

fn print_summary(summary: &RunSummary) {
    eprintln!(
        "{}  {} guests  {} sheets  {}ms  →  {}",
        green("✔"),
        summary.guests,
        summary.sheets,
        summary.duration_ms,
        bold(&summary.output_path.display().to_string()),
    );
    if summary.padded_cards > 0 {
        eprintln!(
            "   {}",
            dim(&format!(
                "{} spare card(s) on the last sheet repeat the last guest",
                summary.padded_cards
            ))
        );
    }
    if let Some(ref dir) = summary.work_dir {
        eprintln!("   intermediate files kept in {}", dir.display());
    }
}

/// Map CLI args to `PlaceCardConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PlaceCardConfig> {
    let mut color_map = ColorMap::default();
    if let Some(ref path) = cli.colors {
        let extra = ColorMap::from_json_file(path)
            .with_context(|| format!("Failed to load colors from {:?}", path))?;
        color_map.extend(extra);
    }

    let cards_per_sheet = usize::from(cli.cards_per_sheet);
    let mut builder = PlaceCardConfig::builder()
        .template_path(&cli.template_path)
        .keep_output(cli.keep_output)
        .inkscape_path(&cli.inkscape_path)
        .inkscape_syntax(cli.inkscape_syntax.clone().into())
        .cards_per_sheet(cards_per_sheet)
        .color_map(color_map)
        .concurrency(cli.concurrency);

    if !cli.markers.is_empty() {
        builder = builder.marker_colors(cli.markers.iter().map(|m| m.trim().to_string()));
    }
    if let Some(ref path) = cli.output_path {
        builder = builder.output_path(path);
    }
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
