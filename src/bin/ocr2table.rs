use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ocr_table_worker::extract::{
    Cascade, ClusterParams, ExtractOptions, ExtractionReport, OcrOutput, OcrPayload, ValueScope,
    extract_table, extract_to_csv_string, tesseract,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "ocr2table",
    version,
    about = "Rebuild tables from OCR output of photographed lab sheets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract a table and write it as CSV or JSON.
    Extract(ExtractArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// Plain recognized text, one table row per line.
    Text,
    /// JSON `{ text, lines? }` with optional word boxes.
    Json,
    /// Tesseract TSV output.
    Tsv,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input path, or `-` for stdin.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = InputFormat::Text)]
    format: InputFormat,

    /// Strategy order, e.g. tab,spaces,spacing,pipe,comma,positional.
    #[arg(long)]
    cascade: Option<String>,

    /// Max vertical distance (px) between a word and its row anchor.
    #[arg(long, default_value_t = 15.0)]
    row_threshold: f32,

    /// Min horizontal distance (px) that opens a new column.
    #[arg(long, default_value_t = 30.0)]
    column_gap: f32,

    /// Words farther than this (px) from every column are dropped.
    #[arg(long, default_value_t = 50.0)]
    max_align_distance: f32,

    /// Words at or below this confidence are ignored.
    #[arg(long, default_value_t = 50.0)]
    min_confidence: f32,

    /// Which cells get value cleanup: all, numeric, off.
    #[arg(long, default_value = "numeric")]
    values: String,

    /// Header of the single-column table used when nothing else fits.
    #[arg(long, default_value = "Data")]
    fallback_header: String,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Write `{ headers, rows }` JSON instead of CSV.
    #[arg(long)]
    json: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let cascade = args
        .cascade
        .as_deref()
        .map(Cascade::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid cascade: {error}"))
        .context("failed to parse --cascade")?;

    let value_scope = ValueScope::from_str(&args.values)
        .map_err(|error| anyhow!("{error}"))
        .context("failed to parse --values")?;

    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    let cluster = ClusterParams {
        row_threshold: args.row_threshold,
        column_gap: args.column_gap,
        max_align_distance: args.max_align_distance,
        min_confidence: args.min_confidence,
    };
    cluster
        .validate()
        .map_err(|error| anyhow!("invalid clustering thresholds: {error}"))?;

    Ok(ExtractOptions {
        cascade,
        cluster,
        value_scope,
        fallback_header: args.fallback_header.clone(),
        delimiter: args.delimiter as u8,
    })
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))
}

fn load_ocr_output(raw: &str, format: InputFormat) -> Result<OcrOutput> {
    match format {
        InputFormat::Text => Ok(OcrOutput::text_only(raw)),
        InputFormat::Tsv => Ok(tesseract::parse_tsv(raw)),
        InputFormat::Json => {
            let payload = serde_json::from_str::<OcrPayload>(raw)
                .context("input is not a valid OCR JSON payload")?;
            Ok(OcrOutput::from(payload))
        }
    }
}

/// Renders the table as pretty JSON with `--json`, as CSV otherwise.
fn render(
    input: &OcrOutput,
    options: &ExtractOptions,
    json: bool,
) -> Result<(String, ExtractionReport)> {
    if json {
        let extraction = extract_table(input, options)?;
        let mut rendered = serde_json::to_string_pretty(&extraction.table)?;
        rendered.push('\n');
        return Ok((rendered, extraction.report));
    }
    Ok(extract_to_csv_string(input, options)?)
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!("  - {warning}");
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let options = parse_options(args)?;
    let raw = read_input(&args.input)?;
    let input = load_ocr_output(&raw, args.format)?;
    let (rendered, report) = render(&input, &options, args.json)
        .with_context(|| format!("failed to extract a table from '{}'", args.input.display()))?;

    match &args.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(report)
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ocr_table_worker=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                if report.strategy.is_some() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
