use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Datelike;
use clap::{Args, Parser, Subcommand};

use scholar_overlap_core::{DocumentBackend, compare_records};
use scholar_overlap_ingest::{default_backend, ingest_all, read_input, read_inputs, validate_input};
use scholar_overlap_reporting::{ExportFormat, export_rows};

mod output;
mod settings;

use output::ColorMode;
use settings::{EnvConfig, Overrides, Settings};

/// Scholar Overlap - Find publications shared between Google Scholar profile exports
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct PipelineArgs {
    /// Header text that identifies a profile export (default: "Google Scholar")
    #[arg(long)]
    marker: Option<String>,

    /// Accept documents whose header lacks the marker
    #[arg(long)]
    skip_detection: bool,

    /// Only compare titles from the last N years (default 4); implies year association
    #[arg(long, value_name = "N", num_args = 0..=1, require_equals = true)]
    recent: Option<Option<i32>>,

    /// Year the recency window counts back from (default: this year)
    #[arg(long, value_name = "YEAR")]
    current_year: Option<i32>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare publication lists across two or more profile PDFs (or archives of them)
    Compare {
        /// PDF files, or .zip / .tar.gz archives containing them
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Ignore all whitespace when matching titles
        #[arg(long)]
        fuzzy: bool,

        /// Export the comparison rows to this path
        #[arg(long)]
        export: Option<PathBuf>,

        /// Export format: csv, json, markdown, text (default: from extension, else csv)
        #[arg(long)]
        format: Option<String>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Dry run: show the detection verdict and extracted titles for one PDF
    Extract {
        /// Path to the PDF file
        file: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Compare {
            files,
            fuzzy,
            export,
            format,
            pipeline,
        } => compare(files, fuzzy, export, format, pipeline),
        Command::Extract { file, pipeline } => extract(file, pipeline),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_settings(pipeline: &PipelineArgs, fuzzy: bool) -> anyhow::Result<Settings> {
    let overrides = Overrides {
        marker: pipeline.marker.clone(),
        skip_detection: pipeline.skip_detection,
        fuzzy,
        recent: pipeline.recent,
        current_year: pipeline.current_year,
    };
    let config = scholar_overlap_core::config_file::load_config();
    let this_year = chrono::Local::now().year();
    Settings::resolve(&overrides, &EnvConfig::from_env(), &config, this_year)
}

fn open_writer(output: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    })
}

fn compare(
    files: Vec<PathBuf>,
    fuzzy: bool,
    export: Option<PathBuf>,
    format: Option<String>,
    pipeline: PipelineArgs,
) -> anyhow::Result<()> {
    let settings = resolve_settings(&pipeline, fuzzy)?;

    // Fail on a bad format before doing any work
    let export_format = match (&export, format) {
        (_, Some(name)) => Some(name.parse::<ExportFormat>().map_err(anyhow::Error::msg)?),
        (Some(path), None) => Some(ExportFormat::from_path(path).unwrap_or(ExportFormat::Csv)),
        (None, None) => None,
    };

    let use_color = !pipeline.no_color && pipeline.output.is_none();
    let color = ColorMode(use_color);
    let mut writer = open_writer(pipeline.output.as_deref())?;

    // Unreadable paths are reported alongside the other skipped items
    let (inputs, read_issues) = read_inputs(&files);

    let backend = default_backend();
    let mut report = ingest_all(inputs, &backend, &settings.ingest_options());
    report.issues = read_issues.into_iter().chain(report.issues).collect();

    output::print_issues(&mut *writer, &report.issues, &report.warnings, color)?;
    output::print_extraction_summary(&mut *writer, &report.documents, color)?;

    if !report.has_enough_records() {
        output::print_not_enough(&mut *writer, color)?;
        return Ok(());
    }

    let rows = compare_records(&report.records(), settings.normalization);
    output::print_comparison(&mut *writer, &rows, color)?;

    if let (Some(path), Some(format)) = (export, export_format) {
        export_rows(&rows, format, &path)?;
        writeln!(writer, "\nExported {} report to {}", format, path.display())?;
    }

    Ok(())
}

fn extract(file: PathBuf, pipeline: PipelineArgs) -> anyhow::Result<()> {
    let settings = resolve_settings(&pipeline, false)?;
    let options = settings.ingest_options();

    let use_color = !pipeline.no_color && pipeline.output.is_none();
    let mut writer = open_writer(pipeline.output.as_deref())?;

    let input = read_input(&file)?;
    validate_input(&input)?;

    let backend = default_backend();
    let document = backend.decode(&input.bytes)?;
    let detected = options.detector.matches(&document);
    let titles = options.extractor.extract(&document);

    output::print_dry_run(
        &mut *writer,
        &input.name,
        document.page_count(),
        options.detector.marker(),
        detected,
        &titles,
        options.recency.as_ref(),
        ColorMode(use_color),
    )?;
    Ok(())
}
