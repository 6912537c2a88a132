//! AgentPerf - call-center agent performance reports
//!
//! A CLI tool that joins an agent roster, a call log and a per-day
//! disposition summary, writes one summary row per agent and day, and
//! prints the best performer for a chosen date.
//!
//! Exit codes:
//!   0 - Success (including "no data for the report date")
//!   1 - Error (bad arguments, unreadable input, schema or data problems)

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::{ReportMetadata, RunReport};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Where the active configuration came from.
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    BuiltIn,
    /// The default file exists but could not be parsed.
    Fallback(String),
}

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration decides where logs go, so it is loaded first
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    if let Err(e) = init_logging(&args, &config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    info!("AgentPerf v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match source {
        ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
        ConfigSource::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE),
        ConfigSource::BuiltIn => debug!("No config file found, using defaults"),
        ConfigSource::Fallback(reason) => warn!("Failed to load config: {}", reason),
    }

    match run_report(&config) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .agentperf.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set input files, report date, output format and more.");
    Ok(())
}

/// Initialize console logging, plus a plain-text log file when enabled.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = if config.logging.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let file_layer = match config.log_file() {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .with(LevelFilter::from_level(level))
        .try_init()
        .context("Failed to set tracing subscriber")
}

/// Load, run the pipeline, save the report and emit the highlight.
fn run_report(config: &Config) -> Result<()> {
    let start_time = Instant::now();

    let sources = config.input_sources()?;
    let inputs = loader::load_inputs(&sources).context("Error loading data")?;
    info!("Files loaded successfully.");

    let options = analysis::PipelineOptions {
        report_date: config.report.date,
        null_key_policy: config.pipeline.null_key_policy,
    };
    let output = analysis::run(&inputs, &options).context("Error generating summary")?;

    let content = match config.report.format {
        OutputFormat::Csv => report::generate_csv_report(&output.summaries)?,
        OutputFormat::Json => {
            let run_report = RunReport {
                metadata: ReportMetadata {
                    generated_at: Utc::now(),
                    org_id: config.report.org_id.clone(),
                    roster_source: sources.roster.display().to_string(),
                    call_log_source: sources.call_log.display().to_string(),
                    disposition_source: sources.disposition_summary.display().to_string(),
                    call_rows: output.enriched_rows,
                    summary_rows: output.summaries.len(),
                    report_date: config.report.date,
                    null_key_policy: config.pipeline.null_key_policy,
                },
                summaries: output.summaries.clone(),
                highlight: output.highlight.clone(),
            };
            report::generate_json_report(&run_report)?
        }
    };

    report::save_report(&config.report.output, &content)?;
    info!("Summary saved to {}", config.report.output.display());

    match output.highlight {
        Some(ref highlight) => {
            println!("\n{}\n", report::generate_highlight_message(highlight));
            info!("Slack-style summary generated.");
        }
        None => {
            let notice = report::no_data_notice(config.report.date);
            println!("{}", notice);
            warn!("{}", notice);
        }
    }

    debug!(
        "Processed {} calls into {} agent-day rows in {:.2}s",
        output.enriched_rows,
        output.summaries.len(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigSource::BuiltIn)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(format!("{:#}", e)))),
    }
}
