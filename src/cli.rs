//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::NullKeyPolicy;
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// AgentPerf - daily call-center agent performance summaries
///
/// Joins the agent roster, call log and disposition summary, writes one
/// row per agent and day, and prints the best performer for a date.
///
/// Examples:
///   agentperf --roster agent_roster.csv --logs call_logs.csv --summary disposition_summary.csv
///   agentperf --roster r.csv --logs l.csv --summary s.csv --date 2025-04-28 --format json -o report.json
///   agentperf --config .agentperf.toml
///   agentperf --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Agent roster CSV (agent_id, org_id, users_first_name, users_last_name, ...)
    #[arg(long, value_name = "FILE")]
    pub roster: Option<PathBuf>,

    /// Call log CSV (call_id, agent_id, org_id, call_date, installment_id, duration, status, login_time)
    #[arg(long, value_name = "FILE")]
    pub logs: Option<PathBuf>,

    /// Disposition summary CSV (agent_id, org_id, call_date, ...)
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Output file path for the summary report
    ///
    /// Default: agent_performance_summary.csv, or the value in the config file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (csv, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Date to compute the best-performer highlight for
    #[arg(short, long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// How to treat rows with a null agent_id or call_date (reject, bucket)
    #[arg(long, value_name = "POLICY")]
    pub null_keys: Option<NullKeyPolicy>,

    /// Organization identifier recorded in the report metadata
    #[arg(long, value_name = "ID", env = "AGENTPERF_ORG_ID")]
    pub org_id: Option<String>,

    /// Also write logs to this file
    ///
    /// Default: agent_analysis.log
    #[arg(long, value_name = "FILE", conflicts_with = "no_log_file")]
    pub log_file: Option<PathBuf>,

    /// Do not write a log file
    #[arg(long)]
    pub no_log_file: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .agentperf.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .agentperf.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// CSV table (default)
    #[default]
    Csv,
    /// JSON document with run metadata and the highlight
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Input files given on the command line must exist
        for (flag, path) in [
            ("--roster", &self.roster),
            ("--logs", &self.logs),
            ("--summary", &self.summary),
        ] {
            if let Some(path) = path {
                if !path.is_file() {
                    return Err(format!("{} file does not exist: {}", flag, path.display()));
                }
            }
        }

        if let Some(ref output) = self.output {
            if output.is_dir() {
                return Err(format!("Output path is a directory: {}", output.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            roster: None,
            logs: None,
            summary: None,
            output: None,
            format: None,
            date: None,
            null_keys: None,
            org_id: None,
            log_file: None,
            no_log_file: false,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "agentperf",
            "--roster",
            "r.csv",
            "--logs",
            "l.csv",
            "--summary",
            "s.csv",
            "--date",
            "2025-04-28",
            "--format",
            "json",
            "--null-keys",
            "bucket",
        ])
        .unwrap();

        assert_eq!(args.roster, Some(PathBuf::from("r.csv")));
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2025, 4, 28));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.null_keys, Some(NullKeyPolicy::Bucket));
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let result = Args::try_parse_from(["agentperf", "--date", "28/04/2025"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_missing_input_file() {
        let mut args = make_args();
        args.roster = Some(PathBuf::from("/definitely/not/here.csv"));
        let err = args.validate().unwrap_err();
        assert!(err.contains("--roster"));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
