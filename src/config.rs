//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.agentperf.toml` files.

use crate::cli::OutputFormat;
use crate::loader::InputSources;
use crate::models::NullKeyPolicy;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".agentperf.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input file locations.
    #[serde(default)]
    pub inputs: InputsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input CSV locations. Usually given on the command line instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roster: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<PathBuf>,
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output file path.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Date the highlight is computed for.
    #[serde(default = "default_report_date")]
    pub date: NaiveDate,

    /// Organization identifier recorded in the report metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            date: default_report_date(),
            org_id: None,
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("agent_performance_summary.csv")
}

fn default_report_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 28).unwrap_or_default()
}

/// Pipeline behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// What to do with rows whose agent_id or call_date is null.
    #[serde(default)]
    pub null_key_policy: NullKeyPolicy,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log file path.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Write logs to `file` in addition to the console.
    #[serde(default = "default_true")]
    pub write_file: bool,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            write_file: true,
            verbose: false,
        }
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("agent_analysis.log")
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.agentperf.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref roster) = args.roster {
            self.inputs.roster = Some(roster.clone());
        }
        if let Some(ref logs) = args.logs {
            self.inputs.logs = Some(logs.clone());
        }
        if let Some(ref summary) = args.summary {
            self.inputs.summary = Some(summary.clone());
        }

        if let Some(ref output) = args.output {
            self.report.output = output.clone();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(date) = args.date {
            self.report.date = date;
        }
        if let Some(ref org_id) = args.org_id {
            self.report.org_id = Some(org_id.clone());
        }

        if let Some(policy) = args.null_keys {
            self.pipeline.null_key_policy = policy;
        }

        if let Some(ref log_file) = args.log_file {
            self.logging.file = log_file.clone();
            self.logging.write_file = true;
        }
        if args.no_log_file {
            self.logging.write_file = false;
        }

        // Flags always override
        if args.verbose {
            self.logging.verbose = true;
        }
        if args.quiet {
            self.logging.verbose = false;
        }
    }

    /// Resolve the three input locations, failing if any is unset.
    pub fn input_sources(&self) -> Result<InputSources> {
        let require = |path: &Option<PathBuf>, flag: &str| {
            path.clone().with_context(|| {
                format!("No {} file given (use {} or set it in {})", &flag[2..], flag, CONFIG_FILE)
            })
        };

        Ok(InputSources {
            roster: require(&self.inputs.roster, "--roster")?,
            call_log: require(&self.inputs.logs, "--logs")?,
            disposition_summary: require(&self.inputs.summary, "--summary")?,
        })
    }

    /// Log file to write to, if file logging is enabled.
    pub fn log_file(&self) -> Option<&Path> {
        self.logging.write_file.then_some(self.logging.file.as_path())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
