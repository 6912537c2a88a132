//! Data models for the agent performance pipeline.
//!
//! This module contains the in-memory relation type the pipeline stages
//! pass between each other, plus the typed aggregate rows and highlight
//! produced at the end of a run.

use crate::error::{PipelineError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used for group keys when null keys are bucketed.
pub const UNKNOWN_KEY: &str = "unknown";

/// Date formats accepted for `call_date` values.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Normalize a raw date cell to a calendar date.
///
/// Accepts `YYYY-MM-DD` optionally followed by a time of day, which is
/// discarded. Returns `None` for anything else.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

/// Round to two decimal places. Exact halves go to the even neighbour.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// How rows with a null or unparseable group key are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NullKeyPolicy {
    /// Fail the run with a data quality error (default)
    #[default]
    Reject,
    /// Route the row to the `unknown` agent or date group
    Bucket,
}

impl fmt::Display for NullKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NullKeyPolicy::Reject => write!(f, "reject"),
            NullKeyPolicy::Bucket => write!(f, "bucket"),
        }
    }
}

/// A named, column-oriented table of nullable text cells.
///
/// Cells stay as text until a stage needs a typed value; an empty cell is
/// stored as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Relation {
    /// Create an empty relation with the given header.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a relation from string literals. Empty strings become nulls.
    #[cfg(test)]
    pub fn from_rows(name: &str, columns: &[&str], rows: &[&[&str]]) -> Self {
        let mut relation = Self::new(name, columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            relation
                .push_row(row.iter().map(|v| cell(v)).collect())
                .expect("test row width matches header");
        }
        relation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Same rows and columns under another name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a row. The row must be exactly as wide as the header.
    pub fn push_row(&mut self, row: Vec<Option<String>>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::data_quality(
                &self.name,
                self.rows.len() + 1,
                format!(
                    "expected {} fields, found {}",
                    self.columns.len(),
                    row.len()
                ),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Position of a column, or a schema error naming this relation.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| PipelineError::missing_column(&self.name, column))
    }

    /// Resolve several columns at once, failing on the first missing one.
    pub fn require_columns(&self, columns: &[&str]) -> Result<Vec<usize>> {
        columns.iter().map(|c| self.column_index(c)).collect()
    }

    /// Cell at `row`, `col` as a string slice; `None` for nulls.
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
    }

    /// Add a column at the end. Existing columns keep their positions.
    pub fn append_column(&mut self, name: impl Into<String>, values: Vec<Option<String>>) -> Result<()> {
        let name = name.into();
        if values.len() != self.rows.len() {
            return Err(PipelineError::data_quality(
                &self.name,
                values.len().min(self.rows.len()) + 1,
                format!(
                    "column '{}' has {} values for {} rows",
                    name,
                    values.len(),
                    self.rows.len()
                ),
            ));
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        self.columns.push(name);
        Ok(())
    }
}

/// Turn a raw field into a cell. Empty fields are null.
pub fn cell(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Per-agent, per-day performance figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDaySummary {
    pub agent_id: String,
    /// Organization of the first row seen for this group.
    pub org_id: Option<String>,
    #[serde(rename = "users_first_name")]
    pub first_name: Option<String>,
    #[serde(rename = "users_last_name")]
    pub last_name: Option<String>,
    /// `None` is the unknown-date bucket.
    pub call_date: Option<NaiveDate>,
    pub total_calls: usize,
    pub unique_loans_contacted: usize,
    pub completed_calls: usize,
    pub avg_call_duration_min: Option<f64>,
    pub presence: u8,
    #[serde(rename = "Connect_Rate")]
    pub connect_rate: Option<f64>,
}

impl AgentDaySummary {
    /// Display name, falling back to the agent id when the roster has none.
    pub fn display_name(&self) -> String {
        display_name(
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            &self.agent_id,
        )
    }
}

fn display_name(first: Option<&str>, last: Option<&str>, fallback: &str) -> String {
    match (first, last) {
        (Some(f), Some(l)) => format!("{} {}", f, l),
        (Some(f), None) => f.to_string(),
        (None, Some(l)) => l.to_string(),
        (None, None) => fallback.to_string(),
    }
}

/// Best performer and day-level figures for one reporting date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub report_date: NaiveDate,
    pub top_agent_id: String,
    pub top_agent_first_name: Option<String>,
    pub top_agent_last_name: Option<String>,
    pub top_agent_connect_rate: Option<f64>,
    pub total_active_agents: usize,
    pub average_duration_minutes: Option<f64>,
}

impl Highlight {
    pub fn top_agent_name(&self) -> String {
        display_name(
            self.top_agent_first_name.as_deref(),
            self.top_agent_last_name.as_deref(),
            &self.top_agent_id,
        )
    }
}

/// Metadata about a report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Organization identifier passed through from the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    pub roster_source: String,
    pub call_log_source: String,
    pub disposition_source: String,
    /// Rows in the call log (and therefore in the enriched relation).
    pub call_rows: usize,
    /// Number of agent/day groups.
    pub summary_rows: usize,
    /// Date used for the highlight.
    pub report_date: NaiveDate,
    pub null_key_policy: NullKeyPolicy,
}

/// The complete JSON report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub metadata: ReportMetadata,
    pub summaries: Vec<AgentDaySummary>,
    /// Absent when no rows exist for the report date.
    pub highlight: Option<Highlight>,
}
