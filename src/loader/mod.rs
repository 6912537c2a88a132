//! CSV loader for the three input relations.
//!
//! Reads delimited files into [`Relation`]s. Any problem opening or parsing
//! a source, including ragged rows, fails the load with the source name
//! attached.

use crate::error::{PipelineError, Result};
use crate::models::{cell, Relation};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Relation name of the agent roster.
pub const ROSTER: &str = "agent_roster";
/// Relation name of the call log.
pub const CALL_LOG: &str = "call_logs";
/// Relation name of the per-day disposition summary.
pub const DISPOSITION_SUMMARY: &str = "disposition_summary";

/// Locations of the three input files.
#[derive(Debug, Clone)]
pub struct InputSources {
    pub roster: PathBuf,
    pub call_log: PathBuf,
    pub disposition_summary: PathBuf,
}

/// The three loaded input relations.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub roster: Relation,
    pub call_log: Relation,
    pub disposition_summary: Relation,
}

/// Load all three inputs. Stops at the first source that fails.
pub fn load_inputs(sources: &InputSources) -> Result<Inputs> {
    let roster = load_relation(ROSTER, &sources.roster)?;
    let call_log = load_relation(CALL_LOG, &sources.call_log)?;
    let disposition_summary = load_relation(DISPOSITION_SUMMARY, &sources.disposition_summary)?;

    if call_log.is_empty() {
        warn!("{} has no rows; the report will be empty", CALL_LOG);
    }

    info!(
        "Loaded {} roster rows, {} call log rows, {} disposition rows",
        roster.len(),
        call_log.len(),
        disposition_summary.len()
    );

    Ok(Inputs {
        roster,
        call_log,
        disposition_summary,
    })
}

/// Load one CSV file as a named relation.
pub fn load_relation(name: &str, path: &Path) -> Result<Relation> {
    debug!("Reading {} from {}", name, path.display());
    let location = path.display().to_string();

    let file = std::fs::File::open(path).map_err(|e| PipelineError::Load {
        relation: name.to_string(),
        location: location.clone(),
        source: csv::Error::from(e),
    })?;

    read_relation(name, &location, file)
}

/// Parse CSV from any reader. `location` is only used in error messages.
pub fn read_relation<R: Read>(name: &str, location: &str, reader: R) -> Result<Relation> {
    let load_error = |source: csv::Error| PipelineError::Load {
        relation: name.to_string(),
        location: location.to_string(),
        source,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let columns: Vec<String> = csv_reader
        .headers()
        .map_err(load_error)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut relation = Relation::new(name, columns);

    for record in csv_reader.records() {
        let record = record.map_err(load_error)?;
        relation.push_row(record.iter().map(cell).collect())?;
    }

    debug!("{}: {} rows, columns {:?}", name, relation.len(), relation.columns());
    Ok(relation)
}
