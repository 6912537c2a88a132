//! Per-agent, per-day aggregation.
//!
//! Groups the flagged relation by `(agent_id, call_date)` in first-seen
//! order and computes call volume, completion, duration and presence
//! figures for each group. Display names are attached afterwards from the
//! [`AgentDirectory`].

use super::deriver::{is_completed_cell, is_present_cell, IS_COMPLETED_FLAG, PRESENCE_FLAG};
use super::directory::AgentDirectory;
use crate::error::{PipelineError, Result};
use crate::models::{normalize_date, round2, AgentDaySummary, NullKeyPolicy, Relation, UNKNOWN_KEY};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// `None` parts are the null-key buckets. They are labelled `unknown` only
/// in the finished summary, so a real agent id `unknown` stays separate.
type GroupKey = (Option<String>, Option<NaiveDate>);

/// Running totals for one group.
#[derive(Debug)]
struct GroupAccumulator {
    agent_id: Option<String>,
    org_id: Option<String>,
    call_date: Option<NaiveDate>,
    total_calls: usize,
    loans: HashSet<String>,
    completed_calls: usize,
    duration_sum: f64,
    duration_count: usize,
    present: bool,
}

impl GroupAccumulator {
    fn new(agent_id: Option<String>, org_id: Option<String>, call_date: Option<NaiveDate>) -> Self {
        Self {
            agent_id,
            org_id,
            call_date,
            total_calls: 0,
            loans: HashSet::new(),
            completed_calls: 0,
            duration_sum: 0.0,
            duration_count: 0,
            present: false,
        }
    }

    fn label(&self) -> String {
        let date = self
            .call_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| UNKNOWN_KEY.to_string());
        let agent = self.agent_id.as_deref().unwrap_or(UNKNOWN_KEY);
        format!("agent {} on {}", agent, date)
    }

    /// Compute the final figures. Totals are complete before rates are taken.
    fn finish(self, directory: &AgentDirectory) -> Result<AgentDaySummary> {
        let avg_call_duration_min = if self.duration_count == 0 {
            None
        } else {
            let minutes = self.duration_sum / self.duration_count as f64 / 60.0;
            if !minutes.is_finite() {
                return Err(PipelineError::Computation {
                    group: self.label(),
                    message: format!("average duration is {}", minutes),
                });
            }
            Some(round2(minutes))
        };

        let connect_rate = if self.total_calls == 0 {
            None
        } else {
            Some(round2(
                self.completed_calls as f64 / self.total_calls as f64 * 100.0,
            ))
        };

        let name = self
            .agent_id
            .as_deref()
            .and_then(|id| directory.lookup(id, self.org_id.as_deref()))
            .cloned()
            .unwrap_or_default();

        Ok(AgentDaySummary {
            agent_id: self.agent_id.unwrap_or_else(|| UNKNOWN_KEY.to_string()),
            org_id: self.org_id,
            first_name: name.first,
            last_name: name.last,
            call_date: self.call_date,
            total_calls: self.total_calls,
            unique_loans_contacted: self.loans.len(),
            completed_calls: self.completed_calls,
            avg_call_duration_min,
            presence: u8::from(self.present),
            connect_rate,
        })
    }
}

/// Column positions the aggregator reads.
struct Columns {
    agent_id: usize,
    org_id: usize,
    call_date: usize,
    installment_id: usize,
    duration: usize,
    presence: usize,
    completed: usize,
}

impl Columns {
    fn resolve(relation: &Relation) -> Result<Self> {
        let cols = relation.require_columns(&[
            "agent_id",
            "org_id",
            "call_date",
            "installment_id",
            "duration",
            PRESENCE_FLAG,
            IS_COMPLETED_FLAG,
        ])?;
        Ok(Self {
            agent_id: cols[0],
            org_id: cols[1],
            call_date: cols[2],
            installment_id: cols[3],
            duration: cols[4],
            presence: cols[5],
            completed: cols[6],
        })
    }
}

/// Aggregate the flagged relation into one summary per agent and day.
pub fn aggregate(
    flagged: &Relation,
    directory: &AgentDirectory,
    policy: NullKeyPolicy,
) -> Result<Vec<AgentDaySummary>> {
    let cols = Columns::resolve(flagged)?;

    let mut groups: Vec<GroupAccumulator> = Vec::new();
    let mut positions: HashMap<GroupKey, usize> = HashMap::new();
    let mut bucketed = 0usize;

    for row in 0..flagged.len() {
        let (key, was_bucketed) = group_key(flagged, row, &cols, policy)?;
        if was_bucketed {
            bucketed += 1;
        }

        let pos = match positions.get(&key) {
            Some(&pos) => pos,
            None => {
                let org_id = flagged.value(row, cols.org_id).map(String::from);
                groups.push(GroupAccumulator::new(key.0.clone(), org_id, key.1));
                positions.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };
        let group = &mut groups[pos];

        group.total_calls += 1;
        if let Some(loan) = flagged.value(row, cols.installment_id) {
            group.loans.insert(loan.to_string());
        }
        if is_completed_cell(flagged.value(row, cols.completed)) {
            group.completed_calls += 1;
        }
        if is_present_cell(flagged.value(row, cols.presence)) {
            group.present = true;
        }
        if let Some(seconds) = parse_duration(flagged, row, cols.duration)? {
            group.duration_sum += seconds;
            group.duration_count += 1;
        }
    }

    if bucketed > 0 {
        warn!(
            "{} rows with a null or invalid agent_id/call_date were grouped under '{}'",
            bucketed, UNKNOWN_KEY
        );
    }

    let summaries = groups
        .into_iter()
        .map(|g| g.finish(directory))
        .collect::<Result<Vec<_>>>()?;

    debug!("Aggregated {} rows into {} groups", flagged.len(), summaries.len());
    info!("Agent performance summary created.");
    Ok(summaries)
}

/// Resolve the group key of a row under the given null key policy.
///
/// Returns the key and whether any part of it was bucketed.
fn group_key(
    relation: &Relation,
    row: usize,
    cols: &Columns,
    policy: NullKeyPolicy,
) -> Result<(GroupKey, bool)> {
    let reject = |message: String| PipelineError::data_quality(relation.name(), row + 1, message);
    let mut bucketed = false;

    let agent_id = match relation.value(row, cols.agent_id) {
        Some(id) => Some(id.to_string()),
        None if policy == NullKeyPolicy::Bucket => {
            bucketed = true;
            None
        }
        None => return Err(reject("agent_id is null".to_string())),
    };

    let call_date = match relation.value(row, cols.call_date) {
        Some(raw) => match normalize_date(raw) {
            Some(date) => Some(date),
            None if policy == NullKeyPolicy::Bucket => {
                bucketed = true;
                None
            }
            None => return Err(reject(format!("call_date '{}' is not a valid date", raw))),
        },
        None if policy == NullKeyPolicy::Bucket => {
            bucketed = true;
            None
        }
        None => return Err(reject("call_date is null".to_string())),
    };

    Ok(((agent_id, call_date), bucketed))
}

/// Duration in seconds. Null and NaN cells count as missing.
fn parse_duration(relation: &Relation, row: usize, col: usize) -> Result<Option<f64>> {
    let Some(raw) = relation.value(row, col) else {
        return Ok(None);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(PipelineError::data_quality(
            relation.name(),
            row + 1,
            format!("duration '{}' is not a number", raw),
        )),
    }
}
