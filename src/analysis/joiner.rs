//! Relation joins.
//!
//! Produces the enriched relation by left-joining the call log with the
//! disposition summary and then with the roster. Call rows are never
//! dropped or duplicated.

use crate::error::{PipelineError, Result};
use crate::models::Relation;
use std::collections::HashMap;
use tracing::{debug, info};

/// Keys joining the call log to the disposition summary.
pub const DISPOSITION_KEYS: [&str; 3] = ["agent_id", "org_id", "call_date"];

/// Keys joining to the roster.
pub const ROSTER_KEYS: [&str; 2] = ["agent_id", "org_id"];

/// Name of the fully joined relation.
pub const ENRICHED: &str = "enriched";

/// Join the three inputs into one denormalized relation.
///
/// All join keys are checked before any work is done, so a missing column
/// never produces a partial join.
pub fn join(roster: &Relation, call_log: &Relation, disposition: &Relation) -> Result<Relation> {
    call_log.require_columns(&DISPOSITION_KEYS)?;
    disposition.require_columns(&DISPOSITION_KEYS)?;
    roster.require_columns(&ROSTER_KEYS)?;

    let with_disposition = left_join(call_log, disposition, &DISPOSITION_KEYS)?;
    let enriched = left_join(&with_disposition, roster, &ROSTER_KEYS)?.renamed(ENRICHED);

    info!(
        "Data merged successfully ({} rows, {} columns).",
        enriched.len(),
        enriched.columns().len()
    );
    Ok(enriched)
}

/// Left-outer join `left` with `right` on equally named key columns.
///
/// The right side must be unique on `keys`. A left row with a null key
/// component never matches. Right columns whose names already exist on the
/// left are suffixed with `_<right name>`.
pub fn left_join(left: &Relation, right: &Relation, keys: &[&str]) -> Result<Relation> {
    let left_keys = left.require_columns(keys)?;
    let right_keys = right.require_columns(keys)?;

    let carried: Vec<usize> = (0..right.columns().len())
        .filter(|i| !right_keys.contains(i))
        .collect();

    let mut columns = left.columns().to_vec();
    for &i in &carried {
        let name = &right.columns()[i];
        if left.has_column(name) {
            columns.push(format!("{}_{}", name, right.name()));
        } else {
            columns.push(name.clone());
        }
    }

    let index = index_unique(right, &right_keys)?;
    let mut joined = Relation::new(format!("{}+{}", left.name(), right.name()), columns);
    let mut unmatched = 0usize;

    for (row_idx, row) in left.rows().iter().enumerate() {
        let mut out = row.clone();
        let matched = key_of(left, row_idx, &left_keys).and_then(|key| index.get(&key).copied());

        match matched {
            Some(r) => out.extend(carried.iter().map(|&i| right.rows()[r][i].clone())),
            None => {
                unmatched += 1;
                out.extend(std::iter::repeat(None).take(carried.len()));
            }
        }
        joined.push_row(out)?;
    }

    debug!(
        "Joined {} with {}: {} rows, {} without a match",
        left.name(),
        right.name(),
        joined.len(),
        unmatched
    );
    Ok(joined)
}

/// Composite key of a row, or `None` if any component is null.
fn key_of<'a>(relation: &'a Relation, row: usize, key_cols: &[usize]) -> Option<Vec<&'a str>> {
    key_cols.iter().map(|&c| relation.value(row, c)).collect()
}

/// Map each non-null key of `relation` to its row, rejecting duplicates.
fn index_unique<'a>(
    relation: &'a Relation,
    key_cols: &[usize],
) -> Result<HashMap<Vec<&'a str>, usize>> {
    let mut index = HashMap::with_capacity(relation.len());

    for row in 0..relation.len() {
        let Some(key) = key_of(relation, row, key_cols) else {
            continue;
        };
        if let Some(first) = index.insert(key.clone(), row) {
            return Err(PipelineError::data_quality(
                relation.name(),
                row + 1,
                format!(
                    "duplicate join key ({}) also on row {}",
                    key.join(", "),
                    first + 1
                ),
            ));
        }
    }

    Ok(index)
}
