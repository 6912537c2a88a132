//! Row-level flags used by the aggregator.

use crate::error::Result;
use crate::models::Relation;
use tracing::debug;

/// Status value that counts as a completed call. Compared exactly.
pub const COMPLETED_STATUS: &str = "completed";

pub const PRESENCE_FLAG: &str = "presence_flag";
pub const IS_COMPLETED_FLAG: &str = "is_completed_flag";

/// Cell values written to `presence_flag`.
pub const PRESENT: &str = "1";
pub const ABSENT: &str = "0";

/// Cell values written to `is_completed_flag`.
pub const COMPLETED: &str = "true";
pub const NOT_COMPLETED: &str = "false";

/// 1 when the row recorded a login, else 0.
pub fn presence_flag(login_time: Option<&str>) -> u8 {
    u8::from(login_time.is_some())
}

/// True only for the exact status `completed`.
pub fn is_completed(status: Option<&str>) -> bool {
    status == Some(COMPLETED_STATUS)
}

/// Read a `presence_flag` cell back.
pub fn is_present_cell(cell: Option<&str>) -> bool {
    cell == Some(PRESENT)
}

/// Read an `is_completed_flag` cell back.
pub fn is_completed_cell(cell: Option<&str>) -> bool {
    cell == Some(COMPLETED)
}

/// Append `presence_flag` and `is_completed_flag` to a copy of `enriched`.
pub fn derive(enriched: &Relation) -> Result<Relation> {
    let login_col = enriched.column_index("login_time")?;
    let status_col = enriched.column_index("status")?;

    let mut presence = Vec::with_capacity(enriched.len());
    let mut completed = Vec::with_capacity(enriched.len());

    for row in 0..enriched.len() {
        let present = presence_flag(enriched.value(row, login_col)) == 1;
        presence.push(Some(if present { PRESENT } else { ABSENT }.to_string()));
        let done = is_completed(enriched.value(row, status_col));
        completed.push(Some(if done { COMPLETED } else { NOT_COMPLETED }.to_string()));
    }

    let mut flagged = enriched.clone();
    flagged.append_column(PRESENCE_FLAG, presence)?;
    flagged.append_column(IS_COMPLETED_FLAG, completed)?;

    debug!("Derived flags for {} rows", flagged.len());
    Ok(flagged)
}
