//! Best-performer highlight for a single reporting date.

use crate::models::{round2, AgentDaySummary, Highlight};
use chrono::NaiveDate;
use tracing::debug;

/// Pick the top agent for `target` and compute the day's figures.
///
/// Returns `None` when no summary falls on `target`. Rows in the unknown
/// date bucket never match. Ties on connect rate go to the first row.
pub fn select_highlight(summaries: &[AgentDaySummary], target: NaiveDate) -> Option<Highlight> {
    let day: Vec<&AgentDaySummary> = summaries
        .iter()
        .filter(|s| s.call_date == Some(target))
        .collect();

    debug!("{} summary rows on {}", day.len(), target);

    let mut top = *day.first()?;
    for &candidate in &day[1..] {
        if rate_of(candidate) > rate_of(top) {
            top = candidate;
        }
    }
    debug!("Top row: {} ({:?}%)", top.display_name(), top.connect_rate);

    let durations: Vec<f64> = day.iter().filter_map(|s| s.avg_call_duration_min).collect();
    let average_duration_minutes = if durations.is_empty() {
        None
    } else {
        Some(round2(durations.iter().sum::<f64>() / durations.len() as f64))
    };

    Some(Highlight {
        report_date: target,
        top_agent_id: top.agent_id.clone(),
        top_agent_first_name: top.first_name.clone(),
        top_agent_last_name: top.last_name.clone(),
        top_agent_connect_rate: top.connect_rate,
        total_active_agents: day.len(),
        average_duration_minutes,
    })
}

/// Null rates rank below every real rate.
fn rate_of(summary: &AgentDaySummary) -> f64 {
    summary.connect_rate.unwrap_or(f64::NEG_INFINITY)
}
