//! Report generation.
//!
//! Renders the per-agent summaries as CSV or JSON and formats the
//! best-performer highlight message.

use crate::models::{AgentDaySummary, Highlight, RunReport, UNKNOWN_KEY};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;

/// Column header of the CSV artifact.
pub const SUMMARY_COLUMNS: [&str; 10] = [
    "agent_id",
    "users_first_name",
    "users_last_name",
    "call_date",
    "total_calls",
    "unique_loans_contacted",
    "completed_calls",
    "avg_call_duration_min",
    "presence",
    "Connect_Rate",
];

/// Render summaries as CSV. Nulls are empty cells, rates use two decimals.
pub fn generate_csv_report(summaries: &[AgentDaySummary]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);

    writer.write_record(SUMMARY_COLUMNS)?;

    for s in summaries {
        writer.write_record([
            s.agent_id.clone(),
            s.first_name.clone().unwrap_or_default(),
            s.last_name.clone().unwrap_or_default(),
            format_date(s.call_date),
            s.total_calls.to_string(),
            s.unique_loans_contacted.to_string(),
            s.completed_calls.to_string(),
            format_decimal(s.avg_call_duration_min),
            s.presence.to_string(),
            format_decimal(s.connect_rate),
        ])?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV report")?;
    String::from_utf8(bytes).context("CSV report is not valid UTF-8")
}

/// Generate a JSON report.
pub fn generate_json_report(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write report content to `path`, replacing any existing file.
pub fn save_report(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

/// Short summary of the best performer, suitable for chat or a console.
pub fn generate_highlight_message(highlight: &Highlight) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Agent Summary for {}", highlight.report_date));
    lines.push(format!(
        "Top Performer: {} ({}% connect rate)",
        highlight.top_agent_name(),
        format_decimal_or_na(highlight.top_agent_connect_rate)
    ));
    lines.push(format!(
        "Total Active Agents: {}",
        highlight.total_active_agents
    ));
    lines.push(format!(
        "Average Duration: {} min",
        format_decimal_or_na(highlight.average_duration_minutes)
    ));

    lines.join("\n")
}

/// Notice emitted when no summary falls on the report date.
pub fn no_data_notice(date: NaiveDate) -> String {
    format!("No agent data available for {}", date)
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| UNKNOWN_KEY.to_string())
}

fn format_decimal(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

fn format_decimal_or_na(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NullKeyPolicy, ReportMetadata};
    use chrono::Utc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn create_test_summaries() -> Vec<AgentDaySummary> {
        vec![
            AgentDaySummary {
                agent_id: "A1".to_string(),
                org_id: Some("O1".to_string()),
                first_name: Some("Asha".to_string()),
                last_name: Some("Rao".to_string()),
                call_date: Some(date("2025-04-28")),
                total_calls: 1,
                unique_loans_contacted: 1,
                completed_calls: 1,
                avg_call_duration_min: Some(2.0),
                presence: 1,
                connect_rate: Some(100.0),
            },
            AgentDaySummary {
                agent_id: "A7".to_string(),
                org_id: None,
                first_name: None,
                last_name: None,
                call_date: None,
                total_calls: 3,
                unique_loans_contacted: 2,
                completed_calls: 2,
                avg_call_duration_min: None,
                presence: 0,
                connect_rate: Some(66.67),
            },
        ]
    }

    fn create_test_highlight() -> Highlight {
        Highlight {
            report_date: date("2025-04-28"),
            top_agent_id: "A1".to_string(),
            top_agent_first_name: Some("Asha".to_string()),
            top_agent_last_name: Some("Rao".to_string()),
            top_agent_connect_rate: Some(100.0),
            total_active_agents: 2,
            average_duration_minutes: Some(1.5),
        }
    }

    #[test]
    fn test_generate_csv_report() {
        let csv = generate_csv_report(&create_test_summaries()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "agent_id,users_first_name,users_last_name,call_date,total_calls,unique_loans_contacted,completed_calls,avg_call_duration_min,presence,Connect_Rate"
        );
        assert_eq!(lines[1], "A1,Asha,Rao,2025-04-28,1,1,1,2.00,1,100.00");
        assert_eq!(lines[2], "A7,,,unknown,3,2,2,,0,66.67");
    }

    #[test]
    fn test_generate_csv_report_empty() {
        let csv = generate_csv_report(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_highlight_message() {
        let msg = generate_highlight_message(&create_test_highlight());
        assert_eq!(
            msg,
            "Agent Summary for 2025-04-28\n\
             Top Performer: Asha Rao (100.00% connect rate)\n\
             Total Active Agents: 2\n\
             Average Duration: 1.50 min"
        );
    }

    #[test]
    fn test_highlight_message_without_durations() {
        let highlight = Highlight {
            average_duration_minutes: None,
            ..create_test_highlight()
        };
        assert!(generate_highlight_message(&highlight).contains("Average Duration: n/a min"));
    }

    #[test]
    fn test_no_data_notice() {
        assert_eq!(
            no_data_notice(date("2025-05-01")),
            "No agent data available for 2025-05-01"
        );
    }

    #[test]
    fn test_generate_json_report() {
        let report = RunReport {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                org_id: Some("O1".to_string()),
                roster_source: "agent_roster.csv".to_string(),
                call_log_source: "call_logs.csv".to_string(),
                disposition_source: "disposition_summary.csv".to_string(),
                call_rows: 4,
                summary_rows: 2,
                report_date: date("2025-04-28"),
                null_key_policy: NullKeyPolicy::Reject,
            },
            summaries: create_test_summaries(),
            highlight: Some(create_test_highlight()),
        };
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"null_key_policy\": \"reject\""));
        assert!(json.contains("\"Connect_Rate\": 66.67"));
        assert!(json.contains("\"top_agent_first_name\": \"Asha\""));
    }

    #[test]
    fn test_save_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_performance_summary.csv");
        save_report(&path, "agent_id\n").unwrap();
        save_report(&path, "agent_id\nA1\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "agent_id\nA1\n");
    }
}
