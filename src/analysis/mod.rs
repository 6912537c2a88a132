//! Join, derive, aggregate and highlight stages.
//!
//! [`run`] drives the stages strictly in order and hands back every result
//! explicitly; nothing is kept between runs.

pub mod aggregator;
pub mod deriver;
pub mod directory;
pub mod highlight;
pub mod joiner;

pub use aggregator::aggregate;
pub use deriver::derive;
pub use directory::AgentDirectory;
pub use highlight::select_highlight;
pub use joiner::join;

use crate::error::Result;
use crate::loader::Inputs;
use crate::models::{AgentDaySummary, Highlight, NullKeyPolicy};
use chrono::NaiveDate;
use tracing::{debug, info};

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Date the highlight is computed for.
    pub report_date: NaiveDate,
    pub null_key_policy: NullKeyPolicy,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Rows in the enriched relation (always the call log row count).
    pub enriched_rows: usize,
    pub summaries: Vec<AgentDaySummary>,
    /// `None` when nothing was recorded on the report date.
    pub highlight: Option<Highlight>,
}

/// Run the full pipeline over loaded inputs.
pub fn run(inputs: &Inputs, options: &PipelineOptions) -> Result<PipelineOutput> {
    let enriched = join(&inputs.roster, &inputs.call_log, &inputs.disposition_summary)?;
    let flagged = derive(&enriched)?;

    let directory = AgentDirectory::from_roster(&inputs.roster)?;
    debug!("Agent directory holds {} names", directory.len());
    let summaries = aggregate(&flagged, &directory, options.null_key_policy)?;

    let highlight = select_highlight(&summaries, options.report_date);
    if let Some(ref h) = highlight {
        info!("Top performer on {}: {}", options.report_date, h.top_agent_name());
    }

    Ok(PipelineOutput {
        enriched_rows: enriched.len(),
        summaries,
        highlight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::loader::{read_relation, CALL_LOG, DISPOSITION_SUMMARY, ROSTER};
    use crate::report::generate_csv_report;

    const ROSTER_CSV: &str = "\
agent_id,org_id,users_first_name,users_last_name,team
A1,O1,Asha,Rao,collections
A2,O1,Ben,Okafor,collections
A3,O1,Cleo,Park,recoveries
";

    const LOGS_CSV: &str = "\
call_id,agent_id,org_id,call_date,installment_id,duration,status,login_time
c1,A1,O1,2025-04-28,L100,120,completed,2025-04-28 09:01:00
c2,A2,O1,2025-04-28,L200,60,completed,
c3,A2,O1,2025-04-28,L201,,missed,2025-04-28 09:30:00
c4,A3,O1,2025-04-28,L300,90,completed,
c5,A1,O1,2025-04-29,L101,30,missed,
";

    const SUMMARY_CSV: &str = "\
agent_id,org_id,call_date,disposition_count,ptp_count
A1,O1,2025-04-28,1,1
A2,O1,2025-04-28,2,0
";

    fn inputs() -> Inputs {
        Inputs {
            roster: read_relation(ROSTER, "roster", ROSTER_CSV.as_bytes()).unwrap(),
            call_log: read_relation(CALL_LOG, "logs", LOGS_CSV.as_bytes()).unwrap(),
            disposition_summary: read_relation(DISPOSITION_SUMMARY, "summary", SUMMARY_CSV.as_bytes())
                .unwrap(),
        }
    }

    fn options(day: &str) -> PipelineOptions {
        PipelineOptions {
            report_date: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
            null_key_policy: NullKeyPolicy::Reject,
        }
    }

    #[test]
    fn test_run_end_to_end() {
        let out = run(&inputs(), &options("2025-04-28")).unwrap();

        assert_eq!(out.enriched_rows, 5);
        assert_eq!(out.summaries.len(), 4);

        let a2 = &out.summaries[1];
        assert_eq!(a2.agent_id, "A2");
        assert_eq!(a2.total_calls, 2);
        assert_eq!(a2.completed_calls, 1);
        assert_eq!(a2.connect_rate, Some(50.0));
        assert_eq!(a2.avg_call_duration_min, Some(1.0));
        assert_eq!(a2.presence, 1);

        let h = out.highlight.unwrap();
        assert_eq!(h.top_agent_name(), "Asha Rao");
        assert_eq!(h.top_agent_connect_rate, Some(100.0));
        assert_eq!(h.total_active_agents, 3);
        assert_eq!(h.average_duration_minutes, Some(1.5));
    }

    #[test]
    fn test_run_without_data_for_date() {
        let out = run(&inputs(), &options("2025-05-01")).unwrap();
        assert!(out.highlight.is_none());
        assert_eq!(out.summaries.len(), 4);
    }

    #[test]
    fn test_run_is_idempotent() {
        let first = run(&inputs(), &options("2025-04-28")).unwrap();
        let second = run(&inputs(), &options("2025-04-28")).unwrap();

        let mut a = first.summaries.clone();
        let mut b = second.summaries.clone();
        a.sort_by(|x, y| (&x.agent_id, x.call_date).cmp(&(&y.agent_id, y.call_date)));
        b.sort_by(|x, y| (&x.agent_id, x.call_date).cmp(&(&y.agent_id, y.call_date)));

        assert_eq!(generate_csv_report(&a).unwrap(), generate_csv_report(&b).unwrap());
        assert_eq!(first.highlight, second.highlight);
    }

    #[test]
    fn test_run_on_fixture_files() {
        let fixtures = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let sources = crate::loader::InputSources {
            roster: fixtures.join("agent_roster.csv"),
            call_log: fixtures.join("call_logs.csv"),
            disposition_summary: fixtures.join("disposition_summary.csv"),
        };
        let inputs = crate::loader::load_inputs(&sources).unwrap();
        let out = run(&inputs, &options("2025-04-28")).unwrap();

        assert_eq!(out.enriched_rows, inputs.call_log.len());
        let csv = generate_csv_report(&out.summaries).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], "A1,Asha,Rao,2025-04-28,3,2,2,1.79,1,66.67");
        assert_eq!(lines[3], "A3,Cleo,Park,2025-04-28,2,2,1,2.12,0,50.00");
        assert_eq!(lines[4], "A4,Dev,Malik,2025-04-28,2,1,2,1.75,1,100.00");
        assert_eq!(lines[5], "A5,,,2025-04-28,1,1,0,1.25,0,0.00");

        let h = out.highlight.unwrap();
        assert_eq!(h.top_agent_name(), "Dev Malik");
        assert_eq!(h.total_active_agents, 5);
        assert_eq!(h.average_duration_minutes, Some(1.58));
    }

    #[test]
    fn test_missing_key_aborts_run() {
        let mut bad = inputs();
        bad.disposition_summary = read_relation(
            DISPOSITION_SUMMARY,
            "summary",
            "agent_id,call_date,ptp_count\nA1,2025-04-28,1\n".as_bytes(),
        )
        .unwrap();

        let err = run(&bad, &options("2025-04-28")).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema { ref relation, ref column }
                if relation == DISPOSITION_SUMMARY && column == "org_id"
        ));
    }
}
