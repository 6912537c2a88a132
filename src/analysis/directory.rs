//! Agent display-name lookup.
//!
//! Names are resolved from the roster after aggregation instead of being
//! part of the group key, so inconsistent name data cannot split a group.

use crate::error::Result;
use crate::models::Relation;
use std::collections::HashMap;

pub const FIRST_NAME: &str = "users_first_name";
pub const LAST_NAME: &str = "users_last_name";

/// First and last name of an agent as recorded in the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentName {
    pub first: Option<String>,
    pub last: Option<String>,
}

/// `(agent_id, org_id) -> name` lookup built from the roster.
#[derive(Debug, Clone, Default)]
pub struct AgentDirectory {
    names: HashMap<(String, String), AgentName>,
}

impl AgentDirectory {
    /// Build the directory. The roster must carry both name columns.
    pub fn from_roster(roster: &Relation) -> Result<Self> {
        let cols = roster.require_columns(&["agent_id", "org_id", FIRST_NAME, LAST_NAME])?;
        let mut names = HashMap::with_capacity(roster.len());

        for row in 0..roster.len() {
            let (Some(agent_id), Some(org_id)) = (roster.value(row, cols[0]), roster.value(row, cols[1]))
            else {
                continue;
            };
            names
                .entry((agent_id.to_string(), org_id.to_string()))
                .or_insert_with(|| AgentName {
                    first: roster.value(row, cols[2]).map(String::from),
                    last: roster.value(row, cols[3]).map(String::from),
                });
        }

        Ok(Self { names })
    }

    pub fn lookup(&self, agent_id: &str, org_id: Option<&str>) -> Option<&AgentName> {
        let org_id = org_id?;
        self.names.get(&(agent_id.to_string(), org_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_agent_and_org() {
        let roster = Relation::from_rows(
            "agent_roster",
            &["agent_id", "org_id", FIRST_NAME, LAST_NAME, "region"],
            &[
                &["A1", "O1", "Asha", "Rao", "north"],
                &["A1", "O2", "Asha", "", "south"],
            ],
        );
        let dir = AgentDirectory::from_roster(&roster).unwrap();

        assert_eq!(dir.len(), 2);
        let name = dir.lookup("A1", Some("O1")).unwrap();
        assert_eq!(name.first.as_deref(), Some("Asha"));
        assert_eq!(name.last.as_deref(), Some("Rao"));
        assert_eq!(dir.lookup("A1", Some("O2")).unwrap().last, None);
        assert!(dir.lookup("A1", None).is_none());
        assert!(dir.lookup("A9", Some("O1")).is_none());
    }

    #[test]
    fn test_roster_without_names_is_schema_error() {
        let roster = Relation::from_rows("agent_roster", &["agent_id", "org_id"], &[]);
        assert!(AgentDirectory::from_roster(&roster).is_err());
    }
}
