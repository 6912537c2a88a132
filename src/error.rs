//! Error types for the performance pipeline.
//!
//! Every stage of the pipeline returns [`PipelineError`] so callers can tell
//! an unreadable input apart from a malformed relation or bad data.

use thiserror::Error;

/// Errors raised while loading, joining or aggregating relations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An input source could not be opened or parsed.
    #[error("Failed to load {relation} from {location}: {source}")]
    Load {
        relation: String,
        location: String,
        #[source]
        source: csv::Error,
    },

    /// A column the pipeline depends on is missing from a relation.
    #[error("Relation '{relation}' is missing required column '{column}'")]
    Schema { relation: String, column: String },

    /// A row carries a null or ill-formed value where the pipeline needs one.
    #[error("Data quality error in '{relation}' (row {row}): {message}")]
    DataQuality {
        relation: String,
        row: usize,
        message: String,
    },

    /// An aggregate produced a value outside the documented null cases.
    #[error("Computation error for {group}: {message}")]
    Computation { group: String, message: String },
}

impl PipelineError {
    /// Create a schema error for a missing column.
    pub fn missing_column(relation: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Schema {
            relation: relation.into(),
            column: column.into(),
        }
    }

    /// Create a data quality error pointing at a row of a relation.
    pub fn data_quality(
        relation: impl Into<String>,
        row: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::DataQuality {
            relation: relation.into(),
            row,
            message: message.into(),
        }
    }
}

/// Result alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;
