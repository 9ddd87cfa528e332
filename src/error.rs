use thiserror::Error;

/// Failures of the analytical core.
///
/// `SchemaMismatch` is fatal at load time. `EmptyAggregate` is returned to the
/// caller of a summary function. `UnmappedJoinKey` is never returned by the
/// geo join; it is only logged for each country that has no boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("input is missing expected column(s): {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("cannot summarize an empty aggregate")]
    EmptyAggregate,

    #[error("no boundary found for country {country:?}; omitted from map")]
    UnmappedJoinKey { country: String },

    #[error("row {row}: emissions value {value:?} is not a number")]
    InvalidNumber { row: usize, value: String },

    #[error("row {row}: unknown emission type {value:?}")]
    UnknownEmissionType { row: usize, value: String },

    #[error("unknown column {0:?} (expected country, region, type, segment or reason)")]
    UnknownColumn(String),

    #[error("invalid filter {0:?} (expected column=value or column=v1|v2)")]
    InvalidPredicate(String),
}
