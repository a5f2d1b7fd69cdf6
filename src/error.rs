//! Error types for the engine.
//!
//! The taxonomy follows the two response categories the caller must
//! distinguish: client faults (bad filter syntax, unknown identifiers)
//! rejected before any SQL is built, and server faults (database failures)
//! surfaced from execution. Nothing in between is swallowed.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// A client-fault rejection: the request itself is invalid.
///
/// Every variant names the specific token responsible so the caller can
/// echo it back verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A filter clause with fewer than two colon-separated parts.
    #[error("malformed filter clause '{clause}': expected column:operator[:value]")]
    MalformedClause { clause: String },

    /// Operator name not present in the catalog.
    #[error("unknown filter operator '{operator}'")]
    UnknownOperator { operator: String },

    /// Operator requires a bound value but the clause supplied none.
    #[error("operator '{operator}' requires a value in clause '{clause}'")]
    MissingValue { operator: String, clause: String },

    /// Identifier not found among the cube's column descriptors.
    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    /// Identifier names a reserved measure column.
    #[error("column '{column}' is a reserved measure column")]
    ReservedColumn { column: String },

    /// Aggregation request without a requested column.
    #[error("no column requested")]
    NoColumnRequested,

    /// Stratifier not found among the cube's column descriptors.
    #[error("unknown stratifier '{stratifier}'")]
    UnknownStratifier { stratifier: String },
}

/// A server-fault from query execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// The database reported a failure.
    #[error("database error: {message}")]
    Database { message: String },

    /// A result row did not have the shape the plan promised.
    #[error("malformed result row: {message}")]
    MalformedRow { message: String },
}

impl ExecutionError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn malformed_row(message: impl Into<String>) -> Self {
        Self::MalformedRow {
            message: message.into(),
        }
    }
}

/// Top-level engine error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// A query exceeded the configured deadline. The underlying execution is
    /// abandoned rather than left running.
    #[error("query timed out after {0} seconds")]
    Timeout(u64),

    /// Fingerprint input failed to serialize. Indicates a bug, not bad input.
    #[error("failed to serialize fingerprint input: {0}")]
    Fingerprint(#[from] serde_json::Error),

    /// Streaming export failed writing to the caller's sink.
    #[error("export write failed: {0}")]
    ExportIo(#[from] std::io::Error),
}

impl EngineError {
    /// Whether this error is the caller's fault (maps to a 4xx-class
    /// response) rather than a server-side failure.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
