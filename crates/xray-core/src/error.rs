//! Unified Error Model
use thiserror::Error;

use crate::execution::ExecutionStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraceError {
    /// A mutation was attempted through a checked operation after the
    /// execution left `in_progress`.
    #[error("LIFECYCLE/{operation} rejected: execution {execution_id} is already {status}")]
    AlreadyClosed {
        execution_id: String,
        status: ExecutionStatus,
        operation: &'static str,
    },

    #[error("TIMESTAMP/{field} out of range: {value}")]
    InvalidTimestamp {
        field: &'static str,
        value: i64,
    },

    #[error("SERIALIZE/{0}")]
    SerializeError(String),
}

impl From<serde_json::Error> for TraceError {
    fn from(err: serde_json::Error) -> Self {
        TraceError::SerializeError(err.to_string())
    }
}
