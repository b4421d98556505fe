//! Storage failures, surfaced to callers unchanged
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Unique index on `executionId` rejected the save
    #[error("DUPLICATE/execution {0} is already stored")]
    DuplicateExecution(String),

    /// A caller-carried `storedId` collides with an existing record
    #[error("CONFLICT/stored id {0} is already in use")]
    StoredIdConflict(String),

    #[error("NOT_FOUND/{0}")]
    NotFound(String),

    #[error("BAD_ID/{0}")]
    InvalidId(String),

    /// Backend unreachable or refusing work. [`crate::MemoryStore`] never
    /// returns it; external backends do.
    #[error("STORAGE/{0}")]
    Unavailable(String),
}
