//! Persistence trait for execution snapshots.
//!
//! The trace builder never calls into a store; pipelines hand their finished
//! snapshot to one. Implementations enforce uniqueness of `executionId` and
//! serve recency-ordered listings.
use async_trait::async_trait;
use xray_core::{ExecutionSnapshot, ExecutionStatus};

use crate::error::StoreError;
use crate::stored_id::StoredId;

#[async_trait]
pub trait TraceStore: Send + Sync {
    /// Persist a snapshot and return its stored id.
    ///
    /// A `storedId` already carried by the snapshot is kept; otherwise one is
    /// assigned. A second snapshot with the same `executionId` is rejected
    /// with [`StoreError::DuplicateExecution`].
    async fn save(&self, snapshot: ExecutionSnapshot) -> Result<StoredId, StoreError>;

    /// Most recently created snapshots first, at most `limit`.
    async fn list(&self, limit: usize) -> Result<Vec<ExecutionSnapshot>, StoreError>;

    /// Like [`TraceStore::list`], restricted to one status.
    async fn list_by_status(
        &self,
        status: ExecutionStatus,
        limit: usize,
    ) -> Result<Vec<ExecutionSnapshot>, StoreError>;

    /// Point lookup. Unparseable ids are [`StoreError::InvalidId`], missing
    /// records [`StoreError::NotFound`].
    async fn get(&self, stored_id: &str) -> Result<ExecutionSnapshot, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}
