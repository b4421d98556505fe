//! In-memory [`TraceStore`]
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use xray_core::{ExecutionSnapshot, ExecutionStatus};

use crate::error::StoreError;
use crate::store::TraceStore;
use crate::stored_id::StoredId;

/// Store handle. Clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<StoredId, Record>,
    /// Unique index on `executionId`
    by_execution_id: HashMap<String, StoredId>,
    next_seq: u64,
}

struct Record {
    seq: u64,
    snapshot: ExecutionSnapshot,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn list_where<F>(&self, limit: usize, filter: F) -> Vec<ExecutionSnapshot>
    where
        F: Fn(&ExecutionSnapshot) -> bool,
    {
        let inner = self.inner.read().await;
        let mut records: Vec<&Record> = inner
            .records
            .values()
            .filter(|r| filter(&r.snapshot))
            .collect();
        records.sort_by(|a, b| {
            b.snapshot
                .created_at
                .cmp(&a.snapshot.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        records
            .into_iter()
            .take(limit)
            .map(|r| r.snapshot.clone())
            .collect()
    }
}

#[async_trait]
impl TraceStore for MemoryStore {
    async fn save(&self, snapshot: ExecutionSnapshot) -> Result<StoredId, StoreError> {
        let stored_id = match snapshot.stored_id.as_deref() {
            Some(existing) => existing.parse::<StoredId>()?,
            None => StoredId::new(),
        };

        let mut inner = self.inner.write().await;
        if inner.by_execution_id.contains_key(&snapshot.execution_id) {
            warn!(execution_id = %snapshot.execution_id, "duplicate execution rejected");
            return Err(StoreError::DuplicateExecution(snapshot.execution_id));
        }
        if inner.records.contains_key(&stored_id) {
            warn!(%stored_id, "stored id already in use");
            return Err(StoreError::StoredIdConflict(stored_id.to_string()));
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner
            .by_execution_id
            .insert(snapshot.execution_id.clone(), stored_id);
        let snapshot = snapshot.with_stored_id(stored_id.to_string());
        info!(
            %stored_id,
            execution_id = %snapshot.execution_id,
            status = %snapshot.status,
            steps = snapshot.steps.len(),
            "execution saved"
        );
        inner.records.insert(stored_id, Record { seq, snapshot });
        Ok(stored_id)
    }

    async fn list(&self, limit: usize) -> Result<Vec<ExecutionSnapshot>, StoreError> {
        Ok(self.list_where(limit, |_| true).await)
    }

    async fn list_by_status(
        &self,
        status: ExecutionStatus,
        limit: usize,
    ) -> Result<Vec<ExecutionSnapshot>, StoreError> {
        Ok(self.list_where(limit, |s| s.status == status).await)
    }

    async fn get(&self, stored_id: &str) -> Result<ExecutionSnapshot, StoreError> {
        let id = stored_id.parse::<StoredId>()?;
        let inner = self.inner.read().await;
        match inner.records.get(&id) {
            Some(record) => Ok(record.snapshot.clone()),
            None => {
                debug!(%id, "execution not found");
                Err(StoreError::NotFound(format!("execution {}", id)))
            }
        }
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.records.len())
    }
}
