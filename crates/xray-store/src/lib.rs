//! X-Ray Store: persistence boundary for execution snapshots
//!
//! [`TraceStore`] is what pipelines and the API talk to. [`MemoryStore`] is
//! the bundled implementation: an explicitly constructed handle that callers
//! create once and pass around, with a unique index on `executionId`.
//!
//! Errors are classified as [`StoreError`] and returned as-is; stores never
//! retry.

pub mod error;
pub mod memory;
pub mod store;
pub mod stored_id;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::TraceStore;
pub use stored_id::StoredId;

/// Default page size for listings
pub const DEFAULT_LIST_LIMIT: usize = 50;
