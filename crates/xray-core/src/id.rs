//! Execution identifiers
//!
//! Generated ids combine the wall clock, a process-wide counter and a random
//! component. Uniqueness is best-effort; collisions are rejected by the store.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix carried by every generated execution id.
pub const EXECUTION_ID_PREFIX: &str = "exec_";

/// Identifier of one execution, caller-supplied or generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Generate a fresh id: `exec_<millis>_<counter>_<random>`, all hex.
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let timestamp = current_timestamp();
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
        let random = uuid::Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}{:x}_{:04x}_{}",
            EXECUTION_ID_PREFIX,
            timestamp,
            counter % 0xFFFF,
            &random[..12]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id has the shape produced by [`ExecutionId::generate`].
    pub fn is_generated(&self) -> bool {
        self.0.starts_with(EXECUTION_ID_PREFIX)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for ExecutionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ExecutionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_id_shape() {
        let id = ExecutionId::generate();
        assert!(id.is_generated());

        let parts: Vec<&str> = id
            .as_str()
            .trim_start_matches(EXECUTION_ID_PREFIX)
            .split('_')
            .collect();
        assert_eq!(parts.len(), 3);
        for part in parts {
            assert!(u64::from_str_radix(&part[..part.len().min(12)], 16).is_ok());
        }
    }

    #[test]
    fn test_rapid_ids_are_distinct() {
        let ids: HashSet<ExecutionId> = (0..1000).map(|_| ExecutionId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_caller_id_is_kept_verbatim() {
        let id = ExecutionId::from("run-42");
        assert_eq!(id.as_str(), "run-42");
        assert!(!id.is_generated());
        assert_eq!(id.to_string(), "run-42");
    }
}
