//! Execution: one run of a multi-step process and its ordered steps
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::ExecutionId;
use crate::step::Step;

/// Lifecycle state of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    InProgress,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::InProgress => "in_progress",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(ExecutionStatus::InProgress),
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            other => Err(format!("unknown execution status: {}", other)),
        }
    }
}

/// Aggregate derived when an execution completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_steps: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_outcome: Option<String>,
}

/// In-memory state of one execution.
///
/// `completed_at`, `duration_ms` and `summary` stay `None` while the status is
/// `InProgress`. `summary` is also `None` after a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub execution_id: ExecutionId,
    pub name: String,
    pub status: ExecutionStatus,
    pub steps: Vec<Step>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub summary: Option<Summary>,
}

impl Execution {
    pub(crate) fn new(name: String, execution_id: ExecutionId) -> Self {
        Self {
            execution_id,
            name,
            status: ExecutionStatus::InProgress,
            steps: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
            duration_ms: None,
            summary: None,
        }
    }

    pub fn last_step(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Steps whose label matches `name`, in execution order.
    pub fn steps_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Step> + 'a {
        self.steps.iter().filter(move |s| s.step == name)
    }

    pub(crate) fn close(&mut self, status: ExecutionStatus, completed_at: DateTime<Utc>) {
        self.status = status;
        self.completed_at = Some(completed_at);
        self.duration_ms =
            Some(completed_at.timestamp_millis() - self.created_at.timestamp_millis());
    }
}
