//! Snapshot: transport and storage shape of an execution
//!
//! Timestamps are epoch milliseconds and optional fields are omitted when
//! absent. Taking a snapshot copies the execution, so later appends on the
//! live trace never show up in a snapshot already taken.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TraceError;
use crate::execution::{Execution, ExecutionStatus, Summary};
use crate::step::{Decision, Payload, Step};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSnapshot {
    /// Identifier assigned by the store, never by the trace builder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_id: Option<String>,
    pub execution_id: String,
    pub name: String,
    pub status: ExecutionStatus,
    pub steps: Vec<StepSnapshot>,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub index: usize,
    pub step: String,
    pub timestamp: i64,
    #[serde(default)]
    pub input: Payload,
    #[serde(default)]
    pub output: Payload,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Payload>,
}

impl ExecutionSnapshot {
    /// Attach a store-assigned identifier
    pub fn with_stored_id(mut self, stored_id: impl Into<String>) -> Self {
        self.stored_id = Some(stored_id.into());
        self
    }

    pub fn to_json(&self) -> Result<String, TraceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, TraceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, TraceError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Execution {
    /// Deep copy of the current state in snapshot form
    pub fn snapshot(&self) -> ExecutionSnapshot {
        ExecutionSnapshot {
            stored_id: None,
            execution_id: self.execution_id.to_string(),
            name: self.name.clone(),
            status: self.status,
            steps: self.steps.iter().map(StepSnapshot::from).collect(),
            created_at: self.created_at.timestamp_millis(),
            completed_at: self.completed_at.map(|t| t.timestamp_millis()),
            duration: self.duration_ms,
            summary: self.summary.clone(),
        }
    }
}

impl From<&Step> for StepSnapshot {
    fn from(step: &Step) -> Self {
        Self {
            index: step.index,
            step: step.step.clone(),
            timestamp: step.timestamp.timestamp_millis(),
            input: step.input.clone(),
            output: step.output.clone(),
            reasoning: step.reasoning.clone(),
            decision: step.decision.clone(),
            metadata: step.metadata.clone(),
        }
    }
}

impl TryFrom<StepSnapshot> for Step {
    type Error = TraceError;

    fn try_from(snapshot: StepSnapshot) -> Result<Self, Self::Error> {
        Ok(Self {
            index: snapshot.index,
            step: snapshot.step,
            timestamp: from_millis("timestamp", snapshot.timestamp)?,
            input: snapshot.input,
            output: snapshot.output,
            reasoning: snapshot.reasoning,
            decision: snapshot.decision,
            metadata: snapshot.metadata,
        })
    }
}

/// Rebuild an execution from a stored snapshot. The stored id is dropped.
impl TryFrom<ExecutionSnapshot> for Execution {
    type Error = TraceError;

    fn try_from(snapshot: ExecutionSnapshot) -> Result<Self, Self::Error> {
        let steps = snapshot
            .steps
            .into_iter()
            .map(Step::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            execution_id: snapshot.execution_id.into(),
            name: snapshot.name,
            status: snapshot.status,
            steps,
            created_at: from_millis("createdAt", snapshot.created_at)?,
            completed_at: snapshot
                .completed_at
                .map(|ms| from_millis("completedAt", ms))
                .transpose()?,
            duration_ms: snapshot.duration,
            summary: snapshot.summary,
        })
    }
}

fn from_millis(field: &'static str, value: i64) -> Result<DateTime<Utc>, TraceError> {
    DateTime::<Utc>::from_timestamp_millis(value)
        .ok_or(TraceError::InvalidTimestamp { field, value })
}
