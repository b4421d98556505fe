//! Trace Builder: records steps of one execution and closes it
//!
//! The builder owns a single [`Execution`] and is driven synchronously by the
//! pipeline it traces. It performs no I/O; persisting the snapshot is the
//! caller's job.
//!
//! The plain operations (`add_step`, `mark_complete`, `mark_failed`) accept
//! calls in any state and overwrite terminal fields on a repeated close. The
//! `try_*` operations reject any mutation once the execution is terminal.
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::TraceError;
use crate::execution::{Execution, ExecutionStatus, Summary};
use crate::id::ExecutionId;
use crate::snapshot::ExecutionSnapshot;
use crate::step::{
    evaluations_metadata, Decision, DecisionOutcome, Evaluation, Payload, Step, EVALUATION_REASON,
};

pub struct TraceBuilder {
    execution: Execution,
    started: Instant,
}

impl TraceBuilder {
    /// Start a trace with a generated execution id
    pub fn new(name: impl Into<String>) -> Self {
        Self::start(name.into(), ExecutionId::generate())
    }

    /// Start a trace under a caller-supplied execution id
    pub fn with_id(name: impl Into<String>, execution_id: impl Into<ExecutionId>) -> Self {
        Self::start(name.into(), execution_id.into())
    }

    fn start(name: String, execution_id: ExecutionId) -> Self {
        let execution = Execution::new(name, execution_id);
        debug!(execution_id = %execution.execution_id, name = %execution.name, "trace started");
        Self {
            execution,
            started: Instant::now(),
        }
    }

    /// Append a step. Its index is the current step count plus one.
    pub fn add_step(
        &mut self,
        step: impl Into<String>,
        input: Payload,
        output: Payload,
        reasoning: impl Into<String>,
        decision: Option<Decision>,
        metadata: Option<Payload>,
    ) {
        if self.is_closed() {
            warn!(
                execution_id = %self.execution.execution_id,
                status = %self.execution.status,
                "step appended to a closed execution"
            );
        }

        let index = self.execution.steps.len() + 1;
        let step = Step {
            index,
            step: step.into(),
            timestamp: self.now(),
            input,
            output,
            reasoning: reasoning.into(),
            decision,
            metadata,
        };
        debug!(
            execution_id = %self.execution.execution_id,
            index,
            step = %step.step,
            "step recorded"
        );
        self.execution.steps.push(step);
    }

    /// Append a step that judged a set of items.
    ///
    /// Shorthand for [`TraceBuilder::add_step`] with an `evaluate` decision
    /// and the evaluations stored under `metadata.evaluations`.
    pub fn add_evaluation_step(
        &mut self,
        step: impl Into<String>,
        input: Payload,
        evaluations: &[Evaluation],
        output: Payload,
        reasoning: impl Into<String>,
        confidence: Option<f64>,
    ) {
        let decision = Decision {
            outcome: DecisionOutcome::Evaluate,
            reason: EVALUATION_REASON.to_string(),
            confidence,
        };
        self.add_step(
            step,
            input,
            output,
            reasoning,
            Some(decision),
            Some(evaluations_metadata(evaluations)),
        );
    }

    /// Close the execution as completed and derive its summary
    pub fn mark_complete(&mut self, final_outcome: Option<String>) {
        let completed_at = self.now();
        self.execution.close(ExecutionStatus::Completed, completed_at);
        self.execution.summary = Some(Summary {
            total_steps: self.execution.steps.len(),
            final_outcome,
        });
        info!(
            execution_id = %self.execution.execution_id,
            steps = self.execution.steps.len(),
            duration_ms = self.execution.duration_ms.unwrap_or_default(),
            "execution completed"
        );
    }

    /// Close the execution as failed.
    ///
    /// With an error message and at least one step, the last step's reasoning
    /// gets ` [ERROR: <error>]` appended. No summary is derived.
    pub fn mark_failed(&mut self, error: Option<&str>) {
        let completed_at = self.now();
        self.execution.close(ExecutionStatus::Failed, completed_at);
        if let Some(error) = error {
            match self.execution.steps.last_mut() {
                Some(last) => last.annotate_error(error),
                None => debug!(execution_id = %self.execution.execution_id, "no step to annotate"),
            }
        }
        info!(
            execution_id = %self.execution.execution_id,
            steps = self.execution.steps.len(),
            error = error.unwrap_or(""),
            "execution failed"
        );
    }

    /// [`TraceBuilder::add_step`] that refuses a terminal execution
    pub fn try_add_step(
        &mut self,
        step: impl Into<String>,
        input: Payload,
        output: Payload,
        reasoning: impl Into<String>,
        decision: Option<Decision>,
        metadata: Option<Payload>,
    ) -> Result<(), TraceError> {
        self.ensure_open("add_step")?;
        self.add_step(step, input, output, reasoning, decision, metadata);
        Ok(())
    }

    /// [`TraceBuilder::add_evaluation_step`] that refuses a terminal execution
    pub fn try_add_evaluation_step(
        &mut self,
        step: impl Into<String>,
        input: Payload,
        evaluations: &[Evaluation],
        output: Payload,
        reasoning: impl Into<String>,
        confidence: Option<f64>,
    ) -> Result<(), TraceError> {
        self.ensure_open("add_evaluation_step")?;
        self.add_evaluation_step(step, input, evaluations, output, reasoning, confidence);
        Ok(())
    }

    /// [`TraceBuilder::mark_complete`] that refuses a second close
    pub fn try_mark_complete(&mut self, final_outcome: Option<String>) -> Result<(), TraceError> {
        self.ensure_open("mark_complete")?;
        self.mark_complete(final_outcome);
        Ok(())
    }

    /// [`TraceBuilder::mark_failed`] that refuses a second close
    pub fn try_mark_failed(&mut self, error: Option<&str>) -> Result<(), TraceError> {
        self.ensure_open("mark_failed")?;
        self.mark_failed(error);
        Ok(())
    }

    fn ensure_open(&self, operation: &'static str) -> Result<(), TraceError> {
        if self.is_closed() {
            warn!(
                execution_id = %self.execution.execution_id,
                status = %self.execution.status,
                operation,
                "rejected mutation of closed execution"
            );
            return Err(TraceError::AlreadyClosed {
                execution_id: self.execution.execution_id.to_string(),
                status: self.execution.status,
                operation,
            });
        }
        Ok(())
    }

    /// Wall-clock time anchored at creation and advanced by the monotonic
    /// clock, so it never falls behind `created_at`.
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.started.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.execution.created_at + elapsed
    }

    pub fn execution(&self) -> &Execution {
        &self.execution
    }

    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution.execution_id
    }

    pub fn status(&self) -> ExecutionStatus {
        self.execution.status
    }

    pub fn steps(&self) -> &[Step] {
        &self.execution.steps
    }

    pub fn is_closed(&self) -> bool {
        self.execution.status.is_terminal()
    }

    /// Transport-ready copy of the current state
    pub fn snapshot(&self) -> ExecutionSnapshot {
        self.execution.snapshot()
    }

    pub fn into_execution(self) -> Execution {
        self.execution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        value.as_object().cloned().unwrap_or_default()
    }

    fn append(builder: &mut TraceBuilder, name: &str, reasoning: &str) {
        builder.add_step(name, Payload::new(), Payload::new(), reasoning, None, None);
    }

    #[test]
    fn test_new_trace_is_in_progress() {
        let builder = TraceBuilder::new("Demo");
        assert_eq!(builder.status(), ExecutionStatus::InProgress);
        assert!(builder.steps().is_empty());
        assert!(builder.execution_id().is_generated());
        assert_eq!(builder.execution().name, "Demo");
    }

    #[test]
    fn test_caller_supplied_id() {
        let builder = TraceBuilder::with_id("Demo", "run-7");
        assert_eq!(builder.execution_id().as_str(), "run-7");
    }

    #[test]
    fn test_indices_are_dense_and_one_based() {
        let mut builder = TraceBuilder::new("Demo");
        for i in 0..25 {
            append(&mut builder, &format!("s{}", i), "r");
        }

        assert_eq!(builder.steps().len(), 25);
        for (i, step) in builder.steps().iter().enumerate() {
            assert_eq!(step.index, i + 1);
        }
    }

    #[test]
    fn test_index_tracks_step_count() {
        let mut builder = TraceBuilder::new("Demo");
        for _ in 0..3 {
            append(&mut builder, "s", "r");
            let last: usize = builder.steps().last().unwrap().index;
            assert_eq!(last, builder.steps().len());
        }
    }

    #[test]
    fn test_step_timestamps_do_not_precede_creation() {
        let mut builder = TraceBuilder::new("Demo");
        append(&mut builder, "a", "r");
        append(&mut builder, "b", "r");
        let steps = builder.steps();
        assert!(steps[0].timestamp >= builder.execution().created_at);
        assert!(steps[1].timestamp >= steps[0].timestamp);
    }

    #[test]
    fn test_complete_derives_summary() {
        let mut builder = TraceBuilder::new("Demo");
        builder.add_step(
            "a",
            payload(json!({ "x": 1 })),
            payload(json!({ "y": 2 })),
            "did a",
            None,
            None,
        );
        builder.add_step(
            "b",
            Payload::new(),
            Payload::new(),
            "did b",
            Some(Decision::new(DecisionOutcome::Filter, "r").with_confidence(0.8)),
            None,
        );
        builder.mark_complete(Some("done".to_string()));

        let execution = builder.execution();
        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(execution.steps[0].index, 1);
        assert_eq!(execution.steps[1].index, 2);
        assert_eq!(
            execution.summary,
            Some(Summary {
                total_steps: 2,
                final_outcome: Some("done".to_string())
            })
        );

        let created = execution.created_at;
        let completed = execution.completed_at.unwrap();
        assert!(created <= completed);
        assert_eq!(
            execution.duration_ms,
            Some(completed.timestamp_millis() - created.timestamp_millis())
        );
    }

    #[test]
    fn test_complete_without_outcome() {
        let mut builder = TraceBuilder::new("Demo");
        builder.mark_complete(None);
        assert_eq!(
            builder.execution().summary,
            Some(Summary {
                total_steps: 0,
                final_outcome: None
            })
        );
    }

    #[test]
    fn test_failed_annotates_last_step_only() {
        let mut builder = TraceBuilder::new("Demo");
        append(&mut builder, "first", "one");
        append(&mut builder, "only", "two");
        builder.mark_failed(Some("boom"));

        let execution = builder.execution();
        assert_eq!(execution.status, ExecutionStatus::Failed);
        assert_eq!(execution.steps[0].reasoning, "one");
        assert!(execution.steps[1].reasoning.ends_with(" [ERROR: boom]"));
        assert_eq!(execution.steps[1].reasoning, "two [ERROR: boom]");
        assert!(execution.summary.is_none());
        assert!(execution.completed_at.is_some());
        assert!(execution.duration_ms.unwrap() >= 0);
    }

    #[test]
    fn test_failed_without_steps_drops_error() {
        let mut builder = TraceBuilder::new("Demo");
        builder.mark_failed(Some("boom"));

        let execution = builder.execution();
        assert_eq!(execution.status, ExecutionStatus::Failed);
        assert!(execution.steps.is_empty());
        assert!(execution.summary.is_none());
        assert!(execution.completed_at.is_some());
        assert!(execution.duration_ms.is_some());
    }

    #[test]
    fn test_failed_without_message_leaves_reasoning() {
        let mut builder = TraceBuilder::new("Demo");
        append(&mut builder, "a", "kept");
        builder.mark_failed(None);
        assert_eq!(builder.steps()[0].reasoning, "kept");
    }

    #[test]
    fn test_evaluation_step_shape() {
        let mut builder = TraceBuilder::new("Demo");
        let evaluations = vec![
            Evaluation::new("p1", true, "ok"),
            Evaluation::new("p2", false, "too expensive"),
        ];
        builder.add_evaluation_step(
            "filter",
            payload(json!({ "count": 2 })),
            &evaluations,
            payload(json!({ "kept": 1 })),
            "applied thresholds",
            Some(0.9),
        );

        let step = &builder.steps()[0];
        assert_eq!(
            step.decision,
            Some(Decision {
                outcome: DecisionOutcome::Evaluate,
                reason: "Evaluation completed".to_string(),
                confidence: Some(0.9),
            })
        );
        assert_eq!(step.evaluations(), evaluations);
        assert_eq!(
            serde_json::to_value(step.metadata.as_ref().unwrap()).unwrap(),
            json!({ "evaluations": [
                { "id": "p1", "passed": true, "reason": "ok" },
                { "id": "p2", "passed": false, "reason": "too expensive" }
            ]})
        );
    }

    #[test]
    fn test_permissive_operations_after_close() {
        let mut builder = TraceBuilder::new("Demo");
        append(&mut builder, "a", "r");
        builder.mark_complete(Some("first".to_string()));

        append(&mut builder, "late", "r");
        assert_eq!(builder.steps().len(), 2);
        assert_eq!(builder.steps()[1].index, 2);

        builder.mark_complete(Some("second".to_string()));
        let summary = builder.execution().summary.clone().unwrap();
        assert_eq!(summary.total_steps, 2);
        assert_eq!(summary.final_outcome.as_deref(), Some("second"));

        builder.mark_failed(Some("late failure"));
        assert_eq!(builder.status(), ExecutionStatus::Failed);
        // summary from the earlier completion is left in place
        assert!(builder.execution().summary.is_some());
    }

    #[test]
    fn test_checked_operations_reject_closed_execution() {
        let mut builder = TraceBuilder::with_id("Demo", "e-1");
        builder
            .try_add_step("a", Payload::new(), Payload::new(), "r", None, None)
            .unwrap();
        builder.try_mark_complete(None).unwrap();

        let err = builder
            .try_add_step("b", Payload::new(), Payload::new(), "r", None, None)
            .unwrap_err();
        assert_eq!(
            err,
            TraceError::AlreadyClosed {
                execution_id: "e-1".to_string(),
                status: ExecutionStatus::Completed,
                operation: "add_step",
            }
        );
        assert!(builder.try_mark_failed(Some("x")).is_err());
        assert!(builder.try_mark_complete(None).is_err());
        assert!(builder
            .try_add_evaluation_step("c", Payload::new(), &[], Payload::new(), "r", None)
            .is_err());

        let execution = builder.execution();
        assert_eq!(execution.steps.len(), 1);
        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(execution.steps[0].reasoning, "r");
    }

    #[test]
    fn test_checked_failure_message() {
        let mut builder = TraceBuilder::with_id("Demo", "e-2");
        builder.try_mark_failed(None).unwrap();
        let err = builder.try_mark_complete(None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "LIFECYCLE/mark_complete rejected: execution e-2 is already failed"
        );
    }
}
