//! X-Ray Core: execution trace model and capture API
//!
//! Records, for one run of a multi-step decision pipeline, what each step saw,
//! produced and decided, and why.
//!
//! ```text
//! TraceBuilder::new ──▶ add_step / add_evaluation_step ──▶ mark_complete | mark_failed
//!                                                                   │
//!                                                             snapshot() ──▶ external store
//! ```
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use xray_core::{Decision, DecisionOutcome, ExecutionStatus, Payload, TraceBuilder};
//!
//! let mut trace = TraceBuilder::new("Demo");
//! let input: Payload = json!({ "x": 1 }).as_object().cloned().unwrap();
//! let output: Payload = json!({ "y": 2 }).as_object().cloned().unwrap();
//! trace.add_step("a", input, output, "did a", None, None);
//! trace.add_step(
//!     "b",
//!     Payload::new(),
//!     Payload::new(),
//!     "kept the best",
//!     Some(Decision::new(DecisionOutcome::Filter, "r").with_confidence(0.8)),
//!     None,
//! );
//! trace.mark_complete(Some("done".to_string()));
//!
//! let snapshot = trace.snapshot();
//! assert_eq!(snapshot.status, ExecutionStatus::Completed);
//! assert_eq!(snapshot.summary.unwrap().total_steps, 2);
//! ```

pub mod builder;
pub mod error;
pub mod execution;
pub mod id;
pub mod snapshot;
pub mod step;

pub use builder::TraceBuilder;
pub use error::TraceError;
pub use execution::{Execution, ExecutionStatus, Summary};
pub use id::ExecutionId;
pub use snapshot::{ExecutionSnapshot, StepSnapshot};
pub use step::{Decision, DecisionOutcome, Evaluation, Payload, Step};

/// Version of the trace model and snapshot format
pub const XRAY_VERSION: &str = "1.0.0";
