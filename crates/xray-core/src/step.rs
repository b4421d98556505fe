//! Step records: what a single pipeline stage saw, produced and decided
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque caller data attached to a step (input, output, metadata).
pub type Payload = Map<String, Value>;

/// Metadata key under which evaluation steps carry their evaluations.
pub const EVALUATIONS_KEY: &str = "evaluations";

/// Reason recorded on the decision of every evaluation step.
pub const EVALUATION_REASON: &str = "Evaluation completed";

/// Tagged outcome of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionOutcome {
    Pass,
    Fail,
    Select,
    Filter,
    Evaluate,
}

impl fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecisionOutcome::Pass => write!(f, "pass"),
            DecisionOutcome::Fail => write!(f, "fail"),
            DecisionOutcome::Select => write!(f, "select"),
            DecisionOutcome::Filter => write!(f, "filter"),
            DecisionOutcome::Evaluate => write!(f, "evaluate"),
        }
    }
}

/// Outcome plus the reason behind it.
///
/// `confidence` is meant to lie in `[0, 1]` but is stored as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub outcome: DecisionOutcome,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Decision {
    pub fn new(outcome: DecisionOutcome, reason: impl Into<String>) -> Self {
        Self {
            outcome,
            reason: reason.into(),
            confidence: None,
        }
    }

    /// Set the confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Per-item judgment, embedded in a step's metadata by evaluation steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: String,
    pub passed: bool,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Payload>,
}

impl Evaluation {
    pub fn new(id: impl Into<String>, passed: bool, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            passed,
            reason: reason.into(),
            metadata: None,
        }
    }

    /// Attach opaque metadata
    pub fn with_metadata(mut self, metadata: Payload) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// One recorded point in an execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position, dense and never reused
    pub index: usize,

    /// Caller label for the stage (not unique)
    pub step: String,

    /// Capture time of the append call
    pub timestamp: DateTime<Utc>,

    pub input: Payload,
    pub output: Payload,
    pub reasoning: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Payload>,
}

impl Step {
    /// Evaluations carried in metadata, if this step follows the convention.
    ///
    /// Entries that do not have the evaluation shape are skipped.
    pub fn evaluations(&self) -> Vec<Evaluation> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(EVALUATIONS_KEY))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn annotate_error(&mut self, error: &str) {
        self.reasoning.push_str(&format!(" [ERROR: {}]", error));
    }
}

/// Build the metadata map an evaluation step carries.
pub(crate) fn evaluations_metadata(evaluations: &[Evaluation]) -> Payload {
    let items = evaluations
        .iter()
        .map(|e| serde_json::to_value(e).unwrap_or(Value::Null))
        .collect();
    let mut metadata = Payload::new();
    metadata.insert(EVALUATIONS_KEY.to_string(), Value::Array(items));
    metadata
}
