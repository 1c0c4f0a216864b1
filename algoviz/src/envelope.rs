//! Wire envelope pushed to every hub subscriber.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::core::context::ExecutionContext;
use crate::core::types::ExecutionStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    ExecutionStep,
    ExecutionComplete,
    ExecutionError,
    /// Reserved; never emitted.
    ExecutionPause,
    /// Reserved; never emitted.
    ExecutionResume,
    ExecutionCancel,
}

impl EnvelopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeKind::ExecutionStep => "execution_step",
            EnvelopeKind::ExecutionComplete => "execution_complete",
            EnvelopeKind::ExecutionError => "execution_error",
            EnvelopeKind::ExecutionPause => "execution_pause",
            EnvelopeKind::ExecutionResume => "execution_resume",
            EnvelopeKind::ExecutionCancel => "execution_cancel",
        }
    }
}

/// `{type, data, timestamp}` as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    pub fn new(kind: EnvelopeKind, data: Value) -> Self {
        Self {
            kind,
            data,
            timestamp: Utc::now(),
        }
    }

    /// One step, tagged with the execution it belongs to.
    pub fn step(execution_id: &str, algorithm_id: &str, step: &ExecutionStep) -> Self {
        let mut data = json!({
            "execution_id": execution_id,
            "algorithm_id": algorithm_id,
            "step_number": step.step_number,
            "action": step.action,
            "data": step.data,
            "timestamp": step.timestamp,
        });
        if let (Some(message), Value::Object(map)) = (&step.message, &mut data) {
            map.insert("message".to_string(), Value::String(message.clone()));
        }
        Self::new(EnvelopeKind::ExecutionStep, data)
    }

    pub fn complete(context: &ExecutionContext) -> Self {
        Self::new(
            EnvelopeKind::ExecutionComplete,
            json!({
                "execution_id": context.id,
                "algorithm_id": context.algorithm_id,
                "output": context.output,
                "steps_count": context.steps.len(),
                "duration_ms": context.duration_ms(),
            }),
        )
    }

    pub fn error(context: &ExecutionContext) -> Self {
        Self::new(
            EnvelopeKind::ExecutionError,
            json!({
                "execution_id": context.id,
                "algorithm_id": context.algorithm_id,
                "error": context.error,
                "steps_count": context.steps.len(),
            }),
        )
    }

    pub fn cancelled(context: &ExecutionContext) -> Self {
        Self::new(
            EnvelopeKind::ExecutionCancel,
            json!({
                "execution_id": context.id,
                "algorithm_id": context.algorithm_id,
                "steps_count": context.steps.len(),
            }),
        )
    }
}
