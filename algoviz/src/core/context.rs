//! Per-execution state and execution id allocation.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::core::params::Parameters;
use crate::core::types::{ExecutionStatus, ExecutionStep};

/// Allocates execution ids from a monotonically increasing counter.
///
/// Ids are unique for the lifetime of the allocator regardless of how many
/// threads allocate concurrently.
#[derive(Debug, Default)]
pub struct ExecutionIds {
    next: AtomicU64,
}

impl ExecutionIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("exec_{n}")
    }
}

/// State of one execution, owned by the task running it.
///
/// Mutated only while `status` is `Running`; once terminal it is handed out
/// read-only.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionContext {
    pub id: String,
    pub algorithm_id: String,
    pub parameters: Parameters,
    pub input: Option<Value>,
    pub status: ExecutionStatus,
    pub steps: Vec<ExecutionStep>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub output: Option<Value>,
    pub error: Option<String>,
}

impl ExecutionContext {
    pub fn new(
        id: String,
        algorithm_id: String,
        parameters: Parameters,
        input: Option<Value>,
    ) -> Self {
        Self {
            id,
            algorithm_id,
            parameters,
            input,
            status: ExecutionStatus::Running,
            steps: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
            output: None,
            error: None,
        }
    }

    /// Append a step, stamping its sequence marker with the arrival index.
    ///
    /// Returns the stamped step. Steps arriving after the terminal transition
    /// are still stamped but not recorded.
    pub fn record(&mut self, mut step: ExecutionStep) -> ExecutionStep {
        step.step_number = self.steps.len() as u64;
        if self.status.is_terminal() {
            warn!(execution_id = %self.id, action = %step.action, "step after terminal status ignored");
            return step;
        }
        self.steps.push(step.clone());
        step
    }

    pub fn complete(&mut self, output: Value) -> bool {
        self.transition(ExecutionStatus::Completed, Some(output), None)
    }

    pub fn fail(&mut self, reason: String) -> bool {
        self.transition(ExecutionStatus::Error, None, Some(reason))
    }

    pub fn cancel(&mut self) -> bool {
        self.transition(ExecutionStatus::Cancelled, None, Some("cancelled".to_string()))
    }

    /// Move from `Running` to `status`. Only the first transition applies.
    fn transition(
        &mut self,
        status: ExecutionStatus,
        output: Option<Value>,
        error: Option<String>,
    ) -> bool {
        if self.status.is_terminal() {
            warn!(
                execution_id = %self.id,
                current = ?self.status,
                requested = ?status,
                "execution already terminal"
            );
            return false;
        }
        self.status = status;
        self.output = output;
        self.error = error;
        self.ended_at = Some(Utc::now());
        true
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at
            .map(|ended| (ended - self.started_at).num_milliseconds())
    }
}
