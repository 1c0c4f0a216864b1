//! Execution orchestration.
//!
//! [`Orchestrator::submit`] runs every check that can reject a request before
//! any work is spawned: registry lookup, parameter and input validation, then
//! the admission permit. Only after all three pass does it allocate an id and
//! start one supervised blocking task. From then on every outcome, including
//! a panicking algorithm body, is reported as a terminal envelope on the hub
//! and never to the submitter.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, instrument, warn};

use crate::core::budget::Budget;
use crate::core::context::{ExecutionContext, ExecutionIds};
use crate::core::params::{RawParameters, ValidationError};
use crate::core::types::ExecutionStep;
use crate::envelope::Envelope;
use crate::executor::{ExecutionError, Executor, StepSink};
use crate::hub::HubHandle;
use crate::io::config::ExecutionsConfig;
use crate::registry::Registry;

/// Why a submission was refused. Nothing is spawned or broadcast in any case.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("algorithm not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("too many concurrent executions (limit {0})")]
    AtCapacity(usize),
}

/// Admission and deadline limits applied to every execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    pub max_concurrent: usize,
    pub timeout: Duration,
}

impl From<&ExecutionsConfig> for ExecutionLimits {
    fn from(config: &ExecutionsConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent,
            timeout: config.timeout(),
        }
    }
}

type CancelFlag = Arc<AtomicBool>;

pub struct Orchestrator {
    registry: Arc<Registry>,
    hub: HubHandle,
    ids: ExecutionIds,
    permits: Arc<Semaphore>,
    limits: ExecutionLimits,
    active: Arc<Mutex<HashMap<String, CancelFlag>>>,
}

/// Handle to one running execution.
pub struct ExecutionHandle {
    id: String,
    cancel: CancelFlag,
    join: JoinHandle<ExecutionContext>,
}

impl ExecutionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ask the execution to stop at its next step boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Wait for the terminal context.
    pub async fn wait(self) -> Result<ExecutionContext, JoinError> {
        self.join.await
    }
}

impl Orchestrator {
    pub fn new(registry: Arc<Registry>, hub: HubHandle, limits: ExecutionLimits) -> Self {
        Self {
            registry,
            hub,
            ids: ExecutionIds::new(),
            permits: Arc::new(Semaphore::new(limits.max_concurrent.max(1))),
            limits,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Validate and start an execution, returning as soon as it is spawned.
    ///
    /// Must be called inside a tokio runtime.
    #[instrument(skip(self, raw_params, input))]
    pub fn submit(
        &self,
        algorithm_id: &str,
        raw_params: &RawParameters,
        input: Option<Value>,
    ) -> Result<ExecutionHandle, SubmitError> {
        let executor = self
            .registry
            .get(algorithm_id)
            .ok_or_else(|| SubmitError::NotFound(algorithm_id.to_string()))?;

        let params = executor
            .validate_parameters(raw_params)
            .and_then(|params| {
                executor.validate_input(input.as_ref())?;
                Ok(params)
            })
            .inspect_err(|err| {
                debug!(field = %err.field, reason = %err.reason, "request rejected");
            })?;

        let permit = Arc::clone(&self.permits).try_acquire_owned().map_err(|_| {
            warn!(limit = self.limits.max_concurrent, "execution refused at capacity");
            SubmitError::AtCapacity(self.limits.max_concurrent)
        })?;

        let id = self.ids.allocate();
        let context = ExecutionContext::new(id.clone(), algorithm_id.to_string(), params, input);
        let cancel = CancelFlag::default();
        self.lock_active().insert(id.clone(), Arc::clone(&cancel));

        let run = Run {
            executor,
            hub: self.hub.clone(),
            cancel: Arc::clone(&cancel),
            budget: Budget::starting_now(self.limits.timeout),
            context,
        };
        let active = Arc::clone(&self.active);
        let execution_id = id.clone();
        let join = tokio::spawn(async move {
            let context = supervise(run).await;
            active
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .remove(&execution_id);
            drop(permit);
            context
        });

        info!(execution_id = %id, "execution started");
        Ok(ExecutionHandle { id, cancel, join })
    }

    /// Request cancellation of a running execution. Returns `false` when no
    /// running execution has that id.
    pub fn cancel(&self, execution_id: &str) -> bool {
        match self.lock_active().get(execution_id) {
            Some(flag) => {
                flag.store(true, Ordering::Release);
                info!(execution_id, "cancellation requested");
                true
            }
            None => false,
        }
    }

    pub fn active_count(&self) -> usize {
        self.lock_active().len()
    }

    fn lock_active(&self) -> MutexGuard<'_, HashMap<String, CancelFlag>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Everything the blocking task needs, moved into it as one value.
struct Run {
    executor: Arc<dyn Executor>,
    hub: HubHandle,
    cancel: CancelFlag,
    budget: Budget,
    context: ExecutionContext,
}

async fn supervise(run: Run) -> ExecutionContext {
    let hub = run.hub.clone();
    let mut fallback = run.context.clone();
    match tokio::task::spawn_blocking(move || run.execute()).await {
        Ok(context) => context,
        Err(err) => {
            // Only reachable if the runtime drops the task during shutdown.
            warn!(execution_id = %fallback.id, error = %err, "execution task aborted");
            fallback.fail(format!("execution task aborted: {err}"));
            hub.broadcast(&Envelope::error(&fallback));
            fallback
        }
    }
}

impl Run {
    fn execute(self) -> ExecutionContext {
        let Run {
            executor,
            hub,
            cancel,
            budget,
            mut context,
        } = self;
        let params = context.parameters.clone();
        let input = context.input.clone();

        let outcome = {
            let mut sink = BroadcastSink {
                context: &mut context,
                hub: &hub,
                cancel: &cancel,
                budget,
            };
            panic::catch_unwind(AssertUnwindSafe(|| {
                executor.execute(input.as_ref(), &params, &mut sink)
            }))
            .unwrap_or_else(|payload| Err(ExecutionError::Panicked(panic_message(&*payload))))
        };

        match outcome {
            Ok(output) => {
                context.complete(output);
                hub.broadcast(&Envelope::complete(&context));
                info!(
                    execution_id = %context.id,
                    steps = context.steps.len(),
                    duration_ms = context.duration_ms().unwrap_or_default(),
                    "execution completed"
                );
            }
            Err(ExecutionError::Cancelled) => {
                context.cancel();
                hub.broadcast(&Envelope::cancelled(&context));
                info!(execution_id = %context.id, steps = context.steps.len(), "execution cancelled");
            }
            Err(err) => {
                warn!(execution_id = %context.id, error = %err, "execution failed");
                context.fail(err.to_string());
                hub.broadcast(&Envelope::error(&context));
            }
        }
        context
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Records each step on the context and forwards it to the hub.
struct BroadcastSink<'a> {
    context: &'a mut ExecutionContext,
    hub: &'a HubHandle,
    cancel: &'a AtomicBool,
    budget: Budget,
}

impl StepSink for BroadcastSink<'_> {
    fn emit(&mut self, step: ExecutionStep) {
        let step = self.context.record(step);
        self.hub.broadcast(&Envelope::step(
            &self.context.id,
            &self.context.algorithm_id,
            &step,
        ));
    }

    fn checkpoint(&self) -> Result<(), ExecutionError> {
        if self.cancel.load(Ordering::Acquire) {
            return Err(ExecutionError::Cancelled);
        }
        if self.budget.is_exhausted() {
            return Err(ExecutionError::DeadlineExceeded(self.budget.limit()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;
    use crate::core::types::ExecutionStatus;
    use crate::envelope::EnvelopeKind;
    use crate::hub::{self, Subscription};
    use crate::test_support::{ScriptedExecutor, raw_params};

    fn limits() -> ExecutionLimits {
        ExecutionLimits {
            max_concurrent: 8,
            timeout: Duration::from_secs(10),
        }
    }

    fn orchestrator_with(
        executors: Vec<ScriptedExecutor>,
        limits: ExecutionLimits,
    ) -> (Orchestrator, HubHandle) {
        let registry = Registry::new();
        for executor in executors {
            registry.register(Arc::new(executor));
        }
        let hub = hub::spawn(1024);
        (Orchestrator::new(Arc::new(registry), hub.clone(), limits), hub)
    }

    async fn next_envelope(sub: &mut Subscription) -> Envelope {
        let frame = sub.recv().await.expect("frame");
        serde_json::from_str(frame.json()).expect("envelope")
    }

    #[tokio::test]
    async fn completed_execution_broadcasts_steps_then_complete() {
        let (orchestrator, hub) =
            orchestrator_with(vec![ScriptedExecutor::new("demo").with_steps(3)], limits());
        let mut sub = hub.register();

        let handle = orchestrator
            .submit("demo", &raw_params(json!({})), None)
            .expect("submit");
        let id = handle.id().to_string();
        let context = handle.wait().await.expect("join");

        assert_eq!(context.status, ExecutionStatus::Completed);
        assert_eq!(context.steps.len(), 3);
        for n in 0..3u64 {
            let envelope = next_envelope(&mut sub).await;
            assert_eq!(envelope.kind, EnvelopeKind::ExecutionStep);
            assert_eq!(envelope.data["execution_id"], json!(id));
            assert_eq!(envelope.data["step_number"], json!(n));
        }
        let done = next_envelope(&mut sub).await;
        assert_eq!(done.kind, EnvelopeKind::ExecutionComplete);
        assert_eq!(done.data["steps_count"], json!(3));
        assert_eq!(orchestrator.active_count(), 0);
    }

    #[tokio::test]
    async fn unknown_algorithm_spawns_nothing() {
        let (orchestrator, hub) = orchestrator_with(Vec::new(), limits());
        let mut sub = hub.register();

        let err = orchestrator
            .submit("nope", &raw_params(json!({})), None)
            .err()
            .expect("not found");
        assert!(matches!(err, SubmitError::NotFound(ref id) if id == "nope"));

        let marker = Envelope::new(EnvelopeKind::ExecutionCancel, json!({"marker": true}));
        hub.broadcast(&marker);
        assert_eq!(next_envelope(&mut sub).await.data, json!({"marker": true}));
        assert_eq!(orchestrator.active_count(), 0);
    }

    #[tokio::test]
    async fn invalid_parameters_are_rejected_before_spawning() {
        let (orchestrator, _hub) =
            orchestrator_with(vec![ScriptedExecutor::new("demo")], limits());
        let err = orchestrator
            .submit("demo", &raw_params(json!({"limit": 99})), None)
            .err()
            .expect("validation");
        assert!(matches!(err, SubmitError::Validation(ref e) if e.field == "limit"));
        assert_eq!(orchestrator.active_count(), 0);
    }

    #[tokio::test]
    async fn input_is_refused_before_spawning() {
        let (orchestrator, _hub) =
            orchestrator_with(vec![ScriptedExecutor::new("demo")], limits());
        let err = orchestrator
            .submit("demo", &raw_params(json!({})), Some(json!([1, 2, 3])))
            .err()
            .expect("input refused");
        assert!(matches!(err, SubmitError::Validation(ref e) if e.field == "input"));
        assert_eq!(orchestrator.active_count(), 0);
    }

    #[tokio::test]
    async fn failure_becomes_error_envelope() {
        let (orchestrator, hub) = orchestrator_with(
            vec![ScriptedExecutor::new("demo").with_steps(1).failing("boom")],
            limits(),
        );
        let mut sub = hub.register();
        let context = orchestrator
            .submit("demo", &raw_params(json!({})), None)
            .expect("submit")
            .wait()
            .await
            .expect("join");

        assert_eq!(context.status, ExecutionStatus::Error);
        assert_eq!(context.error.as_deref(), Some("boom"));
        assert_eq!(next_envelope(&mut sub).await.kind, EnvelopeKind::ExecutionStep);
        let err = next_envelope(&mut sub).await;
        assert_eq!(err.kind, EnvelopeKind::ExecutionError);
        assert_eq!(err.data["error"], json!("boom"));
    }

    #[tokio::test]
    async fn panicking_algorithm_is_contained() {
        let (orchestrator, _hub) = orchestrator_with(
            vec![ScriptedExecutor::new("demo").with_steps(2).panicking("kaboom")],
            limits(),
        );
        let context = orchestrator
            .submit("demo", &raw_params(json!({})), None)
            .expect("submit")
            .wait()
            .await
            .expect("join");

        assert_eq!(context.status, ExecutionStatus::Error);
        assert_eq!(context.steps.len(), 2);
        assert!(context.error.as_deref().unwrap_or_default().contains("kaboom"));
        assert_eq!(orchestrator.active_count(), 0);
    }

    #[tokio::test]
    async fn cancel_stops_at_next_step() {
        let (orchestrator, hub) = orchestrator_with(
            vec![
                ScriptedExecutor::new("slow")
                    .with_steps(10_000)
                    .with_step_delay(Duration::from_millis(2)),
            ],
            limits(),
        );
        let mut sub = hub.register();
        let handle = orchestrator
            .submit("slow", &raw_params(json!({})), None)
            .expect("submit");
        let id = handle.id().to_string();

        // Wait for the first step so the execution is known to be running.
        assert_eq!(next_envelope(&mut sub).await.kind, EnvelopeKind::ExecutionStep);
        assert!(orchestrator.cancel(&id));

        let context = handle.wait().await.expect("join");
        assert_eq!(context.status, ExecutionStatus::Cancelled);
        assert!(context.steps.len() < 10_000);
        assert!(!orchestrator.cancel(&id));
    }

    #[tokio::test]
    async fn deadline_ends_long_executions() {
        let (orchestrator, _hub) = orchestrator_with(
            vec![
                ScriptedExecutor::new("slow")
                    .with_steps(10_000)
                    .with_step_delay(Duration::from_millis(2)),
            ],
            ExecutionLimits {
                max_concurrent: 1,
                timeout: Duration::from_millis(50),
            },
        );
        let context = orchestrator
            .submit("slow", &raw_params(json!({})), None)
            .expect("submit")
            .wait()
            .await
            .expect("join");

        assert_eq!(context.status, ExecutionStatus::Error);
        assert!(context.error.as_deref().unwrap_or_default().contains("deadline"));
    }

    #[tokio::test]
    async fn admission_cap_refuses_extra_submissions() {
        let (orchestrator, _hub) = orchestrator_with(
            vec![
                ScriptedExecutor::new("slow")
                    .with_steps(10_000)
                    .with_step_delay(Duration::from_millis(2)),
            ],
            ExecutionLimits {
                max_concurrent: 1,
                timeout: Duration::from_secs(10),
            },
        );
        let first = orchestrator
            .submit("slow", &raw_params(json!({})), None)
            .expect("first");
        let err = orchestrator
            .submit("slow", &raw_params(json!({})), None)
            .err()
            .expect("second refused");
        assert!(matches!(err, SubmitError::AtCapacity(1)));

        first.cancel();
        first.wait().await.expect("join");
        let again = orchestrator
            .submit("slow", &raw_params(json!({})), None)
            .expect("permit released");
        again.cancel();
        again.wait().await.expect("join");
    }

    #[tokio::test]
    async fn execution_ids_are_unique() {
        let (orchestrator, _hub) =
            orchestrator_with(vec![ScriptedExecutor::new("demo").with_steps(0)], limits());
        let mut ids = HashSet::new();
        for _ in 0..50 {
            let handle = orchestrator
                .submit("demo", &raw_params(json!({})), None)
                .expect("submit");
            assert!(ids.insert(handle.id().to_string()));
            handle.wait().await.expect("join");
        }
    }
}
