//! Executor abstraction for algorithm implementations.
//!
//! The [`Executor`] trait decouples orchestration from the individual
//! algorithm bodies. Every algorithm exposes its descriptor, validates raw
//! parameters into typed [`Parameters`], and runs synchronously while pushing
//! each visualized state transition into a [`StepSink`]. Tests use scripted
//! executors and collecting sinks instead of real algorithms.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::core::params::{
    Parameters, RawParameters, ValidationError, resolve, resolve_array_input,
};
use crate::core::types::{AlgorithmDescriptor, ExecutionStep};

/// Failure inside a running algorithm.
///
/// Never surfaces to the submitting caller; it becomes the reason carried by
/// the terminal envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("execution cancelled")]
    Cancelled,

    #[error("execution exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),

    #[error("algorithm panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Failed(String),
}

/// Receiver for the steps an algorithm emits.
pub trait StepSink {
    /// Record one state transition. Never blocks on delivery.
    fn emit(&mut self, step: ExecutionStep);

    /// Return an error if the execution should stop (cancelled or out of time).
    fn checkpoint(&self) -> Result<(), ExecutionError> {
        Ok(())
    }

    /// Emit `step`, then honor cancellation and deadline checks.
    fn step(&mut self, step: ExecutionStep) -> Result<(), ExecutionError> {
        self.emit(step);
        self.checkpoint()
    }
}

/// Capability every algorithm implementation exposes.
pub trait Executor: Send + Sync {
    /// Immutable descriptor; the id is the registry key.
    fn metadata(&self) -> &AlgorithmDescriptor;

    /// Convert raw parameters into typed parameters or reject them.
    ///
    /// The default checks names, kinds, bounds and required flags declared in
    /// the descriptor. Implementations add cross-parameter rules on top.
    fn validate_parameters(&self, raw: &RawParameters) -> Result<Parameters, ValidationError> {
        resolve(self.metadata(), raw)
    }

    /// Check the caller-supplied input before anything is spawned.
    ///
    /// Algorithms that declare an `array_size` parameter accept an integer
    /// array whose length fits its bounds. Every other algorithm works on
    /// generated data only and refuses any non-null input.
    fn validate_input(&self, input: Option<&Value>) -> Result<(), ValidationError> {
        let descriptor = self.metadata();
        if descriptor.parameter("array_size").is_some() {
            return resolve_array_input(descriptor, input).map(|_| ());
        }
        match input {
            Some(value) if !value.is_null() => Err(ValidationError::new(
                "input",
                format!("{} does not accept caller input", descriptor.id),
            )),
            _ => Ok(()),
        }
    }

    /// Run to completion, emitting every visualized transition in order.
    ///
    /// Step payloads must be owned snapshots; the sink may hand them to other
    /// threads while the algorithm keeps mutating its working buffers.
    fn execute(
        &self,
        input: Option<&Value>,
        params: &Parameters,
        sink: &mut dyn StepSink,
    ) -> Result<Value, ExecutionError>;
}
