//! Test-only helpers: collecting sinks and scripted executors.

use std::time::Duration;

use serde_json::{Value, json};

use crate::core::params::{Parameters, RawParameters};
use crate::core::types::{AlgorithmDescriptor, Category, ExecutionStep, ParameterSpec};
use crate::executor::{ExecutionError, Executor, StepSink};

/// Sink that keeps every emitted step in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub steps: Vec<ExecutionStep>,
}

impl CollectingSink {
    pub fn actions(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.action.as_str()).collect()
    }
}

impl StepSink for CollectingSink {
    fn emit(&mut self, step: ExecutionStep) {
        self.steps.push(step);
    }
}

/// Build raw parameters from a `json!({...})` literal.
pub fn raw_params(value: Value) -> RawParameters {
    match value {
        Value::Object(map) => map,
        other => panic!("raw_params expects a JSON object, got {other}"),
    }
}

enum Ending {
    Output,
    Fail(String),
    Panic(String),
}

/// Executor with a fixed, configurable step script.
///
/// Emits `with_steps` "tick" steps (default 3), sleeping `with_step_delay`
/// after each, then returns `{"ticks": n}`, fails, or panics. Declares one
/// optional `limit` parameter bounded to 1..=10 for validation tests.
pub struct ScriptedExecutor {
    descriptor: AlgorithmDescriptor,
    steps: usize,
    delay: Duration,
    ending: Ending,
}

impl ScriptedExecutor {
    pub fn new(id: &str) -> Self {
        let descriptor = AlgorithmDescriptor::new(id, "Scripted", Category::Sorting)
            .description("Emits a fixed number of steps")
            .param(ParameterSpec::int("limit", "Unused bound for validation", 5).bounds(1, 10));
        Self {
            descriptor,
            steps: 3,
            delay: Duration::ZERO,
            ending: Ending::Output,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.descriptor.category = category;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.ending = Ending::Fail(reason.to_string());
        self
    }

    pub fn panicking(mut self, message: &str) -> Self {
        self.ending = Ending::Panic(message.to_string());
        self
    }
}

impl Executor for ScriptedExecutor {
    fn metadata(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        _input: Option<&Value>,
        _params: &Parameters,
        sink: &mut dyn StepSink,
    ) -> Result<Value, ExecutionError> {
        for tick in 0..self.steps {
            sink.step(ExecutionStep::new("tick", json!({ "tick": tick })))?;
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
        }
        match &self.ending {
            Ending::Output => Ok(json!({ "ticks": self.steps })),
            Ending::Fail(reason) => Err(ExecutionError::Failed(reason.clone())),
            Ending::Panic(message) => panic!("{message}"),
        }
    }
}
