use serde_json::{Value, json};

use crate::algorithms::data::{cycled, input_or_generated, seed_param};
use crate::core::params::{Parameters, ValidationError, resolve_array_input};
use crate::core::types::{AlgorithmDescriptor, Category, ExecutionStep, ParameterSpec};
use crate::executor::{ExecutionError, Executor, StepSink};

/// Largest element value a caller-supplied input may contain.
const MAX_ELEMENT: i64 = 10_000;

pub struct CountingSort {
    descriptor: AlgorithmDescriptor,
}

impl CountingSort {
    pub fn new() -> Self {
        let descriptor =
            AlgorithmDescriptor::new("counting_sort", "Counting Sort", Category::Sorting)
                .description(
                    "A non-comparison-based sorting algorithm that counts the number of objects \
                     having distinct key values.",
                )
                .big_o("Time: O(n + k), Space: O(k) where k is the range of input")
                .param(
                    ParameterSpec::int("array_size", "Size of the array to sort", 10)
                        .bounds(3, 50)
                        .required(),
                )
                .param(
                    ParameterSpec::int("max_value", "Maximum value in the array", 20)
                        .bounds(5, 100)
                        .required(),
                )
                .param(seed_param());
        Self { descriptor }
    }
}

fn out_of_range(values: &[i64]) -> Option<i64> {
    values
        .iter()
        .copied()
        .find(|value| !(0..=MAX_ELEMENT).contains(value))
}

fn range_reason(bad: i64) -> String {
    format!("counting sort supports values between 0 and {MAX_ELEMENT}, got {bad}")
}

impl Default for CountingSort {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for CountingSort {
    fn metadata(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn validate_input(&self, input: Option<&Value>) -> Result<(), ValidationError> {
        let values = resolve_array_input(&self.descriptor, input)?.unwrap_or_default();
        match out_of_range(&values) {
            Some(bad) => Err(ValidationError::new("input", range_reason(bad))),
            None => Ok(()),
        }
    }

    fn execute(
        &self,
        input: Option<&Value>,
        params: &Parameters,
        sink: &mut dyn StepSink,
    ) -> Result<Value, ExecutionError> {
        let arr = input_or_generated(input, params, || {
            cycled(params.size_or("array_size", 10), params.int_or("max_value", 20))
        })?;
        if arr.is_empty() {
            return Err(ExecutionError::InvalidInput(
                "counting sort needs at least one element".to_string(),
            ));
        }
        if let Some(bad) = out_of_range(&arr) {
            return Err(ExecutionError::InvalidInput(range_reason(bad)));
        }

        sink.step(
            ExecutionStep::new("initialize", json!({ "array": arr }))
                .with_message("Starting Counting Sort"),
        )?;

        let max = arr.iter().copied().max().unwrap_or(0) as usize;
        sink.step(
            ExecutionStep::new("find_max", json!({ "array": arr, "max_value": max }))
                .with_message(format!("Found maximum value: {max}")),
        )?;

        let mut count = vec![0usize; max + 1];
        let mut output = vec![0i64; arr.len()];

        sink.step(
            ExecutionStep::new(
                "count_occurrences",
                json!({ "array": arr, "count_array": count, "phase": "counting" }),
            )
            .with_message("Counting occurrences of each element"),
        )?;
        for (index, &element) in arr.iter().enumerate() {
            count[element as usize] += 1;
            sink.step(
                ExecutionStep::new(
                    "count_element",
                    json!({
                        "array": arr,
                        "count_array": count,
                        "element": element,
                        "index": index,
                    }),
                )
                .with_message(format!(
                    "Counted element {element}, count now: {}",
                    count[element as usize]
                )),
            )?;
        }

        sink.step(
            ExecutionStep::new(
                "modify_count",
                json!({ "array": arr, "count_array": count, "phase": "modifying" }),
            )
            .with_message("Modifying count array to store positions"),
        )?;
        for value in 1..=max {
            count[value] += count[value - 1];
            sink.step(
                ExecutionStep::new(
                    "modify_count_element",
                    json!({
                        "array": arr,
                        "count_array": count,
                        "value": value,
                        "new_count": count[value],
                    }),
                )
                .with_message(format!(
                    "Updated count for value {value} to position {}",
                    count[value]
                )),
            )?;
        }

        sink.step(
            ExecutionStep::new(
                "build_output",
                json!({
                    "array": arr,
                    "count_array": count,
                    "output": output,
                    "phase": "building",
                }),
            )
            .with_message("Building output array"),
        )?;
        for &element in arr.iter().rev() {
            let slot = element as usize;
            count[slot] -= 1;
            output[count[slot]] = element;
            sink.step(
                ExecutionStep::new(
                    "place_element",
                    json!({
                        "array": arr,
                        "count_array": count,
                        "output": output,
                        "element": element,
                        "position": count[slot],
                    }),
                )
                .with_message(format!(
                    "Placed element {element} at position {}",
                    count[slot]
                )),
            )?;
        }

        sink.emit(
            ExecutionStep::new("complete", json!({ "array": output, "sorted": true }))
                .with_message("Counting Sort completed"),
        );
        Ok(json!(output))
    }
}
