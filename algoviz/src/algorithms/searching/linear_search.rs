use serde_json::{Value, json};

use crate::algorithms::data::{input_or_generated, seed_param, sequential};
use crate::core::params::Parameters;
use crate::core::types::{AlgorithmDescriptor, Category, ExecutionStep, ParameterSpec};
use crate::executor::{ExecutionError, Executor, StepSink};

pub struct LinearSearch {
    descriptor: AlgorithmDescriptor,
}

impl LinearSearch {
    pub fn new() -> Self {
        let descriptor =
            AlgorithmDescriptor::new("linear_search", "Linear Search", Category::Searching)
                .description(
                    "A simple search algorithm that checks each element in the array \
                     sequentially until the target is found.",
                )
                .big_o("Time: O(n), Space: O(1)")
                .param(
                    ParameterSpec::int("array_size", "Size of the array to search", 10)
                        .bounds(3, 100)
                        .required(),
                )
                .param(ParameterSpec::int("target", "Value to search for", 5).required())
                .param(seed_param());
        Self { descriptor }
    }
}

impl Default for LinearSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for LinearSearch {
    fn metadata(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        input: Option<&Value>,
        params: &Parameters,
        sink: &mut dyn StepSink,
    ) -> Result<Value, ExecutionError> {
        let arr = input_or_generated(input, params, || {
            sequential(params.size_or("array_size", 10))
        })?;
        let target = params.int_or("target", 5);

        sink.step(
            ExecutionStep::new("initialize", json!({ "array": arr, "target": target }))
                .with_message(format!("Starting Linear Search for target: {target}")),
        )?;

        for (index, &current) in arr.iter().enumerate() {
            sink.step(
                ExecutionStep::new(
                    "check_element",
                    json!({
                        "array": arr,
                        "target": target,
                        "current": current,
                        "index": index,
                        "checked": &arr[..=index],
                        "remaining": &arr[index + 1..],
                    }),
                )
                .with_message(format!("Checking element {current} at index {index}")),
            )?;

            if current == target {
                let comparisons = index + 1;
                sink.emit(
                    ExecutionStep::new(
                        "found",
                        json!({
                            "array": arr,
                            "target": target,
                            "found_at": index,
                            "value": current,
                            "comparisons": comparisons,
                        }),
                    )
                    .with_message(format!(
                        "Target {target} found at index {index} after {comparisons} comparisons"
                    )),
                );
                return Ok(json!({
                    "found": true,
                    "index": index,
                    "value": current,
                    "comparisons": comparisons,
                }));
            }
        }

        sink.emit(
            ExecutionStep::new(
                "not_found",
                json!({ "array": arr, "target": target, "comparisons": arr.len() }),
            )
            .with_message(format!(
                "Target {target} not found after checking all {} elements",
                arr.len()
            )),
        );
        Ok(json!({
            "found": false,
            "index": -1,
            "value": null,
            "comparisons": arr.len(),
        }))
    }
}
