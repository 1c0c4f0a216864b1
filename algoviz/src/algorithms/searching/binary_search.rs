use std::cmp::Ordering;

use serde_json::{Value, json};

use crate::algorithms::data::{input_or_generated, seed_param, sequential};
use crate::core::params::Parameters;
use crate::core::types::{AlgorithmDescriptor, Category, ExecutionStep, ParameterSpec};
use crate::executor::{ExecutionError, Executor, StepSink};

pub struct BinarySearch {
    descriptor: AlgorithmDescriptor,
}

impl BinarySearch {
    pub fn new() -> Self {
        let descriptor =
            AlgorithmDescriptor::new("binary_search", "Binary Search", Category::Searching)
                .description(
                    "A search algorithm that finds the position of a target value within a \
                     sorted array by repeatedly dividing the search interval in half.",
                )
                .big_o("Time: O(log n), Space: O(1)")
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

impl Default for BinarySearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for BinarySearch {
    fn metadata(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        input: Option<&Value>,
        params: &Parameters,
        sink: &mut dyn StepSink,
    ) -> Result<Value, ExecutionError> {
        let mut arr = input_or_generated(input, params, || {
            sequential(params.size_or("array_size", 10))
        })?;
        arr.sort_unstable();
        let target = params.int_or("target", 5);

        sink.step(
            ExecutionStep::new("initialize", json!({ "array": arr, "target": target }))
                .with_message(format!(
                    "Starting Binary Search for target: {target} in sorted array"
                )),
        )?;

        // Half-open window [low, high).
        let (mut low, mut high) = (0usize, arr.len());
        let mut comparisons = 0u64;
        while low < high {
            let mid = low + (high - low) / 2;
            comparisons += 1;
            sink.step(
                ExecutionStep::new(
                    "check_middle",
                    json!({
                        "array": arr,
                        "target": target,
                        "left": low,
                        "right": high - 1,
                        "mid": mid,
                        "mid_value": arr[mid],
                        "comparisons": comparisons,
                    }),
                )
                .with_message(format!("Checking middle element {} at index {mid}", arr[mid])),
            )?;

            match arr[mid].cmp(&target) {
                Ordering::Equal => {
                    sink.emit(
                        ExecutionStep::new(
                            "found",
                            json!({
                                "array": arr,
                                "target": target,
                                "found_at": mid,
                                "value": arr[mid],
                                "comparisons": comparisons,
                            }),
                        )
                        .with_message(format!(
                            "Target {target} found at index {mid} after {comparisons} comparisons"
                        )),
                    );
                    return Ok(json!({
                        "found": true,
                        "index": mid,
                        "value": arr[mid],
                        "comparisons": comparisons,
                    }));
                }
                Ordering::Less => {
                    low = mid + 1;
                    sink.step(
                        ExecutionStep::new(
                            "search_right",
                            json!({
                                "array": arr,
                                "target": target,
                                "left": low,
                                "right": high as i64 - 1,
                                "mid": mid,
                                "comparisons": comparisons,
                            }),
                        )
                        .with_message(format!(
                            "Target is greater than {}, searching right half",
                            arr[mid]
                        )),
                    )?;
                }
                Ordering::Greater => {
                    high = mid;
                    sink.step(
                        ExecutionStep::new(
                            "search_left",
                            json!({
                                "array": arr,
                                "target": target,
                                "left": low,
                                "right": high as i64 - 1,
                                "mid": mid,
                                "comparisons": comparisons,
                            }),
                        )
                        .with_message(format!(
                            "Target is less than {}, searching left half",
                            arr[mid]
                        )),
                    )?;
                }
            }
        }

        sink.emit(
            ExecutionStep::new(
                "not_found",
                json!({ "array": arr, "target": target, "comparisons": comparisons }),
            )
            .with_message(format!(
                "Target {target} not found after {comparisons} comparisons"
            )),
        );
        Ok(json!({
            "found": false,
            "index": -1,
            "value": null,
            "comparisons": comparisons,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CollectingSink, raw_params};

    #[test]
    fn default_target_found_in_three_probes() {
        let algo = BinarySearch::new();
        let params = algo.validate_parameters(&raw_params(json!({}))).expect("params");
        let mut sink = CollectingSink::default();
        let output = algo.execute(None, &params, &mut sink).expect("execute");

        // 1..=10: probes 6, 3, 5
        assert_eq!(
            output,
            json!({"found": true, "index": 4, "value": 5, "comparisons": 3})
        );
        assert_eq!(sink.actions().last(), Some(&"found"));
    }

    #[test]
    fn unsorted_input_is_sorted_before_searching() {
        let algo = BinarySearch::new();
        let params = algo
            .validate_parameters(&raw_params(json!({"target": 2})))
            .expect("params");
        let mut sink = CollectingSink::default();
        let output = algo
            .execute(Some(&json!([9, 2, 5])), &params, &mut sink)
            .expect("execute");

        assert_eq!(output["index"], json!(0));
        assert_eq!(sink.steps[0].data["array"], json!([2, 5, 9]));
    }

    #[test]
    fn absent_target_ends_with_not_found() {
        let algo = BinarySearch::new();
        let params = algo
            .validate_parameters(&raw_params(json!({"target": 0})))
            .expect("params");
        let mut sink = CollectingSink::default();
        let output = algo.execute(None, &params, &mut sink).expect("execute");

        assert_eq!(output["found"], json!(false));
        assert_eq!(output["index"], json!(-1));
        assert!(sink.actions().contains(&"search_left"));
        assert_eq!(sink.actions().last(), Some(&"not_found"));
    }
}
