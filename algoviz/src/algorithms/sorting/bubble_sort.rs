use serde_json::{Value, json};

use crate::algorithms::data::{input_or_generated, seed_param, sequential};
use crate::core::params::Parameters;
use crate::core::types::{AlgorithmDescriptor, Category, ExecutionStep, ParameterSpec};
use crate::executor::{ExecutionError, Executor, StepSink};

pub struct BubbleSort {
    descriptor: AlgorithmDescriptor,
}

impl BubbleSort {
    pub fn new() -> Self {
        let descriptor = AlgorithmDescriptor::new("bubble_sort", "Bubble Sort", Category::Sorting)
            .description(
                "A simple sorting algorithm that repeatedly steps through the list, compares \
                 adjacent elements and swaps them if they are in the wrong order.",
            )
            .big_o("Time: O(n²), Space: O(1)")
            .param(
                ParameterSpec::int("array_size", "Size of the array to sort", 10)
                    .bounds(3, 100)
                    .required(),
            )
            .param(ParameterSpec::bool(
                "show_comparisons",
                "Show comparison steps in visualization",
                true,
            ))
            .param(seed_param());
        Self { descriptor }
    }
}

impl Default for BubbleSort {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for BubbleSort {
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
        let show_comparisons = params.bool_or("show_comparisons", true);

        sink.step(
            ExecutionStep::new(
                "initialize",
                json!({
                    "array": arr,
                    "comparisons": 0,
                    "swaps": 0,
                    "show_comparisons": show_comparisons,
                }),
            )
            .with_message("Starting Bubble Sort"),
        )?;

        let n = arr.len();
        let mut comparisons = 0u64;
        let mut swaps = 0u64;

        for i in 0..n.saturating_sub(1) {
            let mut swapped = false;
            sink.step(
                ExecutionStep::new(
                    "outer_loop",
                    json!({
                        "array": arr,
                        "outer_index": i,
                        "comparisons": comparisons,
                        "swaps": swaps,
                    }),
                )
                .with_message(format!("Outer loop iteration {}", i + 1)),
            )?;

            for j in 0..n - i - 1 {
                comparisons += 1;
                if show_comparisons {
                    sink.step(
                        ExecutionStep::new(
                            "compare",
                            json!({
                                "array": arr,
                                "comparing": [j, j + 1],
                                "values": [arr[j], arr[j + 1]],
                                "comparisons": comparisons,
                                "swaps": swaps,
                                "outer_index": i,
                                "inner_index": j,
                            }),
                        )
                        .with_message(format!("Comparing {} and {}", arr[j], arr[j + 1])),
                    )?;
                }

                if arr[j] > arr[j + 1] {
                    arr.swap(j, j + 1);
                    swaps += 1;
                    swapped = true;
                    sink.step(
                        ExecutionStep::new(
                            "swap",
                            json!({
                                "array": arr,
                                "swapped": [j, j + 1],
                                "values": [arr[j + 1], arr[j]],
                                "comparisons": comparisons,
                                "swaps": swaps,
                                "outer_index": i,
                                "inner_index": j,
                            }),
                        )
                        .with_message(format!("Swapped {} and {}", arr[j + 1], arr[j])),
                    )?;
                }
            }

            if !swapped {
                sink.step(
                    ExecutionStep::new(
                        "early_termination",
                        json!({
                            "array": arr,
                            "comparisons": comparisons,
                            "swaps": swaps,
                            "outer_index": i,
                        }),
                    )
                    .with_message("Array is sorted, terminating early"),
                )?;
                break;
            }
        }

        sink.emit(
            ExecutionStep::new(
                "complete",
                json!({
                    "array": arr,
                    "comparisons": comparisons,
                    "swaps": swaps,
                    "sorted": true,
                }),
            )
            .with_message(format!(
                "Bubble Sort completed with {comparisons} comparisons and {swaps} swaps"
            )),
        );

        Ok(json!(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CollectingSink, raw_params};

    #[test]
    fn sorts_caller_input_and_counts_swaps() {
        let algo = BubbleSort::new();
        let params = algo.validate_parameters(&raw_params(json!({}))).expect("params");
        let mut sink = CollectingSink::default();
        let output = algo
            .execute(Some(&json!([3, 1, 2])), &params, &mut sink)
            .expect("execute");

        assert_eq!(output, json!([1, 2, 3]));
        let last = sink.steps.last().expect("steps");
        assert_eq!(last.action, "complete");
        assert_eq!(last.data["swaps"], json!(2));
        assert!(sink.actions().contains(&"swap"));
    }

    #[test]
    fn sorted_input_terminates_early() {
        let algo = BubbleSort::new();
        let params = algo
            .validate_parameters(&raw_params(json!({"array_size": 5, "show_comparisons": false})))
            .expect("params");
        let mut sink = CollectingSink::default();
        algo.execute(None, &params, &mut sink).expect("execute");

        assert_eq!(
            sink.actions(),
            vec!["initialize", "outer_loop", "early_termination", "complete"]
        );
    }

    #[test]
    fn swap_steps_snapshot_the_array() {
        let algo = BubbleSort::new();
        let params = algo.validate_parameters(&raw_params(json!({}))).expect("params");
        let mut sink = CollectingSink::default();
        algo.execute(Some(&json!([2, 1])), &params, &mut sink)
            .expect("execute");

        let initial = &sink.steps[0];
        assert_eq!(initial.data["array"], json!([2, 1]));
        let swap = sink.steps.iter().find(|s| s.action == "swap").expect("swap");
        assert_eq!(swap.data["array"], json!([1, 2]));
    }
}
