use serde_json::{Value, json};

use crate::algorithms::data::{input_or_generated, seed_param, sequential};
use crate::core::params::{Parameters, RawParameters, ValidationError, resolve};
use crate::core::types::{AlgorithmDescriptor, Category, ExecutionStep, ParameterSpec};
use crate::executor::{ExecutionError, Executor, StepSink};

const PIVOT_STRATEGIES: [&str; 3] = ["first", "last", "middle"];

pub struct QuickSort {
    descriptor: AlgorithmDescriptor,
}

impl QuickSort {
    pub fn new() -> Self {
        let descriptor = AlgorithmDescriptor::new("quick_sort", "Quick Sort", Category::Sorting)
            .description(
                "A divide-and-conquer algorithm that picks a pivot element and partitions the \
                 array around the pivot.",
            )
            .big_o("Time: O(n log n) average, O(n²) worst case, Space: O(log n)")
            .param(
                ParameterSpec::int("array_size", "Size of the array to sort", 10)
                    .bounds(3, 100)
                    .required(),
            )
            .param(ParameterSpec::string(
                "pivot_strategy",
                "Pivot selection strategy",
                "middle",
            ))
            .param(seed_param());
        Self { descriptor }
    }
}

impl Default for QuickSort {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for QuickSort {
    fn metadata(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn validate_parameters(&self, raw: &RawParameters) -> Result<Parameters, ValidationError> {
        let params = resolve(&self.descriptor, raw)?;
        let strategy = params.str_or("pivot_strategy", "middle");
        if !PIVOT_STRATEGIES.contains(&strategy) {
            return Err(ValidationError::new(
                "pivot_strategy",
                "must be one of: first, last, middle",
            ));
        }
        Ok(params)
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
        let strategy = params.str_or("pivot_strategy", "middle");

        sink.step(
            ExecutionStep::new(
                "initialize",
                json!({ "array": arr, "pivot_strategy": strategy }),
            )
            .with_message("Starting Quick Sort"),
        )?;

        if arr.len() > 1 {
            let high = arr.len() - 1;
            quick_sort(&mut arr, 0, high, strategy, sink)?;
        }

        sink.emit(
            ExecutionStep::new("complete", json!({ "array": arr, "sorted": true }))
                .with_message("Quick Sort completed"),
        );
        Ok(json!(arr))
    }
}

fn quick_sort(
    arr: &mut [i64],
    low: usize,
    high: usize,
    strategy: &str,
    sink: &mut dyn StepSink,
) -> Result<(), ExecutionError> {
    if low >= high {
        return Ok(());
    }
    let pivot_index = partition(arr, low, high, strategy, sink)?;
    if pivot_index > low {
        quick_sort(arr, low, pivot_index - 1, strategy, sink)?;
    }
    quick_sort(arr, pivot_index + 1, high, strategy, sink)
}

fn choose_pivot(low: usize, high: usize, strategy: &str) -> usize {
    match strategy {
        "first" => low,
        "last" => high,
        _ => low + (high - low) / 2,
    }
}

/// Lomuto partition with the chosen pivot moved to `high` first.
fn partition(
    arr: &mut [i64],
    low: usize,
    high: usize,
    strategy: &str,
    sink: &mut dyn StepSink,
) -> Result<usize, ExecutionError> {
    let pivot_index = choose_pivot(low, high, strategy);
    let pivot = arr[pivot_index];

    sink.step(
        ExecutionStep::new(
            "select_pivot",
            json!({
                "array": arr,
                "pivot_index": pivot_index,
                "pivot_value": pivot,
                "low": low,
                "high": high,
            }),
        )
        .with_message(format!("Selected pivot: {pivot} at index {pivot_index}")),
    )?;

    arr.swap(pivot_index, high);
    // `store` is the next slot for an element <= pivot.
    let mut store = low;
    for j in low..high {
        sink.step(
            ExecutionStep::new(
                "compare_pivot",
                json!({
                    "array": arr,
                    "pivot_value": pivot,
                    "current": arr[j],
                    "j": j,
                    "i": store as i64 - 1,
                }),
            )
            .with_message(format!("Comparing {} with pivot {pivot}", arr[j])),
        )?;

        if arr[j] <= pivot {
            arr.swap(store, j);
            sink.step(
                ExecutionStep::new(
                    "swap_partition",
                    json!({
                        "array": arr,
                        "swapped": [store, j],
                        "pivot_value": pivot,
                        "i": store,
                        "j": j,
                    }),
                )
                .with_message(format!("Swapped {} and {}", arr[j], arr[store])),
            )?;
            store += 1;
        }
    }

    arr.swap(store, high);
    sink.step(
        ExecutionStep::new(
            "pivot_positioned",
            json!({
                "array": arr,
                "pivot_index": store,
                "pivot_value": pivot,
                "partitioned": true,
            }),
        )
        .with_message(format!("Pivot {pivot} positioned at index {store}")),
    )?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CollectingSink, raw_params};

    #[test]
    fn every_strategy_sorts() {
        let algo = QuickSort::new();
        for strategy in PIVOT_STRATEGIES {
            let params = algo
                .validate_parameters(&raw_params(json!({"pivot_strategy": strategy})))
                .expect("params");
            let mut sink = CollectingSink::default();
            let output = algo
                .execute(Some(&json!([9, -2, 7, 7, 0, 3])), &params, &mut sink)
                .expect("execute");
            assert_eq!(output, json!([-2, 0, 3, 7, 7, 9]), "strategy {strategy}");
        }
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = QuickSort::new()
            .validate_parameters(&raw_params(json!({"pivot_strategy": "random"})))
            .unwrap_err();
        assert_eq!(err.field, "pivot_strategy");
    }

    #[test]
    fn pivot_is_positioned_after_each_partition() {
        let algo = QuickSort::new();
        let params = algo.validate_parameters(&raw_params(json!({}))).expect("params");
        let mut sink = CollectingSink::default();
        algo.execute(Some(&json!([3, 1, 2])), &params, &mut sink)
            .expect("execute");
        let selects = sink.actions().iter().filter(|a| **a == "select_pivot").count();
        let placed = sink
            .actions()
            .iter()
            .filter(|a| **a == "pivot_positioned")
            .count();
        assert_eq!(selects, placed);
        assert!(selects >= 1);
    }
}
