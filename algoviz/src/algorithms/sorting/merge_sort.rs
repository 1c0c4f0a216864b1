use serde_json::{Value, json};

use crate::algorithms::data::{input_or_generated, seed_param, sequential};
use crate::core::params::Parameters;
use crate::core::types::{AlgorithmDescriptor, Category, ExecutionStep, ParameterSpec};
use crate::executor::{ExecutionError, Executor, StepSink};

pub struct MergeSort {
    descriptor: AlgorithmDescriptor,
}

impl MergeSort {
    pub fn new() -> Self {
        let descriptor = AlgorithmDescriptor::new("merge_sort", "Merge Sort", Category::Sorting)
            .description(
                "A divide-and-conquer algorithm that divides the array into two halves, sorts \
                 them separately, and then merges them back together.",
            )
            .big_o("Time: O(n log n), Space: O(n)")
            .param(
                ParameterSpec::int("array_size", "Size of the array to sort", 10)
                    .bounds(3, 100)
                    .required(),
            )
            .param(ParameterSpec::bool(
                "show_divisions",
                "Show division steps in visualization",
                true,
            ))
            .param(seed_param());
        Self { descriptor }
    }
}

impl Default for MergeSort {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for MergeSort {
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
        let show_divisions = params.bool_or("show_divisions", true);

        sink.step(
            ExecutionStep::new(
                "initialize",
                json!({ "array": arr, "show_divisions": show_divisions }),
            )
            .with_message("Starting Merge Sort"),
        )?;

        if arr.len() > 1 {
            let right = arr.len() - 1;
            merge_sort(&mut arr, 0, right, show_divisions, sink)?;
        }

        sink.emit(
            ExecutionStep::new("complete", json!({ "array": arr, "sorted": true }))
                .with_message("Merge Sort completed"),
        );
        Ok(json!(arr))
    }
}

fn merge_sort(
    arr: &mut [i64],
    left: usize,
    right: usize,
    show_divisions: bool,
    sink: &mut dyn StepSink,
) -> Result<(), ExecutionError> {
    if left >= right {
        return Ok(());
    }
    let mid = left + (right - left) / 2;

    if show_divisions {
        sink.step(
            ExecutionStep::new(
                "divide",
                json!({
                    "array": arr,
                    "left": left,
                    "mid": mid,
                    "right": right,
                    "left_array": &arr[left..=mid],
                    "right_array": &arr[mid + 1..=right],
                }),
            )
            .with_message(format!("Dividing array from index {left} to {right}")),
        )?;
    }

    merge_sort(arr, left, mid, show_divisions, sink)?;
    merge_sort(arr, mid + 1, right, show_divisions, sink)?;

    sink.step(
        ExecutionStep::new(
            "merge",
            json!({
                "array": arr,
                "left": left,
                "mid": mid,
                "right": right,
                "left_array": &arr[left..=mid],
                "right_array": &arr[mid + 1..=right],
            }),
        )
        .with_message(format!("Merging sorted halves from {left} to {right}")),
    )?;
    merge(arr, left, mid, right, sink)
}

fn merge(
    arr: &mut [i64],
    left: usize,
    mid: usize,
    right: usize,
    sink: &mut dyn StepSink,
) -> Result<(), ExecutionError> {
    let left_half = arr[left..=mid].to_vec();
    let right_half = arr[mid + 1..=right].to_vec();
    let (mut i, mut j, mut k) = (0, 0, left);

    while i < left_half.len() && j < right_half.len() {
        sink.step(
            ExecutionStep::new(
                "compare_merge",
                json!({
                    "array": arr,
                    "left_value": left_half[i],
                    "right_value": right_half[j],
                    "left_index": i,
                    "right_index": j,
                    "target_index": k,
                }),
            )
            .with_message(format!(
                "Comparing {} and {} for merge",
                left_half[i], right_half[j]
            )),
        )?;

        if left_half[i] <= right_half[j] {
            arr[k] = left_half[i];
            i += 1;
        } else {
            arr[k] = right_half[j];
            j += 1;
        }
        k += 1;
    }

    for &value in left_half[i..].iter().chain(&right_half[j..]) {
        arr[k] = value;
        k += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CollectingSink, raw_params};

    #[test]
    fn sorts_with_duplicates() {
        let algo = MergeSort::new();
        let params = algo.validate_parameters(&raw_params(json!({}))).expect("params");
        let mut sink = CollectingSink::default();
        let output = algo
            .execute(Some(&json!([5, 3, 5, 1, 4, 1])), &params, &mut sink)
            .expect("execute");

        assert_eq!(output, json!([1, 1, 3, 4, 5, 5]));
        assert_eq!(sink.actions().last(), Some(&"complete"));
        assert!(sink.actions().contains(&"compare_merge"));
    }

    #[test]
    fn hiding_divisions_omits_divide_steps() {
        let algo = MergeSort::new();
        let params = algo
            .validate_parameters(&raw_params(json!({"show_divisions": false, "seed": 3})))
            .expect("params");
        let mut sink = CollectingSink::default();
        algo.execute(None, &params, &mut sink).expect("execute");
        assert!(!sink.actions().contains(&"divide"));
        assert!(sink.actions().contains(&"merge"));
    }
}
