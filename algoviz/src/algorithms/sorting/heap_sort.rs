use serde_json::{Value, json};

use crate::algorithms::data::{input_or_generated, seed_param, sequential};
use crate::core::params::Parameters;
use crate::core::types::{AlgorithmDescriptor, Category, ExecutionStep, ParameterSpec};
use crate::executor::{ExecutionError, Executor, StepSink};

pub struct HeapSort {
    descriptor: AlgorithmDescriptor,
}

impl HeapSort {
    pub fn new() -> Self {
        let descriptor = AlgorithmDescriptor::new("heap_sort", "Heap Sort", Category::Sorting)
            .description(
                "A comparison-based sorting algorithm that builds a max heap and repeatedly \
                 extracts the maximum element.",
            )
            .big_o("Time: O(n log n), Space: O(1)")
            .param(
                ParameterSpec::int("array_size", "Size of the array to sort", 10)
                    .bounds(3, 100)
                    .required(),
            )
            .param(ParameterSpec::bool(
                "show_heap_structure",
                "Show heap structure steps in visualization",
                true,
            ))
            .param(seed_param());
        Self { descriptor }
    }
}

impl Default for HeapSort {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for HeapSort {
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
        let show = params.bool_or("show_heap_structure", true);

        sink.step(
            ExecutionStep::new(
                "initialize",
                json!({ "array": arr, "show_heap_structure": show }),
            )
            .with_message("Starting Heap Sort"),
        )?;

        let n = arr.len();
        sink.step(
            ExecutionStep::new("build_heap", json!({ "array": arr, "phase": "building" }))
                .with_message("Building max heap"),
        )?;
        for i in (0..n / 2).rev() {
            heapify(&mut arr, n, i, show, sink)?;
        }

        for end in (1..n).rev() {
            arr.swap(0, end);
            sink.step(
                ExecutionStep::new(
                    "extract_max",
                    json!({
                        "array": arr,
                        "extracted": arr[end],
                        "heap_size": end,
                        "remaining": &arr[..end],
                    }),
                )
                .with_message(format!("Extracted max element: {}", arr[end])),
            )?;
            heapify(&mut arr, end, 0, show, sink)?;
        }

        sink.emit(
            ExecutionStep::new("complete", json!({ "array": arr, "sorted": true }))
                .with_message("Heap Sort completed"),
        );
        Ok(json!(arr))
    }
}

/// Sift `root` down within the first `heap_size` elements.
fn heapify(
    arr: &mut [i64],
    heap_size: usize,
    root: usize,
    show: bool,
    sink: &mut dyn StepSink,
) -> Result<(), ExecutionError> {
    let mut parent = root;
    loop {
        let left = 2 * parent + 1;
        let right = 2 * parent + 2;
        if show {
            sink.step(
                ExecutionStep::new(
                    "heapify_check",
                    json!({
                        "array": arr,
                        "parent": parent,
                        "left_child": left,
                        "right_child": right,
                        "parent_value": arr[parent],
                        "heap_size": heap_size,
                    }),
                )
                .with_message(format!("Checking heap property at index {parent}")),
            )?;
        }

        let mut largest = parent;
        if left < heap_size && arr[left] > arr[largest] {
            largest = left;
        }
        if right < heap_size && arr[right] > arr[largest] {
            largest = right;
        }
        if largest == parent {
            return Ok(());
        }

        arr.swap(parent, largest);
        if show {
            sink.step(
                ExecutionStep::new(
                    "heapify_swap",
                    json!({
                        "array": arr,
                        "swapped": [parent, largest],
                        "parent": parent,
                        "largest": largest,
                        "heap_size": heap_size,
                    }),
                )
                .with_message(format!(
                    "Swapped {} and {} to maintain heap property",
                    arr[largest], arr[parent]
                )),
            )?;
        }
        parent = largest;
    }
}
