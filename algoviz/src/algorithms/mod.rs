//! Built-in algorithm executors.

use std::sync::Arc;

use crate::executor::Executor;

pub(crate) mod data;
pub mod searching;
pub mod sorting;

/// Every executor shipped with the crate, in registration order.
pub fn builtin() -> Vec<Arc<dyn Executor>> {
    vec![
        Arc::new(sorting::BubbleSort::new()),
        Arc::new(sorting::QuickSort::new()),
        Arc::new(sorting::MergeSort::new()),
        Arc::new(sorting::HeapSort::new()),
        Arc::new(sorting::CountingSort::new()),
        Arc::new(searching::LinearSearch::new()),
        Arc::new(searching::BinarySearch::new()),
        Arc::new(searching::GraphSearch::depth_first()),
        Arc::new(searching::GraphSearch::breadth_first()),
        Arc::new(searching::HashLookup::new()),
    ]
}
