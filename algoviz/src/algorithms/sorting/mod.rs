//! Sorting algorithms. Each one sorts ascending and returns the sorted array.

mod bubble_sort;
mod counting_sort;
mod heap_sort;
mod merge_sort;
mod quick_sort;

pub use bubble_sort::BubbleSort;
pub use counting_sort::CountingSort;
pub use heap_sort::HeapSort;
pub use merge_sort::MergeSort;
pub use quick_sort::QuickSort;
