//! Searching algorithms. Each reports whether the target was found and how.

mod binary_search;
mod graph_search;
mod hash_lookup;
mod linear_search;

pub use binary_search::BinarySearch;
pub use graph_search::GraphSearch;
pub use hash_lookup::HashLookup;
pub use linear_search::LinearSearch;
