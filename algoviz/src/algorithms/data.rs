//! Input data for the built-in algorithms.
//!
//! Generated data is deterministic: without a `seed` parameter the arrays come
//! out in a fixed arrangement, and with one they are shuffled by a seeded RNG.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::Value;

use crate::core::params::{Parameters, int_elements};
use crate::core::types::ParameterSpec;
use crate::executor::ExecutionError;

pub(crate) fn seed_param() -> ParameterSpec {
    ParameterSpec::optional_int(
        "seed",
        "Shuffle the generated array with this seed (ignored when input is supplied)",
    )
}

/// `1..=size`.
pub(crate) fn sequential(size: usize) -> Vec<i64> {
    (1..=size as i64).collect()
}

/// `(i % max_value) + 1` for each index.
pub(crate) fn cycled(size: usize, max_value: i64) -> Vec<i64> {
    let max_value = max_value.max(1);
    (0..size as i64).map(|i| (i % max_value) + 1).collect()
}

pub(crate) fn shuffle(values: &mut [i64], seed: i64) {
    let mut rng = StdRng::seed_from_u64(seed as u64);
    values.shuffle(&mut rng);
}

/// Use the caller's input array when present, otherwise generate one.
pub(crate) fn input_or_generated(
    input: Option<&Value>,
    params: &Parameters,
    generate: impl FnOnce() -> Vec<i64>,
) -> Result<Vec<i64>, ExecutionError> {
    match input {
        Some(value) if !value.is_null() => int_array(value),
        _ => {
            let mut values = generate();
            if let Some(seed) = params.int("seed") {
                shuffle(&mut values, seed);
            }
            Ok(values)
        }
    }
}

fn int_array(value: &Value) -> Result<Vec<i64>, ExecutionError> {
    let items = value.as_array().ok_or_else(|| {
        ExecutionError::InvalidInput("expected an array of integers".to_string())
    })?;
    int_elements(items).map_err(ExecutionError::InvalidInput)
}

/// Simple connected graph: node `i` links to `i-1`, `i+1` and `i+2`.
pub(crate) fn chain_graph(size: usize) -> Vec<Vec<usize>> {
    (0..size)
        .map(|i| {
            let mut neighbors = Vec::with_capacity(3);
            if i > 0 {
                neighbors.push(i - 1);
            }
            if i + 1 < size {
                neighbors.push(i + 1);
            }
            if i + 2 < size {
                neighbors.push(i + 2);
            }
            neighbors
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generated_arrays_are_deterministic() {
        assert_eq!(sequential(4), vec![1, 2, 3, 4]);
        assert_eq!(cycled(5, 3), vec![1, 2, 3, 1, 2]);

        let mut a = sequential(20);
        let mut b = sequential(20);
        shuffle(&mut a, 7);
        shuffle(&mut b, 7);
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, sequential(20));
    }

    #[test]
    fn input_array_takes_precedence() {
        let input = json!([3, 1, 2]);
        let values = input_or_generated(Some(&input), &Parameters::default(), || sequential(10))
            .expect("input");
        assert_eq!(values, vec![3, 1, 2]);
    }

    #[test]
    fn malformed_input_is_rejected() {
        let input = json!([1, "two"]);
        let err = input_or_generated(Some(&input), &Parameters::default(), Vec::new).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::InvalidInput("element 1 is not an integer".to_string())
        );
        let err = input_or_generated(Some(&json!({"a": 1})), &Parameters::default(), Vec::new)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidInput(_)));
    }

    #[test]
    fn chain_graph_links_forward_and_back() {
        let graph = chain_graph(4);
        assert_eq!(graph[0], vec![1, 2]);
        assert_eq!(graph[1], vec![0, 2, 3]);
        assert_eq!(graph[3], vec![2]);
    }
}
