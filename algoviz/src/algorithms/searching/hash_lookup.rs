use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Value, json};

use crate::core::params::Parameters;
use crate::core::types::{AlgorithmDescriptor, Category, ExecutionStep, ParameterSpec};
use crate::executor::{ExecutionError, Executor, StepSink};

/// Number of sample entries available to seed the table.
const SAMPLE_ENTRIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Entry {
    key: String,
    value: String,
}

/// Separate-chaining table keyed by bucket index.
type Table = BTreeMap<usize, Vec<Entry>>;

pub struct HashLookup {
    descriptor: AlgorithmDescriptor,
}

impl HashLookup {
    pub fn new() -> Self {
        let descriptor =
            AlgorithmDescriptor::new("hash_lookup", "Hash Lookup", Category::Searching)
                .description(
                    "A search algorithm that uses a hash table to achieve O(1) average time \
                     complexity for lookups.",
                )
                .big_o("Time: O(1) average, O(n) worst case, Space: O(n)")
                .param(
                    ParameterSpec::int("table_size", "Size of the hash table", 10)
                        .bounds(5, 50)
                        .required(),
                )
                .param(ParameterSpec::string("key", "Key to search for", "key5").required());
        Self { descriptor }
    }
}

impl Default for HashLookup {
    fn default() -> Self {
        Self::new()
    }
}

/// Sum of the key's code points, reduced modulo `table_size` as it goes.
fn bucket_index(key: &str, table_size: usize) -> usize {
    key.chars()
        .fold(0, |hash, c| (hash + c as usize) % table_size)
}

/// `key1..keyN` mapped to `value1..valueN`, where `N = min(table_size, 10)`.
fn sample_table(table_size: usize) -> Table {
    let mut table = Table::new();
    for i in 1..=table_size.min(SAMPLE_ENTRIES) {
        let key = format!("key{i}");
        table
            .entry(bucket_index(&key, table_size))
            .or_default()
            .push(Entry {
                key,
                value: format!("value{i}"),
            });
    }
    table
}

impl Executor for HashLookup {
    fn metadata(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        _input: Option<&Value>,
        params: &Parameters,
        sink: &mut dyn StepSink,
    ) -> Result<Value, ExecutionError> {
        let table_size = params.size_or("table_size", 10);
        if table_size == 0 {
            return Err(ExecutionError::InvalidInput(
                "table size must be positive".to_string(),
            ));
        }
        let key = params.str_or("key", "key5");
        let table = sample_table(table_size);

        sink.step(
            ExecutionStep::new(
                "initialize",
                json!({ "hash_table": table, "key": key, "table_size": table_size }),
            )
            .with_message(format!("Starting Hash Lookup for key: {key}")),
        )?;

        let hash = bucket_index(key, table_size);
        sink.step(
            ExecutionStep::new(
                "calculate_hash",
                json!({
                    "hash_table": table,
                    "key": key,
                    "hash": hash,
                    "table_size": table_size,
                }),
            )
            .with_message(format!("Calculated hash for key '{key}': {hash}")),
        )?;

        if let Some(bucket) = table.get(&hash) {
            sink.step(
                ExecutionStep::new(
                    "check_bucket",
                    json!({ "hash_table": table, "key": key, "hash": hash, "bucket": bucket }),
                )
                .with_message(format!("Checking bucket at index {hash}")),
            )?;

            for (index, entry) in bucket.iter().enumerate() {
                sink.step(
                    ExecutionStep::new(
                        "check_entry",
                        json!({
                            "hash_table": table,
                            "key": key,
                            "hash": hash,
                            "bucket": bucket,
                            "entry": entry,
                            "index": index,
                        }),
                    )
                    .with_message(format!("Checking entry {index} in bucket: {}", entry.key)),
                )?;

                if entry.key == key {
                    sink.emit(
                        ExecutionStep::new(
                            "found",
                            json!({
                                "hash_table": table,
                                "key": key,
                                "hash": hash,
                                "value": entry.value,
                                "bucket": bucket,
                            }),
                        )
                        .with_message(format!("Key '{key}' found with value: {}", entry.value)),
                    );
                    return Ok(json!({
                        "found": true,
                        "key": key,
                        "value": entry.value,
                        "hash": hash,
                        "collisions": bucket.len() - 1,
                    }));
                }
            }
        }

        sink.emit(
            ExecutionStep::new(
                "not_found",
                json!({ "hash_table": table, "key": key, "hash": hash }),
            )
            .with_message(format!("Key '{key}' not found in hash table")),
        );
        Ok(json!({ "found": false, "key": key, "value": null, "hash": hash }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CollectingSink, raw_params};

    #[test]
    fn bucket_index_sums_code_points() {
        // 'k' + 'e' + 'y' + '5' = 107 + 101 + 121 + 53 = 382
        assert_eq!(bucket_index("key5", 10), 2);
        assert_eq!(bucket_index("key5", 7), 382 % 7);
    }

    #[test]
    fn table_holds_at_most_ten_samples() {
        let entries: usize = sample_table(50).values().map(Vec::len).sum();
        assert_eq!(entries, 10);
        let entries: usize = sample_table(6).values().map(Vec::len).sum();
        assert_eq!(entries, 6);
    }

    #[test]
    fn finds_default_key() {
        let algo = HashLookup::new();
        let params = algo.validate_parameters(&raw_params(json!({}))).expect("params");
        let mut sink = CollectingSink::default();
        let output = algo.execute(None, &params, &mut sink).expect("execute");

        assert_eq!(output["found"], json!(true));
        assert_eq!(output["value"], json!("value5"));
        assert_eq!(output["hash"], json!(2));
        assert_eq!(&sink.actions()[..3], &["initialize", "calculate_hash", "check_bucket"]);
        assert_eq!(sink.actions().last(), Some(&"found"));
    }

    #[test]
    fn missing_key_is_not_found() {
        let algo = HashLookup::new();
        let params = algo
            .validate_parameters(&raw_params(json!({"key": "nope", "table_size": 5})))
            .expect("params");
        let mut sink = CollectingSink::default();
        let output = algo.execute(None, &params, &mut sink).expect("execute");

        assert_eq!(output["found"], json!(false));
        assert_eq!(output["value"], Value::Null);
        assert_eq!(sink.actions().last(), Some(&"not_found"));
    }

    #[test]
    fn caller_input_is_refused() {
        let err = HashLookup::new()
            .validate_input(Some(&json!(["key1"])))
            .unwrap_err();
        assert_eq!(err.field, "input");
        assert_eq!(err.reason, "hash_lookup does not accept caller input");
    }
}
