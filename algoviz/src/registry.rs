//! Algorithm registry keyed by descriptor id.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::algorithms;
use crate::core::types::{AlgorithmDescriptor, Category};
use crate::executor::Executor;

/// Lookup table from algorithm id to executor.
///
/// Writes happen at startup; lookups take a shared read lock and never block
/// each other. Listings come back sorted by id.
#[derive(Default)]
pub struct Registry {
    executors: RwLock<BTreeMap<String, Arc<dyn Executor>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every built-in algorithm.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        for executor in algorithms::builtin() {
            registry.register(executor);
        }
        registry
    }

    /// Add an executor under its descriptor id, replacing any earlier one.
    pub fn register(&self, executor: Arc<dyn Executor>) {
        let id = executor.metadata().id.clone();
        if self.write().insert(id.clone(), executor).is_some() {
            warn!(algorithm_id = %id, "replacing previously registered algorithm");
        } else {
            debug!(algorithm_id = %id, "registered algorithm");
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Executor>> {
        self.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<AlgorithmDescriptor> {
        self.read()
            .values()
            .map(|executor| executor.metadata().clone())
            .collect()
    }

    pub fn list_by_category(&self, category: Category) -> Vec<AlgorithmDescriptor> {
        self.read()
            .values()
            .map(|executor| executor.metadata())
            .filter(|descriptor| descriptor.category == category)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Arc<dyn Executor>>> {
        self.executors
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Arc<dyn Executor>>> {
        self.executors
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedExecutor;

    #[test]
    fn builtin_bubble_sort_is_a_sorting_algorithm() {
        let registry = Registry::with_builtin();
        let executor = registry.get("bubble_sort").expect("bubble_sort registered");
        let descriptor = executor.metadata();
        assert_eq!(descriptor.category, Category::Sorting);
        assert!(!descriptor.parameters.is_empty());
    }

    #[test]
    fn listing_is_sorted_by_id() {
        let registry = Registry::with_builtin();
        let ids: Vec<String> = registry.list().into_iter().map(|d| d.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(ids.len(), registry.len());
    }

    #[test]
    fn list_by_category_filters() {
        let registry = Registry::with_builtin();
        let searching = registry.list_by_category(Category::Searching);
        assert_eq!(searching.len(), 5);
        assert!(searching.iter().all(|d| d.category == Category::Searching));
        assert!(registry.list_by_category(Category::Greedy).is_empty());

        registry.register(Arc::new(
            ScriptedExecutor::new("greedy_demo").with_category(Category::Greedy),
        ));
        let greedy = registry.list_by_category(Category::Greedy);
        assert_eq!(greedy.len(), 1);
        assert_eq!(greedy[0].id, "greedy_demo");
    }

    #[test]
    fn registering_twice_replaces() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(ScriptedExecutor::new("demo").with_steps(1)));
        registry.register(Arc::new(ScriptedExecutor::new("demo").with_steps(2)));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("missing").is_none());
    }
}
