//! Depth-first and breadth-first search over a generated chain graph.
//!
//! Both traversals share one loop; they differ only in which end of the
//! frontier the next node is taken from.

use std::collections::VecDeque;

use serde_json::{Value, json};

use crate::algorithms::data::chain_graph;
use crate::core::params::{Parameters, RawParameters, ValidationError, resolve};
use crate::core::types::{AlgorithmDescriptor, Category, ExecutionStep, ParameterSpec};
use crate::executor::{ExecutionError, Executor, StepSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    DepthFirst,
    BreadthFirst,
}

impl Order {
    fn frontier_name(self) -> &'static str {
        match self {
            Order::DepthFirst => "stack",
            Order::BreadthFirst => "queue",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Order::DepthFirst => "DFS",
            Order::BreadthFirst => "BFS",
        }
    }

    fn next(self, frontier: &mut VecDeque<usize>) -> Option<usize> {
        match self {
            Order::DepthFirst => frontier.pop_back(),
            Order::BreadthFirst => frontier.pop_front(),
        }
    }
}

pub struct GraphSearch {
    descriptor: AlgorithmDescriptor,
    order: Order,
}

impl GraphSearch {
    pub fn depth_first() -> Self {
        let descriptor = AlgorithmDescriptor::new("dfs", "Depth-First Search", Category::Searching)
            .description(
                "A graph traversal algorithm that explores as far as possible along each branch \
                 before backtracking.",
            )
            .big_o("Time: O(V + E), Space: O(V)");
        Self {
            descriptor: with_graph_params(descriptor),
            order: Order::DepthFirst,
        }
    }

    pub fn breadth_first() -> Self {
        let descriptor =
            AlgorithmDescriptor::new("bfs", "Breadth-First Search", Category::Searching)
                .description(
                    "A graph traversal algorithm that explores all vertices at the present depth \
                     before moving on to vertices at the next depth level.",
                )
                .big_o("Time: O(V + E), Space: O(V)");
        Self {
            descriptor: with_graph_params(descriptor),
            order: Order::BreadthFirst,
        }
    }
}

fn with_graph_params(descriptor: AlgorithmDescriptor) -> AlgorithmDescriptor {
    descriptor
        .param(
            ParameterSpec::int("graph_size", "Number of nodes in the graph", 6)
                .bounds(3, 20)
                .required(),
        )
        .param(
            ParameterSpec::int("start_node", "Starting node for search", 0)
                .bounds(0, 19)
                .required(),
        )
        .param(
            ParameterSpec::int("target_node", "Target node to find", 5)
                .bounds(0, 19)
                .required(),
        )
}

impl Executor for GraphSearch {
    fn metadata(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn validate_parameters(&self, raw: &RawParameters) -> Result<Parameters, ValidationError> {
        let params = resolve(&self.descriptor, raw)?;
        let size = params.int_or("graph_size", 6);
        if params.int_or("start_node", 0) >= size {
            return Err(ValidationError::new(
                "start_node",
                format!("must be less than graph_size ({size})"),
            ));
        }
        Ok(params)
    }

    fn execute(
        &self,
        _input: Option<&Value>,
        params: &Parameters,
        sink: &mut dyn StepSink,
    ) -> Result<Value, ExecutionError> {
        let size = params.size_or("graph_size", 6);
        let start = params.size_or("start_node", 0);
        let target = params.size_or("target_node", 5);
        if start >= size {
            return Err(ExecutionError::InvalidInput(format!(
                "start node {start} is outside a graph of {size} nodes"
            )));
        }

        let graph = chain_graph(size);
        let frontier_name = self.order.frontier_name();
        let label = self.order.label();

        sink.step(
            ExecutionStep::new(
                "initialize",
                json!({ "graph": graph, "start_node": start, "target_node": target }),
            )
            .with_message(format!(
                "Starting {label} from node {start} to find node {target}"
            )),
        )?;

        let mut visited = vec![false; size];
        let mut frontier = VecDeque::from([start]);
        let mut path = Vec::new();

        while let Some(current) = self.order.next(&mut frontier) {
            if visited[current] {
                continue;
            }
            visited[current] = true;
            path.push(current);

            sink.step(
                ExecutionStep::new(
                    "visit_node",
                    json!({
                        "graph": graph,
                        "current": current,
                        "visited": visited,
                        frontier_name: frontier,
                        "path": path,
                        "target_node": target,
                    }),
                )
                .with_message(format!("Visiting node {current}")),
            )?;

            if current == target {
                sink.emit(
                    ExecutionStep::new(
                        "found",
                        json!({
                            "graph": graph,
                            "found_at": current,
                            "path": path,
                            "visited": visited,
                        }),
                    )
                    .with_message(format!("Target node {target} found! Path: {path:?}")),
                );
                return Ok(json!({
                    "found": true,
                    "target": target,
                    "path": path,
                    "visited": visited,
                }));
            }

            frontier.extend(graph[current].iter().copied().filter(|n| !visited[*n]));
            sink.step(
                ExecutionStep::new(
                    "add_neighbors",
                    json!({
                        "graph": graph,
                        "current": current,
                        "neighbors": graph[current],
                        frontier_name: frontier,
                        "visited": visited,
                    }),
                )
                .with_message(format!(
                    "Adding unvisited neighbors of {current} to {frontier_name}: {:?}",
                    graph[current]
                )),
            )?;
        }

        sink.emit(
            ExecutionStep::new(
                "not_found",
                json!({ "graph": graph, "visited": visited, "path": path }),
            )
            .with_message(format!("Target node {target} not found")),
        );
        Ok(json!({
            "found": false,
            "target": target,
            "path": path,
            "visited": visited,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CollectingSink, raw_params};

    fn run(algo: &GraphSearch, raw: Value) -> (Value, CollectingSink) {
        let params = algo.validate_parameters(&raw_params(raw)).expect("params");
        let mut sink = CollectingSink::default();
        let output = algo.execute(None, &params, &mut sink).expect("execute");
        (output, sink)
    }

    #[test]
    fn depth_first_follows_the_last_pushed_neighbor() {
        let (output, sink) = run(&GraphSearch::depth_first(), json!({}));
        assert_eq!(output["found"], json!(true));
        assert_eq!(output["path"], json!([0, 2, 4, 5]));
        assert!(sink.steps[1].data.contains_key("stack"));
    }

    #[test]
    fn breadth_first_visits_level_by_level() {
        let (output, sink) = run(&GraphSearch::breadth_first(), json!({}));
        assert_eq!(output["path"], json!([0, 1, 2, 3, 4, 5]));
        assert!(sink.steps[1].data.contains_key("queue"));
        assert_eq!(sink.actions().last(), Some(&"found"));
    }

    #[test]
    fn unreachable_target_is_not_found() {
        let (output, sink) = run(
            &GraphSearch::breadth_first(),
            json!({"graph_size": 4, "target_node": 9}),
        );
        assert_eq!(output["found"], json!(false));
        assert_eq!(output["visited"], json!([true, true, true, true]));
        assert_eq!(sink.actions().last(), Some(&"not_found"));
    }

    #[test]
    fn start_outside_graph_is_rejected() {
        let err = GraphSearch::depth_first()
            .validate_parameters(&raw_params(json!({"graph_size": 4, "start_node": 4})))
            .unwrap_err();
        assert_eq!(err.field, "start_node");
    }

    #[test]
    fn caller_input_is_refused() {
        for algo in [GraphSearch::depth_first(), GraphSearch::breadth_first()] {
            let err = algo.validate_input(Some(&json!([1, 2, 3]))).unwrap_err();
            assert_eq!(err.field, "input");
            assert!(algo.validate_input(None).is_ok());
            assert!(algo.validate_input(Some(&Value::Null)).is_ok());
        }
    }
}
