//! Shared descriptive types for algorithms and their executions.
//!
//! These types define stable wire contracts: descriptors are served as-is by
//! the HTTP layer and steps are embedded verbatim in broadcast envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::params::ParamValue;

/// Fixed algorithm taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sorting,
    Searching,
    GraphsTrees,
    Pathfinding,
    DynamicProgramming,
    Greedy,
    Strings,
    NumberTheory,
    Randomized,
    Optimization,
}

/// Display metadata for one taxonomy entry.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    pub id: Category,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Sorting,
        Category::Searching,
        Category::GraphsTrees,
        Category::Pathfinding,
        Category::DynamicProgramming,
        Category::Greedy,
        Category::Strings,
        Category::NumberTheory,
        Category::Randomized,
        Category::Optimization,
    ];

    pub fn info(self) -> CategoryInfo {
        let (name, description, icon) = match self {
            Category::Sorting => ("Sorting", "Algorithms for sorting data structures", "🔢"),
            Category::Searching => ("Searching", "Algorithms for searching data", "🔎"),
            Category::GraphsTrees => ("Graphs & Trees", "Graph and tree algorithms", "🌳"),
            Category::Pathfinding => (
                "Pathfinding",
                "Pathfinding and shortest path algorithms",
                "🛣️",
            ),
            Category::DynamicProgramming => (
                "Dynamic Programming",
                "Dynamic programming algorithms",
                "🧮",
            ),
            Category::Greedy => ("Greedy Algorithms", "Greedy optimization algorithms", "💰"),
            Category::Strings => ("String Algorithms", "String processing algorithms", "🧩"),
            Category::NumberTheory => (
                "Number Theory",
                "Mathematical and number theory algorithms",
                "🔐",
            ),
            Category::Randomized => (
                "Randomized",
                "Randomized and probabilistic algorithms",
                "🎲",
            ),
            Category::Optimization => (
                "Optimization",
                "Optimization and flow algorithms",
                "⚙️",
            ),
        };
        CategoryInfo {
            id: self,
            name,
            description,
            icon,
        }
    }
}

/// Value kind a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Int,
    Float,
    String,
    Bool,
    Array,
}

/// Declared shape of one algorithm parameter.
///
/// Bounds apply to the numeric value for `int`/`float` and to the element
/// count for `array`; they are ignored for other kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    pub description: String,
    pub default: Option<ParamValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    pub required: bool,
}

impl ParameterSpec {
    fn new(name: &str, kind: ParamKind, description: &str, default: Option<ParamValue>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            default,
            min: None,
            max: None,
            required: false,
        }
    }

    pub fn int(name: &str, description: &str, default: i64) -> Self {
        Self::new(name, ParamKind::Int, description, Some(ParamValue::Int(default)))
    }

    /// Integer parameter with no default; absent means "not set".
    pub fn optional_int(name: &str, description: &str) -> Self {
        Self::new(name, ParamKind::Int, description, None)
    }

    pub fn bool(name: &str, description: &str, default: bool) -> Self {
        Self::new(name, ParamKind::Bool, description, Some(ParamValue::Bool(default)))
    }

    pub fn string(name: &str, description: &str, default: &str) -> Self {
        Self::new(
            name,
            ParamKind::String,
            description,
            Some(ParamValue::String(default.to_string())),
        )
    }

    pub fn bounds(mut self, min: i64, max: i64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Immutable metadata describing one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmDescriptor {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub description: String,
    pub big_o: String,
    pub parameters: Vec<ParameterSpec>,
}

impl AlgorithmDescriptor {
    pub fn new(id: &str, name: &str, category: Category) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            description: String::new(),
            big_o: String::new(),
            parameters: Vec::new(),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn big_o(mut self, big_o: &str) -> Self {
        self.big_o = big_o.to_string();
        self
    }

    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|spec| spec.name == name)
    }
}

/// One visualizable state transition.
///
/// `step_number` is stamped by the orchestrator from arrival order; values set
/// by an algorithm body are overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub step_number: u64,
    pub action: String,
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionStep {
    /// Build a step from an action tag and a JSON object payload.
    ///
    /// A non-object payload is stored under the `value` key.
    pub fn new(action: impl Into<String>, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self {
            step_number: 0,
            action: action.into(),
            data,
            message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Lifecycle state of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Error,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}
