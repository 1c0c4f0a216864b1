//! Typed algorithm parameters and the validation boundary.
//!
//! Raw request parameters arrive as an untyped JSON object. [`resolve`]
//! converts them into [`Parameters`], a map of tagged [`ParamValue`]s that has
//! been kind-checked and bounds-checked against the algorithm's descriptor and
//! filled with defaults. Nothing untyped crosses this boundary.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::types::{AlgorithmDescriptor, ParamKind, ParameterSpec};

/// Raw, unvalidated parameters as received on the wire.
pub type RawParameters = Map<String, Value>;

/// A parameter rejected at the validation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid parameter `{field}`: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A kind-tagged parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Array(Vec<ParamValue>),
}

impl ParamValue {
    /// Convert a JSON value. `null` maps to `None` (treated as absent).
    fn from_json(value: &Value) -> Result<Option<ParamValue>, String> {
        let converted = match value {
            Value::Null => return Ok(None),
            Value::Bool(b) => ParamValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ParamValue::Int(i),
                None => ParamValue::Float(
                    n.as_f64()
                        .ok_or_else(|| format!("number {n} is not representable"))?,
                ),
            },
            Value::String(s) => ParamValue::String(s.clone()),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match ParamValue::from_json(item)? {
                        Some(v) => out.push(v),
                        None => return Err("array elements must not be null".to_string()),
                    }
                }
                ParamValue::Array(out)
            }
            Value::Object(_) => return Err("objects are not supported".to_string()),
        };
        Ok(Some(converted))
    }

    fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::String(_) => "string",
            ParamValue::Bool(_) => "bool",
            ParamValue::Array(_) => "array",
        }
    }

    /// Check the value against `kind`, widening `int` to `float` where needed.
    fn coerce(self, kind: ParamKind) -> Result<ParamValue, String> {
        match (kind, self) {
            (ParamKind::Int, v @ ParamValue::Int(_)) => Ok(v),
            (ParamKind::Float, v @ ParamValue::Float(_)) => Ok(v),
            (ParamKind::Float, ParamValue::Int(i)) => Ok(ParamValue::Float(i as f64)),
            (ParamKind::String, v @ ParamValue::String(_)) => Ok(v),
            (ParamKind::Bool, v @ ParamValue::Bool(_)) => Ok(v),
            (ParamKind::Array, v @ ParamValue::Array(_)) => Ok(v),
            (kind, other) => Err(format!(
                "expected {}, got {}",
                kind_label(kind),
                other.kind_name()
            )),
        }
    }
}

fn kind_label(kind: ParamKind) -> &'static str {
    match kind {
        ParamKind::Int => "int",
        ParamKind::Float => "float",
        ParamKind::String => "string",
        ParamKind::Bool => "bool",
        ParamKind::Array => "array",
    }
}

/// Parameters that passed the validation boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Parameters {
    values: BTreeMap<String, ParamValue>,
}

impl Parameters {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ParamValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn int_or(&self, name: &str, default: i64) -> i64 {
        self.int(name).unwrap_or(default)
    }

    /// Integer parameter used as a size or index; negative values read as 0.
    pub fn size_or(&self, name: &str, default: usize) -> usize {
        self.int(name)
            .map_or(default, |value| usize::try_from(value).unwrap_or(0))
    }

    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        match self.values.get(name) {
            Some(ParamValue::Bool(b)) => *b,
            _ => default,
        }
    }

    pub fn str_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        match self.values.get(name) {
            Some(ParamValue::String(s)) => s.as_str(),
            _ => default,
        }
    }
}

/// Resolve raw parameters against a descriptor.
///
/// Rejects unknown names, wrong kinds, out-of-range values and missing
/// required parameters without a default. Absent optional parameters take
/// their declared default; parameters with no default stay absent.
pub fn resolve(
    descriptor: &AlgorithmDescriptor,
    raw: &RawParameters,
) -> Result<Parameters, ValidationError> {
    if let Some(unknown) = raw.keys().find(|name| descriptor.parameter(name).is_none()) {
        return Err(ValidationError::new(unknown.as_str(), "unknown parameter"));
    }

    let mut values = BTreeMap::new();
    for spec in &descriptor.parameters {
        let supplied = match raw.get(&spec.name) {
            Some(value) => ParamValue::from_json(value)
                .map_err(|reason| ValidationError::new(&spec.name, reason))?,
            None => None,
        };
        let value = match supplied {
            Some(value) => {
                let value = value
                    .coerce(spec.kind)
                    .map_err(|reason| ValidationError::new(&spec.name, reason))?;
                check_bounds(spec, &value)?;
                value
            }
            None => match &spec.default {
                Some(default) => default.clone(),
                None if spec.required => {
                    return Err(ValidationError::new(&spec.name, "required parameter missing"));
                }
                None => continue,
            },
        };
        values.insert(spec.name.clone(), value);
    }
    Ok(Parameters { values })
}

/// Check a caller-supplied input array against the descriptor's
/// `array_size` bounds and return its elements.
///
/// Absent or `null` input resolves to `None`. The length is checked before
/// any element is looked at.
pub fn resolve_array_input(
    descriptor: &AlgorithmDescriptor,
    input: Option<&Value>,
) -> Result<Option<Vec<i64>>, ValidationError> {
    let Some(value) = input.filter(|value| !value.is_null()) else {
        return Ok(None);
    };
    let items = value
        .as_array()
        .ok_or_else(|| ValidationError::new("input", "expected an array of integers"))?;

    let (min, max) = descriptor
        .parameter("array_size")
        .map_or((0, i64::MAX), |spec| {
            (spec.min.unwrap_or(0), spec.max.unwrap_or(i64::MAX))
        });
    let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
    if !(min..=max).contains(&len) {
        return Err(ValidationError::new(
            "input",
            format!("must hold between {min} and {max} elements, got {len}"),
        ));
    }

    int_elements(items)
        .map(Some)
        .map_err(|reason| ValidationError::new("input", reason))
}

/// Elements of a JSON array as integers, naming the first one that is not.
pub fn int_elements(items: &[Value]) -> Result<Vec<i64>, String> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_i64()
                .ok_or_else(|| format!("element {index} is not an integer"))
        })
        .collect()
}

fn check_bounds(spec: &ParameterSpec, value: &ParamValue) -> Result<(), ValidationError> {
    let measured = match value {
        ParamValue::Int(i) => *i as f64,
        ParamValue::Float(f) => *f,
        ParamValue::Array(items) => items.len() as f64,
        ParamValue::String(_) | ParamValue::Bool(_) => return Ok(()),
    };
    let below = spec.min.is_some_and(|min| measured < min as f64);
    let above = spec.max.is_some_and(|max| measured > max as f64);
    if below || above {
        let reason = match (spec.min, spec.max) {
            (Some(min), Some(max)) => format!("must be between {min} and {max}"),
            (Some(min), None) => format!("must be at least {min}"),
            (None, max) => format!("must be at most {}", max.unwrap_or(i64::MAX)),
        };
        return Err(ValidationError::new(&spec.name, reason));
    }
    Ok(())
}
