//! Typed parsing of the free-form step parameters
//!
//! Every parameter parses to a [`Parsed`] value: either what the caller
//! asked for, or a default plus the log line explaining the fallback.

use super::log::py_float;
use super::step::StepKind;
use crate::preprocessing::DropAxis;
use crate::training::{ModelSpec, TestSize, DEFAULT_C, DEFAULT_TEST_SIZE};
use serde_json::{Map, Value};

/// Target range used when `feature_range` is absent or malformed
pub const DEFAULT_FEATURE_RANGE: (i64, i64) = (0, 1);

/// A parameter value, with the log line to emit when a default was substituted
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub warning: Option<String>,
}

impl<T> Parsed<T> {
    pub fn ok(value: T) -> Self {
        Self { value, warning: None }
    }

    pub fn fallback(value: T, warning: impl Into<String>) -> Self {
        Self {
            value,
            warning: Some(warning.into()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.warning.is_some()
    }
}

/// Parameters of a recognized step, typed per step kind
#[derive(Debug, Clone, PartialEq)]
pub enum StepParams {
    DropNulls { axis: Parsed<DropAxis> },
    StandardScaler,
    MinMaxScaler { feature_range: Parsed<(i64, i64)> },
    /// `raw` is the requested value as the caller wrote it
    TrainTestSplit { test_size: Parsed<TestSize>, raw: String },
    Model { spec: ModelSpec, warnings: Vec<String> },
}

impl StepParams {
    pub fn parse(kind: StepKind, params: &Map<String, Value>) -> Self {
        match kind {
            StepKind::DropNulls => StepParams::DropNulls {
                axis: parse_axis(params.get("axis")),
            },
            StepKind::StandardScaler => StepParams::StandardScaler,
            StepKind::MinMaxScaler => StepParams::MinMaxScaler {
                feature_range: parse_feature_range(params.get("feature_range")),
            },
            StepKind::TrainTestSplit => {
                let value = params.get("test_size");
                StepParams::TrainTestSplit {
                    test_size: parse_test_size(value),
                    raw: value.map_or_else(|| py_float(DEFAULT_TEST_SIZE), render_raw),
                }
            }
            StepKind::LogisticRegression => {
                let c = parse_c(params.get("C"));
                StepParams::Model {
                    spec: ModelSpec::LogisticRegression { c: c.value },
                    warnings: c.warning.into_iter().collect(),
                }
            }
            StepKind::DecisionTreeClassifier => {
                let max_depth = parse_max_depth(params.get("max_depth"));
                StepParams::Model {
                    spec: ModelSpec::DecisionTreeClassifier { max_depth: max_depth.value },
                    warnings: max_depth.warning.into_iter().collect(),
                }
            }
        }
    }
}

/// `axis`: 0 / 1 as a number or string, default rows
pub fn parse_axis(value: Option<&Value>) -> Parsed<DropAxis> {
    let index = match value {
        None | Some(Value::Null) => return Parsed::ok(DropAxis::Rows),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => match s.trim() {
            "index" | "rows" => Some(0),
            "columns" => Some(1),
            other => other.parse::<i64>().ok(),
        },
        Some(_) => None,
    };

    match index.and_then(DropAxis::from_index) {
        Some(axis) => Parsed::ok(axis),
        None => Parsed::fallback(
            DropAxis::Rows,
            format!("Warning: Invalid axis {}, dropping rows (axis=0).", render_raw_opt(value)),
        ),
    }
}

/// `feature_range`: `"lo,hi"` with integer bounds and `lo < hi`
pub fn parse_feature_range(value: Option<&Value>) -> Parsed<(i64, i64)> {
    let text = match value {
        None | Some(Value::Null) => return Parsed::ok(DEFAULT_FEATURE_RANGE),
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return feature_range_fallback(),
    };

    let bounds: Vec<Option<i64>> = text.split(',').map(|part| part.trim().parse().ok()).collect();
    match bounds.as_slice() {
        [Some(lo), Some(hi)] if lo < hi => Parsed::ok((*lo, *hi)),
        _ => feature_range_fallback(),
    }
}

fn feature_range_fallback() -> Parsed<(i64, i64)> {
    Parsed::fallback(
        DEFAULT_FEATURE_RANGE,
        "Error parsing feature_range, using default (0, 1).",
    )
}

/// `test_size`: a fraction in `(0, 1)` or a whole row count `>= 1`
pub fn parse_test_size(value: Option<&Value>) -> Parsed<TestSize> {
    let default = TestSize::Fraction(DEFAULT_TEST_SIZE);
    let number = match value {
        None | Some(Value::Null) => return Parsed::ok(default),
        Some(v) => as_f64(v),
    };

    match number {
        Some(ts) if ts > 0.0 && ts < 1.0 => Parsed::ok(TestSize::Fraction(ts)),
        Some(ts) if ts >= 1.0 && ts.fract() == 0.0 => Parsed::ok(TestSize::Count(ts as usize)),
        _ => Parsed::fallback(
            default,
            format!(
                "Warning: Invalid test_size {}, using default {}.",
                render_raw_opt(value),
                py_float(DEFAULT_TEST_SIZE)
            ),
        ),
    }
}

/// `C`: a positive float
pub fn parse_c(value: Option<&Value>) -> Parsed<f64> {
    let number = match value {
        None | Some(Value::Null) => return Parsed::ok(DEFAULT_C),
        Some(v) => as_f64(v),
    };

    match number {
        Some(c) if c > 0.0 && c.is_finite() => Parsed::ok(c),
        _ => Parsed::fallback(
            DEFAULT_C,
            format!(
                "Warning: Invalid C {}, using default {}.",
                render_raw_opt(value),
                py_float(DEFAULT_C)
            ),
        ),
    }
}

/// `max_depth`: a positive integer; falsy values mean unbounded.
/// Fractional numbers truncate toward zero (`2.7` is depth 2).
pub fn parse_max_depth(value: Option<&Value>) -> Parsed<Option<usize>> {
    let depth = match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return Parsed::ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Parsed::ok(None),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => return Parsed::ok(None),
        Some(Value::Number(n)) => n.as_f64().filter(|d| d.is_finite()).map(f64::trunc),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok().map(|d| d as f64),
        Some(_) => None,
    };

    match depth {
        Some(d) if d == 0.0 => Parsed::ok(None),
        Some(d) if d > 0.0 => Parsed::ok(Some(d as usize)),
        _ => Parsed::fallback(
            None,
            format!("Warning: Invalid max_depth {}, growing an unbounded tree.", render_raw_opt(value)),
        ),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// A parameter as the caller wrote it: strings bare, numbers unchanged
pub fn render_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => n.as_f64().map_or_else(|| n.to_string(), py_float),
        other => other.to_string(),
    }
}

fn render_raw_opt(value: Option<&Value>) -> String {
    value.map_or_else(|| "None".to_string(), render_raw)
}
