//! Dataset summary returned after an upload

use crate::error::Result;
use crate::pipeline::round_to;
use crate::preprocessing::{column_f64, column_strings, numeric_columns, MISSING_LABEL};
use crate::training::RANDOM_STATE;
use polars::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

/// Rows shown in the preview
pub const PREVIEW_ROWS: usize = 5;
/// Most frequent target values reported
pub const TOP_VALUES: usize = 10;
/// Points sampled for the scatter plot
pub const SCATTER_POINTS: usize = 300;

/// Value counts of the target (last) column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub target_column: String,
    pub data: Map<String, Value>,
}

/// Pearson correlation matrix of the numeric columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlations {
    pub labels: Vec<String>,
    /// `None` where a correlation is undefined (constant column)
    pub data: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub class: String,
}

/// Shape, preview and display statistics of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub filename: String,
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub preview: Vec<Map<String, Value>>,
    pub distributions: Option<Distribution>,
    pub correlations: Option<Correlations>,
    pub scatter_data: Option<Vec<ScatterPoint>>,
}

impl DatasetProfile {
    /// Profile a loaded frame. Each statistic is computed independently;
    /// one that fails is reported as `None`.
    pub fn from_frame(filename: impl Into<String>, df: &DataFrame) -> Result<Self> {
        let filename = filename.into();
        let column_names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        let preview = preview_records(df, PREVIEW_ROWS)?;

        let target = column_names.last().cloned();
        let numeric = numeric_columns(df);

        let distributions = target
            .as_deref()
            .and_then(|target| best_effort("distributions", value_counts(df, target, TOP_VALUES)));
        let correlations = if numeric.len() >= 2 {
            best_effort("correlations", correlation_matrix(df, &numeric))
        } else {
            None
        };
        let scatter_data = match (&target, numeric.as_slice()) {
            (Some(target), [x, y, ..]) => {
                best_effort("scatter_data", scatter_sample(df, x, y, target, SCATTER_POINTS))
            }
            _ => None,
        };

        Ok(Self {
            filename,
            rows: df.height(),
            columns: df.width(),
            column_names,
            preview,
            distributions,
            correlations,
            scatter_data,
        })
    }
}

fn best_effort<T>(what: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(statistic = what, error = %e, "Skipping dataset statistic");
            None
        }
    }
}

/// First `n` rows as JSON records; missing cells are `null`
pub fn preview_records(df: &DataFrame, n: usize) -> Result<Vec<Map<String, Value>>> {
    let head = df.head(Some(n));
    let mut records = vec![Map::new(); head.height()];

    for column in head.get_columns() {
        let series = column.as_materialized_series();
        for (row, record) in records.iter_mut().enumerate() {
            let value = any_value_to_json(series.get(row)?);
            record.insert(column.name().to_string(), value);
        }
    }
    Ok(records)
}

fn any_value_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float_to_json(v as f64),
        AnyValue::Float64(v) => float_to_json(v),
        other => Value::String(other.to_string()),
    }
}

fn float_to_json(v: f64) -> Value {
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}

/// Most frequent values, descending; equal counts keep first-seen order
fn value_counts(df: &DataFrame, column: &str, top: usize) -> Result<Distribution> {
    let values = column_strings(df.column(column)?)?;

    let mut order: Vec<(String, u64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for value in values.into_iter().flatten() {
        match index.get(&value) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(value.clone(), order.len());
                order.push((value, 1));
            }
        }
    }
    order.sort_by(|a, b| b.1.cmp(&a.1));

    let data = order
        .into_iter()
        .take(top)
        .map(|(value, count)| (value, Value::from(count)))
        .collect();

    Ok(Distribution {
        target_column: column.to_string(),
        data,
    })
}

/// Pairwise-complete Pearson correlations, rounded to 2 decimals
fn correlation_matrix(df: &DataFrame, columns: &[String]) -> Result<Correlations> {
    let data: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|name| column_f64(df.column(name)?))
        .collect::<Result<_>>()?;

    let k = columns.len();
    let mut matrix = vec![vec![None; k]; k];
    for i in 0..k {
        for j in i..k {
            let r = pearson(&data[i], &data[j]).map(|r| round_to(r, 2));
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    Ok(Correlations {
        labels: columns.to_vec(),
        data: matrix,
    })
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        None
    } else {
        Some((cov / denom).clamp(-1.0, 1.0))
    }
}

/// Up to `max_points` rows sampled with the fixed seed; missing coordinates are 0
fn scatter_sample(
    df: &DataFrame,
    x: &str,
    y: &str,
    target: &str,
    max_points: usize,
) -> Result<Vec<ScatterPoint>> {
    let xs = column_f64(df.column(x)?)?;
    let ys = column_f64(df.column(y)?)?;
    let classes = column_strings(df.column(target)?)?;

    let n = df.height();
    let mut rng = ChaCha8Rng::seed_from_u64(RANDOM_STATE);
    let rows = rand::seq::index::sample(&mut rng, n, max_points.min(n));

    Ok(rows
        .into_iter()
        .map(|row| ScatterPoint {
            x: xs[row].unwrap_or(0.0),
            y: ys[row].unwrap_or(0.0),
            class: classes[row].clone().unwrap_or_else(|| MISSING_LABEL.to_string()),
        })
        .collect())
}
