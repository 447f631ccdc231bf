//! Missing value removal

use crate::error::{BuilderError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Which dimension `drop_nulls` removes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropAxis {
    /// Drop every row holding at least one missing value
    Rows,
    /// Drop every column holding at least one missing value
    Columns,
}

impl DropAxis {
    /// Map the numeric `axis` convention (0 = rows, 1 = columns)
    pub fn from_index(axis: i64) -> Option<Self> {
        match axis {
            0 => Some(DropAxis::Rows),
            1 => Some(DropAxis::Columns),
            _ => None,
        }
    }
}

/// Per-row missing flags for a column. Floating point NaN counts as missing.
pub fn missing_mask(column: &Column) -> Result<Vec<bool>> {
    let series = column.as_materialized_series();
    match series.dtype() {
        DataType::Float32 | DataType::Float64 => {
            let floats = series.cast(&DataType::Float64)?;
            Ok(floats
                .f64()?
                .into_iter()
                .map(|v| v.map_or(true, |x| x.is_nan()))
                .collect())
        }
        _ => Ok(series.is_null().into_iter().map(|v| v.unwrap_or(true)).collect()),
    }
}

/// Remove rows (or columns) that contain missing values
pub fn drop_nulls(df: &DataFrame, axis: DropAxis) -> Result<DataFrame> {
    match axis {
        DropAxis::Rows => {
            let mut keep = vec![true; df.height()];
            for column in df.get_columns() {
                let mask = missing_mask(column)?;
                if mask.len() != keep.len() {
                    return Err(BuilderError::ShapeError {
                        expected: format!("{} rows", keep.len()),
                        actual: format!("{} rows in '{}'", mask.len(), column.name()),
                    });
                }
                for (k, missing) in keep.iter_mut().zip(mask) {
                    *k &= !missing;
                }
            }
            let keep = BooleanChunked::from_slice("keep".into(), &keep);
            Ok(df.filter(&keep)?)
        }
        DropAxis::Columns => {
            let mut kept = Vec::with_capacity(df.width());
            for column in df.get_columns() {
                if !missing_mask(column)?.into_iter().any(|m| m) {
                    kept.push(column.name().to_string());
                }
            }
            Ok(df.select(kept)?)
        }
    }
}
