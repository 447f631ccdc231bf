//! Data preprocessing module
//!
//! Dataframe-level transformations applied by pipeline steps:
//! - Missing value removal (rows or columns)
//! - Feature scaling (StandardScaler, MinMaxScaler with a target range)
//! - Categorical encoding (one-hot with the first level dropped, label encoding)

mod encoder;
mod nulls;
mod scaler;

pub use encoder::{Encoder, EncoderType, LabelEncoder, MISSING_LABEL};
pub use nulls::{drop_nulls, missing_mask, DropAxis};
pub use scaler::{Scaler, ScalerType};

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// How a column participates in preprocessing and training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Integer or floating point values
    Numeric,
    /// True/false values: passed through as 0/1 features but never scaled
    Boolean,
    /// Anything else, handled as text categories
    Categorical,
}

impl ColumnKind {
    /// Classify a polars data type
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
            | DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
            | DataType::Float32 | DataType::Float64 => ColumnKind::Numeric,
            DataType::Boolean => ColumnKind::Boolean,
            _ => ColumnKind::Categorical,
        }
    }
}

/// Names of the numeric columns, in frame order
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| ColumnKind::of(col.dtype()) == ColumnKind::Numeric)
        .map(|col| col.name().to_string())
        .collect()
}

/// Column values as `f64`; nulls and NaN become `None`
pub fn column_f64(column: &Column) -> Result<Vec<Option<f64>>> {
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    let values = series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Column values rendered as strings; nulls become `None`
pub fn column_strings(column: &Column) -> Result<Vec<Option<String>>> {
    let series = column.as_materialized_series().cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

/// Render a frame shape the way the run log reports it: `(rows, cols)`
pub fn format_shape(shape: (usize, usize)) -> String {
    format!("({}, {})", shape.0, shape.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_kind() {
        assert_eq!(ColumnKind::of(&DataType::Int64), ColumnKind::Numeric);
        assert_eq!(ColumnKind::of(&DataType::Float32), ColumnKind::Numeric);
        assert_eq!(ColumnKind::of(&DataType::Boolean), ColumnKind::Boolean);
        assert_eq!(ColumnKind::of(&DataType::String), ColumnKind::Categorical);
    }

    #[test]
    fn test_numeric_columns_keep_order() {
        let df = df!(
            "b" => &[1.0, 2.0],
            "name" => &["x", "y"],
            "a" => &[3i64, 4],
        )
        .unwrap();
        assert_eq!(numeric_columns(&df), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_column_f64_maps_nan_to_none() {
        let df = df!("a" => &[Some(1.0), None, Some(f64::NAN)]).unwrap();
        let values = column_f64(df.column("a").unwrap()).unwrap();
        assert_eq!(values, vec![Some(1.0), None, None]);
    }

    #[test]
    fn test_format_shape() {
        assert_eq!(format_shape((100, 5)), "(100, 5)");
    }
}
