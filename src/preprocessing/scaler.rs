//! Feature scaling implementations

use crate::error::{BuilderError, Result};
use super::column_f64;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling into `[lo, hi]`: (x - min) / (max - min) * (hi - lo) + lo
    MinMax { lo: f64, hi: f64 },
}

impl ScalerType {
    /// Min-max scaling into the unit interval
    pub fn unit_min_max() -> Self {
        ScalerType::MinMax { lo: 0.0, hi: 1.0 }
    }
}

/// Parameters for a fitted column
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: f64,    // mean or min
    scale: f64,     // std or range
}

/// Feature scaler.
///
/// Statistics are computed jointly over the fitted columns but per column,
/// ignoring missing values. Missing values stay missing after `transform`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: Vec<(String, ScalerParams)>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: Vec::new(),
            is_fitted: false,
        }
    }

    /// Scaler type
    pub fn scaler_type(&self) -> &ScalerType {
        &self.scaler_type
    }

    /// Fit the scaler to the given columns
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        if let ScalerType::MinMax { lo, hi } = self.scaler_type {
            if !(lo < hi) {
                return Err(BuilderError::PreprocessingError(format!(
                    "Minimum of desired feature range must be smaller than maximum, got ({}, {})",
                    lo, hi
                )));
            }
        }

        self.params.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| BuilderError::FeatureNotFound(col_name.to_string()))?;
            let values: Vec<f64> = column_f64(column)?.into_iter().flatten().collect();
            let params = self.compute_params(&values);
            self.params.push((col_name.to_string(), params));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data, replacing the fitted columns in place
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(BuilderError::ModelNotFitted);
        }

        // Build all scaled columns first, then swap them in
        let replacements: Vec<Series> = self
            .params
            .iter()
            .map(|(col_name, params)| {
                let column = df
                    .column(col_name)
                    .map_err(|_| BuilderError::FeatureNotFound(col_name.clone()))?;
                self.scale_column(column, params)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result.with_column(scaled)?;
        }
        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    fn compute_params(&self, values: &[f64]) -> ScalerParams {
        if values.is_empty() {
            return ScalerParams { center: 0.0, scale: 1.0 };
        }

        match self.scaler_type {
            ScalerType::Standard => {
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                // Population variance (ddof = 0)
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                }
            }
            ScalerType::MinMax { .. } => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let range = max - min;
                ScalerParams {
                    center: min,
                    scale: if range == 0.0 { 1.0 } else { range },
                }
            }
        }
    }

    fn scale_column(&self, column: &Column, params: &ScalerParams) -> Result<Series> {
        let (span, offset) = match self.scaler_type {
            ScalerType::Standard => (1.0, 0.0),
            ScalerType::MinMax { lo, hi } => (hi - lo, lo),
        };

        let scaled: Float64Chunked = column_f64(column)?
            .into_iter()
            .map(|opt| opt.map(|v| (v - params.center) / params.scale * span + offset))
            .collect();

        Ok(scaled.with_name(column.name().clone()).into_series())
    }
}
