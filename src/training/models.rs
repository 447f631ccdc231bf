//! Classifier trait and shared label helpers

use crate::error::{BuilderError, Result};
use ndarray::{Array1, Array2};
use std::cmp::Ordering;

/// Trait for the pipeline's classification models
pub trait Classifier: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict class labels
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// One non-negative score per input feature
    fn feature_importances(&self) -> Result<Array1<f64>>;
}

/// Distinct values of `y`, ascending
pub fn unique_sorted(y: &Array1<f64>) -> Vec<f64> {
    let mut classes: Vec<f64> = y.iter().copied().collect();
    classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    classes.dedup();
    classes
}

/// Reject targets that are not usable as class labels: missing values or
/// non-integral numbers (a continuous target).
pub fn check_class_labels(y: &Array1<f64>) -> Result<()> {
    if y.iter().any(|v| !v.is_finite()) {
        return Err(BuilderError::TrainingError(
            "Input y contains NaN".to_string(),
        ));
    }
    if y.iter().any(|v| v.fract() != 0.0) {
        return Err(BuilderError::TrainingError(
            "Unknown label type: continuous. Classification targets must be categorical or integral".to_string(),
        ));
    }
    Ok(())
}
