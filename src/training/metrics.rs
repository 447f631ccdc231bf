//! Evaluation metrics for the classification branch

use crate::error::{BuilderError, Result};
use super::models::unique_sorted;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Fraction of matching predictions
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    if y_true.is_empty() {
        return Err(BuilderError::EvaluationError("Found empty input arrays".to_string()));
    }
    let correct = y_true.iter().zip(y_pred.iter()).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Confusion matrix; `matrix[i][j]` counts samples of class `labels[i]`
/// predicted as `labels[j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Sorted union of true and predicted labels
    pub labels: Vec<f64>,
    pub matrix: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        check_lengths(y_true, y_pred)?;

        let both: Array1<f64> = y_true.iter().chain(y_pred.iter()).copied().collect();
        let labels = unique_sorted(&both);
        let k = labels.len();
        let index_of = |v: f64| {
            labels
                .binary_search_by(|probe| probe.partial_cmp(&v).unwrap_or(Ordering::Less))
                .map_err(|_| BuilderError::EvaluationError(format!("Label {} is not in the label set", v)))
        };

        let mut matrix = vec![vec![0usize; k]; k];
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            matrix[index_of(*t)?][index_of(*p)?] += 1;
        }

        Ok(Self { labels, matrix })
    }

    /// `(k, k)`
    pub fn shape(&self) -> (usize, usize) {
        (self.labels.len(), self.labels.len())
    }
}

/// One feature's contribution score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Pair feature names with scores and sort by descending importance.
/// Equal scores keep their column order.
pub fn rank_feature_importance(
    feature_names: &[String],
    scores: &Array1<f64>,
) -> Result<Vec<FeatureImportance>> {
    if feature_names.len() != scores.len() {
        return Err(BuilderError::ShapeError {
            expected: format!("{} importance scores", feature_names.len()),
            actual: format!("{} importance scores", scores.len()),
        });
    }

    let mut ranked: Vec<FeatureImportance> = feature_names
        .iter()
        .zip(scores.iter())
        .map(|(name, score)| FeatureImportance {
            feature: name.clone(),
            importance: *score,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.partial_cmp(&a.importance).unwrap_or(Ordering::Equal));
    Ok(ranked)
}

fn check_lengths(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(BuilderError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    Ok(())
}
