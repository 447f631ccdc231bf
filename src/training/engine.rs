//! Model construction and the trained-model container

use crate::error::{BuilderError, Result};
use super::decision_tree::DecisionTree;
use super::linear_models::LogisticRegression;
use super::models::{check_class_labels, Classifier};
use super::{LOGISTIC_MAX_ITER, RANDOM_STATE};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Which model to fit, with its hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelSpec {
    LogisticRegression { c: f64 },
    DecisionTreeClassifier { max_depth: Option<usize> },
}

impl ModelSpec {
    /// Human-readable model name
    pub fn label(&self) -> &'static str {
        match self {
            ModelSpec::LogisticRegression { .. } => "Logistic Regression",
            ModelSpec::DecisionTreeClassifier { .. } => "Decision Tree Classifier",
        }
    }

    /// Unfitted model with the fixed seed and iteration cap
    pub fn build(&self) -> TrainedModel {
        match self {
            ModelSpec::LogisticRegression { c } => TrainedModel::LogisticRegression(
                LogisticRegression::new()
                    .with_c(*c)
                    .with_max_iter(LOGISTIC_MAX_ITER)
                    .with_random_state(RANDOM_STATE),
            ),
            ModelSpec::DecisionTreeClassifier { max_depth } => TrainedModel::DecisionTreeClassifier(
                DecisionTree::new()
                    .with_max_depth(*max_depth)
                    .with_random_state(RANDOM_STATE),
            ),
        }
    }
}

/// Enum to hold trained model variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    LogisticRegression(LogisticRegression),
    DecisionTreeClassifier(DecisionTree),
}

impl TrainedModel {
    fn classifier(&self) -> &dyn Classifier {
        match self {
            TrainedModel::LogisticRegression(m) => m,
            TrainedModel::DecisionTreeClassifier(m) => m,
        }
    }

    fn classifier_mut(&mut self) -> &mut dyn Classifier {
        match self {
            TrainedModel::LogisticRegression(m) => m,
            TrainedModel::DecisionTreeClassifier(m) => m,
        }
    }

    /// Fit on integral class labels
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_class_labels(y)?;
        self.classifier_mut().fit(x, y)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.classifier().predict(x)
    }

    /// Tree: impurity-based importances. Linear: mean |coef| over classes.
    pub fn feature_importances(&self) -> Result<Array1<f64>> {
        self.classifier().feature_importances()
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrainedModel::LogisticRegression(_) => "Logistic Regression",
            TrainedModel::DecisionTreeClassifier(_) => "Decision Tree Classifier",
        }
    }
}

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
///
/// Numeric and boolean columns are cast to `f64`. A missing value or NaN
/// is an error: the classifiers cannot fit on it.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| column_to_vec(df, col_name))
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

/// One numeric column as an `Array1<f64>`, same missing-value rules as
/// [`columns_to_array2`]
pub fn column_to_array1(df: &DataFrame, col_name: &str) -> Result<Array1<f64>> {
    column_to_vec(df, col_name).map(Array1::from)
}

fn column_to_vec(df: &DataFrame, col_name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(col_name)
        .map_err(|_| BuilderError::FeatureNotFound(col_name.to_string()))?;
    let series = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| BuilderError::DataError(e.to_string()))?;

    series
        .f64()
        .map_err(|e| BuilderError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| match v {
            Some(x) if !x.is_nan() => Ok(x),
            _ => Err(BuilderError::DataError(format!(
                "Input contains NaN (column '{}')",
                col_name
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_columns_to_array2() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0],
            "b" => &[4i64, 5, 6],
            "flag" => &[true, false, true],
        )
        .unwrap();
        let names = vec!["a".to_string(), "b".to_string(), "flag".to_string()];
        let x = columns_to_array2(&df, &names).unwrap();
        assert_eq!(x, array![[1.0, 4.0, 1.0], [2.0, 5.0, 0.0], [3.0, 6.0, 1.0]]);
    }

    #[test]
    fn test_missing_value_is_an_error() {
        let df = df!("a" => &[Some(1.0), None]).unwrap();
        let err = columns_to_array2(&df, &["a".to_string()]).unwrap_err();
        assert!(err.to_string().contains("NaN"));
    }

    #[test]
    fn test_unknown_column() {
        let df = df!("a" => &[1.0]).unwrap();
        assert!(matches!(
            column_to_array1(&df, "zzz"),
            Err(BuilderError::FeatureNotFound(_))
        ));
    }

    #[test]
    fn test_spec_builds_configured_models() {
        let model = ModelSpec::LogisticRegression { c: 0.5 }.build();
        match model {
            TrainedModel::LogisticRegression(m) => {
                assert_eq!(m.c, 0.5);
                assert_eq!(m.max_iter, LOGISTIC_MAX_ITER);
            }
            other => panic!("unexpected model {}", other.label()),
        }

        let spec = ModelSpec::DecisionTreeClassifier { max_depth: Some(3) };
        assert_eq!(spec.label(), "Decision Tree Classifier");
        assert!(matches!(spec.build(), TrainedModel::DecisionTreeClassifier(_)));
    }

    #[test]
    fn test_fit_rejects_continuous_target() {
        let mut model = ModelSpec::DecisionTreeClassifier { max_depth: None }.build();
        let x = array![[1.0], [2.0]];
        let y = array![0.5, 1.5];
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn test_fit_predict_importances() {
        let mut model = ModelSpec::DecisionTreeClassifier { max_depth: None }.build();
        let x = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
        let importances = model.feature_importances().unwrap();
        assert!((importances[0] - 1.0).abs() < 1e-12);
    }
}
