//! Model training module
//!
//! Provides the classifiers a pipeline can train and the pieces around them:
//! - Logistic regression (binary sigmoid or multinomial softmax, L2 penalty)
//! - CART decision tree classifier
//! - Seeded train/test split
//! - Accuracy, confusion matrix and feature importance ranking

mod engine;
mod models;
pub mod decision_tree;
pub mod linear_models;
pub mod metrics;
pub mod split;

pub use engine::{column_to_array1, columns_to_array2, ModelSpec, TrainedModel};
pub use models::{check_class_labels, unique_sorted, Classifier};
pub use decision_tree::{DecisionTree, TreeNode};
pub use linear_models::LogisticRegression;
pub use metrics::{accuracy, rank_feature_importance, ConfusionMatrix, FeatureImportance};
pub use split::{train_test_split, TestSize, TrainTestSplit};

/// Seed used for every randomized stage of a run
pub const RANDOM_STATE: u64 = 42;

/// Fraction of rows held out when no split step is given
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Iteration cap for the logistic regression solver
pub const LOGISTIC_MAX_ITER: usize = 1000;

/// Default inverse regularization strength
pub const DEFAULT_C: f64 = 1.0;
