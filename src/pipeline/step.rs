//! Request and result types exchanged with callers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One unit of pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStep {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl PipelineStep {
    pub fn new(id: impl Into<String>, step_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            step_type: step_type.into(),
            params: Map::new(),
        }
    }

    /// Builder-style parameter setter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Recognized kind, `None` for an unknown `type`
    pub fn kind(&self) -> Option<StepKind> {
        StepKind::parse(&self.step_type)
    }
}

/// A dataset name plus the ordered steps to run on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequest {
    #[serde(rename = "datasetName")]
    pub dataset_name: String,
    pub steps: Vec<PipelineStep>,
}

impl PipelineRequest {
    pub fn new(dataset_name: impl Into<String>, steps: Vec<PipelineStep>) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            steps,
        }
    }
}

/// Outcome of one run. Failures are reported here, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    pub message: String,
    pub metrics: Map<String, Value>,
    pub logs: Vec<String>,
    #[serde(default)]
    pub model_path: Option<String>,
}

impl PipelineResult {
    /// Failed run: empty metrics, the logs gathered so far, no artifact
    pub fn failure(message: impl Into<String>, logs: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            metrics: Map::new(),
            logs,
            model_path: None,
        }
    }
}

/// The closed set of step types the executor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    DropNulls,
    StandardScaler,
    MinMaxScaler,
    TrainTestSplit,
    LogisticRegression,
    DecisionTreeClassifier,
}

impl StepKind {
    pub const ALL: [StepKind; 6] = [
        StepKind::DropNulls,
        StepKind::StandardScaler,
        StepKind::MinMaxScaler,
        StepKind::TrainTestSplit,
        StepKind::LogisticRegression,
        StepKind::DecisionTreeClassifier,
    ];

    /// Wire name used in the step `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::DropNulls => "drop_nulls",
            StepKind::StandardScaler => "standard_scaler",
            StepKind::MinMaxScaler => "min_max_scaler",
            StepKind::TrainTestSplit => "train_test_split",
            StepKind::LogisticRegression => "logistic_regression",
            StepKind::DecisionTreeClassifier => "decision_tree_classifier",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == s)
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            StepKind::DropNulls => "Drop Missing Values",
            StepKind::StandardScaler => "Standard Scaler",
            StepKind::MinMaxScaler => "Min Max Scaler",
            StepKind::TrainTestSplit => "Train/Test Split",
            StepKind::LogisticRegression => "Logistic Regression",
            StepKind::DecisionTreeClassifier => "Decision Tree Classifier",
        }
    }

    /// Whether the step selects a model rather than transforming data
    pub fn is_model(&self) -> bool {
        matches!(self, StepKind::LogisticRegression | StepKind::DecisionTreeClassifier)
    }
}
