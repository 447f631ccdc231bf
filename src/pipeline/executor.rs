//! Pipeline executor
//!
//! Runs one request end to end: load the dataset, apply the preprocessing
//! steps in the order given, then train and evaluate a model when a model
//! step is present. Every failure is reported through the returned
//! [`PipelineResult`] together with the log gathered up to that point.

use super::log::{accuracy_percent, py_list, round_to, RunLog};
use super::params::{Parsed, StepParams};
use super::step::{PipelineRequest, PipelineResult, PipelineStep, StepKind};
use crate::data::DatasetLoader;
use crate::error::{BuilderError, Result};
use crate::preprocessing::{
    drop_nulls, format_shape, numeric_columns, ColumnKind, DropAxis, Encoder, EncoderType,
    LabelEncoder, Scaler, ScalerType,
};
use crate::store::ModelStore;
use crate::training::{
    accuracy, column_to_array1, columns_to_array2, rank_feature_importance, train_test_split,
    ConfusionMatrix, TestSize, DEFAULT_TEST_SIZE, RANDOM_STATE,
};
use chrono::Local;
use ndarray::Array1;
use polars::prelude::*;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Directories the executor reads datasets from and writes artifacts to
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub upload_dir: PathBuf,
    pub models_dir: PathBuf,
}

impl ExecutorConfig {
    pub fn new(upload_dir: impl Into<PathBuf>, models_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            models_dir: models_dir.into(),
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::new("uploads", "generated_models")
    }
}

/// How a run that did not error ended
enum RunOutcome {
    Completed {
        metrics: Map<String, Value>,
        model_path: Option<String>,
    },
    /// No usable feature column was left for training
    TrainingFailed,
}

/// Interprets pipeline requests against the dataset and model directories
#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    loader: DatasetLoader,
    store: ModelStore,
}

impl PipelineExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            loader: DatasetLoader::new(config.upload_dir),
            store: ModelStore::new(config.models_dir),
        }
    }

    pub fn loader(&self) -> &DatasetLoader {
        &self.loader
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Run a pipeline. Never fails: errors become `success = false` results.
    pub fn run(&self, request: &PipelineRequest) -> PipelineResult {
        let start = Instant::now();
        let dataset = request.dataset_name.as_str();
        let mut log = RunLog::new();

        info!(dataset = %dataset, steps = request.steps.len(), "Starting pipeline run");

        let Some(path) = self.loader.resolve(dataset) else {
            warn!(dataset = %dataset, "Dataset not found");
            log.push(format!("Error: File '{}' not found in uploads.", dataset));
            return PipelineResult::failure("Dataset not found", log.into_entries());
        };

        match self.execute(request, &path, &mut log) {
            Ok(RunOutcome::Completed { mut metrics, model_path }) => {
                let duration = round_to(start.elapsed().as_secs_f64(), 2);
                metrics.insert("duration_seconds".to_string(), Value::from(duration));
                info!(
                    dataset = %dataset,
                    duration_secs = duration,
                    model_path = model_path.as_deref().unwrap_or("-"),
                    "Pipeline run completed"
                );
                PipelineResult {
                    success: true,
                    message: "Pipeline run successfully".to_string(),
                    metrics,
                    logs: log.into_entries(),
                    model_path,
                }
            }
            Ok(RunOutcome::TrainingFailed) => {
                warn!(dataset = %dataset, "Training failed: no feature columns");
                PipelineResult::failure("Training failed", log.into_entries())
            }
            Err(e) => {
                error!(dataset = %dataset, error = %e, "Pipeline failed");
                log.push(format!("Critical Error: {}", e));
                PipelineResult::failure("Pipeline failed", log.into_entries())
            }
        }
    }

    fn execute(&self, request: &PipelineRequest, path: &Path, log: &mut RunLog) -> Result<RunOutcome> {
        log.push(format!("Loading dataset '{}'...", request.dataset_name));
        let df = DatasetLoader::load(path)?;
        log.push(format!("Initial shape: {}", format_shape(df.shape())));

        let (df, test_size) = preprocess(df, &request.steps, log)?;

        match select_model_step(&request.steps, log) {
            Some((step, kind)) => self.train(&request.dataset_name, &df, step, kind, test_size, log),
            None => {
                log.push("No model step found. Preprocessing only.");
                let mut metrics = Map::new();
                metrics.insert("rows_processed".to_string(), Value::from(df.height()));
                metrics.insert("columns_processed".to_string(), Value::from(df.width()));
                Ok(RunOutcome::Completed {
                    metrics,
                    model_path: None,
                })
            }
        }
    }

    fn train(
        &self,
        dataset_name: &str,
        df: &DataFrame,
        step: &PipelineStep,
        kind: StepKind,
        test_size: TestSize,
        log: &mut RunLog,
    ) -> Result<RunOutcome> {
        let (spec, warnings) = match StepParams::parse(kind, &step.params) {
            StepParams::Model { spec, warnings } => (spec, warnings),
            _ => {
                return Err(BuilderError::InvalidInput(format!(
                    "'{}' is not a model step",
                    kind.as_str()
                )))
            }
        };

        log.push(format!("Preparing Model: {}...", spec.label()));
        for warning in warnings {
            warn!(step_id = %step.id, "{}", warning);
            log.push(warning);
        }

        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        let (target, feature_names) = names
            .split_last()
            .ok_or_else(|| BuilderError::DataError("Dataset has no columns".to_string()))?;

        let x_df = encode_features(df, feature_names, log)?;
        let feature_columns: Vec<String> = x_df.get_column_names().iter().map(|s| s.to_string()).collect();

        log.push(format!("Target Column: {}", target));
        log.push(format!("Feature Columns (Post-Encoding): {}", py_list(&feature_columns)));

        if feature_columns.is_empty() {
            log.push("Error: No numeric feature columns found/generated.");
            return Ok(RunOutcome::TrainingFailed);
        }

        let y = encode_target(df, target, log)?;
        let x = columns_to_array2(&x_df, &feature_columns)?;

        log.push(format!("Splitting data with test_size={}...", test_size));
        let split = train_test_split(&x, &y, test_size, RANDOM_STATE)?;
        log.push(format!("Train Set: {} samples", split.x_train.nrows()));
        log.push(format!("Test Set: {} samples", split.x_test.nrows()));

        let mut model = spec.build();
        log.push("Training model...");
        model.fit(&split.x_train, &split.y_train)?;

        log.push("Evaluating...");
        let y_pred = model.predict(&split.x_test)?;
        let acc = accuracy(&split.y_test, &y_pred)?;

        let mut metrics = Map::new();
        metrics.insert("Accuracy".to_string(), Value::from(accuracy_percent(acc)));
        metrics.insert("train_samples".to_string(), Value::from(split.x_train.nrows()));
        metrics.insert("test_samples".to_string(), Value::from(split.x_test.nrows()));
        log.push(format!("Training completed. Accuracy: {:.4}", acc));

        // Best effort from here on: failures are logged, not fatal
        match ConfusionMatrix::compute(&split.y_test, &y_pred) {
            Ok(cm) => {
                metrics.insert("confusion_matrix".to_string(), json!(cm.matrix));
                log.push(format!("Confusion Matrix calculated. Shape: {}", format_shape(cm.shape())));
            }
            Err(e) => {
                warn!(error = %e, "Confusion matrix failed");
                log.push(format!("Warning: Failed to calc confusion matrix: {}", e));
            }
        }

        let ranked = model
            .feature_importances()
            .and_then(|scores| rank_feature_importance(&feature_columns, &scores));
        match ranked {
            Ok(ranked) => {
                let entries: Vec<Value> = ranked
                    .iter()
                    .map(|f| json!({ "feature": f.feature, "importance": f.importance }))
                    .collect();
                metrics.insert("feature_importance".to_string(), Value::Array(entries));
                log.push("Feature importance calculated.");
            }
            Err(e) => {
                warn!(error = %e, "Feature importance failed");
                log.push(format!("Warning: Failed to calc feature importance: {}", e));
            }
        }

        let filename = ModelStore::artifact_name(dataset_name, Local::now());
        self.store.save(&filename, &model)?;
        log.push(format!("Model saved to {}", filename));

        Ok(RunOutcome::Completed {
            metrics,
            model_path: Some(filename),
        })
    }
}

/// Apply the data steps in order. Returns the transformed frame and the
/// test size requested by the last split step.
fn preprocess(mut df: DataFrame, steps: &[PipelineStep], log: &mut RunLog) -> Result<(DataFrame, TestSize)> {
    let mut test_size = TestSize::Fraction(DEFAULT_TEST_SIZE);

    for step in steps {
        let Some(kind) = step.kind() else {
            warn!(step_id = %step.id, step_type = %step.step_type, "Ignoring unknown step type");
            continue;
        };
        if kind.is_model() {
            continue;
        }

        debug!(step_id = %step.id, step = kind.as_str(), "Applying step");
        df = match StepParams::parse(kind, &step.params) {
            StepParams::DropNulls { axis } => apply_drop_nulls(df, axis, &step.id, log)?,
            StepParams::StandardScaler => apply_standard_scaler(df, log)?,
            StepParams::MinMaxScaler { feature_range } => {
                apply_min_max_scaler(df, feature_range, &step.id, log)?
            }
            StepParams::TrainTestSplit { test_size: parsed, raw } => {
                let shown = match parsed.warning {
                    Some(warning) => {
                        warn!(step_id = %step.id, "{}", warning);
                        log.push(warning);
                        parsed.value.to_string()
                    }
                    None => raw,
                };
                log.push(format!("Configuration: Train/Test Split set to {}", shown));
                test_size = parsed.value;
                df
            }
            StepParams::Model { .. } => df,
        };
    }

    Ok((df, test_size))
}

fn apply_drop_nulls(df: DataFrame, axis: Parsed<DropAxis>, step_id: &str, log: &mut RunLog) -> Result<DataFrame> {
    log.push("Applying Drop Missing Values...");
    if let Some(warning) = axis.warning {
        warn!(step_id = %step_id, "{}", warning);
        log.push(warning);
    }

    let before = df.shape();
    let df = drop_nulls(&df, axis.value)?;
    log.push(format!(
        "Dropped rows/cols. Shape: {} -> {}",
        format_shape(before),
        format_shape(df.shape())
    ));
    Ok(df)
}

fn apply_standard_scaler(df: DataFrame, log: &mut RunLog) -> Result<DataFrame> {
    log.push("Applying Standard Scaler...");
    let numeric = numeric_columns(&df);
    if numeric.is_empty() {
        log.push("Warning: No numeric columns to scale.");
        return Ok(df);
    }

    let columns: Vec<&str> = numeric.iter().map(String::as_str).collect();
    let scaled = Scaler::new(ScalerType::Standard).fit_transform(&df, &columns)?;
    log.push(format!("Scaled {} numeric columns.", numeric.len()));
    Ok(scaled)
}

fn apply_min_max_scaler(
    df: DataFrame,
    feature_range: Parsed<(i64, i64)>,
    step_id: &str,
    log: &mut RunLog,
) -> Result<DataFrame> {
    log.push("Applying MinMax Scaler...");
    let numeric = numeric_columns(&df);
    if numeric.is_empty() {
        log.push("Warning: No numeric columns to scale.");
        return Ok(df);
    }

    let (lo, hi) = feature_range.value;
    let columns: Vec<&str> = numeric.iter().map(String::as_str).collect();
    let scaled = Scaler::new(ScalerType::MinMax {
        lo: lo as f64,
        hi: hi as f64,
    })
    .fit_transform(&df, &columns)?;

    match feature_range.warning {
        Some(warning) => {
            warn!(step_id = %step_id, "{}", warning);
            log.push(warning);
        }
        None => log.push(format!(
            "Scaled {} numeric columns to range ({}, {}).",
            numeric.len(),
            lo,
            hi
        )),
    }
    Ok(scaled)
}

/// First model step in the list; extra model steps are reported and ignored
fn select_model_step<'a>(steps: &'a [PipelineStep], log: &mut RunLog) -> Option<(&'a PipelineStep, StepKind)> {
    let models: Vec<(&PipelineStep, StepKind)> = steps
        .iter()
        .filter_map(|step| step.kind().filter(StepKind::is_model).map(|kind| (step, kind)))
        .collect();

    let (step, kind) = *models.first()?;
    if models.len() > 1 {
        let message = format!(
            "Warning: {} model steps found; using '{}' (step {}), ignoring the rest.",
            models.len(),
            kind.as_str(),
            step.id
        );
        warn!(step_id = %step.id, count = models.len(), "Multiple model steps");
        log.push(message);
    }
    Some((step, kind))
}

/// One-hot encode the text feature columns (first level dropped); numeric
/// and boolean features pass through unchanged
fn encode_features(df: &DataFrame, feature_names: &[String], log: &mut RunLog) -> Result<DataFrame> {
    let features = df.select(feature_names.iter().map(String::as_str))?;

    let categorical: Vec<String> = features
        .get_columns()
        .iter()
        .filter(|col| ColumnKind::of(col.dtype()) == ColumnKind::Categorical)
        .map(|col| col.name().to_string())
        .collect();

    if categorical.is_empty() {
        return Ok(features);
    }

    log.push(format!("One-Hot Encoding categorical features: {}", py_list(&categorical)));
    let columns: Vec<&str> = categorical.iter().map(String::as_str).collect();
    Encoder::new(EncoderType::OneHot { drop_first: true }).fit_transform(&features, &columns)
}

/// Text targets become contiguous class indices; numeric targets are used as is
fn encode_target(df: &DataFrame, target: &str, log: &mut RunLog) -> Result<Array1<f64>> {
    let column = df.column(target)?;
    if ColumnKind::of(column.dtype()) != ColumnKind::Categorical {
        return column_to_array1(df, target);
    }

    let mut encoder = LabelEncoder::new();
    let encoded = encoder.fit_transform(column)?;
    log.push(format!(
        "Encoded target '{}' to integer classes: {}",
        target,
        py_list(encoder.classes())
    ));
    Ok(Array1::from(encoded))
}
