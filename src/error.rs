//! Error types for the pipeline engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, BuilderError>;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Model artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Evaluation error: {0}")]
    EvaluationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<polars::error::PolarsError> for BuilderError {
    fn from(err: polars::error::PolarsError) -> Self {
        BuilderError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for BuilderError {
    fn from(err: serde_json::Error) -> Self {
        BuilderError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for BuilderError {
    fn from(err: bincode::Error) -> Self {
        BuilderError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for BuilderError {
    fn from(err: ndarray::ShapeError) -> Self {
        BuilderError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
