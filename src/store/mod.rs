//! Model artifact storage
//!
//! Artifacts are write-once files in a single directory, named after the
//! dataset and the time they were trained, holding the bincode encoding of
//! a [`TrainedModel`].

use crate::data::is_safe_file_name;
use crate::error::{BuilderError, Result};
use crate::training::TrainedModel;
use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Artifact file extension
pub const ARTIFACT_EXTENSION: &str = "pkl";

#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `model_<dataset>_<YYYYmmdd_HHMMSS>.pkl`
    pub fn artifact_name(dataset_name: &str, trained_at: DateTime<Local>) -> String {
        format!(
            "model_{}_{}.{}",
            dataset_name,
            trained_at.format("%Y%m%d_%H%M%S"),
            ARTIFACT_EXTENSION
        )
    }

    /// Location of an artifact; names with separators or `..` are rejected
    pub fn path_for(&self, filename: &str) -> Result<PathBuf> {
        if !is_safe_file_name(filename) {
            return Err(BuilderError::InvalidInput(format!(
                "Invalid model file name '{}'",
                filename
            )));
        }
        Ok(self.root.join(filename))
    }

    /// Serialize a fitted model to `filename`, creating the directory if needed
    pub fn save(&self, filename: &str, model: &TrainedModel) -> Result<PathBuf> {
        let path = self.path_for(filename)?;
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }

        let bytes = bincode::serialize(model).map_err(|e| {
            BuilderError::SerializationError(format!("Failed to serialize model: {}", e))
        })?;

        let mut file = File::create(&path)?;
        file.write_all(&bytes)?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Model artifact written");
        Ok(path)
    }

    /// Read back a stored model
    pub fn load(&self, filename: &str) -> Result<TrainedModel> {
        let bytes = self.read_bytes(filename)?;
        bincode::deserialize(&bytes).map_err(|e| {
            BuilderError::SerializationError(format!("Failed to deserialize model: {}", e))
        })
    }

    /// Raw artifact bytes, for download
    pub fn read_bytes(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.path_for(filename)?;
        if !path.is_file() {
            return Err(BuilderError::ArtifactNotFound(filename.to_string()));
        }

        let mut file = File::open(&path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.path_for(filename).map_or(false, |path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::ModelSpec;
    use chrono::TimeZone;
    use ndarray::array;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).single().unwrap();
        assert_eq!(
            ModelStore::artifact_name("iris.csv", at),
            "model_iris.csv_20240309_140507.pkl"
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path().join("models"));

        let mut model = ModelSpec::DecisionTreeClassifier { max_depth: Some(2) }.build();
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        model.fit(&x, &y).unwrap();

        store.save("m.pkl", &model).unwrap();
        assert!(store.exists("m.pkl"));

        let loaded = store.load("m.pkl").unwrap();
        assert_eq!(loaded.predict(&x).unwrap(), y);
        assert!(!store.read_bytes("m.pkl").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_unsafe_names() {
        let store = ModelStore::new("models");
        assert!(store.path_for("../x.pkl").is_err());
        assert!(store.read_bytes("a/b.pkl").is_err());
        assert!(!store.exists("../x.pkl"));
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path());
        assert!(matches!(
            store.read_bytes("absent.pkl"),
            Err(BuilderError::ArtifactNotFound(_))
        ));
    }
}
