//! Application configuration

use crate::pipeline::ExecutorConfig;
use std::path::PathBuf;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8000;

/// Default request body limit (100 MiB)
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 100 * 1024 * 1024;

/// Server and storage configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Where uploaded datasets are stored
    pub upload_dir: PathBuf,
    /// Where trained model artifacts are written
    pub models_dir: PathBuf,
    pub max_upload_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            models_dir: std::env::var("MODELS_DIR")
                .unwrap_or_else(|_| "generated_models".to_string())
                .into(),
            max_upload_size: std::env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),
        }
    }
}

impl AppConfig {
    /// Directories handed to the pipeline executor
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig::new(self.upload_dir.clone(), self.models_dir.clone())
    }

    /// `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        if std::env::var("API_PORT").is_err() {
            assert_eq!(config.port, 8000);
        }
        if std::env::var("MAX_UPLOAD_SIZE").is_err() {
            assert_eq!(config.max_upload_size, 100 * 1024 * 1024);
        }
    }

    #[test]
    fn test_executor_config_carries_directories() {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            upload_dir: "in".into(),
            models_dir: "out".into(),
            max_upload_size: 1024,
        };
        let exec = config.executor_config();
        assert_eq!(exec.upload_dir, PathBuf::from("in"));
        assert_eq!(exec.models_dir, PathBuf::from("out"));
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }
}
