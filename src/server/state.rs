//! Application state shared across handlers

use crate::config::AppConfig;
use crate::data::DatasetLoader;
use crate::pipeline::PipelineExecutor;
use crate::store::ModelStore;

/// Runs share no mutable state; handlers only need the configured
/// directories and an executor over them.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub executor: PipelineExecutor,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let executor = PipelineExecutor::new(config.executor_config());
        Self { config, executor }
    }

    pub fn loader(&self) -> &DatasetLoader {
        self.executor.loader()
    }

    pub fn store(&self) -> &ModelStore {
        self.executor.store()
    }
}
