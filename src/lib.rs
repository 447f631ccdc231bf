//! ML Builder - tabular pipeline engine
//!
//! Runs user-assembled pipelines of preprocessing and model-training steps
//! against uploaded datasets, returning metrics, an ordered log trail and a
//! persisted model artifact.
//!
//! # Modules
//!
//! - [`pipeline`] - Step types, parameter parsing and the executor
//! - [`preprocessing`] - Null dropping, scaling, categorical encoding
//! - [`training`] - Logistic regression, decision tree, split and metrics
//! - [`data`] - Dataset loading and upload profiles
//! - [`store`] - Model artifact persistence
//! - [`config`] - Environment-driven configuration
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Engine
pub mod pipeline;
pub mod preprocessing;
pub mod training;

// Collaborators
pub mod data;
pub mod store;
pub mod config;

// Services
pub mod server;
pub mod cli;

pub use error::{BuilderError, Result};
pub use pipeline::{ExecutorConfig, PipelineExecutor, PipelineRequest, PipelineResult, PipelineStep};
