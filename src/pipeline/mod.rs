//! Pipeline execution
//!
//! A pipeline is a flat, ordered list of typed steps applied to one uploaded
//! dataset. Data steps (`drop_nulls`, `standard_scaler`, `min_max_scaler`)
//! transform the working frame in the order given; `train_test_split` only
//! records the held-out fraction; the first model step
//! (`logistic_regression`, `decision_tree_classifier`) triggers training on
//! the final frame, with the last column as the target.
//!
//! # Example
//!
//! ```no_run
//! use ml_builder::pipeline::{ExecutorConfig, PipelineExecutor, PipelineRequest, PipelineStep};
//!
//! let executor = PipelineExecutor::new(ExecutorConfig::new("uploads", "generated_models"));
//! let request = PipelineRequest::new(
//!     "iris.csv",
//!     vec![
//!         PipelineStep::new("1", "drop_nulls"),
//!         PipelineStep::new("2", "standard_scaler"),
//!         PipelineStep::new("3", "logistic_regression").with_param("C", 1.0),
//!     ],
//! );
//! let result = executor.run(&request);
//! for line in &result.logs {
//!     println!("{}", line);
//! }
//! ```

mod executor;
mod log;
mod params;
mod step;

pub use executor::{ExecutorConfig, PipelineExecutor};
pub use log::{accuracy_percent, py_float, py_list, round_to, RunLog};
pub use params::{
    parse_axis, parse_c, parse_feature_range, parse_max_depth, parse_test_size, Parsed,
    StepParams, DEFAULT_FEATURE_RANGE,
};
pub use step::{PipelineRequest, PipelineResult, PipelineStep, StepKind};
