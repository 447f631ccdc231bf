//! Dataset loading and profiling
//!
//! Uploaded datasets live as plain files in one directory. [`DatasetLoader`]
//! turns a stored file into a `DataFrame`; [`DatasetProfile`] summarises it
//! for display after an upload.

mod loader;
mod profile;

pub use loader::{is_safe_file_name, DataFormat, DatasetLoader, NULL_MARKERS};
pub use profile::{
    preview_records, Correlations, DatasetProfile, Distribution, ScatterPoint, PREVIEW_ROWS,
    SCATTER_POINTS, TOP_VALUES,
};
