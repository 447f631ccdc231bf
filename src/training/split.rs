//! Seeded train/test splitting

use crate::error::{BuilderError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of the held-out test set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TestSize {
    /// Fraction of rows in `(0, 1)`
    Fraction(f64),
    /// Absolute number of rows
    Count(usize),
}

impl TestSize {
    /// Number of test rows for a dataset of `n_samples` rows
    pub fn n_test(&self, n_samples: usize) -> usize {
        match *self {
            TestSize::Fraction(f) => (f * n_samples as f64).ceil() as usize,
            TestSize::Count(c) => c,
        }
    }
}

impl fmt::Display for TestSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestSize::Fraction(v) => write!(f, "{}", crate::pipeline::py_float(*v)),
            TestSize::Count(c) => write!(f, "{}", c),
        }
    }
}

/// Result of [`train_test_split`]
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Shuffle the rows with a seeded RNG and hold out the first `n_test` of them.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_size: TestSize,
    seed: u64,
) -> Result<TrainTestSplit> {
    let n_samples = x.nrows();
    if n_samples != y.len() {
        return Err(BuilderError::ShapeError {
            expected: format!("{} target values", n_samples),
            actual: format!("{} target values", y.len()),
        });
    }

    let n_test = test_size.n_test(n_samples);
    if n_test == 0 || n_test >= n_samples {
        return Err(BuilderError::InvalidInput(format!(
            "With n_samples={}, test_size={} the resulting train set or test set is empty",
            n_samples, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), train_idx),
        x_test: x.select(Axis(0), test_idx),
        y_train: y.select(Axis(0), train_idx),
        y_test: y.select(Axis(0), test_idx),
    })
}
