//! Decision tree classifier (CART, Gini impurity)

use crate::error::{BuilderError, Result};
use super::models::{unique_sorted, Classifier};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Values closer than this are treated as equal when placing thresholds
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with the predicted class label
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Candidate split found for one feature
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth (unbounded when `None`)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Seed for the feature scan order
    pub random_state: Option<u64>,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
    /// Sorted class labels
    classes: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    /// Create a new classifier tree
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            random_state: None,
            n_features: 0,
            feature_importances: None,
            classes: Vec::new(),
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the seed for the feature scan order
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(BuilderError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(BuilderError::TrainingError(
                "Cannot fit a decision tree on zero samples".to_string(),
            ));
        }

        self.n_features = n_features;
        self.classes = unique_sorted(y);

        let y_idx: Vec<usize> = y
            .iter()
            .map(|v| self.class_index(*v))
            .collect::<Result<_>>()?;

        let mut feature_order: Vec<usize> = (0..n_features).collect();
        if let Some(seed) = self.random_state {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            feature_order.shuffle(&mut rng);
        }

        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        let root = self.build_tree(x, &y_idx, &indices, 0, &feature_order, &mut importances);
        self.root = Some(root);

        // Normalize feature importances
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn class_index(&self, label: f64) -> Result<usize> {
        self.classes
            .binary_search_by(|c| c.partial_cmp(&label).unwrap_or(Ordering::Less))
            .map_err(|_| BuilderError::TrainingError(format!("Unknown class label {}", label)))
    }

    fn class_counts(&self, y_idx: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &i in indices {
            counts[y_idx[i]] += 1;
        }
        counts
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y_idx: &[usize],
        indices: &[usize],
        depth: usize,
        feature_order: &[usize],
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = self.class_counts(y_idx, indices);
        let impurity = gini(&counts, n_samples);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity <= 0.0;

        if should_stop {
            return self.leaf(&counts, n_samples);
        }

        let Some(best) = self.find_best_split(x, y_idx, indices, impurity, feature_order) else {
            return self.leaf(&counts, n_samples);
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        let left_counts = self.class_counts(y_idx, &left_indices);
        let right_counts = self.class_counts(y_idx, &right_indices);
        importances[best.feature_idx] += n_samples as f64 * impurity
            - left_indices.len() as f64 * gini(&left_counts, left_indices.len())
            - right_indices.len() as f64 * gini(&right_counts, right_indices.len());

        let left = Box::new(self.build_tree(x, y_idx, &left_indices, depth + 1, feature_order, importances));
        let right = Box::new(self.build_tree(x, y_idx, &right_indices, depth + 1, feature_order, importances));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    /// Majority class; ties go to the smallest label
    fn leaf(&self, counts: &[usize], n_samples: usize) -> TreeNode {
        let mut best = 0;
        for (idx, &count) in counts.iter().enumerate() {
            if count > counts[best] {
                best = idx;
            }
        }
        TreeNode::Leaf {
            value: self.classes.get(best).copied().unwrap_or(0.0),
            n_samples,
        }
    }

    /// Scan features in parallel; each sorts its values once and sweeps the
    /// candidate thresholds while moving samples from right to left.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y_idx: &[usize],
        indices: &[usize],
        parent_impurity: f64,
        feature_order: &[usize],
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let n_classes = self.classes.len();
        let total_counts = self.class_counts(y_idx, indices);

        let per_feature: Vec<Option<SplitCandidate>> = feature_order
            .par_iter()
            .map(|&feature_idx| {
                let mut sorted: Vec<(f64, usize)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], y_idx[i]))
                    .collect();
                sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

                let mut left_counts = vec![0usize; n_classes];
                let mut best: Option<SplitCandidate> = None;

                for pos in 0..n - 1 {
                    left_counts[sorted[pos].1] += 1;

                    let (current, next) = (sorted[pos].0, sorted[pos + 1].0);
                    if next <= current + FEATURE_THRESHOLD {
                        continue;
                    }

                    let n_left = pos + 1;
                    let n_right = n - n_left;
                    if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                        continue;
                    }

                    let right_counts: Vec<usize> = total_counts
                        .iter()
                        .zip(&left_counts)
                        .map(|(t, l)| t - l)
                        .collect();
                    let weighted = (n_left as f64 * gini(&left_counts, n_left)
                        + n_right as f64 * gini(&right_counts, n_right))
                        / n as f64;
                    let gain = parent_impurity - weighted;

                    if best.map_or(true, |b| gain > b.gain) {
                        let mut threshold = (current + next) / 2.0;
                        if threshold >= next {
                            threshold = current;
                        }
                        best = Some(SplitCandidate { feature_idx, threshold, gain });
                    }
                }

                best
            })
            .collect();

        // First feature in scan order wins ties
        per_feature.into_iter().flatten().fold(None, |acc, cand| match acc {
            Some(best) if cand.gain <= best.gain => Some(best),
            _ => Some(cand),
        })
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(BuilderError::ModelNotFitted)?;

        if x.ncols() != self.n_features {
            return Err(BuilderError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let predictions: Vec<f64> = x
            .outer_iter()
            .map(|sample| Self::predict_sample(root, &sample.to_vec()))
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn predict_sample(node: &TreeNode, sample: &[f64]) -> f64 {
        match node {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                if sample[*feature_idx] <= *threshold {
                    Self::predict_sample(left, sample)
                } else {
                    Self::predict_sample(right, sample)
                }
            }
        }
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Sorted class labels seen during fit
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Get tree depth (a lone leaf has depth 0)
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        DecisionTree::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        DecisionTree::predict(self, x)
    }

    fn feature_importances(&self) -> Result<Array1<f64>> {
        self.feature_importances
            .clone()
            .ok_or(BuilderError::ModelNotFitted)
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}
