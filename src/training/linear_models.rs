//! Logistic regression classifier

use crate::error::{BuilderError, Result};
use super::models::{unique_sorted, Classifier};
use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Largest number of step halvings in one line search
const MAX_BACKTRACKS: usize = 50;

/// Sufficient-decrease constant of the Armijo condition
const ARMIJO: f64 = 1e-4;

/// First and last diagonal shift tried when the Newton system is not
/// numerically positive definite (relative to a unit diagonal)
const RIDGE_START: f64 = 1e-10;
const RIDGE_MAX: f64 = 1.0;

/// L2-regularized logistic regression.
///
/// Two classes are modelled with a single sigmoid row, more classes with a
/// multinomial (softmax) model holding one coefficient row per class.
/// The objective is mean cross-entropy plus `||W||^2 / (2 * C * n)`,
/// minimised by Newton's method with a backtracking line search. Intercepts
/// are not penalised.
///
/// Newton steps do not depend on the units of the features, so unscaled
/// columns (incomes next to ages) converge as quickly as standardised ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients, one row per modelled class
    pub coefficients: Option<Array2<f64>>,
    /// Fitted intercepts, one per coefficient row
    pub intercepts: Option<Array1<f64>>,
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum Newton iterations
    pub max_iter: usize,
    /// Convergence tolerance on the largest gradient component
    pub tol: f64,
    /// Seed kept for reproducibility; the solver itself is deterministic
    pub random_state: Option<u64>,
    /// Iterations used by the last fit
    pub n_iter: usize,
    /// Sorted class labels
    classes: Vec<f64>,
    /// Whether model is fitted
    pub is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercepts: None,
            c: 1.0,
            max_iter: 100,
            tol: 1e-6,
            random_state: None,
            n_iter: 0,
            classes: Vec::new(),
            is_fitted: false,
        }
    }

    /// Set inverse regularization strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Sorted class labels seen during fit
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Whether the last fit stopped before the iteration cap
    pub fn converged(&self) -> bool {
        self.is_fitted && self.n_iter < self.max_iter
    }

    fn is_binary(&self) -> bool {
        self.classes.len() == 2
    }

    /// Fit the model
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(BuilderError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if !(self.c > 0.0) {
            return Err(BuilderError::InvalidInput(format!(
                "C must be positive, got {}",
                self.c
            )));
        }

        self.classes = unique_sorted(y);
        if self.classes.len() < 2 {
            return Err(BuilderError::TrainingError(format!(
                "This solver needs samples of at least 2 classes in the data, but the data contains only one class: {:?}",
                self.classes.first()
            )));
        }

        let targets = self.target_matrix(y);
        let n_rows = targets.ncols();
        let penalty = 1.0 / (self.c * n_samples as f64);
        let design = with_intercept_column(x);

        let mut weights = Array2::<f64>::zeros((n_rows, n_features));
        let mut bias = Array1::<f64>::zeros(n_rows);
        let (mut loss, mut probs) = self.objective(x, &targets, &weights, &bias, penalty);

        self.n_iter = self.max_iter;
        for iter in 0..self.max_iter {
            let grad = gradient(&design, &(&probs - &targets), &weights, penalty);
            if grad.iter().fold(0.0_f64, |m, g| m.max(g.abs())) < self.tol {
                self.n_iter = iter;
                break;
            }

            let hessian = hessian(&design, &probs, penalty);
            let direction = newton_direction(&hessian, &grad).ok_or_else(|| {
                BuilderError::TrainingError("Newton system could not be solved".to_string())
            })?;
            let slope = grad.dot(&direction);
            if !(slope < 0.0) {
                // No descent direction left at working precision
                self.n_iter = iter;
                break;
            }

            let mut t: f64 = 1.0;
            let mut accepted = false;
            for _ in 0..MAX_BACKTRACKS {
                let (cand_w, cand_b) = take_step(&weights, &bias, &direction, t);
                let (cand_loss, cand_probs) = self.objective(x, &targets, &cand_w, &cand_b, penalty);
                if cand_loss <= loss + ARMIJO * t * slope {
                    weights = cand_w;
                    bias = cand_b;
                    loss = cand_loss;
                    probs = cand_probs;
                    accepted = true;
                    break;
                }
                t *= 0.5;
            }

            if !accepted {
                // The loss no longer decreases in floating point
                self.n_iter = iter;
                break;
            }
        }

        self.coefficients = Some(weights);
        self.intercepts = Some(bias);
        self.is_fitted = true;

        Ok(self)
    }

    /// One column for binary problems (1.0 marks the positive class),
    /// one-hot over the classes otherwise.
    fn target_matrix(&self, y: &Array1<f64>) -> Array2<f64> {
        if self.is_binary() {
            let positive = self.classes[1];
            Array2::from_shape_fn((y.len(), 1), |(i, _)| if y[i] == positive { 1.0 } else { 0.0 })
        } else {
            Array2::from_shape_fn((y.len(), self.classes.len()), |(i, k)| {
                if y[i] == self.classes[k] { 1.0 } else { 0.0 }
            })
        }
    }

    fn decision_function(x: &Array2<f64>, weights: &Array2<f64>, bias: &Array1<f64>) -> Array2<f64> {
        x.dot(&weights.t()) + bias
    }

    /// Regularized loss and the modelled probabilities, one column per row
    /// of coefficients
    fn objective(
        &self,
        x: &Array2<f64>,
        targets: &Array2<f64>,
        weights: &Array2<f64>,
        bias: &Array1<f64>,
        penalty: f64,
    ) -> (f64, Array2<f64>) {
        let scores = Self::decision_function(x, weights, bias);
        let n = x.nrows() as f64;
        let mut cross_entropy = 0.0;

        let probs = if self.is_binary() {
            for (z, t) in scores.iter().zip(targets.iter()) {
                // -log(sigmoid(z)) = softplus(-z), -log(1 - sigmoid(z)) = softplus(z)
                cross_entropy += if *t > 0.5 { softplus(-z) } else { softplus(*z) };
            }
            scores.mapv(sigmoid)
        } else {
            let mut probs = scores.clone();
            for (mut row, (score_row, target_row)) in probs
                .outer_iter_mut()
                .zip(scores.outer_iter().zip(targets.outer_iter()))
            {
                let max = score_row.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
                let log_norm = max + score_row.mapv(|s| (s - max).exp()).sum().ln();
                for ((p, s), t) in row.iter_mut().zip(score_row.iter()).zip(target_row.iter()) {
                    *p = (s - log_norm).exp();
                    cross_entropy -= t * (s - log_norm);
                }
            }
            probs
        };

        let loss = cross_entropy / n + 0.5 * penalty * weights.mapv(|w| w * w).sum();
        (loss, probs)
    }

    /// Predict class probabilities, one column per class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (weights, bias) = self.fitted_params()?;
        if x.ncols() != weights.ncols() {
            return Err(BuilderError::ShapeError {
                expected: format!("{} features", weights.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let scores = Self::decision_function(x, weights, bias);
        if self.is_binary() {
            Ok(Array2::from_shape_fn((x.nrows(), 2), |(i, k)| {
                let p = sigmoid(scores[[i, 0]]);
                if k == 1 { p } else { 1.0 - p }
            }))
        } else {
            let mut probs = scores;
            for mut row in probs.outer_iter_mut() {
                let max = row.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
                row.mapv_inplace(|s| (s - max).exp());
                let total = row.sum();
                row.mapv_inplace(|p| p / total);
            }
            Ok(probs)
        }
    }

    /// Predict class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        let labels = proba
            .outer_iter()
            .map(|row| {
                let mut best = 0;
                for (k, p) in row.iter().enumerate() {
                    if *p > row[best] {
                        best = k;
                    }
                }
                self.classes[best]
            })
            .collect();
        Ok(labels)
    }

    /// Get accuracy score
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let y_pred = self.predict(x)?;
        let correct = y_pred.iter().zip(y.iter()).filter(|(p, a)| p == a).count();
        Ok(correct as f64 / y.len().max(1) as f64)
    }

    fn fitted_params(&self) -> Result<(&Array2<f64>, &Array1<f64>)> {
        match (&self.coefficients, &self.intercepts) {
            (Some(w), Some(b)) if self.is_fitted => Ok((w, b)),
            _ => Err(BuilderError::ModelNotFitted),
        }
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LogisticRegression::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LogisticRegression::predict(self, x)
    }

    /// Mean absolute coefficient across the coefficient rows
    fn feature_importances(&self) -> Result<Array1<f64>> {
        let (weights, _) = self.fitted_params()?;
        weights
            .mapv(f64::abs)
            .mean_axis(Axis(0))
            .ok_or_else(|| BuilderError::EvaluationError("Model has no coefficient rows".to_string()))
    }
}

/// `x` with a trailing column of ones for the intercept
fn with_intercept_column(x: &Array2<f64>) -> Array2<f64> {
    let d = x.ncols();
    Array2::from_shape_fn((x.nrows(), d + 1), |(i, j)| if j < d { x[[i, j]] } else { 1.0 })
}

/// Gradient packed row by row: for each coefficient row its weights, then
/// its intercept
fn gradient(design: &Array2<f64>, residual: &Array2<f64>, weights: &Array2<f64>, penalty: f64) -> Array1<f64> {
    let n = design.nrows() as f64;
    let d = weights.ncols();
    let mut grad = residual.t().dot(design) / n;
    grad.slice_mut(s![.., ..d]).scaled_add(penalty, weights);
    grad.iter().copied().collect()
}

/// Hessian in the packing of [`gradient`]. Block `(a, b)` is
/// `X^T diag(p_a (delta_ab - p_b)) X / n`, which for a single sigmoid row
/// reduces to `X^T diag(p (1 - p)) X / n`.
fn hessian(design: &Array2<f64>, probs: &Array2<f64>, penalty: f64) -> Array2<f64> {
    let n = design.nrows() as f64;
    let width = design.ncols();
    let rows = probs.ncols();
    let mut h = Array2::<f64>::zeros((rows * width, rows * width));

    for a in 0..rows {
        for b in a..rows {
            let delta = if a == b { 1.0 } else { 0.0 };
            let (pa, pb) = (probs.column(a), probs.column(b));
            let curvature = Array1::from_shape_fn(probs.nrows(), |i| pa[i] * (delta - pb[i]));
            let weighted = design * &curvature.insert_axis(Axis(1));
            let block = design.t().dot(&weighted) / n;

            h.slice_mut(s![a * width..(a + 1) * width, b * width..(b + 1) * width])
                .assign(&block);
            if a != b {
                h.slice_mut(s![b * width..(b + 1) * width, a * width..(a + 1) * width])
                    .assign(&block.t());
            }
        }
        for j in 0..width - 1 {
            h[[a * width + j, a * width + j]] += penalty;
        }
    }
    h
}

/// Solve `H d = -g`. The system is Jacobi-scaled to a unit diagonal before
/// the Cholesky factorisation; a growing ridge is added while the
/// factorisation breaks down (the softmax Hessian is singular along the
/// shared intercept direction).
fn newton_direction(hessian: &Array2<f64>, grad: &Array1<f64>) -> Option<Array1<f64>> {
    let m = grad.len();
    let scale = hessian
        .diag()
        .mapv(|h| if h > 0.0 && h.is_finite() { 1.0 / h.sqrt() } else { 1.0 });
    let scaled = Array2::from_shape_fn((m, m), |(i, j)| hessian[[i, j]] * scale[i] * scale[j]);
    let rhs = Array1::from_shape_fn(m, |i| -grad[i] * scale[i]);

    let mut ridge = RIDGE_START;
    while ridge <= RIDGE_MAX {
        let mut system = scaled.clone();
        system.diag_mut().mapv_inplace(|v| v + ridge);
        if let Some(z) = cholesky_solve(system, &rhs) {
            return Some(z * &scale);
        }
        ridge *= 100.0;
    }
    None
}

/// Solve `A z = b` for symmetric positive definite `A`; `None` when the
/// factorisation meets a non-positive pivot
fn cholesky_solve(mut a: Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let m = b.len();
    for j in 0..m {
        let mut pivot = a[[j, j]];
        for k in 0..j {
            pivot -= a[[j, k]] * a[[j, k]];
        }
        if !(pivot > 0.0 && pivot.is_finite()) {
            return None;
        }
        let pivot = pivot.sqrt();
        a[[j, j]] = pivot;
        for i in j + 1..m {
            let mut v = a[[i, j]];
            for k in 0..j {
                v -= a[[i, k]] * a[[j, k]];
            }
            a[[i, j]] = v / pivot;
        }
    }

    // L y = b, then L^T z = y
    let mut z = b.to_owned();
    for i in 0..m {
        let mut v = z[i];
        for k in 0..i {
            v -= a[[i, k]] * z[k];
        }
        z[i] = v / a[[i, i]];
    }
    for i in (0..m).rev() {
        let mut v = z[i];
        for k in i + 1..m {
            v -= a[[k, i]] * z[k];
        }
        z[i] = v / a[[i, i]];
    }
    Some(z)
}

/// Parameters moved `t` along a packed direction
fn take_step(weights: &Array2<f64>, bias: &Array1<f64>, direction: &Array1<f64>, t: f64) -> (Array2<f64>, Array1<f64>) {
    let (rows, d) = weights.dim();
    let width = d + 1;
    let w = Array2::from_shape_fn((rows, d), |(a, j)| weights[[a, j]] + t * direction[a * width + j]);
    let b = Array1::from_shape_fn(rows, |a| bias[a] + t * direction[a * width + d]);
    (w, b)
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_binary_classification() {
        let x = array![[-2.0, 1.0], [-1.5, 0.5], [-1.0, 0.8], [1.0, -0.2], [1.5, 0.1], [2.0, -1.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut model = LogisticRegression::new().with_max_iter(1000).with_random_state(42);
        model.fit(&x, &y).unwrap();

        assert_eq!(model.coefficients.as_ref().unwrap().nrows(), 1);
        assert_eq!(model.score(&x, &y).unwrap(), 1.0);
    }

    #[test]
    fn test_multiclass_classification() {
        let x = array![
            [0.0, 0.0], [0.2, 0.1], [0.1, 0.3],
            [5.0, 0.0], [5.2, 0.2], [4.9, 0.1],
            [0.0, 5.0], [0.3, 5.1], [0.1, 4.8]
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];

        let mut model = LogisticRegression::new().with_max_iter(1000);
        model.fit(&x, &y).unwrap();

        assert_eq!(model.coefficients.as_ref().unwrap().dim(), (3, 2));
        assert_eq!(model.predict(&x).unwrap(), y);

        let proba = model.predict_proba(&x).unwrap();
        for row in proba.outer_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_stronger_regularization_shrinks_coefficients() {
        let x = array![[-2.0], [-1.0], [-0.5], [0.5], [1.0], [2.0]];
        let y = array![0.0, 0.0, 1.0, 0.0, 1.0, 1.0];

        let mut loose = LogisticRegression::new().with_c(100.0).with_max_iter(1000);
        loose.fit(&x, &y).unwrap();
        let mut tight = LogisticRegression::new().with_c(0.01).with_max_iter(1000);
        tight.fit(&x, &y).unwrap();

        let loose_w = loose.coefficients.as_ref().unwrap()[[0, 0]].abs();
        let tight_w = tight.coefficients.as_ref().unwrap()[[0, 0]].abs();
        assert!(tight_w < loose_w);
    }

    #[test]
    fn test_feature_importances_are_mean_abs_coefficients() {
        let mut model = LogisticRegression::new();
        model.coefficients = Some(array![[1.0, -2.0], [-3.0, 0.0]]);
        model.intercepts = Some(array![0.0, 0.0]);
        model.is_fitted = true;

        let importances = Classifier::feature_importances(&model).unwrap();
        assert_eq!(importances, array![2.0, 1.0]);
    }

    #[test]
    fn test_single_class_is_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 1.0];
        let mut model = LogisticRegression::new();
        assert!(matches!(model.fit(&x, &y), Err(BuilderError::TrainingError(_))));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let x = array![[0.3, 1.0], [1.2, 0.1], [2.5, 0.7], [3.1, 0.2], [0.9, 0.9]];
        let y = array![0.0, 0.0, 1.0, 1.0, 0.0];

        let mut a = LogisticRegression::new().with_max_iter(1000);
        let mut b = LogisticRegression::new().with_max_iter(1000);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.coefficients, b.coefficients);
    }

    fn income_age(n: usize, scale: f64) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                (20_000.0 + 400.0 * i as f64) * scale / 1e5
            } else {
                20.0 + ((i * 7) % 50) as f64
            }
        });
        let y = Array1::from_shape_fn(n, |i| if 20_000.0 + 400.0 * i as f64 > 60_000.0 { 1.0 } else { 0.0 });
        (x, y)
    }

    #[test]
    fn test_unscaled_separable_features_converge() {
        for scale in [1.0, 100.0, 1e3, 1e5] {
            let (x, y) = income_age(200, scale);
            let mut model = LogisticRegression::new().with_max_iter(1000).with_random_state(42);
            model.fit(&x, &y).unwrap();

            assert!(model.converged(), "scale {} stopped at {} iterations", scale, model.n_iter);
            let acc = model.score(&x, &y).unwrap();
            assert!(acc >= 0.99, "scale {} accuracy {}", scale, acc);
        }
    }

    #[test]
    fn test_gradient_vanishes_at_solution() {
        let x = array![[0.3, 10.0], [1.2, 40.0], [2.5, 15.0], [3.1, 80.0], [0.9, 55.0], [2.2, 30.0]];
        let y = array![0.0, 0.0, 1.0, 1.0, 0.0, 1.0];

        let mut model = LogisticRegression::new().with_max_iter(1000);
        model.fit(&x, &y).unwrap();
        assert!(model.converged());

        let weights = model.coefficients.clone().unwrap();
        let bias = model.intercepts.clone().unwrap();
        let penalty = 1.0 / (model.c * x.nrows() as f64);
        let targets = model.target_matrix(&y);
        let (_, probs) = model.objective(&x, &targets, &weights, &bias, penalty);
        let grad = gradient(&with_intercept_column(&x), &(&probs - &targets), &weights, penalty);
        assert!(grad.iter().all(|g| g.abs() < 1e-6));
    }

    #[test]
    fn test_multiclass_converges() {
        let x = array![
            [0.0, 0.0], [200.0, 0.1], [100.0, 0.3], [0.0, 0.6],
            [5000.0, 0.0], [5200.0, 0.2], [4900.0, 0.1],
            [0.0, 5.0], [300.0, 5.1], [100.0, 4.8]
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];

        let mut model = LogisticRegression::new().with_max_iter(1000);
        model.fit(&x, &y).unwrap();

        assert!(model.converged());
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_cholesky_solve() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let z = cholesky_solve(a, &array![2.0, 5.0]).unwrap();
        assert!((z[0] + 0.5).abs() < 1e-12);
        assert!((z[1] - 2.0).abs() < 1e-12);

        assert!(cholesky_solve(array![[1.0, 2.0], [2.0, 1.0]], &array![1.0, 1.0]).is_none());
    }
}
