//! Multi-class linear SVM (one-vs-rest hinge loss).
//!
//! Each class gets a binary separator trained with the Pegasos stochastic
//! sub-gradient method. The bias is learned as the weight of a constant
//! feature, so it is regularized together with the other weights.

use ndarray::{s, Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::vectorizer::SparseVector;
use crate::error::ModelError;

/// Hyperparameters of the linear SVM solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvmParams {
    /// Inverse regularization strength.
    pub c: f64,
    /// Passes over the training set.
    pub epochs: usize,
    /// Seed for the sample order.
    pub seed: u64,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            epochs: 50,
            seed: 42,
        }
    }
}

impl SvmParams {
    /// Train on sparse rows `x` with class indices `y` in `0..n_classes`.
    pub fn fit(
        &self,
        x: &[SparseVector],
        y: &[usize],
        n_classes: usize,
        n_features: usize,
    ) -> Result<LinearSvm, ModelError> {
        if x.len() != y.len() {
            return Err(ModelError::Dimension(format!(
                "{} rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(ModelError::InvalidSplit("no training rows".to_string()));
        }
        if n_classes < 2 {
            return Err(ModelError::InsufficientClasses(n_classes));
        }
        if let Some(&bad) = y.iter().find(|&&class| class >= n_classes) {
            return Err(ModelError::Dimension(format!(
                "class index {} out of range for {} classes",
                bad, n_classes
            )));
        }
        if let Some(row) = x.iter().find(|row| row.min_dimension() > n_features) {
            return Err(ModelError::Dimension(format!(
                "row needs {} features but model has {}",
                row.min_dimension(),
                n_features
            )));
        }
        if !(self.c > 0.0) || self.epochs == 0 {
            return Err(ModelError::Dimension(format!(
                "invalid solver parameters: c={}, epochs={}",
                self.c, self.epochs
            )));
        }

        let lambda = 1.0 / (self.c * x.len() as f64);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut weights = Array2::zeros((n_classes, n_features));
        let mut bias = Array1::zeros(n_classes);

        for class in 0..n_classes {
            let targets: Vec<f64> = y
                .iter()
                .map(|&label| if label == class { 1.0 } else { -1.0 })
                .collect();
            let (w, b) = pegasos(x, &targets, n_features, lambda, self.epochs, &mut rng);
            weights.row_mut(class).assign(&w);
            bias[class] = b;
        }

        debug!(
            "Trained linear SVM: {} classes, {} features, {} rows, lambda={:.3e}",
            n_classes,
            n_features,
            x.len(),
            lambda
        );

        Ok(LinearSvm { weights, bias })
    }
}

fn pegasos(
    x: &[SparseVector],
    targets: &[f64],
    n_features: usize,
    lambda: f64,
    epochs: usize,
    rng: &mut ChaCha8Rng,
) -> (Array1<f64>, f64) {
    // w = scale * v; the last slot of v holds the bias weight.
    let mut v = Array1::<f64>::zeros(n_features + 1);
    let mut scale = 1.0;
    let mut step = 0usize;
    let mut order: Vec<usize> = (0..x.len()).collect();

    for _ in 0..epochs {
        order.shuffle(rng);
        for &i in &order {
            step += 1;
            let eta = 1.0 / (lambda * (step as f64 + 1.0));
            let score = scale * (x[i].dot(v.slice(s![..n_features])) + v[n_features]);
            let margin = targets[i] * score;

            scale *= 1.0 - eta * lambda;
            if margin < 1.0 {
                let update = eta * targets[i] / scale;
                for &(j, value) in x[i].entries() {
                    v[j] += update * value;
                }
                v[n_features] += update;
            }

            if scale < 1e-9 {
                v *= scale;
                scale = 1.0;
            }
        }
    }

    v *= scale;
    let bias = v[n_features];
    (v.slice(s![..n_features]).to_owned(), bias)
}

/// Trained one-vs-rest linear separators, one row per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvm {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl LinearSvm {
    /// Assemble a model from raw parameters, checking their shapes.
    pub fn from_parts(weights: Array2<f64>, bias: Array1<f64>) -> Result<Self, ModelError> {
        let model = Self { weights, bias };
        model.validate()?;
        Ok(model)
    }

    /// Check shape agreement and finiteness of all parameters.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.weights.nrows() != self.bias.len() {
            return Err(ModelError::Dimension(format!(
                "{} weight rows but {} biases",
                self.weights.nrows(),
                self.bias.len()
            )));
        }
        if self.weights.nrows() < 2 {
            return Err(ModelError::InsufficientClasses(self.weights.nrows()));
        }
        if self.weights.iter().chain(self.bias.iter()).any(|w| !w.is_finite()) {
            return Err(ModelError::Dimension("non-finite parameter".to_string()));
        }
        Ok(())
    }

    pub fn n_classes(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.weights.ncols()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn bias(&self) -> &Array1<f64> {
        &self.bias
    }

    /// Signed distance to each class separator.
    pub fn decision_scores(&self, x: &SparseVector) -> Array1<f64> {
        Array1::from_iter(
            self.weights
                .rows()
                .into_iter()
                .zip(self.bias.iter())
                .map(|(row, b)| x.dot(row) + b),
        )
    }

    /// Index of the highest-scoring class; ties go to the lowest index.
    pub fn predict(&self, x: &SparseVector) -> usize {
        argmax(&self.decision_scores(x))
    }

    /// Softmax over decision scores.
    pub fn probabilities(&self, x: &SparseVector) -> Array1<f64> {
        softmax(&self.decision_scores(x))
    }
}

pub(crate) fn argmax(scores: &Array1<f64>) -> usize {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = i;
        }
    }
    best
}

pub(crate) fn softmax(scores: &Array1<f64>) -> Array1<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp = scores.mapv(|s| (s - max).exp());
    let total = exp.sum();
    exp / total
}
