//! Estimator seam
//!
//! The training pipeline only needs `fit(X, y) -> trained state` and
//! `predict(X) -> y_hat` over numeric matrices. Any regression algorithm
//! implementing [`Regressor`] can be plugged in.

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};

/// A regression algorithm that can be fitted on a numeric matrix.
///
/// `fit` returns a fresh model instead of mutating `self`, so a failed fit
/// never leaves a half-trained estimator behind.
#[cfg_attr(test, mockall::automock(type Model = MeanModel;))]
pub trait Regressor {
    type Model: FittedModel;

    /// Fit on rows `x` with targets `y`
    fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<Self::Model>;
}

/// Trained estimator state
pub trait FittedModel: Send + Sync {
    /// Short algorithm name recorded in artifact metadata
    fn name(&self) -> &str;

    /// Row width the model was fitted on
    fn n_features(&self) -> usize;

    /// Predict a single row
    fn predict_row(&self, row: &[f64]) -> f64;

    /// Structural check run on deserialized models
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Predict every row of a matrix
    fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.predict_row(row)).collect()
    }
}

/// Check a training matrix and return its row width
pub fn check_training_matrix(x: &[Vec<f64>], y: &[f64]) -> Result<usize> {
    if x.is_empty() {
        return Err(PredictorError::Estimator("training matrix has no rows".into()));
    }
    if x.len() != y.len() {
        return Err(PredictorError::Estimator(format!(
            "row count mismatch: {} rows, {} targets",
            x.len(),
            y.len()
        )));
    }

    let width = x[0].len();
    if width == 0 {
        return Err(PredictorError::Estimator("training matrix has no columns".into()));
    }
    if let Some(row) = x.iter().position(|r| r.len() != width) {
        return Err(PredictorError::Estimator(format!(
            "row {} has {} columns, expected {}",
            row,
            x[row].len(),
            width
        )));
    }
    if x.iter().flatten().chain(y).any(|v| !v.is_finite()) {
        return Err(PredictorError::Estimator("training data contains non-finite values".into()));
    }

    Ok(width)
}

/// Baseline estimator: always predicts the training mean
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanRegressor;

/// Fitted [`MeanRegressor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanModel {
    mean: f64,
    n_features: usize,
}

impl MeanModel {
    pub fn new(mean: f64, n_features: usize) -> Self {
        Self { mean, n_features }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }
}

impl Regressor for MeanRegressor {
    type Model = MeanModel;

    fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<MeanModel> {
        let n_features = check_training_matrix(x, y)?;
        let mean = y.iter().sum::<f64>() / y.len() as f64;
        Ok(MeanModel::new(mean, n_features))
    }
}

impl FittedModel for MeanModel {
    fn name(&self) -> &str {
        "mean"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, _row: &[f64]) -> f64 {
        self.mean
    }
}
