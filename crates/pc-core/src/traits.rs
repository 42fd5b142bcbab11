//! Core traits for popclass-rs
//!
//! This module defines the trait-based architecture that enables
//! dependency inversion: the population model and classifier depend on a
//! density-estimation capability, not on a concrete estimator.

use crate::matrix::Matrix;
use crate::Result;

/// A fitted density estimator.
///
/// Implementations define a density over a `dim()`-dimensional parameter
/// space and evaluate it at arbitrary query points.
pub trait DensityEstimator: Send + Sync {
    /// Dimensionality of the fitted density.
    fn dim(&self) -> usize;

    /// Evaluate the density at each row of `points`.
    ///
    /// `points` must have `dim()` columns. Returns one density value per row.
    fn evaluate(&self, points: &Matrix) -> Result<Vec<f64>>;
}

/// A density-estimation method: fits a [`DensityEstimator`] to samples.
///
/// `data` has shape `(n_samples, n_dims)`. Estimator-specific options
/// (bandwidth rule, kernel shape) live on the implementing type, so any
/// configured method can be substituted for the default KDE.
pub trait DensityMethod: Send + Sync {
    /// Fit an estimator to the given samples.
    fn fit(&self, data: &Matrix) -> Result<Box<dyn DensityEstimator>>;

    /// Method name (e.g. "gaussian_kde", "tophat_kde").
    fn name(&self) -> &str;
}
