//! Posterior samples for one observed event, and their pairing with the
//! sampling-prior density.
//!
//! External sampler bridges (arviz, pymultinest, ...) are expected to emit
//! data satisfying the same construction invariants enforced here: no NaN
//! samples, more samples than parameters, and a one-to-one correspondence
//! between parameter labels and sample columns.

use pc_core::{Error, Matrix, Result};
use pc_model::align::alignment_indices;

/// Posterior samples with parameter labels. Immutable value object:
/// [`Posterior::marginal`] returns a new instance and never mutates.
#[derive(Debug, Clone)]
pub struct Posterior {
    samples: Matrix,
    parameter_labels: Vec<String>,
}

impl Posterior {
    /// Build a posterior from a `(n_samples, n_parameters)` sample matrix.
    pub fn new(samples: Matrix, parameter_labels: Vec<String>) -> Result<Self> {
        if parameter_labels.len() != samples.cols() {
            return Err(Error::InvalidPosterior(format!(
                "{} parameter labels for {} sample columns",
                parameter_labels.len(),
                samples.cols()
            )));
        }
        for (i, p) in parameter_labels.iter().enumerate() {
            if parameter_labels[..i].contains(p) {
                return Err(Error::InvalidPosterior(format!(
                    "duplicate parameter label '{p}'"
                )));
            }
        }
        if samples.has_nan() {
            return Err(Error::InvalidPosterior("posterior samples cannot be NaN".into()));
        }
        if samples.rows() <= samples.cols() {
            return Err(Error::InvalidPosterior(format!(
                "need more samples than parameters for a well-posed marginal density, \
                 got {} samples in {} parameters",
                samples.rows(),
                samples.cols()
            )));
        }
        Ok(Self { samples, parameter_labels })
    }

    /// Convenience constructor from per-sample rows (what adapter bridges emit).
    pub fn from_rows(rows: Vec<Vec<f64>>, parameter_labels: Vec<String>) -> Result<Self> {
        Self::new(Matrix::from_rows(rows)?, parameter_labels)
    }

    /// Sample matrix, shape `(n_samples, n_parameters)`.
    pub fn samples(&self) -> &Matrix {
        &self.samples
    }

    /// Parameter labels, aligned to sample columns.
    pub fn parameter_labels(&self) -> &[String] {
        &self.parameter_labels
    }

    /// Number of posterior samples.
    pub fn n_samples(&self) -> usize {
        self.samples.rows()
    }

    /// Number of parameters.
    pub fn n_parameters(&self) -> usize {
        self.samples.cols()
    }

    /// Marginal posterior over an ordered subset of parameters.
    ///
    /// The returned labels equal `parameter_list` (the caller's order, not
    /// the stored order) and columns are reordered to match.
    pub fn marginal(&self, parameter_list: &[String]) -> Result<Posterior> {
        let indices = alignment_indices(&self.parameter_labels, parameter_list)?;
        let samples = self.samples.select_columns(&indices)?;
        if samples.rows() <= samples.cols() {
            return Err(Error::InvalidPosterior(format!(
                "marginal over {} parameters is ill-posed with {} samples",
                samples.cols(),
                samples.rows()
            )));
        }
        Ok(Self { samples, parameter_labels: parameter_list.to_vec() })
    }

    /// Pair this posterior with the prior density of its samples.
    pub fn to_inference_data(&self, prior_density: Vec<f64>) -> Result<InferenceData> {
        InferenceData::new(self.clone(), prior_density)
    }
}

/// A posterior plus the sampling-prior density at each posterior sample,
/// used to importance-weight the samples back to a uniform reference.
#[derive(Debug, Clone)]
pub struct InferenceData {
    posterior: Posterior,
    prior_density: Vec<f64>,
}

impl InferenceData {
    /// Pair a posterior with its per-sample prior density values.
    pub fn new(posterior: Posterior, prior_density: Vec<f64>) -> Result<Self> {
        if prior_density.len() != posterior.n_samples() {
            return Err(Error::Validation(format!(
                "prior density length mismatch: expected {}, got {}",
                posterior.n_samples(),
                prior_density.len()
            )));
        }
        if prior_density.iter().any(|x| !x.is_finite()) {
            return Err(Error::Validation("prior density values must be finite".into()));
        }
        Ok(Self { posterior, prior_density })
    }

    /// The wrapped posterior.
    pub fn posterior(&self) -> &Posterior {
        &self.posterior
    }

    /// Prior density aligned to the posterior samples.
    pub fn prior_density(&self) -> &[f64] {
        &self.prior_density
    }
}
