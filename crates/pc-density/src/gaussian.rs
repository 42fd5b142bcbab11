//! Multivariate Gaussian kernel density estimation.

use crate::math::{LogSumExp, LN_SQRT_2PI};
use nalgebra::DMatrix;
use pc_core::{DensityEstimator, DensityMethod, Error, Matrix, Result};
use rayon::prelude::*;

/// Bandwidth selection rule for [`GaussianKde`].
///
/// Scott and Silverman are the standard plug-in rules based on the effective
/// sample count; `Factor` applies a caller-chosen multiplier to the data
/// covariance directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bandwidth {
    /// Scott's rule: `neff^(-1 / (d + 4))`.
    Scott,
    /// Silverman's rule: `(neff * (d + 2) / 4)^(-1 / (d + 4))`.
    Silverman,
    /// Fixed multiplicative factor on the sample standard deviations.
    Factor(f64),
}

impl Bandwidth {
    fn factor(&self, neff: f64, dims: usize) -> Result<f64> {
        let d = dims as f64;
        let f = match *self {
            Bandwidth::Scott => neff.powf(-1.0 / (d + 4.0)),
            Bandwidth::Silverman => (neff * (d + 2.0) / 4.0).powf(-1.0 / (d + 4.0)),
            Bandwidth::Factor(f) => {
                if !f.is_finite() || f <= 0.0 {
                    return Err(Error::Validation(format!(
                        "bandwidth factor must be finite and > 0, got {f}"
                    )));
                }
                f
            }
        };
        Ok(f)
    }
}

/// Gaussian KDE over a d-dimensional parameter space.
///
/// `p(x) = Σ_i ŵ_i · N(x; x_i, Σ_K)` with `Σ_K = factor² · Cov(data)` and
/// normalized weights `ŵ`. Evaluation whitens both the training samples and
/// the query point through the Cholesky factor of `Σ_K`, so each kernel term
/// reduces to a squared Euclidean distance, accumulated in log space.
pub struct GaussianKde {
    dims: usize,
    /// Whitened training samples, row-major `(n, dims)`.
    whitened: Vec<f64>,
    /// Per-sample log of the normalized weight (`-inf` for zero weights).
    log_weights: Vec<f64>,
    /// Lower Cholesky factor of the kernel covariance, row-major `(dims, dims)`.
    chol_l: Vec<f64>,
    /// `-d·ln(sqrt(2π)) - Σ ln(L_kk)`.
    log_norm: f64,
}

impl GaussianKde {
    /// Fit a KDE to `data` (shape `(n_samples, n_dims)`) with optional
    /// non-negative per-sample weights.
    pub fn from_samples(
        data: &Matrix,
        weights: Option<&[f64]>,
        bandwidth: Bandwidth,
    ) -> Result<Self> {
        let n = data.rows();
        let d = data.cols();
        if d == 0 {
            return Err(Error::Validation("GaussianKde requires at least one dimension".into()));
        }
        if n <= d {
            return Err(Error::Validation(format!(
                "GaussianKde requires more samples than dimensions, got {n} samples in {d} dims"
            )));
        }
        if !data.is_finite() {
            return Err(Error::Validation("GaussianKde samples must be finite".into()));
        }

        let norm_weights = normalize_weights(n, weights)?;
        let neff = 1.0 / norm_weights.iter().map(|w| w * w).sum::<f64>();
        let factor = bandwidth.factor(neff, d)?;

        // Weighted mean.
        let mut mean = vec![0.0f64; d];
        for (i, row) in data.iter_rows().enumerate() {
            let w = norm_weights[i];
            for (m, &x) in mean.iter_mut().zip(row) {
                *m += w * x;
            }
        }

        // Bias-corrected weighted covariance, scaled by the bandwidth factor.
        let denom = 1.0 - norm_weights.iter().map(|w| w * w).sum::<f64>();
        if denom <= 0.0 {
            return Err(Error::Validation(
                "GaussianKde weights are degenerate (single effective sample)".into(),
            ));
        }
        let mut cov = DMatrix::<f64>::zeros(d, d);
        for (i, row) in data.iter_rows().enumerate() {
            let w = norm_weights[i];
            for a in 0..d {
                let da = row[a] - mean[a];
                for b in a..d {
                    let v = w * da * (row[b] - mean[b]);
                    cov[(a, b)] += v;
                }
            }
        }
        let scale = factor * factor / denom;
        for a in 0..d {
            for b in a..d {
                let v = cov[(a, b)] * scale;
                cov[(a, b)] = v;
                cov[(b, a)] = v;
            }
        }

        let chol = nalgebra::Cholesky::new(cov).ok_or_else(|| {
            Error::Validation(
                "GaussianKde kernel covariance is not positive definite \
                 (degenerate or collinear samples)"
                    .into(),
            )
        })?;
        let l = chol.l();
        let mut chol_l = vec![0.0f64; d * d];
        for a in 0..d {
            for b in 0..=a {
                chol_l[a * d + b] = l[(a, b)];
            }
        }
        let log_det_l: f64 = (0..d).map(|k| chol_l[k * d + k].ln()).sum();
        let log_norm = -(d as f64) * LN_SQRT_2PI - log_det_l;

        // Whiten training samples once so evaluation is a distance computation.
        let mut whitened = vec![0.0f64; n * d];
        for (i, row) in data.iter_rows().enumerate() {
            let out = &mut whitened[i * d..(i + 1) * d];
            out.copy_from_slice(row);
            forward_solve(&chol_l, d, out);
        }

        let log_weights = norm_weights
            .iter()
            .map(|&w| if w > 0.0 { w.ln() } else { f64::NEG_INFINITY })
            .collect();

        Ok(Self { dims: d, whitened, log_weights, chol_l, log_norm })
    }

    fn density_at(&self, point: &[f64]) -> f64 {
        let d = self.dims;
        let mut zq = point.to_vec();
        forward_solve(&self.chol_l, d, &mut zq);

        let mut acc = LogSumExp::new();
        for (i, zi) in self.whitened.chunks_exact(d).enumerate() {
            let lw = self.log_weights[i];
            if lw == f64::NEG_INFINITY {
                continue;
            }
            let mut q = 0.0f64;
            for (a, &z) in zi.iter().enumerate() {
                let dz = zq[a] - z;
                q += dz * dz;
            }
            acc.add(lw - 0.5 * q);
        }
        let lse = acc.value();
        if lse == f64::NEG_INFINITY {
            return 0.0;
        }
        (lse + self.log_norm).exp()
    }
}

impl DensityEstimator for GaussianKde {
    fn dim(&self) -> usize {
        self.dims
    }

    fn evaluate(&self, points: &Matrix) -> Result<Vec<f64>> {
        if points.cols() != self.dims {
            return Err(Error::Validation(format!(
                "GaussianKde point dimension mismatch: expected {}, got {}",
                self.dims,
                points.cols()
            )));
        }
        if !points.is_finite() {
            return Err(Error::Validation("GaussianKde query points must be finite".into()));
        }
        Ok((0..points.rows())
            .into_par_iter()
            .map(|i| self.density_at(points.row(i)))
            .collect())
    }
}

/// [`DensityMethod`] producing [`GaussianKde`] estimators.
#[derive(Debug, Clone, Copy)]
pub struct GaussianKdeMethod {
    /// Bandwidth rule applied at fit time.
    pub bandwidth: Bandwidth,
}

impl GaussianKdeMethod {
    /// Gaussian KDE with Scott's rule.
    pub fn scott() -> Self {
        Self { bandwidth: Bandwidth::Scott }
    }

    /// Gaussian KDE with Silverman's rule.
    pub fn silverman() -> Self {
        Self { bandwidth: Bandwidth::Silverman }
    }
}

impl Default for GaussianKdeMethod {
    fn default() -> Self {
        Self::scott()
    }
}

impl DensityMethod for GaussianKdeMethod {
    fn fit(&self, data: &Matrix) -> Result<Box<dyn DensityEstimator>> {
        Ok(Box::new(GaussianKde::from_samples(data, None, self.bandwidth)?))
    }

    fn name(&self) -> &str {
        "gaussian_kde"
    }
}

fn normalize_weights(n: usize, weights: Option<&[f64]>) -> Result<Vec<f64>> {
    match weights {
        None => Ok(vec![1.0 / n as f64; n]),
        Some(w) => {
            if w.len() != n {
                return Err(Error::Validation(format!(
                    "weights length mismatch: expected {n}, got {}",
                    w.len()
                )));
            }
            if w.iter().any(|x| !x.is_finite()) {
                return Err(Error::Validation("weights must be finite".into()));
            }
            if w.iter().any(|x| *x < 0.0) {
                return Err(Error::Validation("weights must be >= 0".into()));
            }
            let sum: f64 = w.iter().sum();
            if !(sum.is_finite() && sum > 0.0) {
                return Err(Error::Validation(format!("requires sum(weights) > 0, got {sum}")));
            }
            Ok(w.iter().map(|x| x / sum).collect())
        }
    }
}

/// Solve `L z = v` in place for lower-triangular `L` (row-major `(d, d)`).
#[inline]
fn forward_solve(l: &[f64], d: usize, v: &mut [f64]) {
    for k in 0..d {
        let mut acc = v[k];
        for j in 0..k {
            acc -= l[k * d + j] * v[j];
        }
        v[k] = acc / l[k * d + k];
    }
}
