//! Fixed-bandwidth tophat (ball) kernel density estimation.

use pc_core::{DensityEstimator, DensityMethod, Error, Matrix, Result};
use rayon::prelude::*;
use statrs::function::gamma::gamma;

/// Tophat KDE: a uniform ball kernel of radius `bandwidth` around each sample.
///
/// `p(x) = #{i : ‖x − x_i‖ ≤ h} / (n · V_d(h))` with `V_d(h)` the volume of
/// the d-ball of radius `h`. Unlike the Gaussian kernel this estimator has
/// hard support, which makes it the natural base density for carving out
/// "unmodeled" parameter space: it is exactly zero away from the samples.
pub struct TophatKde {
    dims: usize,
    /// Training samples, row-major `(n, dims)`.
    centers: Vec<f64>,
    n_centers: usize,
    bandwidth_sq: f64,
    /// `1 / (n · V_d(h))`.
    density_per_hit: f64,
}

impl TophatKde {
    /// Fit a tophat KDE to `data` (shape `(n_samples, n_dims)`).
    pub fn from_samples(data: &Matrix, bandwidth: f64) -> Result<Self> {
        let n = data.rows();
        let d = data.cols();
        if d == 0 {
            return Err(Error::Validation("TophatKde requires at least one dimension".into()));
        }
        if n == 0 {
            return Err(Error::Validation("TophatKde requires at least one sample".into()));
        }
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return Err(Error::Validation(format!(
                "TophatKde bandwidth must be finite and > 0, got {bandwidth}"
            )));
        }
        if !data.is_finite() {
            return Err(Error::Validation("TophatKde samples must be finite".into()));
        }

        let ball_volume = unit_ball_volume(d) * bandwidth.powi(d as i32);
        Ok(Self {
            dims: d,
            centers: data.as_slice().to_vec(),
            n_centers: n,
            bandwidth_sq: bandwidth * bandwidth,
            density_per_hit: 1.0 / (n as f64 * ball_volume),
        })
    }

    fn density_at(&self, point: &[f64]) -> f64 {
        let d = self.dims;
        let mut hits = 0usize;
        for center in self.centers.chunks_exact(d) {
            let mut q = 0.0f64;
            for (a, &c) in center.iter().enumerate() {
                let dx = point[a] - c;
                q += dx * dx;
                if q > self.bandwidth_sq {
                    break;
                }
            }
            if q <= self.bandwidth_sq {
                hits += 1;
            }
        }
        hits as f64 * self.density_per_hit
    }

    /// Number of training samples.
    pub fn n_samples(&self) -> usize {
        self.n_centers
    }
}

impl DensityEstimator for TophatKde {
    fn dim(&self) -> usize {
        self.dims
    }

    fn evaluate(&self, points: &Matrix) -> Result<Vec<f64>> {
        if points.cols() != self.dims {
            return Err(Error::Validation(format!(
                "TophatKde point dimension mismatch: expected {}, got {}",
                self.dims,
                points.cols()
            )));
        }
        if !points.is_finite() {
            return Err(Error::Validation("TophatKde query points must be finite".into()));
        }
        Ok((0..points.rows())
            .into_par_iter()
            .map(|i| self.density_at(points.row(i)))
            .collect())
    }
}

/// Volume of the unit d-ball: `π^(d/2) / Γ(d/2 + 1)`.
fn unit_ball_volume(d: usize) -> f64 {
    std::f64::consts::PI.powf(d as f64 / 2.0) / gamma(d as f64 / 2.0 + 1.0)
}

/// [`DensityMethod`] producing [`TophatKde`] estimators.
#[derive(Debug, Clone, Copy)]
pub struct TophatKdeMethod {
    /// Ball radius in parameter space.
    pub bandwidth: f64,
}

impl TophatKdeMethod {
    /// Tophat KDE with the given ball radius.
    pub fn new(bandwidth: f64) -> Self {
        Self { bandwidth }
    }
}

impl DensityMethod for TophatKdeMethod {
    fn fit(&self, data: &Matrix) -> Result<Box<dyn DensityEstimator>> {
        Ok(Box::new(TophatKde::from_samples(data, self.bandwidth)?))
    }

    fn name(&self) -> &str {
        "tophat_kde"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_ball_volumes() {
        assert_relative_eq!(unit_ball_volume(1), 2.0, epsilon = 1e-12);
        assert_relative_eq!(unit_ball_volume(2), std::f64::consts::PI, epsilon = 1e-12);
        assert_relative_eq!(
            unit_ball_volume(3),
            4.0 / 3.0 * std::f64::consts::PI,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_single_sample_density_inside_and_outside() {
        let data = Matrix::from_rows(vec![vec![0.0, 0.0]]).unwrap();
        let kde = TophatKde::from_samples(&data, 1.0).unwrap();

        let points = Matrix::from_rows(vec![
            vec![0.0, 0.0],
            vec![0.5, 0.5],
            vec![2.0, 0.0],
        ])
        .unwrap();
        let out = kde.evaluate(&points).unwrap();
        let inside = 1.0 / std::f64::consts::PI;
        assert_relative_eq!(out[0], inside, epsilon = 1e-12);
        assert_relative_eq!(out[1], inside, epsilon = 1e-12);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn test_hit_counting() {
        let data =
            Matrix::from_rows(vec![vec![0.0], vec![0.1], vec![5.0], vec![5.05]]).unwrap();
        let kde = TophatKde::from_samples(&data, 0.4).unwrap();
        // 1-D ball volume is 2h = 0.8; density per hit is 1/(4*0.8).
        let out = kde
            .evaluate(&Matrix::from_rows(vec![vec![0.05], vec![5.0], vec![2.5]]).unwrap())
            .unwrap();
        assert_relative_eq!(out[0], 2.0 / (4.0 * 0.8), epsilon = 1e-12);
        assert_relative_eq!(out[1], 2.0 / (4.0 * 0.8), epsilon = 1e-12);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn test_boundary_point_counts_as_hit() {
        let data = Matrix::from_rows(vec![vec![0.0]]).unwrap();
        let kde = TophatKde::from_samples(&data, 0.5).unwrap();
        let out = kde.evaluate(&Matrix::from_rows(vec![vec![0.5]]).unwrap()).unwrap();
        assert!(out[0] > 0.0);
    }

    #[test]
    fn test_invalid_bandwidth_rejected() {
        let data = Matrix::from_rows(vec![vec![0.0]]).unwrap();
        assert!(TophatKde::from_samples(&data, 0.0).is_err());
        assert!(TophatKde::from_samples(&data, f64::NAN).is_err());
    }
}
