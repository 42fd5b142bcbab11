//! # pc-density
//!
//! Density estimators for popclass-rs:
//! - [`GaussianKde`]: multivariate Gaussian KDE with Scott/Silverman/fixed
//!   bandwidth and full sample covariance.
//! - [`TophatKde`]: fixed-bandwidth ball-kernel KDE with hard support.
//!
//! Both implement the [`pc_core::DensityEstimator`] capability and come with
//! a [`pc_core::DensityMethod`] factory so they can be swapped anywhere a
//! density estimator is consumed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod gaussian;
pub mod math;
pub mod tophat;

pub use gaussian::{Bandwidth, GaussianKde, GaussianKdeMethod};
pub use tophat::{TophatKde, TophatKdeMethod};
