//! # pc-classify
//!
//! The classification engine of popclass-rs:
//! - [`Posterior`] / [`InferenceData`]: an observed event's posterior samples
//!   and their sampling-prior density.
//! - [`classify`]: per-class importance-sampled posterior overlap against a
//!   [`pc_model::PopulationModel`], normalized to a probability simplex.
//! - [`AdditiveUq`] / [`PassthroughUq`]: pluggable additive
//!   uncertainty-quantification strategies.
//! - [`NoneClassUq`]: the epistemic "None" class over a discretized grid
//!   ([`ParameterGrid`] + [`NdArray`]).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod grid;
pub mod none_class;
pub mod posterior;
pub mod uq;

pub use classify::classify;
pub use grid::{NdArray, ParameterGrid};
pub use none_class::{NoneClassUq, NoneClassUqBuilder, NONE_CLASS};
pub use posterior::{InferenceData, Posterior};
pub use uq::{AdditiveUq, PassthroughUq};
