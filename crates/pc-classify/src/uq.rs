//! Additive uncertainty-quantification strategies.

use crate::posterior::InferenceData;
use pc_model::PopulationModel;
use pc_core::Result;
use std::collections::BTreeMap;

/// An additive UQ step applied to the unnormalized class scores before
/// normalization.
///
/// Implementations may rescale existing entries and/or insert new ones (e.g.
/// a "None" class), but must return a valid mapping from class name to
/// non-negative score. `apply_uq` is a pure transformation: the input map is
/// untouched and a new map is returned.
pub trait AdditiveUq: Send + Sync {
    /// Transform the unnormalized class scores.
    fn apply_uq(
        &self,
        unnormalized_prob: &BTreeMap<String, f64>,
        inference_data: &InferenceData,
        population_model: &PopulationModel,
        parameters: &[String],
    ) -> Result<BTreeMap<String, f64>>;
}

/// The null strategy: returns the scores unchanged.
///
/// This is the baseline contract every additive-UQ strategy refines — a
/// possible reweight-and-insert, never an unrelated transformation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughUq;

impl AdditiveUq for PassthroughUq {
    fn apply_uq(
        &self,
        unnormalized_prob: &BTreeMap<String, f64>,
        _inference_data: &InferenceData,
        _population_model: &PopulationModel,
        _parameters: &[String],
    ) -> Result<BTreeMap<String, f64>> {
        Ok(unnormalized_prob.clone())
    }
}
