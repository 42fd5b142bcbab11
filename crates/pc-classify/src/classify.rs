//! Class-probability computation for one observed event.

use crate::posterior::InferenceData;
use crate::uq::AdditiveUq;
use pc_core::{Error, Result};
use pc_model::PopulationModel;
use std::collections::BTreeMap;

/// Classify an observed event against a population model.
///
/// For each class `c` the unnormalized score is
///
/// `w_c · mean_i( p(φ_i | c) / π(φ_i) )`
///
/// over posterior samples `φ_i` with sampling-prior density `π`: a
/// self-normalized importance-sampling estimate of the overlap between the
/// event's posterior and the class's simulated population, weighted by the
/// class weight. An optional additive-UQ strategy then transforms the score
/// map (e.g. inserting a "None" class) before normalization to a probability
/// simplex.
///
/// Fails with [`Error::ZeroNormalization`] if the final score sum is zero or
/// non-finite; no partial or renormalized-by-fiat result is ever returned.
pub fn classify(
    inference_data: &InferenceData,
    population_model: &PopulationModel,
    parameters: &[String],
    additive_uq: Option<&dyn AdditiveUq>,
) -> Result<BTreeMap<String, f64>> {
    let posterior = inference_data.posterior().marginal(parameters)?;
    let prior_density = inference_data.prior_density();

    let mut unnormalized = BTreeMap::new();
    for class_name in population_model.classes() {
        let density = population_model.evaluate_density(
            class_name,
            posterior.parameter_labels(),
            posterior.samples(),
        )?;
        let integrated = importance_mean(&density, prior_density)?;
        let weight = population_model.class_weight(class_name)?;
        unnormalized.insert(class_name.clone(), integrated * weight);
    }

    let unnormalized = match additive_uq {
        Some(uq) => {
            uq.apply_uq(&unnormalized, inference_data, population_model, parameters)?
        }
        None => unnormalized,
    };

    normalize(unnormalized)
}

/// `mean(density / prior)` — the importance-sampling estimate shared by the
/// per-class scores and the None-class evaluation.
pub(crate) fn importance_mean(density: &[f64], prior_density: &[f64]) -> Result<f64> {
    if density.len() != prior_density.len() {
        return Err(Error::Validation(format!(
            "density/prior length mismatch: {} vs {}",
            density.len(),
            prior_density.len()
        )));
    }
    let n = density.len() as f64;
    Ok(density.iter().zip(prior_density).map(|(d, p)| d / p).sum::<f64>() / n)
}

fn normalize(mut scores: BTreeMap<String, f64>) -> Result<BTreeMap<String, f64>> {
    for (class_name, score) in &scores {
        if !score.is_finite() || *score < 0.0 {
            return Err(Error::Validation(format!(
                "unnormalized score for class '{class_name}' must be finite and >= 0, \
                 got {score}"
            )));
        }
    }
    let total: f64 = scores.values().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(Error::ZeroNormalization(format!(
            "sum of unnormalized class scores is {total}; \
             the posterior has no support under any class"
        )));
    }
    for score in scores.values_mut() {
        *score /= total;
    }
    Ok(scores)
}
