//! End-to-end classification scenarios against a synthetic galactic model.

use pc_classify::{classify, NoneClassUq, PassthroughUq, Posterior, NONE_CLASS};
use pc_classify::uq::AdditiveUq;
use pc_core::Matrix;
use pc_model::PopulationModel;
use rand::prelude::*;
use rand_distr::Normal;
use std::collections::HashMap;

const STAR_CENTER: [f64; 2] = [0.7, -0.65];
const BH_CENTER: [f64; 2] = [2.2, -1.8];
const PRIOR_DENSITY: f64 = 0.028;

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn gaussian_rows(n: usize, locs: &[f64], scale: f64, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            locs.iter()
                .map(|&m| Normal::new(m, scale).unwrap().sample(&mut rng))
                .collect()
        })
        .collect()
}

/// Two-class model mimicking a stellar population and a black-hole cluster in
/// (log10tE, log10piE) space.
fn galactic_model() -> PopulationModel {
    let star = Matrix::from_rows(gaussian_rows(2_000, &STAR_CENTER, 0.3, 101)).unwrap();
    let bh = Matrix::from_rows(gaussian_rows(1_500, &BH_CENTER, 0.3, 102)).unwrap();
    let weights = HashMap::from([("star".to_string(), 0.7), ("black_hole".to_string(), 0.3)]);
    PopulationModel::new(
        vec![("star".into(), star), ("black_hole".into(), bh)],
        &weights,
        names(&["log10tE", "log10piE"]),
    )
    .unwrap()
}

fn posterior_at(loc: &[f64; 2], scale: f64, n: usize, seed: u64) -> Posterior {
    Posterior::from_rows(gaussian_rows(n, loc, scale, seed), names(&["log10tE", "log10piE"]))
        .unwrap()
}

fn none_class_for(model: &PopulationModel) -> NoneClassUq {
    NoneClassUq::builder()
        .parameters(["log10tE", "log10piE"])
        .bound("log10tE", -0.5, 4.0)
        .bound("log10piE", -3.0, 0.0)
        .grid_size(100)
        .build(Some(model))
        .unwrap()
}

#[test]
fn test_class_probabilities_sum_to_unity() {
    let model = galactic_model();
    let posterior = posterior_at(&[1.5, -1.0], 0.1, 2_000, 7);
    let inference_data =
        posterior.to_inference_data(vec![PRIOR_DENSITY; 2_000]).unwrap();
    let parameters = names(&["log10tE", "log10piE"]);

    let classification = classify(&inference_data, &model, &parameters, None).unwrap();
    for class in model.classes() {
        assert!(classification.contains_key(class));
    }
    let total: f64 = classification.values().sum();
    assert!((total - 1.0).abs() < 1e-6);

    let none_class = none_class_for(&model);
    let with_uq =
        classify(&inference_data, &model, &parameters, Some(&none_class)).unwrap();
    assert!(with_uq.contains_key(NONE_CLASS));
    let total: f64 = with_uq.values().sum();
    assert!((total - 1.0).abs() < 1e-6);
}

#[test]
fn test_high_confidence_black_hole() {
    let model = galactic_model();
    let posterior = posterior_at(&BH_CENTER, 1e-5, 5_000, 8);
    let inference_data =
        posterior.to_inference_data(vec![PRIOR_DENSITY; 5_000]).unwrap();

    let classification = classify(
        &inference_data,
        &model,
        &names(&["log10tE", "log10piE"]),
        None,
    )
    .unwrap();
    assert!(
        classification["black_hole"] > 0.999,
        "black_hole = {}",
        classification["black_hole"]
    );
}

#[test]
fn test_high_confidence_star_with_uq() {
    let model = galactic_model();
    let posterior = posterior_at(&STAR_CENTER, 1e-5, 5_000, 9);
    let inference_data =
        posterior.to_inference_data(vec![PRIOR_DENSITY; 5_000]).unwrap();

    let none_class = none_class_for(&model);
    let classification = classify(
        &inference_data,
        &model,
        &names(&["log10tE", "log10piE"]),
        Some(&none_class),
    )
    .unwrap();
    assert!(classification["star"] > 0.99, "star = {}", classification["star"]);
    assert!(
        classification[NONE_CLASS] < 0.01,
        "None = {}",
        classification[NONE_CLASS]
    );
}

#[test]
fn test_no_support_classified_as_none() {
    let model = galactic_model();
    // A region inside the bounds but far from both simulated clusters.
    let posterior = posterior_at(&[3.0, -0.1], 1e-5, 5_000, 10);
    let inference_data =
        posterior.to_inference_data(vec![PRIOR_DENSITY; 5_000]).unwrap();

    let none_class = none_class_for(&model);
    let classification = classify(
        &inference_data,
        &model,
        &names(&["log10tE", "log10piE"]),
        Some(&none_class),
    )
    .unwrap();
    assert!(
        classification[NONE_CLASS] > 0.99,
        "None = {}",
        classification[NONE_CLASS]
    );
    assert!(classification["star"] < 0.01, "star = {}", classification["star"]);
}

#[test]
fn test_far_posterior_without_uq_is_zero_normalization() {
    let model = galactic_model();
    // So far away that every class density underflows to exactly zero.
    let posterior = posterior_at(&[1e3, -1e3], 1e-5, 1_000, 11);
    let inference_data =
        posterior.to_inference_data(vec![PRIOR_DENSITY; 1_000]).unwrap();

    let err = classify(
        &inference_data,
        &model,
        &names(&["log10tE", "log10piE"]),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, pc_core::Error::ZeroNormalization(_)));
}

#[test]
fn test_passthrough_uq_is_identity() {
    let model = galactic_model();
    let posterior = posterior_at(&[1.5, -1.0], 0.1, 1_000, 12);
    let inference_data =
        posterior.to_inference_data(vec![PRIOR_DENSITY; 1_000]).unwrap();
    let parameters = names(&["log10tE", "log10piE"]);

    let scores = std::collections::BTreeMap::from([
        ("star".to_string(), 80.0),
        ("black_hole".to_string(), 20.0),
    ]);
    let out = PassthroughUq
        .apply_uq(&scores, &inference_data, &model, &parameters)
        .unwrap();
    assert_eq!(out, scores);

    // And classify with the passthrough equals classify without UQ.
    let plain = classify(&inference_data, &model, &parameters, None).unwrap();
    let with_null =
        classify(&inference_data, &model, &parameters, Some(&PassthroughUq)).unwrap();
    assert_eq!(plain.len(), with_null.len());
    for (class, prob) in &plain {
        assert!((prob - with_null[class]).abs() < 1e-12);
    }
}

#[test]
fn test_classification_order_invariant_in_parameters() {
    let model = galactic_model();
    let posterior = posterior_at(&[1.5, -1.0], 0.1, 1_000, 13);
    let inference_data =
        posterior.to_inference_data(vec![PRIOR_DENSITY; 1_000]).unwrap();

    let fwd = classify(
        &inference_data,
        &model,
        &names(&["log10tE", "log10piE"]),
        None,
    )
    .unwrap();
    let rev = classify(
        &inference_data,
        &model,
        &names(&["log10piE", "log10tE"]),
        None,
    )
    .unwrap();
    for (class, prob) in &fwd {
        assert!((prob - rev[class]).abs() < 1e-9, "{class}: {prob} vs {}", rev[class]);
    }
}
