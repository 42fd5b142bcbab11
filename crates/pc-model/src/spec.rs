//! Declarative population-model spec (JSON), consumed by loading collaborators.
//!
//! The on-disk layout mirrors the tree the original model files use:
//! `model_name`, `parameters`, `class_weights`, `class_data`. Class data is an
//! ordered list (not a map) so the class order of the built
//! [`PopulationModel`] is deterministic.

use crate::model::PopulationModel;
use pc_core::{Error, Matrix, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Samples for one class: rows are samples, columns follow the spec's
/// declared parameter order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDataSpec {
    /// Class name (unique within the spec).
    pub class: String,
    /// Sample rows, each of length `parameters.len()`.
    pub samples: Vec<Vec<f64>>,
}

/// Serializable population-model description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationModelSpec {
    /// Human-readable model name.
    pub model_name: String,
    /// Declared parameter order for every class's sample columns.
    pub parameters: Vec<String>,
    /// Per-class non-negative weight.
    pub class_weights: BTreeMap<String, f64>,
    /// Per-class samples, in class order.
    pub class_data: Vec<ClassDataSpec>,
}

impl PopulationModelSpec {
    /// Parse a spec from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a spec from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to a JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Capture a built model back into spec form.
    pub fn from_model(model: &PopulationModel, model_name: impl Into<String>) -> Result<Self> {
        let parameters = model.parameters().to_vec();
        let mut class_weights = BTreeMap::new();
        let mut class_data = Vec::with_capacity(model.n_classes());
        for class in model.classes() {
            class_weights.insert(class.clone(), model.class_weight(class)?);
            let samples = model.samples(class, &parameters)?;
            class_data.push(ClassDataSpec {
                class: class.clone(),
                samples: samples.iter_rows().map(|r| r.to_vec()).collect(),
            });
        }
        Ok(Self { model_name: model_name.into(), parameters, class_weights, class_data })
    }

    /// Build a validated [`PopulationModel`] from this spec.
    pub fn build(&self) -> Result<PopulationModel> {
        let n_params = self.parameters.len();
        let mut population_samples = Vec::with_capacity(self.class_data.len());
        for entry in &self.class_data {
            for (i, row) in entry.samples.iter().enumerate() {
                if row.len() != n_params {
                    return Err(Error::Validation(format!(
                        "class '{}' sample {i} has {} values, expected {n_params}",
                        entry.class,
                        row.len()
                    )));
                }
            }
            let samples = Matrix::from_rows(entry.samples.clone())?;
            population_samples.push((entry.class.clone(), samples));
        }
        let class_weights: HashMap<String, f64> =
            self.class_weights.iter().map(|(k, v)| (k.clone(), *v)).collect();
        PopulationModel::new(population_samples, &class_weights, self.parameters.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_spec() -> PopulationModelSpec {
        PopulationModelSpec {
            model_name: "demo".into(),
            parameters: vec!["log10tE".into(), "log10piE".into()],
            class_weights: BTreeMap::from([("star".to_string(), 0.8), ("bh".to_string(), 0.2)]),
            class_data: vec![
                ClassDataSpec {
                    class: "star".into(),
                    samples: (0..20)
                        .map(|i| vec![0.5 + 0.01 * i as f64, -0.6 - 0.01 * i as f64])
                        .collect(),
                },
                ClassDataSpec {
                    class: "bh".into(),
                    samples: (0..20)
                        .map(|i| vec![2.0 + 0.01 * i as f64, -1.7 + 0.01 * i as f64])
                        .collect(),
                },
            ],
        }
    }

    #[test]
    fn test_build_preserves_class_order() {
        let model = demo_spec().build().unwrap();
        assert_eq!(model.classes(), &["star".to_string(), "bh".to_string()]);
        assert_eq!(model.parameters(), &["log10tE".to_string(), "log10piE".to_string()]);
    }

    #[test]
    fn test_json_round_trip_reproduces_model() {
        let spec = demo_spec();
        let json = spec.to_json_string().unwrap();
        let reread = PopulationModelSpec::from_json_str(&json).unwrap();
        let a = spec.build().unwrap();
        let b = reread.build().unwrap();

        assert_eq!(a.classes(), b.classes());
        assert_eq!(a.parameters(), b.parameters());
        for class in a.classes() {
            let sa = a.samples(class, &spec.parameters).unwrap();
            let sb = b.samples(class, &spec.parameters).unwrap();
            assert_eq!(sa, sb);
            assert_eq!(a.class_weight(class).unwrap(), b.class_weight(class).unwrap());
        }
    }

    #[test]
    fn test_from_model_round_trip() {
        let spec = demo_spec();
        let model = spec.build().unwrap();
        let captured = PopulationModelSpec::from_model(&model, "demo").unwrap();
        assert_eq!(captured.parameters, spec.parameters);
        assert_eq!(captured.class_weights, spec.class_weights);
        assert_eq!(captured.class_data.len(), spec.class_data.len());
        for (a, b) in captured.class_data.iter().zip(&spec.class_data) {
            assert_eq!(a.class, b.class);
            assert_eq!(a.samples, b.samples);
        }
    }

    #[test]
    fn test_ragged_class_data_rejected() {
        let mut spec = demo_spec();
        spec.class_data[0].samples[3] = vec![1.0];
        assert!(spec.build().is_err());
    }
}
