//! Population model: per-class simulation samples used as classification priors.

use crate::align::alignment_indices;
use pc_core::{DensityEstimator, DensityMethod, Error, Matrix, Result};
use pc_density::GaussianKdeMethod;
use std::collections::HashMap;
use std::sync::Arc;

/// A galactic population model: per-class parameter samples, per-class
/// weights, and the declared parameter order shared by every sample array.
///
/// Class order is the insertion order of the sample map and is stable across
/// calls. Density evaluation goes through a pluggable [`DensityMethod`]
/// (Gaussian KDE with Scott's rule by default); the estimator is re-trained
/// per call — callers that need amortized reuse fit one explicitly via
/// [`PopulationModel::fit_density`] and keep it.
pub struct PopulationModel {
    parameters: Vec<String>,
    class_names: Vec<String>,
    class_samples: Vec<Matrix>,
    class_weights: Vec<f64>,
    name_to_index: HashMap<String, usize>,
    density_method: Arc<dyn DensityMethod>,
}

impl std::fmt::Debug for PopulationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopulationModel")
            .field("parameters", &self.parameters)
            .field("class_names", &self.class_names)
            .field("class_samples", &self.class_samples)
            .field("class_weights", &self.class_weights)
            .field("name_to_index", &self.name_to_index)
            .field("density_method", &"<dyn DensityMethod>")
            .finish()
    }
}

impl PopulationModel {
    /// Build a population model from per-class samples and weights.
    ///
    /// `population_samples` pairs each class name with a
    /// `(n_samples_for_class, n_parameters)` sample matrix; iteration order
    /// fixes the class order. Every class must carry a weight, every weight a
    /// class, and every sample matrix a column per declared parameter.
    pub fn new(
        population_samples: Vec<(String, Matrix)>,
        class_weights: &HashMap<String, f64>,
        parameters: Vec<String>,
    ) -> Result<Self> {
        Self::with_density_method(
            population_samples,
            class_weights,
            parameters,
            Arc::new(GaussianKdeMethod::scott()),
        )
    }

    /// Same as [`PopulationModel::new`] with an explicit density method.
    pub fn with_density_method(
        population_samples: Vec<(String, Matrix)>,
        class_weights: &HashMap<String, f64>,
        parameters: Vec<String>,
        density_method: Arc<dyn DensityMethod>,
    ) -> Result<Self> {
        if parameters.is_empty() {
            return Err(Error::Validation(
                "PopulationModel requires at least one parameter".into(),
            ));
        }
        for (i, p) in parameters.iter().enumerate() {
            if parameters[..i].contains(p) {
                return Err(Error::Validation(format!(
                    "PopulationModel parameter '{p}' declared more than once"
                )));
            }
        }
        if population_samples.is_empty() {
            return Err(Error::Validation("PopulationModel requires at least one class".into()));
        }

        let mut class_names = Vec::with_capacity(population_samples.len());
        let mut class_samples = Vec::with_capacity(population_samples.len());
        let mut weights = Vec::with_capacity(population_samples.len());
        let mut name_to_index = HashMap::with_capacity(population_samples.len());

        for (name, samples) in population_samples {
            if name_to_index.contains_key(&name) {
                return Err(Error::Validation(format!(
                    "PopulationModel class '{name}' appears more than once"
                )));
            }
            if samples.rows() == 0 {
                return Err(Error::Validation(format!(
                    "PopulationModel class '{name}' has no samples"
                )));
            }
            if samples.cols() != parameters.len() {
                return Err(Error::Validation(format!(
                    "PopulationModel class '{name}' sample column count mismatch: \
                     expected {}, got {}",
                    parameters.len(),
                    samples.cols()
                )));
            }
            let w = *class_weights.get(&name).ok_or_else(|| {
                Error::Validation(format!("PopulationModel class '{name}' has no class weight"))
            })?;
            if !w.is_finite() || w < 0.0 {
                return Err(Error::Validation(format!(
                    "PopulationModel class '{name}' weight must be finite and >= 0, got {w}"
                )));
            }
            name_to_index.insert(name.clone(), class_names.len());
            class_names.push(name);
            class_samples.push(samples);
            weights.push(w);
        }

        for name in class_weights.keys() {
            if !name_to_index.contains_key(name) {
                return Err(Error::Validation(format!(
                    "class weight for '{name}' has no matching sample set"
                )));
            }
        }

        Ok(Self {
            parameters,
            class_names,
            class_samples,
            class_weights: weights,
            name_to_index,
            density_method,
        })
    }

    /// Declared parameter order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Class names, in insertion order (stable across calls).
    pub fn classes(&self) -> &[String] {
        &self.class_names
    }

    /// Number of classes.
    pub fn n_classes(&self) -> usize {
        self.class_names.len()
    }

    fn class_index(&self, class_name: &str) -> Result<usize> {
        self.name_to_index.get(class_name).copied().ok_or_else(|| {
            Error::UnknownClass(format!(
                "'{class_name}' not in population model; classes are [{}]",
                self.class_names.join(", ")
            ))
        })
    }

    /// Simulation samples for one class, columns aligned to `parameters`.
    pub fn samples(&self, class_name: &str, parameters: &[String]) -> Result<Matrix> {
        let idx = self.class_index(class_name)?;
        let indices = alignment_indices(&self.parameters, parameters)?;
        self.class_samples[idx].select_columns(&indices)
    }

    /// Stored weight for one class.
    pub fn class_weight(&self, class_name: &str) -> Result<f64> {
        Ok(self.class_weights[self.class_index(class_name)?])
    }

    /// Fit the configured density method to one class's samples restricted to
    /// `parameters`. Callers that evaluate repeatedly should hold onto the
    /// returned estimator instead of re-fitting through
    /// [`PopulationModel::evaluate_density`] every time.
    pub fn fit_density(
        &self,
        class_name: &str,
        parameters: &[String],
    ) -> Result<Box<dyn DensityEstimator>> {
        let class_samples = self.samples(class_name, parameters)?;
        self.density_method.fit(&class_samples)
    }

    /// Class-conditional density of `points` (shape
    /// `(n_query_points, len(parameters))`, columns in `parameters` order).
    ///
    /// The result is invariant under simultaneous permutation of `parameters`
    /// and the columns of `points`: only the (name, coordinate) pairing
    /// matters, not the column order.
    pub fn evaluate_density(
        &self,
        class_name: &str,
        parameters: &[String],
        points: &Matrix,
    ) -> Result<Vec<f64>> {
        if points.cols() != parameters.len() {
            return Err(Error::Validation(format!(
                "points column count mismatch: expected {}, got {}",
                parameters.len(),
                points.cols()
            )));
        }
        let estimator = self.fit_density(class_name, parameters)?;
        estimator.evaluate(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::prelude::*;
    use rand_distr::Normal;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn gaussian_matrix(n: usize, locs: &[f64], scale: f64, seed: u64) -> Matrix {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows = (0..n)
            .map(|_| {
                locs.iter()
                    .map(|&m| Normal::new(m, scale).unwrap().sample(&mut rng))
                    .collect()
            })
            .collect();
        Matrix::from_rows(rows).unwrap()
    }

    fn two_class_model() -> PopulationModel {
        let star = gaussian_matrix(400, &[0.7, -0.65], 0.3, 1);
        let bh = gaussian_matrix(300, &[2.2, -1.8], 0.3, 2);
        let weights =
            HashMap::from([("star".to_string(), 0.7), ("black_hole".to_string(), 0.3)]);
        PopulationModel::new(
            vec![("star".into(), star), ("black_hole".into(), bh)],
            &weights,
            names(&["log10tE", "log10piE"]),
        )
        .unwrap()
    }

    #[test]
    fn test_classes_insertion_order_stable() {
        let model = two_class_model();
        assert_eq!(model.classes(), &["star".to_string(), "black_hole".to_string()]);
        assert_eq!(model.classes(), model.classes());
    }

    #[test]
    fn test_samples_column_order_follows_request() {
        let model = two_class_model();
        let fwd = model.samples("star", &names(&["log10tE", "log10piE"])).unwrap();
        let rev = model.samples("star", &names(&["log10piE", "log10tE"])).unwrap();
        assert_eq!(fwd.rows(), rev.rows());
        for i in 0..fwd.rows() {
            assert_eq!(fwd.get(i, 0), rev.get(i, 1));
            assert_eq!(fwd.get(i, 1), rev.get(i, 0));
        }
    }

    #[test]
    fn test_unknown_class_fails() {
        let model = two_class_model();
        assert!(matches!(
            model.samples("neutron_star", &names(&["log10tE"])),
            Err(Error::UnknownClass(_))
        ));
        assert!(matches!(
            model.class_weight("neutron_star"),
            Err(Error::UnknownClass(_))
        ));
    }

    #[test]
    fn test_class_weight_returned() {
        let model = two_class_model();
        assert_eq!(model.class_weight("star").unwrap(), 0.7);
        assert_eq!(model.class_weight("black_hole").unwrap(), 0.3);
    }

    #[test]
    fn test_density_invariant_under_simultaneous_permutation() {
        let model = two_class_model();
        let points =
            Matrix::from_rows(vec![vec![0.7, -0.65], vec![1.0, -1.0], vec![2.0, -1.5]])
                .unwrap();
        let fwd = model
            .evaluate_density("star", &names(&["log10tE", "log10piE"]), &points)
            .unwrap();
        let swapped = points.select_columns(&[1, 0]).unwrap();
        let rev = model
            .evaluate_density("star", &names(&["log10piE", "log10tE"]), &swapped)
            .unwrap();
        for (a, b) in fwd.iter().zip(&rev) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_missing_weight_rejected() {
        let star = gaussian_matrix(50, &[0.0], 1.0, 3);
        let weights = HashMap::new();
        let result = PopulationModel::new(
            vec![("star".into(), star)],
            &weights,
            names(&["log10tE"]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_orphan_weight_rejected() {
        let star = gaussian_matrix(50, &[0.0], 1.0, 3);
        let weights =
            HashMap::from([("star".to_string(), 0.5), ("ghost".to_string(), 0.5)]);
        let result = PopulationModel::new(
            vec![("star".into(), star)],
            &weights,
            names(&["log10tE"]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_column_count_mismatch_rejected() {
        let star = gaussian_matrix(50, &[0.0, 1.0], 1.0, 3);
        let weights = HashMap::from([("star".to_string(), 1.0)]);
        let result = PopulationModel::new(
            vec![("star".into(), star)],
            &weights,
            names(&["log10tE"]),
        );
        assert!(result.is_err());
    }
}
