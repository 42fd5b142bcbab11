//! Epistemic "None" class: probability mass for regions the population model
//! does not adequately cover.

use crate::classify::importance_mean;
use crate::grid::{NdArray, ParameterGrid};
use crate::posterior::{InferenceData, Posterior};
use crate::uq::AdditiveUq;
use pc_core::{DensityEstimator, DensityMethod, Error, Matrix, Result};
use pc_density::TophatKdeMethod;
use pc_model::PopulationModel;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Name of the synthetic class inserted by [`NoneClassUq`].
pub const NONE_CLASS: &str = "None";

/// Additive-UQ strategy that inserts a "None" class whose density is the
/// normalized complement of the combined population model's density.
///
/// At construction a base density is trained on the union of all classes'
/// samples (ignoring class boundaries and weights), evaluated at every cell
/// center of a uniform grid over the given bounds, and inverted:
///
/// `p_raw(cell) = 1 − eval(cell) / max(eval)`
///
/// then normalized so `Σ p_raw · cell_volume = 1`. The binned density is
/// cached; evaluation is a per-sample bin lookup. The instance is read-only
/// after construction and may be shared across concurrent classifications;
/// rebuild it whenever the parameters, bounds, grid resolution, or the
/// underlying population model change.
pub struct NoneClassUq {
    grid: ParameterGrid,
    base_model_kde: Arc<dyn DensityEstimator>,
    none_pdf_binned: NdArray,
    none_class_weight: f64,
}

impl std::fmt::Debug for NoneClassUq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoneClassUq")
            .field("grid", &self.grid)
            .field("base_model_kde", &"<dyn DensityEstimator>")
            .field("none_pdf_binned", &self.none_pdf_binned)
            .field("none_class_weight", &self.none_class_weight)
            .finish()
    }
}

/// Builder for [`NoneClassUq`].
pub struct NoneClassUqBuilder {
    parameters: Vec<String>,
    bounds: HashMap<String, (f64, f64)>,
    grid_size: usize,
    none_class_weight: f64,
    density_method: Option<Arc<dyn DensityMethod>>,
    base_density: Option<Arc<dyn DensityEstimator>>,
}

impl NoneClassUq {
    /// Builder with the default configuration: `grid_size = 1000`,
    /// `none_class_weight = 0.01`, tophat base kernel with bandwidth 0.4.
    pub fn builder() -> NoneClassUqBuilder {
        NoneClassUqBuilder {
            parameters: Vec::new(),
            bounds: HashMap::new(),
            grid_size: 1000,
            none_class_weight: 0.01,
            density_method: Some(Arc::new(TophatKdeMethod::new(0.4))),
            base_density: None,
        }
    }

    /// The discretization grid.
    pub fn grid(&self) -> &ParameterGrid {
        &self.grid
    }

    /// The base density trained on the union of all classes' samples.
    pub fn base_model_kde(&self) -> &dyn DensityEstimator {
        self.base_model_kde.as_ref()
    }

    /// The cached, normalized None-class density binned on the grid cells.
    pub fn none_pdf_binned(&self) -> &NdArray {
        &self.none_pdf_binned
    }

    /// Fraction of total probability mass reserved for the None class.
    pub fn none_class_weight(&self) -> f64 {
        self.none_class_weight
    }

    /// None-class density at each posterior sample, via grid lookup.
    ///
    /// Samples are binned per dimension with half-open intervals; bin indices
    /// are clipped into `[0, grid_size - 2]`, so samples outside the bounds
    /// collapse into the boundary cells rather than erroring.
    pub fn evaluate(&self, posterior: &Posterior) -> Result<Vec<f64>> {
        let marginal = posterior.marginal(self.grid.parameters())?;
        let n_dims = self.grid.n_dims();
        let mut index = vec![0usize; n_dims];
        let mut out = Vec::with_capacity(marginal.n_samples());
        for row in marginal.samples().iter_rows() {
            for (dim, slot) in index.iter_mut().enumerate() {
                *slot = self.grid.digitize(dim, row[dim]);
            }
            out.push(self.none_pdf_binned.get(&index));
        }
        Ok(out)
    }
}

impl AdditiveUq for NoneClassUq {
    /// Reserve `none_class_weight` of the probability mass for the None
    /// class: every existing score is rescaled by `1 − w`, and the None score
    /// is `w · mean(evaluate(posterior) / prior_density)`.
    fn apply_uq(
        &self,
        unnormalized_prob: &BTreeMap<String, f64>,
        inference_data: &InferenceData,
        _population_model: &PopulationModel,
        parameters: &[String],
    ) -> Result<BTreeMap<String, f64>> {
        let grid_params = self.grid.parameters();
        if parameters.len() != grid_params.len()
            || !parameters.iter().all(|p| grid_params.contains(p))
        {
            return Err(Error::Validation(format!(
                "NoneClassUq was built for parameters [{}], classification uses [{}]",
                grid_params.join(", "),
                parameters.join(", ")
            )));
        }

        let w = self.none_class_weight;
        let mut out: BTreeMap<String, f64> =
            unnormalized_prob.iter().map(|(k, v)| (k.clone(), v * (1.0 - w))).collect();

        let none_density = self.evaluate(inference_data.posterior())?;
        let none_evaluated = importance_mean(&none_density, inference_data.prior_density())?;
        out.insert(NONE_CLASS.to_string(), w * none_evaluated);
        Ok(out)
    }
}

impl NoneClassUqBuilder {
    /// Parameters the None class is defined over (sets the grid dimensions).
    pub fn parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// Bounds for every parameter, `name -> (lower, upper)`.
    pub fn bounds(mut self, bounds: HashMap<String, (f64, f64)>) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set the bounds for one parameter.
    pub fn bound(mut self, parameter: impl Into<String>, lower: f64, upper: f64) -> Self {
        self.bounds.insert(parameter.into(), (lower, upper));
        self
    }

    /// Number of grid edges per dimension.
    pub fn grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Fraction of probability mass reserved for the None class.
    pub fn none_class_weight(mut self, weight: f64) -> Self {
        self.none_class_weight = weight;
        self
    }

    /// Density method used to train the base density. Passing `None` clears
    /// the default; construction then requires a pre-trained base density.
    pub fn density_method(mut self, method: Option<Arc<dyn DensityMethod>>) -> Self {
        self.density_method = method;
        self
    }

    /// Supply a pre-trained base density instead of training one.
    pub fn base_density(mut self, density: Arc<dyn DensityEstimator>) -> Self {
        self.base_density = Some(density);
        self
    }

    /// Build the None-class state: grid, base density, and the cached binned
    /// complement density.
    pub fn build(self, population_model: Option<&PopulationModel>) -> Result<NoneClassUq> {
        if self.parameters.is_empty() {
            return Err(Error::MissingConfiguration(
                "NoneClassUq requires at least one parameter".into(),
            ));
        }
        if !self.none_class_weight.is_finite()
            || !(0.0..=1.0).contains(&self.none_class_weight)
        {
            return Err(Error::Validation(format!(
                "none_class_weight must be in [0, 1], got {}",
                self.none_class_weight
            )));
        }

        let grid = ParameterGrid::new(&self.parameters, &self.bounds, self.grid_size)?;

        let base_model_kde: Arc<dyn DensityEstimator> = match (self.base_density, population_model)
        {
            (Some(density), _) => {
                if density.dim() != self.parameters.len() {
                    return Err(Error::Validation(format!(
                        "pre-trained base density has {} dimensions, expected {}",
                        density.dim(),
                        self.parameters.len()
                    )));
                }
                density
            }
            (None, None) => {
                return Err(Error::MissingConfiguration(
                    "NoneClassUq requires a population model or a pre-trained base density"
                        .into(),
                ));
            }
            (None, Some(model)) => {
                let Some(method) = self.density_method.as_ref() else {
                    return Err(Error::MissingConfiguration(
                        "NoneClassUq requires a density method when no pre-trained base \
                         density is given"
                            .into(),
                    ));
                };
                let per_class: Vec<Matrix> = model
                    .classes()
                    .iter()
                    .map(|c| model.samples(c, &self.parameters))
                    .collect::<Result<_>>()?;
                let refs: Vec<&Matrix> = per_class.iter().collect();
                let union = Matrix::vstack(&refs)?;
                tracing::debug!(
                    n_samples = union.rows(),
                    n_dims = union.cols(),
                    method = method.name(),
                    "training base density on union of class samples"
                );
                Arc::from(method.fit(&union)?)
            }
        };

        let started = std::time::Instant::now();
        let centers = grid.centers_raveled()?;
        let evaluations = base_model_kde.evaluate(&centers)?;

        let mut max_eval = f64::NEG_INFINITY;
        for &e in &evaluations {
            if !e.is_finite() || e < 0.0 {
                return Err(Error::Validation(format!(
                    "base density produced an invalid grid evaluation: {e}"
                )));
            }
            if e > max_eval {
                max_eval = e;
            }
        }
        if max_eval <= 0.0 {
            return Err(Error::Validation(
                "base density is zero everywhere on the grid; \
                 cannot define a complement density"
                    .into(),
            ));
        }

        let mut raw: Vec<f64> =
            evaluations.iter().map(|e| 1.0 - e / max_eval).collect();
        let normalization: f64 = raw.iter().sum::<f64>() * grid.cell_volume();
        if !normalization.is_finite() || normalization <= 0.0 {
            return Err(Error::Validation(format!(
                "complement density normalization is {normalization}; \
                 the base density saturates the entire grid"
            )));
        }
        for v in &mut raw {
            *v /= normalization;
        }
        let none_pdf_binned = NdArray::from_values(raw, grid.cell_shape())?;

        tracing::debug!(
            n_cells = grid.n_cells(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built None-class grid density"
        );

        Ok(NoneClassUq {
            grid,
            base_model_kde,
            none_pdf_binned,
            none_class_weight: self.none_class_weight,
        })
    }
}
