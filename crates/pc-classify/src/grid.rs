//! Dense N-dimensional grid over a bounded parameter region.
//!
//! The grid is stored as per-dimension edge/center axes plus row-major stride
//! metadata; the full Cartesian products ([`ParameterGrid::corners`],
//! [`ParameterGrid::centers_raveled`]) are materialized on demand. Values
//! binned on the grid live in an [`NdArray`]: one flat buffer indexed by a
//! per-dimension bin-index tuple.

use pc_core::{Error, Matrix, Result};
use pc_density::math::linspace;
use std::collections::HashMap;

/// Dense N-dimensional array: flat row-major buffer + shape + strides.
#[derive(Debug, Clone)]
pub struct NdArray {
    data: Vec<f64>,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

impl NdArray {
    /// Wrap a flat row-major buffer (last dimension fastest) with a shape.
    pub fn from_values(data: Vec<f64>, shape: Vec<usize>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::Validation(format!(
                "NdArray buffer length mismatch: expected {expected} for shape {shape:?}, got {}",
                data.len()
            )));
        }
        let mut strides = vec![1usize; shape.len()];
        for k in (0..shape.len().saturating_sub(1)).rev() {
            strides[k] = strides[k + 1] * shape[k + 1];
        }
        Ok(Self { data, shape, strides })
    }

    /// Array shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Value at a per-dimension index tuple. `index` must have one entry per
    /// dimension, each within the shape.
    #[inline]
    pub fn get(&self, index: &[usize]) -> f64 {
        debug_assert_eq!(index.len(), self.shape.len());
        let mut flat = 0usize;
        for (k, &i) in index.iter().enumerate() {
            debug_assert!(i < self.shape[k]);
            flat += i * self.strides[k];
        }
        self.data[flat]
    }

    /// Flat row-major view of the buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Uniform rectangular grid over a bounded region of parameter space.
#[derive(Debug, Clone)]
pub struct ParameterGrid {
    parameters: Vec<String>,
    edges: Vec<Vec<f64>>,
    centers: Vec<Vec<f64>>,
    grid_size: usize,
    cell_volume: f64,
}

impl ParameterGrid {
    /// Build a grid with `grid_size` evenly spaced edges per dimension.
    ///
    /// `bounds` maps each parameter in `parameters` to `(lower, upper)`.
    pub fn new(
        parameters: &[String],
        bounds: &HashMap<String, (f64, f64)>,
        grid_size: usize,
    ) -> Result<Self> {
        if parameters.is_empty() {
            return Err(Error::Validation("ParameterGrid requires at least one parameter".into()));
        }
        if grid_size < 2 {
            return Err(Error::Validation(format!(
                "ParameterGrid requires grid_size >= 2, got {grid_size}"
            )));
        }

        let mut edges = Vec::with_capacity(parameters.len());
        let mut centers = Vec::with_capacity(parameters.len());
        let mut cell_volume = 1.0f64;
        for p in parameters {
            let &(lo, hi) = bounds.get(p).ok_or_else(|| {
                Error::Validation(format!("no bounds given for parameter '{p}'"))
            })?;
            if !lo.is_finite() || !hi.is_finite() || lo >= hi {
                return Err(Error::Validation(format!(
                    "invalid bounds for '{p}': expected finite low < high, got ({lo}, {hi})"
                )));
            }
            let e = linspace(lo, hi, grid_size);
            let c: Vec<f64> = e.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect();
            cell_volume *= e[1] - e[0];
            edges.push(e);
            centers.push(c);
        }

        // Reject grids whose cell count overflows before any allocation.
        parameters.iter().try_fold(1usize, |acc, _| {
            acc.checked_mul(grid_size - 1).ok_or_else(|| {
                Error::Validation(format!(
                    "grid of size {grid_size} over {} dimensions has too many cells",
                    parameters.len()
                ))
            })
        })?;

        Ok(Self {
            parameters: parameters.to_vec(),
            edges,
            centers,
            grid_size,
            cell_volume,
        })
    }

    /// Parameters, in grid dimension order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Number of dimensions.
    pub fn n_dims(&self) -> usize {
        self.parameters.len()
    }

    /// Number of edges per dimension.
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Edge coordinates for one dimension (`grid_size` values).
    pub fn edges(&self, dim: usize) -> &[f64] {
        &self.edges[dim]
    }

    /// Bin-center coordinates for one dimension (`grid_size - 1` values).
    pub fn centers(&self, dim: usize) -> &[f64] {
        &self.centers[dim]
    }

    /// Edge coordinates looked up by parameter name.
    pub fn edges_for(&self, parameter: &str) -> Option<&[f64]> {
        self.parameters
            .iter()
            .position(|p| p == parameter)
            .map(|k| self.edges[k].as_slice())
    }

    /// Per-cell volume (constant across the uniform grid).
    pub fn cell_volume(&self) -> f64 {
        self.cell_volume
    }

    /// Shape of the cell (bin-center) array: `[grid_size - 1; n_dims]`.
    pub fn cell_shape(&self) -> Vec<usize> {
        vec![self.grid_size - 1; self.parameters.len()]
    }

    /// Total number of cells.
    pub fn n_cells(&self) -> usize {
        self.cell_shape().iter().product()
    }

    /// All grid corner coordinates: the Cartesian product of the edge axes in
    /// row-major order (last dimension fastest), shape
    /// `(grid_size^n_dims, n_dims)`.
    pub fn corners(&self) -> Result<Matrix> {
        cartesian_product(&self.edges)
    }

    /// All cell-center coordinates, row-major, shape
    /// `((grid_size-1)^n_dims, n_dims)`. Row `r` corresponds to the
    /// [`NdArray`] flat index `r` for arrays of shape [`Self::cell_shape`].
    pub fn centers_raveled(&self) -> Result<Matrix> {
        cartesian_product(&self.centers)
    }

    /// Bin index of `x` along one dimension, using half-open intervals
    /// `[e_k, e_{k+1})` and clipping into `[0, grid_size - 2]` so coordinates
    /// outside the bounds collapse into the boundary cells.
    #[inline]
    pub fn digitize(&self, dim: usize, x: f64) -> usize {
        let edges = &self.edges[dim];
        let k = edges.partition_point(|e| *e <= x);
        k.saturating_sub(1).min(self.grid_size - 2)
    }
}

/// Cartesian product of per-dimension axes, row-major (last axis fastest).
fn cartesian_product(axes: &[Vec<f64>]) -> Result<Matrix> {
    let d = axes.len();
    let total: usize = axes.iter().map(|a| a.len()).product();
    let mut data = Vec::with_capacity(total.saturating_mul(d));
    let mut index = vec![0usize; d];
    for _ in 0..total {
        for (k, &i) in index.iter().enumerate() {
            data.push(axes[k][i]);
        }
        for k in (0..d).rev() {
            index[k] += 1;
            if index[k] < axes[k].len() {
                break;
            }
            index[k] = 0;
        }
    }
    Matrix::from_flat(data, total, d)
}
