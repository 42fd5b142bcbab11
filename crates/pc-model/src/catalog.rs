//! Explicit, injectable catalog of named population models.
//!
//! There is no global registry: whoever performs model loading constructs a
//! catalog, registers loaders (closures or JSON paths), and passes it where
//! it is needed. The classification engine itself never sees a catalog —
//! only already-built [`PopulationModel`]s.

use crate::model::PopulationModel;
use crate::spec::PopulationModelSpec;
use pc_core::{Error, Result};
use std::path::PathBuf;

type Loader = Box<dyn Fn() -> Result<PopulationModel> + Send + Sync>;

/// Mapping from model name to a loader producing a [`PopulationModel`].
#[derive(Default)]
pub struct ModelCatalog {
    entries: Vec<(String, Loader)>,
}

impl ModelCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Register a loader under a model name. A repeated name replaces the
    /// previous loader.
    pub fn register<F>(&mut self, name: impl Into<String>, loader: F)
    where
        F: Fn() -> Result<PopulationModel> + Send + Sync + 'static,
    {
        let name = name.into();
        self.entries.retain(|(n, _)| *n != name);
        self.entries.push((name, Box::new(loader)));
    }

    /// Register a JSON spec file (see [`PopulationModelSpec`]) under a name.
    pub fn register_json_path(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        let path = path.into();
        self.register(name, move || PopulationModelSpec::from_path(&path)?.build());
    }

    /// Registered model names, in registration order.
    pub fn available(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Load a model by name.
    ///
    /// An unrecognized name fails with [`Error::ModelNotFound`] naming the
    /// available models; it never yields an empty model.
    pub fn load(&self, name: &str) -> Result<PopulationModel> {
        let loader = self
            .entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, l)| l)
            .ok_or_else(|| {
                Error::ModelNotFound(format!(
                    "'{name}' is not available; available models are [{}]",
                    self.available().join(", ")
                ))
            })?;
        tracing::debug!(model = name, "loading population model from catalog");
        loader()
    }
}
