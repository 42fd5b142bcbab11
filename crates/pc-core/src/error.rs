//! Error types for popclass-rs

use thiserror::Error;

/// popclass-rs error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Posterior sample invariant violated (NaN samples, or too few samples).
    #[error("Invalid posterior: {0}")]
    InvalidPosterior(String),

    /// Requested parameter name absent from the declared parameter set.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Requested class name absent from the population model.
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// Required configuration missing at construction time.
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    /// Sum of unnormalized class scores is zero or non-finite.
    #[error("Zero normalization: {0}")]
    ZeroNormalization(String),

    /// Model name not present in the catalog.
    #[error("Model not found: {0}")]
    ModelNotFound(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
