//! Parameter alignment between a declared ordering and a requested subset.

use pc_core::{Error, Result};

/// Map a requested ordered subset of parameter names onto a declared order.
///
/// Returns one index into `declared` per entry of `requested`, in the
/// requested order, so that selecting those columns from an array stored in
/// `declared` order yields columns aligned exactly to `requested`.
///
/// An unknown or duplicated requested name fails with
/// [`Error::InvalidParameter`]. An empty request is a caller misuse state:
/// it is allowed (zero-column result) but logged as a warning.
pub fn alignment_indices(declared: &[String], requested: &[String]) -> Result<Vec<usize>> {
    if requested.is_empty() {
        tracing::warn!("empty parameter request: result will have zero columns");
        return Ok(Vec::new());
    }

    let mut indices = Vec::with_capacity(requested.len());
    for (i, name) in requested.iter().enumerate() {
        if requested[..i].contains(name) {
            return Err(Error::InvalidParameter(format!(
                "parameter '{name}' requested more than once"
            )));
        }
        let idx = declared.iter().position(|p| p == name).ok_or_else(|| {
            Error::InvalidParameter(format!(
                "parameter '{name}' not in declared set [{}]",
                declared.join(", ")
            ))
        })?;
        indices.push(idx);
    }
    Ok(indices)
}
