//! Domain and field shape validation.
//!
//! A domain Ω is a tuple of 2 or 3 positive grid extents. A vector field over
//! Ω is stored as a rank-5 tensor `[Ω0, Ω1, Ω2, T, k]`, where the third
//! spatial axis is fixed to 1 for planar domains, `T` counts timepoints and
//! `k` is a positive multiple of the dimensionality.
//!
//! A volume one slice thick is a valid 3-D domain. Its tensors look planar,
//! so the dimensionality travels with the [`Domain`] rather than being
//! re-read from the shape.

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, Result};

/// Rank of every vector field tensor.
pub const FIELD_RANK: usize = 5;

/// Validate a domain and return its dimensionality.
pub fn validate_domain(omega: &[usize]) -> Result<usize> {
    if omega.len() != 2 && omega.len() != 3 {
        return Err(FieldError::shape(format!(
            "domain must have 2 or 3 extents, got {}",
            omega.len()
        )));
    }
    if let Some(axis) = omega.iter().position(|&n| n == 0) {
        return Err(FieldError::shape(format!(
            "domain extent along axis {} must be positive, got {:?}",
            axis, omega
        )));
    }
    Ok(omega.len())
}

/// Validate a raw field shape and return the dimensionality it encodes.
///
/// The dimensionality is 2 when the third spatial axis has size 1 and 3
/// otherwise; the component axis must then be a positive multiple of it.
/// Fields over single-slice volumes are built with
/// [`Domain::field_shape`] instead.
pub fn validate_field(shape: &[usize]) -> Result<usize> {
    if shape.len() != FIELD_RANK {
        return Err(FieldError::shape(format!(
            "vector field must have rank {}, got shape {:?}",
            FIELD_RANK, shape
        )));
    }
    let d = if shape[2] == 1 { 2 } else { 3 };
    validate_domain(&shape[..d])?;
    if shape[3] == 0 {
        return Err(FieldError::shape(format!(
            "vector field must have at least one timepoint, got shape {:?}",
            shape
        )));
    }
    let k = shape[4];
    if k == 0 || k % d != 0 {
        return Err(FieldError::shape(format!(
            "component axis must be a positive multiple of {}, got {}",
            d, k
        )));
    }
    Ok(d)
}

/// Canonical field shape for a domain and a timepoint count.
pub fn field_shape(omega: &[usize], timepoints: usize) -> Result<[usize; FIELD_RANK]> {
    Domain::new(omega)?.field_shape(timepoints, omega.len())
}

/// Discretized spatial domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain {
    extents: [usize; 3],
    dim: usize,
}

impl Domain {
    /// Create a validated domain from 2 or 3 extents.
    pub fn new(omega: &[usize]) -> Result<Self> {
        let dim = validate_domain(omega)?;
        let mut extents = [1usize; 3];
        extents[..dim].copy_from_slice(omega);
        Ok(Self { extents, dim })
    }

    /// Recover the domain encoded by a raw field shape.
    pub fn from_field_shape(shape: &[usize]) -> Result<Self> {
        let dim = validate_field(shape)?;
        Self::new(&shape[..dim])
    }

    /// Spatial dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Extents along the `dim` spatial axes.
    pub fn extents(&self) -> &[usize] {
        &self.extents[..self.dim]
    }

    /// Extents padded to three axes (the unused axis has size 1).
    pub fn spatial_shape(&self) -> [usize; 3] {
        self.extents
    }

    /// Number of grid points.
    pub fn num_points(&self) -> usize {
        self.extents.iter().product()
    }

    /// Whether a continuous point lies inside `[0, Ω_i - 1]` on every axis.
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.dim
            && point
                .iter()
                .zip(self.extents())
                .all(|(&x, &n)| x >= 0.0 && x <= (n - 1) as f64)
    }

    /// Tensor shape of a field over this domain.
    pub fn field_shape(
        &self,
        timepoints: usize,
        components: usize,
    ) -> Result<[usize; FIELD_RANK]> {
        if timepoints == 0 {
            return Err(FieldError::shape(
                "vector field must have at least one timepoint",
            ));
        }
        if components == 0 || components % self.dim != 0 {
            return Err(FieldError::shape(format!(
                "component axis must be a positive multiple of {}, got {}",
                self.dim, components
            )));
        }
        Ok([
            self.extents[0],
            self.extents[1],
            self.extents[2],
            timepoints,
            components,
        ])
    }

    /// Check that a tensor shape describes a field over this domain.
    pub fn check_field_shape(&self, shape: &[usize]) -> Result<()> {
        if shape.len() != FIELD_RANK {
            return Err(FieldError::shape(format!(
                "vector field must have rank {}, got shape {:?}",
                FIELD_RANK, shape
            )));
        }
        let expected = self.field_shape(shape[3], shape[4])?;
        if shape != expected {
            return Err(FieldError::ShapeMismatch {
                expected: expected.to_vec(),
                actual: shape.to_vec(),
            });
        }
        Ok(())
    }
}
