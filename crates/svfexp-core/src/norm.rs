//! Norms of vector fields for error measurement.

use burn::tensor::backend::Backend;
use burn::tensor::ElementConversion;

use crate::error::{FieldError, Result};
use crate::field::VectorField;

/// Sum of per-point Euclidean norms over the field interior.
///
/// `passe_partout` cells are trimmed from both ends of each of the `d`
/// spatial axes (the unused third axis of planar fields is left alone).
/// Only the first `d` components enter the norm. With `normalized`, the sum
/// is divided by the number of retained points times the timepoint count.
pub fn field_norm<B: Backend>(
    field: &VectorField<B>,
    passe_partout: usize,
    normalized: bool,
) -> Result<f64> {
    let dim = field.dim();
    let mut data = field.spatial_part().into_tensor();
    for axis in 0..dim {
        let n = data.dims()[axis];
        if 2 * passe_partout >= n {
            return Err(FieldError::shape(format!(
                "passe-partout {} removes all of axis {} with extent {}",
                passe_partout, axis, n
            )));
        }
        data = data.narrow(axis, passe_partout, n - 2 * passe_partout);
    }

    let [m0, m1, m2, timepoints, _] = data.dims();
    let total = data
        .powf_scalar(2.0)
        .sum_dim(4)
        .sqrt()
        .sum()
        .into_scalar()
        .elem::<f64>();

    if normalized {
        Ok(total / (m0 * m1 * m2 * timepoints) as f64)
    } else {
        Ok(total)
    }
}

/// Norm of the difference of two compatible fields.
pub fn field_difference_norm<B: Backend>(
    a: &VectorField<B>,
    b: &VectorField<B>,
    passe_partout: usize,
    normalized: bool,
) -> Result<f64> {
    field_norm(&a.checked_sub(b)?, passe_partout, normalized)
}
