//! Finite-difference Jacobian of a vector field.
//!
//! The Jacobian is stored as an extended field with `k = d²` components,
//! row-major: component `c * d + a` holds `∂F_c / ∂x_a`.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::{FieldError, Result};
use crate::field::VectorField;

/// Derivative of every component along one spatial axis.
///
/// Central differences in the interior, one-sided differences on the
/// two boundary slabs, zero along axes with a single sample.
fn axis_derivative<B: Backend>(data: &Tensor<B, 5>, axis: usize) -> Tensor<B, 5> {
    let n = data.dims()[axis];
    match n {
        1 => data.zeros_like(),
        2 => {
            let diff = data.clone().narrow(axis, 1, 1) - data.clone().narrow(axis, 0, 1);
            Tensor::cat(vec![diff.clone(), diff], axis)
        }
        _ => {
            let first = data.clone().narrow(axis, 1, 1) - data.clone().narrow(axis, 0, 1);
            let forward = data.clone().narrow(axis, 2, n - 2);
            let backward = data.clone().narrow(axis, 0, n - 2);
            let interior = (forward - backward).mul_scalar(0.5);
            let last = data.clone().narrow(axis, n - 1, 1) - data.clone().narrow(axis, n - 2, 1);
            Tensor::cat(vec![first, interior, last], axis)
        }
    }
}

/// Jacobian of a plain field, one `d × d` matrix per point and timepoint.
pub fn jacobian<B: Backend>(field: &VectorField<B>) -> Result<VectorField<B>> {
    field.require_plain("the Jacobian")?;
    let dim = field.dim();
    let [n0, n1, n2, timepoints, _] = field.shape();

    let partials = (0..dim)
        .map(|axis| axis_derivative(field.data(), axis).unsqueeze_dim::<6>(5))
        .collect();
    let stacked: Tensor<B, 6> = Tensor::cat(partials, 5);
    let data = stacked.reshape([n0, n1, n2, timepoints, dim * dim]);
    VectorField::on_domain(data, field.domain(), field.convention())
}

/// Per-point matrix-vector product `J(x) · W(x)`.
///
/// `jac` stores `d × d` matrices row-major (`k = d²`), `vectors` is a plain
/// field on the same grid; the result has `vectors`' convention.
pub fn jacobian_product<B: Backend>(
    jac: &VectorField<B>,
    vectors: &VectorField<B>,
) -> Result<VectorField<B>> {
    vectors.require_plain("the Jacobian product")?;
    let dim = vectors.dim();
    let [n0, n1, n2, timepoints, _] = vectors.shape();
    let expected = [n0, n1, n2, timepoints, dim * dim];
    if jac.shape() != expected {
        return Err(FieldError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: jac.shape().to_vec(),
        });
    }

    let matrices: Tensor<B, 6> = jac.data().clone().reshape([n0, n1, n2, timepoints, dim, dim]);
    let columns: Tensor<B, 6> = vectors.data().clone().reshape([n0, n1, n2, timepoints, 1, dim]);
    let product = (matrices * columns)
        .sum_dim(5)
        .reshape([n0, n1, n2, timepoints, dim]);
    VectorField::on_domain(product, vectors.domain(), vectors.convention())
}
