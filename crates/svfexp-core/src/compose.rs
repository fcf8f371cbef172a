//! Sampling and composition of vector fields.
//!
//! Composition is evaluated per timepoint: slice `t` of the result only
//! depends on slice `t` of each operand.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};

use crate::domain::generate_grid;
use crate::error::{FieldError, Result};
use crate::field::{Convention, VectorField};
use crate::interpolation::{InterpolationMethod, Interpolator};

/// Timepoint `t` of a field as `[Ω0, Ω1, Ω2, k]` grid data.
fn grid_data<B: Backend>(field: &VectorField<B>, t: usize) -> Tensor<B, 4> {
    let [n0, n1, n2, _, k] = field.shape();
    field.data().clone().narrow(3, t, 1).reshape([n0, n1, n2, k])
}

/// Timepoint `t` of a field as `[N, k]` rows.
fn rows<B: Backend>(field: &VectorField<B>, t: usize) -> Tensor<B, 2> {
    let [n0, n1, n2, _, k] = field.shape();
    field.data().clone().narrow(3, t, 1).reshape([n0 * n1 * n2, k])
}

/// Sample `field` at the locations given per timepoint by `locations`.
///
/// `locations(t)` returns `[N, d]` continuous indices, one row per grid
/// point; the result is a field on the same grid with the field's convention.
fn resample<B, L>(
    field: &VectorField<B>,
    method: InterpolationMethod,
    mut locations: L,
) -> Result<VectorField<B>>
where
    B: Backend,
    L: FnMut(usize) -> Tensor<B, 2>,
{
    let [n0, n1, n2, timepoints, k] = field.shape();
    let slices = (0..timepoints)
        .map(|t| {
            let values = method.interpolate(&grid_data(field, t), locations(t));
            values.reshape([n0, n1, n2, 1, k])
        })
        .collect();
    VectorField::on_domain(Tensor::cat(slices, 3), field.domain(), field.convention())
}

/// Sample a field at a single continuous point.
///
/// Returns `T * d` values laid out `[T, d]`: the `d`-vector of every
/// timepoint in order.
pub fn sample<B: Backend>(
    field: &VectorField<B>,
    point: &[f64],
    method: InterpolationMethod,
) -> Result<Vec<f64>> {
    let dim = field.dim();
    if point.len() != dim {
        return Err(FieldError::shape(format!(
            "sample point has {} coordinates, field is {}-D",
            point.len(),
            dim
        )));
    }
    if point.iter().any(|x| !x.is_finite()) {
        return Err(FieldError::numerical(point, "non-finite sample location"));
    }
    let points = Tensor::<B, 2>::from_data(
        TensorData::new(point.to_vec(), [1, dim]),
        &field.device(),
    );
    let values = sample_points(field, points, method)?;
    Ok(values.into_data().iter::<f64>().collect())
}

/// Sample a field at a batch of continuous points `[Batch, d]`.
///
/// Returns `[Batch, T, d]`.
pub fn sample_points<B: Backend>(
    field: &VectorField<B>,
    points: Tensor<B, 2>,
    method: InterpolationMethod,
) -> Result<Tensor<B, 3>> {
    field.require_plain("sampling")?;
    let [batch, width] = points.dims();
    if width != field.dim() {
        return Err(FieldError::ShapeMismatch {
            expected: vec![batch, field.dim()],
            actual: vec![batch, width],
        });
    }
    let dim = field.dim();
    let per_time = (0..field.timepoints())
        .map(|t| {
            method
                .interpolate(&grid_data(field, t), points.clone())
                .reshape([batch, 1, dim])
        })
        .collect();
    Ok(Tensor::cat(per_time, 1))
}

/// Evaluate `F(x + G(x))` at every grid point `x`.
///
/// `G` must be a Lagrangian displacement; the result carries `F`'s convention.
pub fn warp<B: Backend>(
    f: &VectorField<B>,
    g: &VectorField<B>,
    method: InterpolationMethod,
) -> Result<VectorField<B>> {
    f.require_plain("warping")?;
    g.require_plain("warping")?;
    g.require_convention(Convention::Lagrangian)?;
    if f.shape() != g.shape() {
        return Err(FieldError::ShapeMismatch {
            expected: f.shape().to_vec(),
            actual: g.shape().to_vec(),
        });
    }
    let grid = generate_grid::<B>(g.domain(), &g.device());
    resample(f, method, |t| grid.clone() + rows(g, t))
}

/// Compose two fields, `H = F ∘ G`.
///
/// * Lagrangian: `H(x) = F(x + G(x)) + G(x)`
/// * Eulerian: `H(x) = F(G(x))`
///
/// Both operands must share domain, timepoint count and convention.
/// Composition is not commutative and only approximately associative.
pub fn compose<B: Backend>(
    f: &VectorField<B>,
    g: &VectorField<B>,
    method: InterpolationMethod,
) -> Result<VectorField<B>> {
    f.require_plain("composition")?;
    g.require_plain("composition")?;
    f.ensure_compatible(g)?;

    match f.convention() {
        Convention::Lagrangian => warp(f, g, method)?.checked_add(g),
        Convention::Eulerian => resample(f, method, |t| rows(g, t)),
    }
}
