//! Synthetic fields: projective actions of matrices and seeded random noise.

use burn::tensor::backend::Backend;
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use svfexp_core::domain::grid_coordinates;
use svfexp_core::{Convention, Domain, FieldError, Result, VectorField};

use crate::gaussian::GaussianSmoother;

/// Homogeneous weights below this magnitude have no affine image.
const PROJECTIVE_EPSILON: f64 = 1e-12;

fn check_action(dim: usize, domain: &Domain, m: &DMatrix<f64>) -> Result<()> {
    if domain.dim() != dim {
        return Err(FieldError::configuration(format!(
            "a {}-D group cannot act on a {}-D domain",
            dim,
            domain.dim()
        )));
    }
    if m.nrows() != dim + 1 || m.ncols() != dim + 1 {
        return Err(FieldError::shape(format!(
            "expected a {}x{} matrix, got {}x{}",
            dim + 1,
            dim + 1,
            m.nrows(),
            m.ncols()
        )));
    }
    Ok(())
}

/// Evaluate `f(x, H x̃)` at every grid point and pack the result as a field.
fn from_action<B, F>(
    dim: usize,
    domain: &Domain,
    m: &DMatrix<f64>,
    device: &B::Device,
    mut f: F,
) -> Result<VectorField<B>>
where
    B: Backend,
    F: FnMut(&[f64], &DVector<f64>) -> Result<Vec<f64>>,
{
    check_action(dim, domain, m)?;
    let grid = grid_coordinates(domain);
    let mut values = Vec::with_capacity(grid.len());
    for x in grid.chunks(dim) {
        let homogeneous = DVector::from_iterator(
            dim + 1,
            x.iter().copied().chain(std::iter::once(1.0)),
        );
        let image = m * homogeneous;
        values.extend(f(x, &image)?);
    }
    VectorField::from_values(domain, 1, dim, values, Convention::Lagrangian, device)
}

/// Velocity `v(x) = (M x̃)[:d] − (M x̃)[d]·x` of an algebra element.
pub fn velocity_from_matrix<B: Backend>(
    dim: usize,
    domain: &Domain,
    algebra: &DMatrix<f64>,
    device: &B::Device,
) -> Result<VectorField<B>> {
    from_action(dim, domain, algebra, device, |x, image| {
        let w = image[dim];
        Ok(x.iter().enumerate().map(|(i, &xi)| image[i] - w * xi).collect())
    })
}

/// Displacement `(H x̃)[:d] / (H x̃)[d] − x` of a group element.
///
/// Fails with a numerical error at the first grid point mapped to infinity.
pub fn displacement_from_matrix<B: Backend>(
    dim: usize,
    domain: &Domain,
    group: &DMatrix<f64>,
    device: &B::Device,
) -> Result<VectorField<B>> {
    from_action(dim, domain, group, device, |x, image| {
        let w = image[dim];
        if w.abs() < PROJECTIVE_EPSILON {
            return Err(FieldError::numerical(x, "point is mapped to the line at infinity"));
        }
        Ok(x.iter().enumerate().map(|(i, &xi)| image[i] / w - xi).collect())
    })
}

/// Seeded Gaussian noise of standard deviation `sigma`, smoothed with a
/// Gaussian of `smoothing_sigma` grid cells.
///
/// The same seed always yields the same field.
pub fn random_smooth_field<B: Backend>(
    domain: &Domain,
    timepoints: usize,
    sigma: f64,
    smoothing_sigma: f64,
    seed: u64,
    device: &B::Device,
) -> Result<VectorField<B>> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(FieldError::configuration(format!(
            "noise sigma must be finite and non-negative, got {}",
            sigma
        )));
    }
    let smoother = GaussianSmoother::new(smoothing_sigma)?;
    let dim = domain.dim();
    let count = domain.field_shape(timepoints, dim)?.iter().product::<usize>();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let values: Vec<f64> = (0..count)
        .map(|_| {
            let z: f64 = StandardNormal.sample(&mut rng);
            sigma * z
        })
        .collect();
    tracing::debug!(
        "Generated {} noise samples (seed {}, sigma {}, smoothing {})",
        count,
        seed,
        sigma,
        smoothing_sigma
    );

    let noise = VectorField::from_values(
        domain,
        timepoints,
        dim,
        values,
        Convention::Lagrangian,
        device,
    )?;
    smoother.apply(&noise)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f64>;

    #[test]
    fn test_affine_velocity() {
        let device = Default::default();
        let domain = Domain::new(&[5, 4]).unwrap();
        let m = DMatrix::from_row_slice(3, 3, &[0.0, -1.0, 2.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0]);
        let v = velocity_from_matrix::<TestBackend>(2, &domain, &m, &device).unwrap();
        assert_eq!(v.convention(), Convention::Lagrangian);
        assert_eq!(v.shape(), [5, 4, 1, 1, 2]);
        let value = v.value_at(&[3, 2], 0).unwrap();
        assert!((value[0] - 0.0).abs() < 1e-15);
        assert!((value[1] - 2.0).abs() < 1e-15);
    }

    #[test]
    fn test_projective_velocity_and_displacement() {
        let device = Default::default();
        let domain = Domain::new(&[4, 4]).unwrap();
        let h = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.1, 0.0, 1.0]);

        let v = velocity_from_matrix::<TestBackend>(2, &domain, &h, &device).unwrap();
        // w = 1.2 at x = (2, 3)
        let value = v.value_at(&[2, 3], 0).unwrap();
        assert!((value[0] - (2.0 - 1.2 * 2.0)).abs() < 1e-12);
        assert!((value[1] - (3.0 - 1.2 * 3.0)).abs() < 1e-12);

        let u = displacement_from_matrix::<TestBackend>(2, &domain, &h, &device).unwrap();
        let value = u.value_at(&[2, 3], 0).unwrap();
        assert!((value[0] - (2.0 / 1.2 - 2.0)).abs() < 1e-12);
        assert!((value[1] - (3.0 / 1.2 - 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_point_at_infinity_is_reported() {
        let device = Default::default();
        let domain = Domain::new(&[4, 4]).unwrap();
        let h = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, -0.5, 0.0, 1.0]);
        let err = displacement_from_matrix::<TestBackend>(2, &domain, &h, &device).unwrap_err();
        match err {
            FieldError::Numerical { point, .. } => assert_eq!(point[0], 2.0),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_dimension_checks() {
        let device = Default::default();
        let domain = Domain::new(&[4, 4, 4]).unwrap();
        let m = DMatrix::<f64>::zeros(3, 3);
        assert!(matches!(
            velocity_from_matrix::<TestBackend>(2, &domain, &m, &device),
            Err(FieldError::Configuration(_))
        ));
        let planar = Domain::new(&[4, 4]).unwrap();
        let wrong = DMatrix::<f64>::zeros(4, 4);
        assert!(matches!(
            velocity_from_matrix::<TestBackend>(2, &planar, &wrong, &device),
            Err(FieldError::Shape(_))
        ));
    }

    #[test]
    fn test_random_field_is_reproducible() {
        let device = Default::default();
        let domain = Domain::new(&[10, 10]).unwrap();
        let a = random_smooth_field::<TestBackend>(&domain, 1, 2.0, 1.0, 7, &device).unwrap();
        let b = random_smooth_field::<TestBackend>(&domain, 1, 2.0, 1.0, 7, &device).unwrap();
        let c = random_smooth_field::<TestBackend>(&domain, 1, 2.0, 1.0, 8, &device).unwrap();
        assert_eq!(a.to_values(), b.to_values());
        assert_ne!(a.to_values(), c.to_values());
        assert_eq!(a.shape(), [10, 10, 1, 1, 2]);
        assert!(a.max_abs() > 0.0);

        let raw = random_smooth_field::<TestBackend>(&domain, 1, 2.0, 0.0, 7, &device).unwrap();
        assert!(raw.max_abs() > a.max_abs());
    }
}
