//! Conversion between Lagrangian and Eulerian coordinates.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::domain::{generate_grid, Domain};
use crate::error::Result;

use super::vector_field::{Convention, VectorField};

/// Identity grid as a `[Ω0, Ω1, Ω2, T, k]` tensor.
///
/// The first `dim` components hold the point coordinates; any extra
/// components are zero.
fn identity_tensor<B: Backend>(
    domain: &Domain,
    timepoints: usize,
    components: usize,
    device: &B::Device,
) -> Tensor<B, 5> {
    let [n0, n1, n2] = domain.spatial_shape();
    let dim = domain.dim();
    let mut grid = generate_grid::<B>(domain, device);
    if components > dim {
        let padding = Tensor::zeros([domain.num_points(), components - dim], device);
        grid = Tensor::cat(vec![grid, padding], 1);
    }
    grid.reshape([n0, n1, n2, 1, components])
        .repeat(&[1, 1, 1, timepoints, 1])
}

/// Identity map in the requested convention.
///
/// Lagrangian identity is the zero field; Eulerian identity stores the grid
/// coordinates of each point, repeated over every timepoint.
pub fn identity_field<B: Backend>(
    domain: &Domain,
    timepoints: usize,
    convention: Convention,
    device: &B::Device,
) -> Result<VectorField<B>> {
    match convention {
        Convention::Lagrangian => VectorField::zeros(domain, timepoints, convention, device),
        Convention::Eulerian => {
            domain.field_shape(timepoints, domain.dim())?;
            let data = identity_tensor::<B>(domain, timepoints, domain.dim(), device);
            VectorField::on_domain(data, domain, convention)
        }
    }
}

/// Convert a Lagrangian field to Eulerian coordinates by adding the grid.
pub fn to_eulerian<B: Backend>(field: &VectorField<B>) -> Result<VectorField<B>> {
    field.require_convention(Convention::Lagrangian)?;
    let identity = identity_tensor::<B>(
        field.domain(),
        field.timepoints(),
        field.components(),
        &field.device(),
    );
    Ok(field
        .map_data(field.data().clone() + identity)
        .relabel(Convention::Eulerian))
}

/// Convert an Eulerian field to Lagrangian coordinates by subtracting the grid.
pub fn to_lagrangian<B: Backend>(field: &VectorField<B>) -> Result<VectorField<B>> {
    field.require_convention(Convention::Eulerian)?;
    let identity = identity_tensor::<B>(
        field.domain(),
        field.timepoints(),
        field.components(),
        &field.device(),
    );
    Ok(field
        .map_data(field.data().clone() - identity)
        .relabel(Convention::Lagrangian))
}

/// Convert a field to the requested convention, passing it through when it
/// already matches.
pub fn to_convention<B: Backend>(
    field: VectorField<B>,
    convention: Convention,
) -> Result<VectorField<B>> {
    if field.convention() == convention {
        return Ok(field);
    }
    match convention {
        Convention::Eulerian => to_eulerian(&field),
        Convention::Lagrangian => to_lagrangian(&field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f64>;

    #[test]
    fn test_identity_lagrangian_is_zero() {
        let device = Default::default();
        let domain = Domain::new(&[4, 5]).unwrap();
        let id = identity_field::<TestBackend>(&domain, 2, Convention::Lagrangian, &device)
            .unwrap();
        assert_eq!(id.shape(), [4, 5, 1, 2, 2]);
        assert_eq!(id.max_abs(), 0.0);
    }

    #[test]
    fn test_identity_eulerian_holds_coordinates() {
        let device = Default::default();
        let domain = Domain::new(&[4, 5, 6]).unwrap();
        let id = identity_field::<TestBackend>(&domain, 2, Convention::Eulerian, &device).unwrap();
        assert_eq!(id.shape(), [4, 5, 6, 2, 3]);
        assert_eq!(id.value_at(&[3, 1, 5], 0).unwrap(), vec![3.0, 1.0, 5.0]);
        assert_eq!(id.value_at(&[3, 1, 5], 1).unwrap(), vec![3.0, 1.0, 5.0]);
    }

    #[test]
    fn test_round_trip() {
        let device = Default::default();
        let domain = Domain::new(&[6, 7]).unwrap();
        let field = VectorField::<TestBackend>::from_fn(
            &domain,
            1,
            Convention::Lagrangian,
            &device,
            |x| vec![0.1 * x[1] as f64, -0.2 * x[0] as f64],
        )
        .unwrap();

        let eulerian = to_eulerian(&field).unwrap();
        assert_eq!(eulerian.convention(), Convention::Eulerian);
        let value = eulerian.value_at(&[2, 3], 0).unwrap();
        assert!((value[0] - 2.3).abs() < 1e-12);
        assert!((value[1] - 2.6).abs() < 1e-12);

        let back = to_lagrangian(&eulerian).unwrap();
        let err = back.checked_sub(&field).unwrap().max_abs();
        assert!(err <= 1e-10);
        // The input is untouched.
        assert_eq!(field.convention(), Convention::Lagrangian);
    }

    #[test]
    fn test_conversion_rejects_wrong_convention() {
        let device = Default::default();
        let domain = Domain::new(&[3, 3]).unwrap();
        let lagrangian = VectorField::<TestBackend>::zeros(
            &domain,
            1,
            Convention::Lagrangian,
            &device,
        )
        .unwrap();
        let eulerian = to_eulerian(&lagrangian).unwrap();

        assert!(matches!(
            to_lagrangian(&lagrangian),
            Err(FieldError::ConventionMismatch { .. })
        ));
        assert!(matches!(
            to_eulerian(&eulerian),
            Err(FieldError::ConventionMismatch { .. })
        ));
    }

    #[test]
    fn test_extended_components_keep_extra_channels() {
        let device = Default::default();
        let domain = Domain::new(&[3, 3]).unwrap();
        let field = VectorField::<TestBackend>::from_values(
            &domain,
            1,
            4,
            vec![0.0; 36],
            Convention::Lagrangian,
            &device,
        )
        .unwrap();
        let eulerian = to_eulerian(&field).unwrap();
        assert_eq!(eulerian.value_at(&[2, 1], 0).unwrap(), vec![2.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_to_convention_passes_through() {
        let device = Default::default();
        let domain = Domain::new(&[3, 3]).unwrap();
        let field = VectorField::<TestBackend>::zeros(&domain, 1, Convention::Lagrangian, &device)
            .unwrap();
        let same = to_convention(field.clone(), Convention::Lagrangian).unwrap();
        assert_eq!(same.convention(), Convention::Lagrangian);
        let other = to_convention(field, Convention::Eulerian).unwrap();
        assert_eq!(other.value_at(&[1, 2], 0).unwrap(), vec![1.0, 2.0]);
    }
}
