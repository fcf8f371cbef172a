//! Grid-based vector field.
//!
//! A [`VectorField`] pairs a rank-5 tensor `[Ω0, Ω1, Ω2, T, k]` with the
//! domain it lives on and the coordinate convention of its values. Fields
//! are value objects: every operation returns a new field.

use std::fmt;
use std::ops::Neg;

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor, TensorData};
use serde::{Deserialize, Serialize};

use crate::domain::{validate_field, Domain, FIELD_RANK};
use crate::error::{FieldError, Result};

/// Meaning of the values stored in a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    /// Value at `x` is the displacement `φ(x) - x`. Identity is the zero field.
    #[default]
    Lagrangian,
    /// Value at `x` is the absolute position `φ(x)`. Identity is the grid itself.
    Eulerian,
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lagrangian => write!(f, "lagrangian"),
            Self::Eulerian => write!(f, "eulerian"),
        }
    }
}

/// Vector field sampled on a regular grid.
///
/// # Type Parameters
/// * `B` - The Burn backend
#[derive(Debug, Clone)]
pub struct VectorField<B: Backend> {
    /// Values with shape `[Ω0, Ω1, Ω2, T, k]`
    data: Tensor<B, 5>,
    domain: Domain,
    convention: Convention,
}

impl<B: Backend> VectorField<B> {
    /// Wrap a tensor, validating its shape.
    ///
    /// The domain is read from the shape, so a third axis of size 1 means a
    /// planar field. Use [`on_domain`](Self::on_domain) for single-slice
    /// volumes.
    pub fn new(data: Tensor<B, 5>, convention: Convention) -> Result<Self> {
        let shape = data.dims();
        validate_field(&shape)?;
        let domain = Domain::from_field_shape(&shape)?;
        Self::on_domain(data, &domain, convention)
    }

    /// Wrap a tensor holding a field over `domain`.
    ///
    /// The tensor is re-materialized in row-major order, so views produced by
    /// `permute` and similar layout changes are safe to pass in.
    pub fn on_domain(data: Tensor<B, 5>, domain: &Domain, convention: Convention) -> Result<Self> {
        domain.check_field_shape(&data.dims())?;
        let device = data.device();
        let data = Tensor::from_data(data.into_data(), &device);
        Ok(Self {
            data,
            domain: *domain,
            convention,
        })
    }

    /// Build a field from row-major host values laid out `[Ω0, Ω1, Ω2, T, k]`.
    pub fn from_values(
        domain: &Domain,
        timepoints: usize,
        components: usize,
        values: Vec<f64>,
        convention: Convention,
        device: &B::Device,
    ) -> Result<Self> {
        let shape = domain.field_shape(timepoints, components)?;
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(FieldError::shape(format!(
                "expected {} values for shape {:?}, got {}",
                expected,
                shape,
                values.len()
            )));
        }
        let data = Tensor::<B, 5>::from_data(TensorData::new(values, shape), device);
        Self::on_domain(data, domain, convention)
    }

    /// Build a field by evaluating `f` at every grid index.
    ///
    /// `f` receives the `dim` integer coordinates of a grid point and returns
    /// its `dim` vector components; the same value is used for every timepoint.
    pub fn from_fn<F>(
        domain: &Domain,
        timepoints: usize,
        convention: Convention,
        device: &B::Device,
        mut f: F,
    ) -> Result<Self>
    where
        F: FnMut(&[usize]) -> Vec<f64>,
    {
        let dim = domain.dim();
        let [n0, n1, n2] = domain.spatial_shape();
        let mut values = Vec::with_capacity(domain.num_points() * timepoints * dim);
        for i in 0..n0 {
            for j in 0..n1 {
                for k in 0..n2 {
                    let index = [i, j, k];
                    let vector = f(&index[..dim]);
                    if vector.len() != dim {
                        return Err(FieldError::shape(format!(
                            "generator returned {} components at {:?}, expected {}",
                            vector.len(),
                            &index[..dim],
                            dim
                        )));
                    }
                    for _ in 0..timepoints {
                        values.extend_from_slice(&vector);
                    }
                }
            }
        }
        Self::from_values(domain, timepoints, dim, values, convention, device)
    }

    /// Field with the same vector at every grid point.
    pub fn constant(
        domain: &Domain,
        timepoints: usize,
        vector: &[f64],
        convention: Convention,
        device: &B::Device,
    ) -> Result<Self> {
        Self::from_fn(domain, timepoints, convention, device, |_| vector.to_vec())
    }

    /// All-zero field with `dim` components.
    pub fn zeros(
        domain: &Domain,
        timepoints: usize,
        convention: Convention,
        device: &B::Device,
    ) -> Result<Self> {
        let shape = domain.field_shape(timepoints, domain.dim())?;
        Self::on_domain(Tensor::zeros(shape, device), domain, convention)
    }

    /// Underlying tensor.
    pub fn data(&self) -> &Tensor<B, 5> {
        &self.data
    }

    /// Consume the field and return its tensor.
    pub fn into_tensor(self) -> Tensor<B, 5> {
        self.data
    }

    /// Domain the field is defined on.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Spatial dimensionality.
    pub fn dim(&self) -> usize {
        self.domain.dim()
    }

    /// Number of timepoints.
    pub fn timepoints(&self) -> usize {
        self.data.dims()[3]
    }

    /// Number of stored components per point.
    pub fn components(&self) -> usize {
        self.data.dims()[4]
    }

    /// Tensor shape `[Ω0, Ω1, Ω2, T, k]`.
    pub fn shape(&self) -> [usize; FIELD_RANK] {
        self.data.dims()
    }

    /// Coordinate convention of the values.
    pub fn convention(&self) -> Convention {
        self.convention
    }

    /// Device holding the tensor.
    pub fn device(&self) -> B::Device {
        self.data.device()
    }

    /// Whether the field stores exactly one `dim`-vector per point.
    pub fn is_plain(&self) -> bool {
        self.components() == self.dim()
    }

    /// Replace the tensor, keeping domain and convention.
    ///
    /// The new tensor must have the same shape.
    pub(crate) fn map_data(&self, data: Tensor<B, 5>) -> Self {
        debug_assert_eq!(data.dims(), self.shape());
        Self {
            data,
            domain: self.domain,
            convention: self.convention,
        }
    }

    /// Relabel the convention without touching the values.
    pub(crate) fn relabel(self, convention: Convention) -> Self {
        Self { convention, ..self }
    }

    /// The first `dim` components of every point.
    pub fn spatial_part(&self) -> Self {
        let dim = self.dim();
        let data = self.data.clone().narrow(4, 0, dim);
        Self {
            data,
            domain: self.domain,
            convention: self.convention,
        }
    }

    /// Single-timepoint slice.
    pub fn timepoint(&self, t: usize) -> Result<Self> {
        if t >= self.timepoints() {
            return Err(FieldError::shape(format!(
                "timepoint {} out of range for {} timepoints",
                t,
                self.timepoints()
            )));
        }
        let data = self.data.clone().narrow(3, t, 1);
        Ok(Self {
            data,
            domain: self.domain,
            convention: self.convention,
        })
    }

    /// Stack single-timepoint fields along the time axis.
    pub fn stack_timepoints(slices: Vec<Self>) -> Result<Self> {
        let first = slices
            .first()
            .ok_or_else(|| FieldError::shape("cannot stack an empty list of timepoints"))?;
        let convention = first.convention;
        for slice in &slices[1..] {
            first.ensure_compatible_spatially(slice)?;
            slice.require_convention(convention)?;
        }
        let domain = first.domain;
        let tensors = slices.into_iter().map(|s| s.data).collect();
        Self::on_domain(Tensor::cat(tensors, 3), &domain, convention)
    }

    /// All values as a host vector, row-major over `[Ω0, Ω1, Ω2, T, k]`.
    pub fn to_values(&self) -> Vec<f64> {
        self.data.to_data().iter::<f64>().collect()
    }

    /// Components stored at a grid index and timepoint.
    pub fn value_at(&self, index: &[usize], t: usize) -> Result<Vec<f64>> {
        let shape = self.shape();
        if index.len() != self.dim() {
            return Err(FieldError::shape(format!(
                "index {:?} does not match dimensionality {}",
                index,
                self.dim()
            )));
        }
        let mut full = [0usize; 3];
        full[..index.len()].copy_from_slice(index);
        if (0..3).any(|axis| full[axis] >= shape[axis]) || t >= shape[3] {
            return Err(FieldError::shape(format!(
                "index {:?} at timepoint {} out of bounds for shape {:?}",
                index, t, shape
            )));
        }
        let value = self.data.clone().slice([
            full[0]..full[0] + 1,
            full[1]..full[1] + 1,
            full[2]..full[2] + 1,
            t..t + 1,
            0..shape[4],
        ]);
        Ok(value.into_data().iter::<f64>().collect())
    }

    /// Largest absolute component value.
    pub fn max_abs(&self) -> f64 {
        self.data.clone().abs().max().into_scalar().elem::<f64>()
    }

    /// Componentwise sum. Both fields must share shape and convention.
    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        self.ensure_compatible(other)?;
        Ok(self.map_data(self.data.clone() + other.data.clone()))
    }

    /// Componentwise difference. Both fields must share shape and convention.
    pub fn checked_sub(&self, other: &Self) -> Result<Self> {
        self.ensure_compatible(other)?;
        Ok(self.map_data(self.data.clone() - other.data.clone()))
    }

    /// Multiply every component by a scalar.
    pub fn scale(&self, factor: f64) -> Self {
        self.map_data(self.data.clone().mul_scalar(factor))
    }

    /// Fail unless the field carries the expected convention.
    pub fn require_convention(&self, expected: Convention) -> Result<()> {
        if self.convention != expected {
            return Err(FieldError::ConventionMismatch {
                expected,
                actual: self.convention,
            });
        }
        Ok(())
    }

    /// Fail unless the field stores exactly `dim` components.
    pub fn require_plain(&self, operation: &str) -> Result<()> {
        if !self.is_plain() {
            return Err(FieldError::configuration(format!(
                "{} is defined for plain vector fields only, got {} components in {}-D",
                operation,
                self.components(),
                self.dim()
            )));
        }
        Ok(())
    }

    /// Fail unless both fields have identical shape and convention.
    pub fn ensure_compatible(&self, other: &Self) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(FieldError::ShapeMismatch {
                expected: self.shape().to_vec(),
                actual: other.shape().to_vec(),
            });
        }
        other.require_convention(self.convention)
    }

    fn ensure_compatible_spatially(&self, other: &Self) -> Result<()> {
        let (a, b) = (self.shape(), other.shape());
        if a[..3] != b[..3] || a[4] != b[4] {
            return Err(FieldError::ShapeMismatch {
                expected: a.to_vec(),
                actual: b.to_vec(),
            });
        }
        Ok(())
    }
}

impl<B: Backend> Neg for VectorField<B> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            data: -self.data,
            ..self
        }
    }
}

impl<B: Backend> Neg for &VectorField<B> {
    type Output = VectorField<B>;

    fn neg(self) -> Self::Output {
        -self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f64>;

    #[test]
    fn test_new_validates_shape() {
        let device = Default::default();
        let ok = Tensor::<TestBackend, 5>::zeros([4, 4, 1, 1, 2], &device);
        assert!(VectorField::new(ok, Convention::Lagrangian).is_ok());

        let bad = Tensor::<TestBackend, 5>::zeros([4, 4, 4, 1, 7], &device);
        assert!(matches!(
            VectorField::new(bad, Convention::Lagrangian),
            Err(FieldError::Shape(_))
        ));
    }

    #[test]
    fn test_permuted_tensor_keeps_logical_order() {
        let device = Default::default();
        // Stored [3, 2, ...] with value 10 * a + b + c / 10 at (a, b, component c).
        let mut values = Vec::new();
        for a in 0..3 {
            for b in 0..2 {
                for c in 0..2 {
                    values.push(10.0 * a as f64 + b as f64 + 0.1 * c as f64);
                }
            }
        }
        let stored =
            Tensor::<TestBackend, 5>::from_data(TensorData::new(values, [3, 2, 1, 1, 2]), &device);
        let field = VectorField::new(stored.permute([1, 0, 2, 3, 4]), Convention::Lagrangian)
            .unwrap();
        assert_eq!(field.shape(), [2, 3, 1, 1, 2]);

        let mut expected = Vec::new();
        for i in 0..2 {
            for j in 0..3 {
                for c in 0..2 {
                    expected.push(2.0 * (10.0 * j as f64 + i as f64 + 0.1 * c as f64));
                }
            }
        }
        assert_eq!(field.scale(2.0).to_values(), expected);
        let value = field.value_at(&[1, 2], 0).unwrap();
        assert_eq!(value, vec![10.0 * 2.0 + 1.0, 10.0 * 2.0 + 1.0 + 0.1]);
    }

    #[test]
    fn test_on_domain_keeps_single_slice_volume() {
        let device = Default::default();
        let domain = Domain::new(&[4, 4, 1]).unwrap();
        let data = Tensor::<TestBackend, 5>::ones([4, 4, 1, 1, 3], &device);
        let field = VectorField::on_domain(data, &domain, Convention::Lagrangian).unwrap();
        assert_eq!(field.dim(), 3);
        assert_eq!(field.value_at(&[3, 3, 0], 0).unwrap(), vec![1.0; 3]);

        let planar = Tensor::<TestBackend, 5>::ones([4, 4, 1, 1, 2], &device);
        assert!(VectorField::on_domain(planar, &domain, Convention::Lagrangian).is_err());
    }

    #[test]
    fn test_from_fn_layout() {
        let device = Default::default();
        let domain = Domain::new(&[3, 4]).unwrap();
        let field = VectorField::<TestBackend>::from_fn(
            &domain,
            2,
            Convention::Lagrangian,
            &device,
            |x| vec![x[0] as f64, 10.0 * x[1] as f64],
        )
        .unwrap();

        assert_eq!(field.shape(), [3, 4, 1, 2, 2]);
        assert_eq!(field.value_at(&[2, 3], 0).unwrap(), vec![2.0, 30.0]);
        assert_eq!(field.value_at(&[2, 3], 1).unwrap(), vec![2.0, 30.0]);
        assert!(field.value_at(&[3, 0], 0).is_err());
        assert!(field.value_at(&[0, 0], 2).is_err());
    }

    #[test]
    fn test_from_fn_rejects_wrong_arity() {
        let device = Default::default();
        let domain = Domain::new(&[3, 3, 3]).unwrap();
        let result = VectorField::<TestBackend>::from_fn(
            &domain,
            1,
            Convention::Lagrangian,
            &device,
            |_| vec![0.0, 0.0],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_arithmetic() {
        let device = Default::default();
        let domain = Domain::new(&[5, 5]).unwrap();
        let a = VectorField::<TestBackend>::constant(
            &domain,
            1,
            &[1.0, 2.0],
            Convention::Lagrangian,
            &device,
        )
        .unwrap();
        let b = VectorField::<TestBackend>::constant(
            &domain,
            1,
            &[0.5, -1.0],
            Convention::Lagrangian,
            &device,
        )
        .unwrap();

        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.value_at(&[1, 1], 0).unwrap(), vec![1.5, 1.0]);

        let diff = a.checked_sub(&b).unwrap();
        assert_eq!(diff.value_at(&[4, 4], 0).unwrap(), vec![0.5, 3.0]);

        let scaled = a.scale(-2.0);
        assert_eq!(scaled.value_at(&[0, 0], 0).unwrap(), vec![-2.0, -4.0]);

        let negated = -&b;
        assert_eq!(negated.value_at(&[2, 3], 0).unwrap(), vec![-0.5, 1.0]);
        assert_eq!(a.max_abs(), 2.0);
    }

    #[test]
    fn test_arithmetic_rejects_mixed_conventions() {
        let device = Default::default();
        let domain = Domain::new(&[5, 5]).unwrap();
        let a = VectorField::<TestBackend>::zeros(&domain, 1, Convention::Lagrangian, &device)
            .unwrap();
        let b = VectorField::<TestBackend>::zeros(&domain, 1, Convention::Eulerian, &device)
            .unwrap();
        assert!(matches!(
            a.checked_add(&b),
            Err(FieldError::ConventionMismatch { .. })
        ));
    }

    #[test]
    fn test_timepoint_slicing_and_stacking() {
        let device = Default::default();
        let domain = Domain::new(&[4, 4, 4]).unwrap();
        let field = VectorField::<TestBackend>::constant(
            &domain,
            3,
            &[1.0, 2.0, 3.0],
            Convention::Lagrangian,
            &device,
        )
        .unwrap();

        let slice = field.timepoint(1).unwrap();
        assert_eq!(slice.shape(), [4, 4, 4, 1, 3]);
        assert!(field.timepoint(3).is_err());

        let stacked = VectorField::stack_timepoints(vec![slice.clone(), slice]).unwrap();
        assert_eq!(stacked.timepoints(), 2);
    }

    #[test]
    fn test_spatial_part_drops_extended_components() {
        let device = Default::default();
        let domain = Domain::new(&[3, 3]).unwrap();
        let values = vec![1.0; 3 * 3 * 4];
        let field = VectorField::<TestBackend>::from_values(
            &domain,
            1,
            4,
            values,
            Convention::Lagrangian,
            &device,
        )
        .unwrap();
        assert!(!field.is_plain());
        assert!(field.require_plain("compose").is_err());

        let spatial = field.spatial_part();
        assert!(spatial.is_plain());
        assert_eq!(spatial.shape(), [3, 3, 1, 1, 2]);
    }

    #[test]
    fn test_convention_display() {
        assert_eq!(Convention::Lagrangian.to_string(), "lagrangian");
        assert_eq!(Convention::Eulerian.to_string(), "eulerian");
        assert_eq!(Convention::default(), Convention::Lagrangian);
    }
}
