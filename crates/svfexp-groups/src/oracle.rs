//! Matrix Lie groups acting projectively on the grid.

use burn::tensor::backend::Backend;
use nalgebra::DMatrix;
use svfexp_core::{Domain, Result, VectorField};

use crate::generate::{displacement_from_matrix, velocity_from_matrix};

/// Closed-form reference for the exponential of a matrix Lie algebra.
///
/// Algebra and group elements are `(d+1) × (d+1)` matrices acting on
/// homogeneous coordinates `x̃ = (x, 1)`.
pub trait LieGroupOracle {
    /// Spatial dimensionality `d`.
    fn dim(&self) -> usize;

    /// Group element `exp(algebra)`.
    fn exp(&self, algebra: &DMatrix<f64>) -> Result<DMatrix<f64>>;

    /// Algebra element whose exponential is `group`.
    fn log(&self, group: &DMatrix<f64>) -> Result<DMatrix<f64>>;

    /// Lagrangian SVF generated by an algebra element.
    fn velocity_field<B: Backend>(
        &self,
        domain: &Domain,
        algebra: &DMatrix<f64>,
        device: &B::Device,
    ) -> Result<VectorField<B>> {
        velocity_from_matrix(self.dim(), domain, algebra, device)
    }

    /// Lagrangian displacement of a group element.
    fn displacement_field<B: Backend>(
        &self,
        domain: &Domain,
        group: &DMatrix<f64>,
        device: &B::Device,
    ) -> Result<VectorField<B>> {
        displacement_from_matrix(self.dim(), domain, group, device)
    }

    /// Displacement of `exp(algebra)`, the exact flow of
    /// [`velocity_field`](Self::velocity_field) at `t = 1`.
    fn exponential_field<B: Backend>(
        &self,
        domain: &Domain,
        algebra: &DMatrix<f64>,
        device: &B::Device,
    ) -> Result<VectorField<B>> {
        let group = self.exp(algebra)?;
        self.displacement_field(domain, &group, device)
    }
}
