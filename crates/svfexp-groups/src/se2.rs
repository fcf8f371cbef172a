//! Special Euclidean group of the plane.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use svfexp_core::{FieldError, Result};

use crate::oracle::LieGroupOracle;

/// Below this angle the closed forms switch to their Taylor limits.
const SMALL_ANGLE: f64 = 1e-12;

/// Rigid motions of the plane in homogeneous `3 × 3` form.
///
/// Algebra elements are `[[0, -θ, tx], [θ, 0, ty], [0, 0, 0]]`; group
/// elements are `[[R(θ), t], [0, 1]]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Se2;

impl Se2 {
    /// Algebra element with rotation rate `theta` and translation `(tx, ty)`.
    pub fn algebra(theta: f64, tx: f64, ty: f64) -> DMatrix<f64> {
        DMatrix::from_row_slice(3, 3, &[0.0, -theta, tx, theta, 0.0, ty, 0.0, 0.0, 0.0])
    }

    /// Group element rotating by `theta` about `center`.
    pub fn rotation_about(theta: f64, center: [f64; 2]) -> DMatrix<f64> {
        let (sin, cos) = theta.sin_cos();
        let [xc, yc] = center;
        let tx = (1.0 - cos) * xc + sin * yc;
        let ty = -sin * xc + (1.0 - cos) * yc;
        DMatrix::from_row_slice(3, 3, &[cos, -sin, tx, sin, cos, ty, 0.0, 0.0, 1.0])
    }

    /// Algebra element whose exponential is [`rotation_about`](Self::rotation_about).
    pub fn rotation_about_algebra(theta: f64, center: [f64; 2]) -> Result<DMatrix<f64>> {
        Self.log(&Self::rotation_about(theta, center))
    }

    /// `V(θ)` mapping algebra translations to group translations.
    fn translation_operator(theta: f64) -> [[f64; 2]; 2] {
        if theta.abs() < SMALL_ANGLE {
            return [[1.0, 0.0], [0.0, 1.0]];
        }
        let (sin, cos) = theta.sin_cos();
        let a = sin / theta;
        let b = (1.0 - cos) / theta;
        [[a, -b], [b, a]]
    }

    fn check(m: &DMatrix<f64>) -> Result<()> {
        if m.nrows() != 3 || m.ncols() != 3 {
            return Err(FieldError::shape(format!(
                "SE(2) elements are 3x3, got {}x{}",
                m.nrows(),
                m.ncols()
            )));
        }
        if m.iter().any(|v| !v.is_finite()) {
            return Err(FieldError::numerical(m.as_slice(), "matrix has non-finite entries"));
        }
        Ok(())
    }
}

impl LieGroupOracle for Se2 {
    fn dim(&self) -> usize {
        2
    }

    fn exp(&self, algebra: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        Self::check(algebra)?;
        let theta = algebra[(1, 0)];
        let (tx, ty) = (algebra[(0, 2)], algebra[(1, 2)]);
        let v = Self::translation_operator(theta);
        let (sin, cos) = theta.sin_cos();
        Ok(DMatrix::from_row_slice(
            3,
            3,
            &[
                cos,
                -sin,
                v[0][0] * tx + v[0][1] * ty,
                sin,
                cos,
                v[1][0] * tx + v[1][1] * ty,
                0.0,
                0.0,
                1.0,
            ],
        ))
    }

    fn log(&self, group: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        Self::check(group)?;
        let theta = group[(1, 0)].atan2(group[(0, 0)]);
        let v = Self::translation_operator(theta);
        let det = v[0][0] * v[1][1] - v[0][1] * v[1][0];
        if det.abs() < SMALL_ANGLE {
            return Err(FieldError::numerical(group.as_slice(), "translation operator is singular"));
        }
        let (px, py) = (group[(0, 2)], group[(1, 2)]);
        let tx = (v[1][1] * px - v[0][1] * py) / det;
        let ty = (-v[1][0] * px + v[0][0] * py) / det;
        Ok(Self::algebra(theta, tx, ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::expm;
    use burn_ndarray::NdArray;
    use std::f64::consts::PI;
    use svfexp_core::Domain;

    type TestBackend = NdArray<f64>;

    #[test]
    fn test_closed_form_matches_matrix_exponential() {
        let a = Se2::algebra(0.7, 1.5, -2.0);
        let closed = Se2.exp(&a).unwrap();
        let numeric = expm(&a).unwrap();
        assert!((&closed - &numeric).norm() < 1e-12);

        let zero = Se2.exp(&Se2::algebra(0.0, 1.0, 2.0)).unwrap();
        assert!((zero[(0, 2)] - 1.0).abs() < 1e-15 && (zero[(1, 2)] - 2.0).abs() < 1e-15);
    }

    #[test]
    fn test_exp_log_round_trip() {
        let g = Se2::rotation_about(PI / 8.0, [7.0, 7.0]);
        let back = Se2.exp(&Se2.log(&g).unwrap()).unwrap();
        assert!((&back - &g).norm() < 1e-12);

        let a = Se2::algebra(-1.1, 0.3, 4.0);
        let again = Se2.log(&Se2.exp(&a).unwrap()).unwrap();
        assert!((&again - &a).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_fixes_its_center() {
        let device = Default::default();
        let domain = Domain::new(&[15, 15]).unwrap();
        let g = Se2::rotation_about(0.4, [7.0, 7.0]);
        let u = Se2.displacement_field::<TestBackend>(&domain, &g, &device).unwrap();
        let centre = u.value_at(&[7, 7], 0).unwrap();
        assert!(centre.iter().all(|c| c.abs() < 1e-12));

        let a = Se2::rotation_about_algebra(0.4, [7.0, 7.0]).unwrap();
        let v = Se2.velocity_field::<TestBackend>(&domain, &a, &device).unwrap();
        let value = v.value_at(&[9, 7], 0).unwrap();
        // Rigid rotation: v(x) = θ J (x - c).
        assert!(value[0].abs() < 1e-12);
        assert!((value[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_size_rejected() {
        assert!(matches!(Se2.exp(&DMatrix::zeros(4, 4)), Err(FieldError::Shape(_))));
    }
}
