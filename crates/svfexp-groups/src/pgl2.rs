//! Projective linear group of the plane.

use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use svfexp_core::{FieldError, Result};

use crate::matrix::{expm, logm};
use crate::oracle::LieGroupOracle;

const DIM: usize = 2;
const SIZE: usize = DIM + 1;

/// Homographies of the plane, `H = [[A, T], [B, 1]]` up to scale.
///
/// With `special` set, algebra elements are trace-free.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pgl2 {
    pub special: bool,
}

/// Options for [`Pgl2::random_group`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomGroupOptions {
    /// Standard deviation of the entries before exponentiation.
    pub sigma: f64,
    /// Recentre the homography on this point.
    pub center: Option<[f64; 2]>,
    /// Multiply the group matrix by this factor.
    pub scale: Option<f64>,
}

impl Default for RandomGroupOptions {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            center: None,
            scale: None,
        }
    }
}

impl Pgl2 {
    pub fn new(special: bool) -> Self {
        Self { special }
    }

    /// Conjugate `h` by the translation to `center`, so that a map fixing
    /// the origin fixes `center` instead.
    ///
    /// The result is normalized so that its bottom-right entry is one.
    pub fn centered(h: &DMatrix<f64>, center: [f64; 2]) -> Result<DMatrix<f64>> {
        check(h)?;
        let bc = h[(DIM, 0)] * center[0] + h[(DIM, 1)] * center[1];
        let den = 1.0 - bc;
        if den.abs() < 1e-12 {
            return Err(FieldError::numerical(&center, "center is mapped to infinity"));
        }

        let mut out = DMatrix::<f64>::zeros(SIZE, SIZE);
        for i in 0..DIM {
            for j in 0..DIM {
                out[(i, j)] = (h[(i, j)] + center[i] * h[(DIM, j)]) / den;
            }
            out[(DIM, i)] = h[(DIM, i)] / den;
            let ac = h[(i, 0)] * center[0] + h[(i, 1)] * center[1];
            out[(i, DIM)] = (h[(i, DIM)] - ac - bc * center[i] + center[i]) / den;
        }
        out[(DIM, DIM)] = 1.0;
        Ok(out)
    }

    /// Random algebra element with `N(0, sigma²)` entries.
    pub fn random_algebra<R: Rng + ?Sized>(&self, rng: &mut R, sigma: f64) -> DMatrix<f64> {
        let mut m = DMatrix::from_fn(SIZE, SIZE, |_, _| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            sigma * z
        });
        if self.special {
            let rest: f64 = (1..SIZE).map(|i| m[(i, i)]).sum();
            m[(0, 0)] = -rest;
        }
        m
    }

    /// Random group element, obtained by exponentiating a random matrix so
    /// that its logarithm is real.
    pub fn random_group<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        options: &RandomGroupOptions,
    ) -> Result<DMatrix<f64>> {
        let mut m = DMatrix::from_fn(SIZE, SIZE, |_, _| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            options.sigma * z
        });
        m[(DIM, DIM)] = 1.0;
        let mut h = expm(&m)?;

        if let Some(scale) = options.scale {
            h *= scale;
        }
        if let Some(center) = options.center {
            h = Self::centered(&h, center)?;
        }
        if self.special {
            let rest: f64 = (1..SIZE).map(|i| h[(i, i)]).sum();
            h[(0, 0)] = -rest;
        }
        h[(DIM, DIM)] = 1.0;
        Ok(h)
    }

    /// [`random_algebra`](Self::random_algebra) with a fixed seed.
    pub fn seeded_algebra(&self, seed: u64, sigma: f64) -> DMatrix<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.random_algebra(&mut rng, sigma)
    }

    /// [`random_group`](Self::random_group) with a fixed seed.
    pub fn seeded_group(&self, seed: u64, options: &RandomGroupOptions) -> Result<DMatrix<f64>> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.random_group(&mut rng, options)
    }
}

fn check(m: &DMatrix<f64>) -> Result<()> {
    if m.nrows() != SIZE || m.ncols() != SIZE {
        return Err(FieldError::shape(format!(
            "PGL(2) elements are 3x3, got {}x{}",
            m.nrows(),
            m.ncols()
        )));
    }
    Ok(())
}

impl LieGroupOracle for Pgl2 {
    fn dim(&self) -> usize {
        DIM
    }

    fn exp(&self, algebra: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        check(algebra)?;
        if self.special && algebra.trace().abs() > 1e-4 {
            return Err(FieldError::configuration(format!(
                "special algebra elements are trace-free, trace is {}",
                algebra.trace()
            )));
        }
        expm(algebra)
    }

    fn log(&self, group: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        check(group)?;
        logm(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use svfexp_core::Domain;

    type TestBackend = NdArray<f64>;

    #[test]
    fn test_exp_log_round_trip() {
        let pgl = Pgl2::default();
        let a = pgl.seeded_algebra(3, 0.3);
        let g = pgl.exp(&a).unwrap();
        let back = pgl.exp(&pgl.log(&g).unwrap()).unwrap();
        assert!((&back - &g).norm() < 1e-9 * g.norm());
    }

    #[test]
    fn test_special_algebra_is_trace_free() {
        let pgl = Pgl2::new(true);
        let a = pgl.seeded_algebra(11, 1.0);
        assert!(a.trace().abs() < 1e-12);
        assert!(pgl.exp(&a).is_ok());
        assert!(pgl.exp(&DMatrix::identity(3, 3)).is_err());
    }

    #[test]
    fn test_seeded_generators_are_reproducible() {
        let pgl = Pgl2::default();
        assert_eq!(pgl.seeded_algebra(5, 1.0), pgl.seeded_algebra(5, 1.0));
        assert_ne!(pgl.seeded_algebra(5, 1.0), pgl.seeded_algebra(6, 1.0));

        let options = RandomGroupOptions {
            sigma: 0.1,
            center: Some([5.0, 5.0]),
            scale: None,
        };
        let h = pgl.seeded_group(5, &options).unwrap();
        assert_eq!(h, pgl.seeded_group(5, &options).unwrap());
        assert_eq!(h[(2, 2)], 1.0);
    }

    #[test]
    fn test_centered_moves_the_fixed_point() {
        // Pure linear maps fix the origin; centred on c they fix c.
        let h = DMatrix::from_row_slice(3, 3, &[1.2, 0.1, 0.0, -0.2, 0.9, 0.0, 0.0, 0.0, 1.0]);
        let centered = Pgl2::centered(&h, [4.0, 3.0]).unwrap();

        let device = Default::default();
        let domain = Domain::new(&[8, 8]).unwrap();
        let u = Pgl2::default()
            .displacement_field::<TestBackend>(&domain, &centered, &device)
            .unwrap();
        let fixed = u.value_at(&[4, 3], 0).unwrap();
        assert!(fixed.iter().all(|c| c.abs() < 1e-12), "{:?}", fixed);
        assert!(u.value_at(&[0, 0], 0).unwrap()[0].abs() > 1e-3);
    }

    #[test]
    fn test_centered_projective_fixed_point() {
        let h = DMatrix::from_row_slice(3, 3, &[1.1, 0.0, 0.0, 0.0, 0.95, 0.0, 0.01, -0.02, 1.0]);
        let c = [2.0, 5.0];
        let centered = Pgl2::centered(&h, c).unwrap();
        let image = &centered * nalgebra::DVector::from_vec(vec![c[0], c[1], 1.0]);
        assert!((image[0] / image[2] - c[0]).abs() < 1e-12);
        assert!((image[1] / image[2] - c[1]).abs() < 1e-12);
    }
}
