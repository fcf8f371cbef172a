//! Analytic ground truths for SVF exponentiation.
//!
//! Matrix Lie groups acting projectively on the grid give velocity fields
//! whose exponential is known in closed form. The crate also provides the
//! seeded random smooth fields used for stress tests.

pub mod gaussian;
pub mod generate;
pub mod matrix;
pub mod oracle;
pub mod pgl2;
pub mod se2;

pub use gaussian::GaussianSmoother;
pub use generate::{displacement_from_matrix, random_smooth_field, velocity_from_matrix};
pub use matrix::{expm, logm, sqrtm};
pub use oracle::LieGroupOracle;
pub use pgl2::{Pgl2, RandomGroupOptions};
pub use se2::Se2;
