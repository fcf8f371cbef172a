//! Core vector field types and operators.
//!
//! Fields live on regular 2-D or 3-D grids and are stored as rank-5 burn
//! tensors `[Ω0, Ω1, Ω2, T, k]` tagged with a coordinate convention. This
//! crate provides the grid model, Lagrangian/Eulerian conversion,
//! interpolation, composition, finite-difference Jacobians and the field norm
//! used to compare integrator outputs.

pub mod compose;
pub mod domain;
pub mod error;
pub mod field;
pub mod interpolation;
pub mod jacobian;
pub mod norm;

pub use compose::{compose, sample, sample_points, warp};
pub use domain::{field_shape, generate_grid, validate_domain, validate_field, Domain, FIELD_RANK};
pub use error::{FieldError, Result};
pub use field::{identity_field, to_convention, to_eulerian, to_lagrangian, Convention, VectorField};
pub use interpolation::{InterpolationMethod, Interpolator};
pub use jacobian::{jacobian, jacobian_product};
pub use norm::{field_difference_norm, field_norm};
