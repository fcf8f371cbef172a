//! Vector fields and coordinate conventions.

pub mod coordinate;
pub mod vector_field;

pub use coordinate::{identity_field, to_convention, to_eulerian, to_lagrangian};
pub use vector_field::{Convention, VectorField};
