//! Discretized domains and their coordinate grids.

pub mod grid;
pub mod shape;

pub use grid::{generate_grid, grid_coordinates};
pub use shape::{field_shape, validate_domain, validate_field, Domain, FIELD_RANK};
