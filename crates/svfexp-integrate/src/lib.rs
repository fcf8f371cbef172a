//! Exponentiation of stationary velocity fields.
//!
//! Given a Lagrangian velocity field `v`, computes the displacement of the
//! flow `φ(1, ·)` solving `∂φ/∂t = v(φ)`, `φ(0, x) = x`. Methods range from
//! scaling-and-squaring variants over fixed-step Runge-Kutta schemes to an
//! adaptive per-point solver used as an independent reference.

pub mod adaptive;
pub mod config;
pub mod exponential;
pub mod one_step;
pub mod report;
pub mod scaling_squaring;

pub use adaptive::{integrate_grid, integrate_seeds, StepController};
pub use config::{
    validate_squarings, validate_steps, validate_tolerances, AdaptiveConfig, IntegrationMethod,
    IntegratorConfig, MAX_SQUARINGS, MAX_STEPS,
};
pub use exponential::{Exponential, ExponentialOutput};
pub use one_step::{integrate_fixed_step, ButcherTableau};
pub use report::{NumericalReport, Trajectory};
pub use scaling_squaring::{
    polyaffine_scaling_and_squaring, rk4_scaling_and_squaring, scaling_and_squaring, square,
};
