//! Scaling-and-squaring family.
//!
//! Each variant builds an approximation of `exp(v / 2^N)` and squares it
//! `N` times, `φ ← φ ∘ φ`. The variants only differ in the seed.

use burn::tensor::backend::Backend;
use svfexp_core::{
    compose, jacobian, jacobian_product, Convention, InterpolationMethod, Result, VectorField,
};

use crate::config::validate_squarings;
use crate::one_step::{step, ButcherTableau};

fn check_velocity<B: Backend>(velocity: &VectorField<B>, squarings: usize) -> Result<()> {
    validate_squarings(squarings)?;
    velocity.require_convention(Convention::Lagrangian)?;
    velocity.require_plain("integration")
}

/// Compose a displacement with itself `squarings` times.
pub fn square<B: Backend>(
    mut phi: VectorField<B>,
    squarings: usize,
    method: InterpolationMethod,
) -> Result<VectorField<B>> {
    for i in 0..squarings {
        phi = compose(&phi, &phi, method)?;
        tracing::debug!("squaring {}/{}: max displacement {:.6}", i + 1, squarings, phi.max_abs());
    }
    Ok(phi)
}

/// Plain scaling-and-squaring with the first-order seed `v / 2^N`.
pub fn scaling_and_squaring<B: Backend>(
    velocity: &VectorField<B>,
    squarings: usize,
    method: InterpolationMethod,
) -> Result<VectorField<B>> {
    check_velocity(velocity, squarings)?;
    let seed = velocity.scale(0.5f64.powi(squarings as i32));
    square(seed, squarings, method)
}

/// Flow of the local affine approximation of `v_s` over unit time.
///
/// With `J` the Jacobian of `v_s`, returns `Σ_{j=0}^{order} J^j v_s / (j+1)!`.
pub fn polyaffine_seed<B: Backend>(
    scaled: &VectorField<B>,
    order: usize,
) -> Result<VectorField<B>> {
    let jac = jacobian(scaled)?;
    let mut term = scaled.clone();
    let mut seed = scaled.clone();
    for j in 1..=order {
        term = jacobian_product(&jac, &term)?.scale(1.0 / (j + 1) as f64);
        seed = seed.checked_add(&term)?;
    }
    Ok(seed)
}

/// Scaling-and-squaring seeded with the truncated polyaffine series.
pub fn polyaffine_scaling_and_squaring<B: Backend>(
    velocity: &VectorField<B>,
    squarings: usize,
    series_order: usize,
    method: InterpolationMethod,
) -> Result<VectorField<B>> {
    check_velocity(velocity, squarings)?;
    let scaled = velocity.scale(0.5f64.powi(squarings as i32));
    let seed = polyaffine_seed(&scaled, series_order)?;
    square(seed, squarings, method)
}

/// Scaling-and-squaring seeded with one RK4 step of size `1 / 2^N`.
pub fn rk4_scaling_and_squaring<B: Backend>(
    velocity: &VectorField<B>,
    squarings: usize,
    method: InterpolationMethod,
) -> Result<VectorField<B>> {
    check_velocity(velocity, squarings)?;
    let identity = VectorField::zeros(
        velocity.domain(),
        velocity.timepoints(),
        Convention::Lagrangian,
        &velocity.device(),
    )?;
    let h = 0.5f64.powi(squarings as i32);
    let seed = step(velocity, &identity, &ButcherTableau::RK4, h, method)?;
    square(seed, squarings, method)
}
