//! Fixed-step explicit Runge-Kutta integration of a stationary velocity field.
//!
//! The flow is advanced as a Lagrangian displacement `φ`, starting from the
//! identity. Stage velocities are sampled at the displaced grid points
//! `x + φ(x) + h Σ a_ij k_j`.

use burn::tensor::backend::Backend;
use svfexp_core::{warp, Convention, InterpolationMethod, Result, VectorField};

use crate::config::{validate_steps, IntegrationMethod};

/// Explicit Butcher tableau.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButcherTableau {
    pub name: &'static str,
    /// Strictly lower-triangular stage coefficients, row `i` has `i` entries.
    pub a: &'static [&'static [f64]],
    pub b: &'static [f64],
    pub c: &'static [f64],
}

impl ButcherTableau {
    pub const EULER: Self = Self {
        name: "euler",
        a: &[&[]],
        b: &[1.0],
        c: &[0.0],
    };

    pub const MIDPOINT: Self = Self {
        name: "midpoint",
        a: &[&[], &[0.5]],
        b: &[0.0, 1.0],
        c: &[0.0, 0.5],
    };

    pub const HEUN: Self = Self {
        name: "heun",
        a: &[&[], &[1.0]],
        b: &[0.5, 0.5],
        c: &[0.0, 1.0],
    };

    /// Heun's third-order method.
    pub const HEUN_MODIFIED: Self = Self {
        name: "heun_modified",
        a: &[&[], &[1.0 / 3.0], &[0.0, 2.0 / 3.0]],
        b: &[0.25, 0.0, 0.75],
        c: &[0.0, 1.0 / 3.0, 2.0 / 3.0],
    };

    pub const RK4: Self = Self {
        name: "rk4",
        a: &[&[], &[0.5], &[0.0, 0.5], &[0.0, 0.0, 1.0]],
        b: &[1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
        c: &[0.0, 0.5, 0.5, 1.0],
    };

    /// Tableau of a fixed-step method, `None` for the other schemes.
    pub fn for_method(method: IntegrationMethod) -> Option<Self> {
        match method {
            IntegrationMethod::Euler => Some(Self::EULER),
            IntegrationMethod::Midpoint => Some(Self::MIDPOINT),
            IntegrationMethod::Heun => Some(Self::HEUN),
            IntegrationMethod::HeunModified => Some(Self::HEUN_MODIFIED),
            IntegrationMethod::Rk4 => Some(Self::RK4),
            _ => None,
        }
    }

    /// Number of stages.
    pub fn stages(&self) -> usize {
        self.b.len()
    }
}

/// `base + h Σ w_j k_j`, skipping zero weights.
fn weighted_sum<B: Backend>(
    base: &VectorField<B>,
    h: f64,
    weights: &[f64],
    stages: &[VectorField<B>],
) -> Result<VectorField<B>> {
    let mut acc = base.clone();
    for (w, k) in weights.iter().zip(stages) {
        if *w != 0.0 {
            acc = acc.checked_add(&k.scale(h * w))?;
        }
    }
    Ok(acc)
}

/// Advance the displacement `phi` by one step of size `h`.
pub fn step<B: Backend>(
    velocity: &VectorField<B>,
    phi: &VectorField<B>,
    tableau: &ButcherTableau,
    h: f64,
    method: InterpolationMethod,
) -> Result<VectorField<B>> {
    let mut stages: Vec<VectorField<B>> = Vec::with_capacity(tableau.stages());
    for row in tableau.a {
        let position = weighted_sum(phi, h, row, &stages)?;
        stages.push(warp(velocity, &position, method)?);
    }
    weighted_sum(phi, h, tableau.b, &stages)
}

/// Integrate a Lagrangian SVF over unit time with `steps` equal steps.
///
/// Returns the Lagrangian displacement at `t = 1`.
pub fn integrate_fixed_step<B: Backend>(
    velocity: &VectorField<B>,
    tableau: &ButcherTableau,
    steps: usize,
    method: InterpolationMethod,
) -> Result<VectorField<B>> {
    validate_steps(steps)?;
    velocity.require_convention(Convention::Lagrangian)?;
    velocity.require_plain("integration")?;

    let h = 1.0 / steps as f64;
    let mut phi = VectorField::zeros(
        velocity.domain(),
        velocity.timepoints(),
        Convention::Lagrangian,
        &velocity.device(),
    )?;
    for i in 0..steps {
        phi = step(velocity, &phi, tableau, h, method)?;
        tracing::debug!("{} step {}/{}", tableau.name, i + 1, steps);
    }
    Ok(phi)
}
