//! Integrator configuration and validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use svfexp_core::{Convention, FieldError, InterpolationMethod, Result};

/// Largest accepted number of squarings.
pub const MAX_SQUARINGS: usize = 32;

/// Largest accepted number of fixed steps.
pub const MAX_STEPS: usize = 1 << 20;

/// Exponentiation scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMethod {
    /// First-order seed `v / 2^N` followed by `N` self-compositions.
    #[default]
    ScalingAndSquaring,
    /// Locally affine seed followed by `N` self-compositions.
    PolyaffineSs,
    /// One RK4 step of size `1 / 2^N` as seed, then `N` self-compositions.
    GssRk4,
    Euler,
    Midpoint,
    Heun,
    /// Heun's third-order method.
    HeunModified,
    Rk4,
    /// Dormand-Prince 5(4) per grid point.
    AdaptivePointwise,
}

impl IntegrationMethod {
    /// Every supported method.
    pub const ALL: [Self; 9] = [
        Self::ScalingAndSquaring,
        Self::PolyaffineSs,
        Self::GssRk4,
        Self::Euler,
        Self::Midpoint,
        Self::Heun,
        Self::HeunModified,
        Self::Rk4,
        Self::AdaptivePointwise,
    ];

    /// Name used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScalingAndSquaring => "scaling_and_squaring",
            Self::PolyaffineSs => "polyaffine_ss",
            Self::GssRk4 => "gss_rk4",
            Self::Euler => "euler",
            Self::Midpoint => "midpoint",
            Self::Heun => "heun",
            Self::HeunModified => "heun_modified",
            Self::Rk4 => "rk4",
            Self::AdaptivePointwise => "adaptive_pointwise",
        }
    }

    /// Whether `steps` counts squarings rather than time steps.
    pub fn uses_squarings(&self) -> bool {
        matches!(
            self,
            Self::ScalingAndSquaring | Self::PolyaffineSs | Self::GssRk4
        )
    }
}

impl fmt::Display for IntegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationMethod {
    type Err = FieldError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| FieldError::configuration(format!("unknown integration method '{}'", s)))
    }
}

/// Step-size control for the adaptive pointwise solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Relative tolerance.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
    /// First trial step.
    pub initial_step: f64,
    /// Smallest step before a point is declared failed.
    pub min_step: f64,
    /// Step attempts per point before it is declared failed.
    pub max_steps: usize,
    /// Safety factor applied to the optimal step.
    pub safety: f64,
    /// Smallest step shrink factor.
    pub min_factor: f64,
    /// Largest step growth factor.
    pub max_factor: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-8,
            initial_step: 0.1,
            min_step: 1e-10,
            max_steps: 10_000,
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 5.0,
        }
    }
}

impl AdaptiveConfig {
    /// Create a new adaptive config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set relative and absolute tolerances.
    pub fn with_tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.rtol = rtol;
        self.atol = atol;
        self
    }

    /// Set the first trial step.
    pub fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = step;
        self
    }

    /// Set the smallest admissible step.
    pub fn with_min_step(mut self, step: f64) -> Self {
        self.min_step = step;
        self
    }

    /// Set the per-point step budget.
    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = steps;
        self
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<()> {
        validate_tolerances(self.rtol, self.atol)?;
        if !(self.initial_step.is_finite() && self.initial_step > 0.0 && self.initial_step <= 1.0) {
            return Err(FieldError::configuration(format!(
                "initial step must lie in (0, 1], got {}",
                self.initial_step
            )));
        }
        if !(self.min_step.is_finite()
            && self.min_step > 0.0
            && self.min_step <= self.initial_step)
        {
            return Err(FieldError::configuration(format!(
                "minimum step must lie in (0, {}], got {}",
                self.initial_step, self.min_step
            )));
        }
        if self.max_steps == 0 {
            return Err(FieldError::configuration("step budget must be positive"));
        }
        if !(self.safety > 0.0 && self.safety <= 1.0) {
            return Err(FieldError::configuration(format!(
                "safety factor must lie in (0, 1], got {}",
                self.safety
            )));
        }
        if !(self.min_factor > 0.0
            && self.min_factor < 1.0
            && self.max_factor > 1.0
            && self.max_factor.is_finite())
        {
            return Err(FieldError::configuration(format!(
                "step factors must satisfy 0 < min < 1 < max, got [{}, {}]",
                self.min_factor, self.max_factor
            )));
        }
        Ok(())
    }
}

/// Full integrator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Exponentiation scheme.
    pub method: IntegrationMethod,
    /// Squarings for the scaling-and-squaring family, time steps otherwise.
    pub steps: usize,
    /// Interpolation used whenever a field is sampled off-grid.
    pub interpolation: InterpolationMethod,
    /// Highest Jacobian power in the polyaffine seed.
    pub series_order: usize,
    /// Adaptive solver settings.
    pub adaptive: AdaptiveConfig,
    /// Border cells left at zero displacement by the adaptive solver.
    pub passe_partout: usize,
    /// Convention of the returned field.
    pub output_convention: Convention,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            method: IntegrationMethod::default(),
            steps: 7,
            interpolation: InterpolationMethod::default(),
            series_order: 3,
            adaptive: AdaptiveConfig::default(),
            passe_partout: 0,
            output_convention: Convention::Lagrangian,
        }
    }
}

impl IntegratorConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the method.
    pub fn with_method(mut self, method: IntegrationMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the step or squaring count.
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Set the interpolation method.
    pub fn with_interpolation(mut self, interpolation: InterpolationMethod) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set the polyaffine series order.
    pub fn with_series_order(mut self, order: usize) -> Self {
        self.series_order = order;
        self
    }

    /// Set the adaptive solver settings.
    pub fn with_adaptive(mut self, adaptive: AdaptiveConfig) -> Self {
        self.adaptive = adaptive;
        self
    }

    /// Set the border skipped by the adaptive solver.
    pub fn with_passe_partout(mut self, passe_partout: usize) -> Self {
        self.passe_partout = passe_partout;
        self
    }

    /// Set the output convention.
    pub fn with_output_convention(mut self, convention: Convention) -> Self {
        self.output_convention = convention;
        self
    }

    /// Check the parameters relevant to the selected method.
    pub fn validate(&self) -> Result<()> {
        match self.method {
            IntegrationMethod::AdaptivePointwise => self.adaptive.validate(),
            IntegrationMethod::PolyaffineSs => {
                validate_squarings(self.steps)?;
                if self.series_order > MAX_SQUARINGS {
                    return Err(FieldError::configuration(format!(
                        "series order {} exceeds the maximum of {}",
                        self.series_order, MAX_SQUARINGS
                    )));
                }
                Ok(())
            }
            m if m.uses_squarings() => validate_squarings(self.steps),
            _ => validate_steps(self.steps),
        }
    }
}

/// Fixed-step count must be positive and bounded.
pub fn validate_steps(steps: usize) -> Result<()> {
    if steps == 0 {
        return Err(FieldError::configuration("number of steps must be positive"));
    }
    if steps > MAX_STEPS {
        return Err(FieldError::configuration(format!(
            "number of steps {} exceeds the maximum of {}",
            steps, MAX_STEPS
        )));
    }
    Ok(())
}

/// Squaring count must be positive and at most [`MAX_SQUARINGS`].
pub fn validate_squarings(squarings: usize) -> Result<()> {
    if squarings == 0 {
        return Err(FieldError::configuration("number of squarings must be positive"));
    }
    if squarings > MAX_SQUARINGS {
        return Err(FieldError::configuration(format!(
            "number of squarings {} exceeds the maximum of {}",
            squarings, MAX_SQUARINGS
        )));
    }
    Ok(())
}

/// Tolerances must be finite, `atol` positive and `rtol` non-negative.
pub fn validate_tolerances(rtol: f64, atol: f64) -> Result<()> {
    if !atol.is_finite() || atol <= 0.0 {
        return Err(FieldError::configuration(format!(
            "absolute tolerance must be positive and finite, got {}",
            atol
        )));
    }
    if !rtol.is_finite() || rtol < 0.0 {
        return Err(FieldError::configuration(format!(
            "relative tolerance must be non-negative and finite, got {}",
            rtol
        )));
    }
    Ok(())
}
