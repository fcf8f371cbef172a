//! Uniform entry point over every integration method.

use std::time::Instant;

use burn::tensor::backend::Backend;
use svfexp_core::{to_convention, Convention, FieldError, Result, VectorField};

use crate::adaptive::integrate_grid;
use crate::config::{IntegrationMethod, IntegratorConfig};
use crate::one_step::{integrate_fixed_step, ButcherTableau};
use crate::report::NumericalReport;
use crate::scaling_squaring::{
    polyaffine_scaling_and_squaring, rk4_scaling_and_squaring, scaling_and_squaring,
};

/// Result of an exponentiation.
#[derive(Debug, Clone)]
pub struct ExponentialOutput<B: Backend> {
    /// Flow at `t = 1`, in the configured output convention.
    pub displacement: VectorField<B>,
    /// Per-point failures; always clean for grid-wide methods.
    pub report: NumericalReport,
}

/// Stationary velocity field exponentiation.
#[derive(Debug, Clone, Copy)]
pub struct Exponential {
    config: IntegratorConfig,
}

impl Exponential {
    /// Create an integrator, validating the configuration.
    pub fn new(config: IntegratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    /// Exponentiate a Lagrangian SVF.
    pub fn compute<B: Backend>(&self, svf: &VectorField<B>) -> Result<ExponentialOutput<B>> {
        svf.require_convention(Convention::Lagrangian)?;
        svf.require_plain("integration")?;

        let config = &self.config;
        let start = Instant::now();
        tracing::info!(
            "Exponentiating {:?} SVF with {} ({} steps, {} interpolation)",
            svf.shape(),
            config.method,
            config.steps,
            config.interpolation
        );

        let mut report = NumericalReport::new();
        let displacement = match config.method {
            IntegrationMethod::ScalingAndSquaring => {
                scaling_and_squaring(svf, config.steps, config.interpolation)?
            }
            IntegrationMethod::PolyaffineSs => polyaffine_scaling_and_squaring(
                svf,
                config.steps,
                config.series_order,
                config.interpolation,
            )?,
            IntegrationMethod::GssRk4 => {
                rk4_scaling_and_squaring(svf, config.steps, config.interpolation)?
            }
            IntegrationMethod::Euler
            | IntegrationMethod::Midpoint
            | IntegrationMethod::Heun
            | IntegrationMethod::HeunModified
            | IntegrationMethod::Rk4 => {
                let tableau = ButcherTableau::for_method(config.method).ok_or_else(|| {
                    FieldError::configuration(format!("{} has no Butcher tableau", config.method))
                })?;
                integrate_fixed_step(svf, &tableau, config.steps, config.interpolation)?
            }
            IntegrationMethod::AdaptivePointwise => {
                let (field, adaptive_report) = integrate_grid(
                    svf,
                    config.interpolation,
                    &config.adaptive,
                    config.passe_partout,
                )?;
                report = adaptive_report;
                field
            }
        };

        let displacement = to_convention(displacement, config.output_convention)?;
        tracing::info!(
            "{} finished in {:.3?}: {} failed points",
            config.method,
            start.elapsed(),
            report.failures().len()
        );
        Ok(ExponentialOutput { displacement, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use svfexp_core::Domain;

    type TestBackend = NdArray<f64>;

    #[test]
    fn test_invalid_config_rejected() {
        let config = IntegratorConfig::new().with_steps(0);
        assert!(matches!(Exponential::new(config), Err(FieldError::Configuration(_))));
    }

    #[test]
    fn test_every_method_on_constant_field() {
        let device = Default::default();
        let domain = Domain::new(&[8, 8]).unwrap();
        let v = VectorField::<TestBackend>::constant(
            &domain,
            1,
            &[0.2, -0.1],
            Convention::Lagrangian,
            &device,
        )
        .unwrap();
        for method in IntegrationMethod::ALL {
            let config = IntegratorConfig::new().with_method(method).with_steps(3);
            let exp = Exponential::new(config).unwrap();
            let output = exp.compute(&v).unwrap();
            assert!(output.report.is_clean(), "{}", method);
            let err = output.displacement.checked_sub(&v).unwrap().max_abs();
            assert!(err < 1e-9, "{}: {}", method, err);
        }
    }

    #[test]
    fn test_eulerian_output() {
        let device = Default::default();
        let domain = Domain::new(&[6, 6]).unwrap();
        let v = VectorField::<TestBackend>::zeros(&domain, 1, Convention::Lagrangian, &device)
            .unwrap();
        let config = IntegratorConfig::new().with_output_convention(Convention::Eulerian);
        let exp = Exponential::new(config).unwrap();
        let output = exp.compute(&v).unwrap();
        assert_eq!(output.displacement.convention(), Convention::Eulerian);
        assert_eq!(output.displacement.value_at(&[4, 5], 0).unwrap(), vec![4.0, 5.0]);
    }

    #[test]
    fn test_eulerian_svf_rejected() {
        let device = Default::default();
        let domain = Domain::new(&[6, 6]).unwrap();
        let v =
            VectorField::<TestBackend>::zeros(&domain, 1, Convention::Eulerian, &device).unwrap();
        let exp = Exponential::new(IntegratorConfig::default()).unwrap();
        assert!(matches!(exp.compute(&v), Err(FieldError::ConventionMismatch { .. })));
    }

    #[test]
    fn test_fixed_step_methods_use_their_tableau() {
        let device = Default::default();
        let domain = Domain::new(&[8, 8]).unwrap();
        let v = VectorField::<TestBackend>::from_fn(
            &domain,
            1,
            Convention::Lagrangian,
            &device,
            |x| vec![0.05 * x[1] as f64 - 0.2, -0.05 * x[0] as f64 + 0.2],
        )
        .unwrap();
        for method in IntegrationMethod::ALL {
            let config = IntegratorConfig::new().with_method(method).with_steps(4);
            let output = Exponential::new(config).unwrap().compute(&v).unwrap();
            match ButcherTableau::for_method(method) {
                Some(tableau) => {
                    let direct =
                        integrate_fixed_step(&v, &tableau, 4, config.interpolation).unwrap();
                    assert_eq!(output.displacement.to_values(), direct.to_values(), "{}", method);
                }
                None => assert!(
                    method.uses_squarings() || method == IntegrationMethod::AdaptivePointwise,
                    "{}",
                    method
                ),
            }
        }
    }
}
