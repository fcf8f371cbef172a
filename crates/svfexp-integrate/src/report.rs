//! Per-point numerical diagnostics.

use svfexp_core::FieldError;

/// Diagnostics collected while integrating.
///
/// Grid-wide integrators return an empty report. The adaptive solver lists
/// one [`FieldError::Numerical`] entry per seed that failed to reach `t = 1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericalReport {
    failures: Vec<FieldError>,
    /// Seeds that reached `t = 1`.
    pub converged: usize,
    /// Accepted steps over all seeds.
    pub accepted_steps: u64,
    /// Rejected steps over all seeds.
    pub rejected_steps: u64,
    /// Velocity evaluations over all seeds.
    pub evaluations: u64,
}

impl NumericalReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure.
    pub fn push(&mut self, failure: FieldError) {
        self.failures.push(failure);
    }

    /// Recorded failures, in seed order.
    pub fn failures(&self) -> &[FieldError] {
        &self.failures
    }

    /// Whether every point converged.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Path of a single seed: ordered `(t, point)` pairs from `t = 0` to `t = 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub seed: Vec<f64>,
    pub points: Vec<(f64, Vec<f64>)>,
}

impl Trajectory {
    /// Trajectory holding only the seed at `t = 0`.
    pub fn start(seed: &[f64]) -> Self {
        Self {
            seed: seed.to_vec(),
            points: vec![(0.0, seed.to_vec())],
        }
    }

    /// Last recorded position.
    pub fn end(&self) -> &[f64] {
        self.points
            .last()
            .map(|(_, p)| p.as_slice())
            .unwrap_or(self.seed.as_slice())
    }

    /// Displacement from the seed to the last recorded position.
    pub fn displacement(&self) -> Vec<f64> {
        self.end()
            .iter()
            .zip(&self.seed)
            .map(|(end, start)| end - start)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_collects_failures() {
        let mut report = NumericalReport::new();
        assert!(report.is_clean());
        report.push(FieldError::numerical(&[1.0, 2.0], "step size underflow"));
        assert!(!report.is_clean());
        assert_eq!(report.failures().len(), 1);
        assert!(report.failures()[0].is_recoverable());
    }

    #[test]
    fn test_trajectory_displacement() {
        let mut trajectory = Trajectory::start(&[1.0, 2.0]);
        assert_eq!(trajectory.displacement(), vec![0.0, 0.0]);
        trajectory.points.push((1.0, vec![1.5, 1.0]));
        assert_eq!(trajectory.end(), &[1.5, 1.0]);
        assert_eq!(trajectory.displacement(), vec![0.5, -1.0]);
    }
}
