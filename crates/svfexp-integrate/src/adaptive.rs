//! Adaptive pointwise integration with Dormand-Prince 5(4).
//!
//! Every seed carries its own time, step size and error control; all active
//! seeds are advanced together so that each stage costs a single batched
//! sampling of the velocity field. Seeds that fail are retired with a
//! [`FieldError::Numerical`] entry in the report; the others continue.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use svfexp_core::{
    generate_grid, sample_points, Convention, FieldError, InterpolationMethod, Result, VectorField,
};

use crate::config::AdaptiveConfig;
use crate::report::{NumericalReport, Trajectory};

const STAGES: usize = 7;

const C: [f64; STAGES] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

const A: [[f64; 6]; STAGES] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
        0.0,
    ],
    [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ],
];

/// Fifth-order weights; the last stage is evaluated at the new state (FSAL).
const B: [f64; STAGES] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
    0.0,
];

/// Difference between the fifth- and fourth-order weights.
const E: [f64; STAGES] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

/// Order of the embedded error estimate plus one.
const ERROR_EXPONENT: f64 = 1.0 / 5.0;

/// Step-size controller using an I-controller.
///
/// `h_new = safety * h * error^(-1/5)`, clamped to `[min_factor, max_factor]`.
#[derive(Debug, Clone, Copy)]
pub struct StepController {
    pub safety: f64,
    pub min_factor: f64,
    pub max_factor: f64,
}

impl StepController {
    pub fn from_config(config: &AdaptiveConfig) -> Self {
        Self {
            safety: config.safety,
            min_factor: config.min_factor,
            max_factor: config.max_factor,
        }
    }

    /// Compute the step size adjustment factor.
    pub fn compute_factor(&self, error: f64) -> f64 {
        if error == 0.0 {
            return self.max_factor;
        }
        let factor = self.safety * error.powf(-ERROR_EXPONENT);
        factor.clamp(self.min_factor, self.max_factor)
    }
}

/// State of one seed during integration.
struct SeedState {
    trajectory: Trajectory,
    t: f64,
    y: Vec<f64>,
    h: f64,
    /// Velocity at `y`, reused as the first stage of the next step.
    k1: Vec<f64>,
    attempts: usize,
    outcome: Option<std::result::Result<(), String>>,
}

impl SeedState {
    fn active(&self) -> bool {
        self.outcome.is_none()
    }

    fn fail(&mut self, reason: String) {
        self.outcome = Some(Err(reason));
    }
}

/// Scaled RMS norm of the error estimate.
fn error_norm(err: &[f64], y: &[f64], y_new: &[f64], config: &AdaptiveConfig) -> f64 {
    let sum: f64 = err
        .iter()
        .zip(y.iter().zip(y_new))
        .map(|(e, (a, b))| {
            let scale = config.atol + config.rtol * a.abs().max(b.abs());
            (e / scale).powi(2)
        })
        .sum();
    (sum / err.len() as f64).sqrt()
}

/// Sample the velocity at a batch of host points, one `dim`-vector each.
///
/// Non-finite points are not sampled and yield `None`.
fn evaluate<B: Backend>(
    velocity: &VectorField<B>,
    points: &[Vec<f64>],
    method: InterpolationMethod,
) -> Result<Vec<Option<Vec<f64>>>> {
    if points.is_empty() {
        return Ok(Vec::new());
    }
    let dim = velocity.dim();
    let finite: Vec<bool> = points.iter().map(|p| p.iter().all(|x| x.is_finite())).collect();
    let flat: Vec<f64> = points
        .iter()
        .zip(&finite)
        .flat_map(|(p, &ok)| if ok { p.clone() } else { vec![0.0; dim] })
        .collect();
    let batch = points.len();
    let tensor = Tensor::<B, 2>::from_data(TensorData::new(flat, [batch, dim]), &velocity.device());
    let values: Vec<f64> = sample_points(velocity, tensor, method)?
        .into_data()
        .iter::<f64>()
        .collect();
    Ok(values
        .chunks(dim)
        .zip(finite)
        .map(|(v, ok)| ok.then(|| v.to_vec()))
        .collect())
}

fn check_velocity<B: Backend>(velocity: &VectorField<B>, config: &AdaptiveConfig) -> Result<()> {
    config.validate()?;
    velocity.require_convention(Convention::Lagrangian)?;
    velocity.require_plain("adaptive integration")?;
    if velocity.timepoints() != 1 {
        return Err(FieldError::configuration(format!(
            "adaptive integration requires a single timepoint, got {}",
            velocity.timepoints()
        )));
    }
    Ok(())
}

/// Integrate the flow of a stationary velocity field from each seed over
/// `t ∈ [0, 1]`.
///
/// Returns the trajectories of the seeds that converged, in seed order, and
/// a report listing the seeds that did not.
pub fn integrate_seeds<B: Backend>(
    velocity: &VectorField<B>,
    seeds: &[Vec<f64>],
    method: InterpolationMethod,
    config: &AdaptiveConfig,
) -> Result<(Vec<Trajectory>, NumericalReport)> {
    check_velocity(velocity, config)?;
    let dim = velocity.dim();
    if let Some(seed) = seeds.iter().find(|s| s.len() != dim) {
        return Err(FieldError::shape(format!(
            "seed {:?} does not match dimensionality {}",
            seed, dim
        )));
    }

    let controller = StepController::from_config(config);
    let mut report = NumericalReport::new();

    let initial = evaluate(velocity, seeds, method)?;
    report.evaluations += seeds.len() as u64;
    let mut states: Vec<SeedState> = seeds
        .iter()
        .zip(initial)
        .map(|(seed, k1)| {
            let mut state = SeedState {
                trajectory: Trajectory::start(seed),
                t: 0.0,
                y: seed.clone(),
                h: config.initial_step,
                k1: k1.clone().unwrap_or_default(),
                attempts: 0,
                outcome: None,
            };
            match k1 {
                Some(k) if k.iter().all(|v| v.is_finite()) => {}
                Some(_) => state.fail("non-finite velocity at seed".to_string()),
                None => state.fail("non-finite seed".to_string()),
            }
            state
        })
        .collect();

    let mut round = 0usize;
    loop {
        let active: Vec<usize> = (0..states.len()).filter(|&i| states[i].active()).collect();
        if active.is_empty() {
            break;
        }
        round += 1;

        let mut final_step = vec![false; active.len()];
        for (slot, &i) in active.iter().enumerate() {
            let s = &mut states[i];
            if s.h >= 1.0 - s.t {
                s.h = 1.0 - s.t;
                final_step[slot] = true;
            }
        }

        // k[stage][slot] for the active seeds.
        let mut k: Vec<Vec<Vec<f64>>> =
            vec![active.iter().map(|&i| states[i].k1.clone()).collect()];
        let mut broken: Vec<Option<usize>> = vec![None; active.len()];
        for stage in 1..STAGES {
            let points: Vec<Vec<f64>> = active
                .iter()
                .enumerate()
                .map(|(slot, &i)| {
                    let s = &states[i];
                    (0..dim)
                        .map(|c| {
                            s.y[c]
                                + s.h
                                    * (0..stage)
                                        .map(|j| A[stage][j] * k[j][slot][c])
                                        .sum::<f64>()
                        })
                        .collect()
                })
                .collect();
            let values = evaluate(velocity, &points, method)?;
            report.evaluations += active.len() as u64;
            k.push(
                values
                    .into_iter()
                    .enumerate()
                    .map(|(slot, v)| match v {
                        Some(v) if v.iter().all(|x| x.is_finite()) => v,
                        _ => {
                            if broken[slot].is_none() {
                                broken[slot] = Some(stage);
                            }
                            vec![0.0; dim]
                        }
                    })
                    .collect(),
            );
        }

        for (slot, &i) in active.iter().enumerate() {
            let s = &mut states[i];
            s.attempts += 1;
            if let Some(stage) = broken[slot] {
                s.fail(format!("non-finite velocity near t = {:.6}", s.t + C[stage] * s.h));
                continue;
            }

            let y_new: Vec<f64> = (0..dim)
                .map(|c| s.y[c] + s.h * (0..STAGES).map(|j| B[j] * k[j][slot][c]).sum::<f64>())
                .collect();
            let err: Vec<f64> = (0..dim)
                .map(|c| s.h * (0..STAGES).map(|j| E[j] * k[j][slot][c]).sum::<f64>())
                .collect();
            let error = error_norm(&err, &s.y, &y_new, config);
            let factor = controller.compute_factor(error);

            if error <= 1.0 {
                report.accepted_steps += 1;
                s.t = if final_step[slot] { 1.0 } else { s.t + s.h };
                s.y = y_new;
                s.k1 = k[STAGES - 1][slot].clone();
                s.trajectory.points.push((s.t, s.y.clone()));
                if final_step[slot] {
                    s.outcome = Some(Ok(()));
                    continue;
                }
                s.h *= factor;
            } else {
                report.rejected_steps += 1;
                s.h *= factor.min(1.0);
            }

            if s.h < config.min_step {
                let reason = format!("step size underflow ({:e}) at t = {:.6}", s.h, s.t);
                s.fail(reason);
            } else if s.attempts >= config.max_steps {
                let reason = format!(
                    "step budget of {} exhausted at t = {:.6}",
                    config.max_steps, s.t
                );
                s.fail(reason);
            }
        }
        tracing::debug!("adaptive round {}: {} seeds active", round, active.len());
    }

    let mut trajectories = Vec::with_capacity(states.len());
    for state in states {
        match state.outcome {
            Some(Ok(())) => {
                report.converged += 1;
                trajectories.push(state.trajectory);
            }
            Some(Err(reason)) => {
                tracing::warn!("seed {:?} failed to converge: {}", state.trajectory.seed, reason);
                report.push(FieldError::numerical(&state.trajectory.seed, reason));
            }
            None => {}
        }
    }
    Ok((trajectories, report))
}

/// Integrate every grid point outside a `passe_partout` border.
///
/// Returns the Lagrangian displacement at `t = 1`; border points and points
/// that failed keep a zero displacement and failures are listed in the report.
pub fn integrate_grid<B: Backend>(
    velocity: &VectorField<B>,
    method: InterpolationMethod,
    config: &AdaptiveConfig,
    passe_partout: usize,
) -> Result<(VectorField<B>, NumericalReport)> {
    check_velocity(velocity, config)?;
    let domain = *velocity.domain();
    let dim = domain.dim();
    let extents = domain.extents().to_vec();

    let grid: Vec<f64> = generate_grid::<B>(&domain, &velocity.device())
        .into_data()
        .iter::<f64>()
        .collect();
    let inside = |point: &[f64]| {
        point
            .iter()
            .zip(&extents)
            .all(|(&x, &n)| x >= passe_partout as f64 && x + (passe_partout as f64) < n as f64)
    };
    let (indices, seeds): (Vec<usize>, Vec<Vec<f64>>) = grid
        .chunks(dim)
        .enumerate()
        .filter(|(_, p)| inside(p))
        .map(|(i, p)| (i, p.to_vec()))
        .unzip();

    let (trajectories, report) = integrate_seeds(velocity, &seeds, method, config)?;

    let mut values = vec![0.0; domain.num_points() * dim];
    let mut converged = trajectories.iter().peekable();
    for (&index, seed) in indices.iter().zip(&seeds) {
        if let Some(trajectory) = converged.next_if(|t| &t.seed == seed) {
            let offset = index * dim;
            values[offset..offset + dim].copy_from_slice(&trajectory.displacement());
        }
    }

    let displacement = VectorField::from_values(
        &domain,
        1,
        dim,
        values,
        Convention::Lagrangian,
        &velocity.device(),
    )?;
    Ok((displacement, report))
}
