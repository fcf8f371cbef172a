//! Dense matrix exponential and logarithm.

use nalgebra::DMatrix;
use svfexp_core::{FieldError, Result};

/// Square roots are taken until `‖X - I‖_F` drops below this.
const LOG_SERIES_RADIUS: f64 = 0.25;
const MAX_SQUARE_ROOTS: usize = 64;
const MAX_SQRT_ITERATIONS: usize = 100;
const MAX_SERIES_TERMS: usize = 200;

fn check_square(m: &DMatrix<f64>) -> Result<()> {
    if !m.is_square() || m.nrows() == 0 {
        return Err(FieldError::shape(format!(
            "expected a non-empty square matrix, got {}x{}",
            m.nrows(),
            m.ncols()
        )));
    }
    if m.iter().any(|v| !v.is_finite()) {
        return Err(FieldError::numerical(m.as_slice(), "matrix has non-finite entries"));
    }
    Ok(())
}

fn invert(m: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    m.clone()
        .try_inverse()
        .ok_or_else(|| FieldError::numerical(m.as_slice(), "singular matrix"))
}

/// Matrix exponential.
pub fn expm(m: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    check_square(m)?;
    Ok(m.clone().exp())
}

/// Principal square root by the Denman-Beavers iteration.
pub fn sqrtm(m: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    check_square(m)?;
    let n = m.nrows();
    let mut y = m.clone();
    let mut z = DMatrix::<f64>::identity(n, n);
    for _ in 0..MAX_SQRT_ITERATIONS {
        let y_inv = invert(&y)?;
        let z_inv = invert(&z)?;
        let y_next = (&y + z_inv) * 0.5;
        let z_next = (&z + y_inv) * 0.5;
        let change = (&y_next - &y).norm();
        y = y_next;
        z = z_next;
        if change <= 1e-13 * y.norm().max(1.0) {
            return Ok(y);
        }
    }
    Err(FieldError::numerical(m.as_slice(), "square root iteration did not converge"))
}

/// Principal matrix logarithm by inverse scaling and squaring.
///
/// Square roots are taken until the matrix is close to the identity, the
/// logarithm is evaluated there with the Gregory series
/// `log X = 2 Σ Z^(2k+1) / (2k+1)`, `Z = (X - I)(X + I)^-1`, and scaled back.
pub fn logm(m: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    check_square(m)?;
    let n = m.nrows();
    let identity = DMatrix::<f64>::identity(n, n);

    let mut x = m.clone();
    let mut roots = 0usize;
    while (&x - &identity).norm() > LOG_SERIES_RADIUS {
        if roots == MAX_SQUARE_ROOTS {
            return Err(FieldError::numerical(m.as_slice(), "matrix logarithm did not converge"));
        }
        x = sqrtm(&x)?;
        roots += 1;
    }

    let z = (&x - &identity) * invert(&(&x + &identity))?;
    let z2 = &z * &z;
    let mut power = z.clone();
    let mut log = z;
    for k in 1..MAX_SERIES_TERMS {
        power = &power * &z2;
        let term = &power / (2 * k + 1) as f64;
        let size = term.norm();
        log += term;
        if size <= 1e-17 * log.norm().max(1e-300) {
            break;
        }
    }
    Ok(log * 2f64.powi(roots as i32 + 1))
}
