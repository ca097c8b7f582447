//! Quadratic model `y = a(x-b)^2 + c`.
//!
//! The fitter relies on two primitive operations:
//! - predict `y(x)` for given parameters (residuals, plots)
//! - fill the Jacobian row `∂y/∂(a, b, c)` at `x` (solver steps)

use crate::domain::{N_PARAMS, ParameterVector};

/// Evaluate the model at `x`.
pub fn predict(x: f64, p: &ParameterVector) -> f64 {
    let dx = x - p.b;
    p.a * dx * dx + p.c
}

/// Fill the partial derivatives of the model at `x`.
///
/// Order matches `ParameterVector::to_array`.
pub fn fill_jacobian_row(x: f64, p: &ParameterVector, out: &mut [f64; N_PARAMS]) {
    let dx = x - p.b;
    out[0] = dx * dx;
    out[1] = -2.0 * p.a * dx;
    out[2] = 1.0;
}

/// Sample the model on `n` evenly spaced points over `[x_min, x_max]`.
pub fn sample_curve(p: &ParameterVector, x_min: f64, x_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let x = x_min + u * (x_max - x_min);
            (x, predict(x, p))
        })
        .collect()
}
