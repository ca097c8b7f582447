//! Weighted least-squares fit of `y = a(x-b)^2 + c`.
//!
//! Given:
//! - observations `(x_i, y_i, err_i)`
//! - an initial guess for `(a, b, c)`
//! - a nonlinear least-squares solver
//!
//! we minimize `Σ ((y_i - f(x_i)) / err_i)^2` and estimate the parameter
//! covariance the way SciPy's `curve_fit` does with relative sigmas:
//!
//! ```text
//! pcov = (J_wᵀ J_w)⁻¹ · χ²_w / (n - 3)
//! ```
//!
//! where `J_w` is the weighted Jacobian at the solution.

use nalgebra::{DMatrix, DVector, Matrix3};
use tracing::{debug, info};

use crate::domain::{CovarianceMatrix, FitResult, N_PARAMS, ParameterVector, Sample, SampleSet};
use crate::error::AppError;
use crate::math::{LeastSquaresProblem, LeastSquaresSolver, normal_matrix_inverse};
use crate::models::{fill_jacobian_row, predict};

/// The weighted quadratic problem over a borrowed sample slice.
pub struct QuadraticProblem<'a> {
    samples: &'a [Sample],
}

impl<'a> QuadraticProblem<'a> {
    /// Wrap `samples`, rejecting observations whose weight is undefined.
    pub fn new(samples: &'a [Sample]) -> Result<Self, AppError> {
        for (i, s) in samples.iter().enumerate() {
            if !s.err.is_finite() || s.err == 0.0 {
                return Err(AppError::Fit(format!(
                    "sample {i:02} has uncertainty {}; weight 1/err^2 is undefined",
                    s.err
                )));
            }
        }
        Ok(Self { samples })
    }
}

fn params_of(v: &DVector<f64>) -> ParameterVector {
    ParameterVector::new(v[0], v[1], v[2])
}

impl LeastSquaresProblem for QuadraticProblem<'_> {
    fn n_params(&self) -> usize {
        N_PARAMS
    }

    fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
        let p = params_of(params);
        DVector::from_iterator(
            self.samples.len(),
            self.samples.iter().map(|s| (s.y - predict(s.x, &p)) / s.err),
        )
    }

    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64> {
        let p = params_of(params);
        let mut jac = DMatrix::<f64>::zeros(self.samples.len(), N_PARAMS);
        let mut row = [0.0; N_PARAMS];
        for (i, s) in self.samples.iter().enumerate() {
            fill_jacobian_row(s.x, &p, &mut row);
            for (j, v) in row.iter().enumerate() {
                jac[(i, j)] = v / s.err;
            }
        }
        jac
    }
}

/// Fit the quadratic model to `samples` starting from `initial`.
pub fn fit_quadratic(
    samples: &SampleSet,
    initial: ParameterVector,
    solver: &dyn LeastSquaresSolver,
) -> Result<FitResult, AppError> {
    let n = samples.len();
    if n < N_PARAMS {
        return Err(AppError::Underdetermined {
            n_samples: n,
            n_params: N_PARAMS,
        });
    }

    let problem = QuadraticProblem::new(samples.as_slice())?;
    let init = DVector::from_row_slice(&initial.to_array());

    info!(n_samples = n, a = initial.a, b = initial.b, c = initial.c, "fitting quadratic");
    let out = solver.solve(&problem, &init)?;

    let params = params_of(&out.params);
    if !params.is_finite() {
        return Err(AppError::Fit("solver returned non-finite parameters".to_string()));
    }

    let unscaled = normal_matrix_inverse(&out.jacobian).ok_or_else(|| {
        AppError::Fit(
            "Jacobian is singular at the solution; parameters are not identifiable from these samples"
                .to_string(),
        )
    })?;

    let dof = n - N_PARAMS;
    let covariance = if dof > 0 {
        let s_sq = out.cost / dof as f64;
        Matrix3::from_fn(|i, j| unscaled[(i, j)] * s_sq)
    } else {
        // No residual variance to scale by; the reporter refuses dof == 0.
        Matrix3::from_element(f64::INFINITY)
    };

    debug!(
        iterations = out.iterations,
        evaluations = out.evaluations,
        chi2 = out.cost,
        "fit converged"
    );

    Ok(FitResult {
        params,
        covariance: CovarianceMatrix(covariance),
        weighted_chi2: out.cost,
        iterations: out.iterations,
        evaluations: out.evaluations,
        termination: out.termination,
    })
}
