//! Levenberg–Marquardt nonlinear least squares.
//!
//! The fitter only talks to the [`LeastSquaresSolver`] trait; any solver that
//! returns the minimizing parameters together with the Jacobian at the solution
//! can stand in for [`LevenbergMarquardt`].
//!
//! Conventions:
//! - residuals are `observed - model`, already divided by the per-point sigma
//! - the Jacobian is that of the (weighted) *model*, so a Gauss–Newton step
//!   solves `J δ ≈ r`
//!
//! Each step solves the damped problem as an augmented linear least-squares
//! system
//!
//! ```text
//! | J       |       | r |
//! | √λ · D  | δ  ≈  | 0 |
//! ```
//!
//! with `D = diag(‖J_k‖)` (Marquardt scaling). Accepted steps shrink `λ` by 10,
//! rejected steps grow it by 10. Stopping rules and defaults follow MINPACK's
//! `lmder` as used by SciPy's `curve_fit`.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::{SolverConfig, Termination};
use crate::error::AppError;
use crate::math::solve_least_squares;

/// A weighted nonlinear least-squares problem.
pub trait LeastSquaresProblem {
    fn n_params(&self) -> usize;

    /// Weighted residuals `(y_i - f(x_i; p)) / σ_i`.
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;

    /// Jacobian of the weighted model `f(x_i; p) / σ_i` with respect to `p`
    /// (one row per residual).
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;
}

/// Result of a successful solve.
#[derive(Debug, Clone)]
pub struct SolverOutput {
    pub params: DVector<f64>,
    /// Weighted Jacobian evaluated at `params`.
    pub jacobian: DMatrix<f64>,
    /// `‖r‖²` at `params`.
    pub cost: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub termination: Termination,
}

/// Capability: minimize `‖r(p)‖²` from an initial guess.
pub trait LeastSquaresSolver {
    fn solve(
        &self,
        problem: &dyn LeastSquaresProblem,
        initial: &DVector<f64>,
    ) -> Result<SolverOutput, AppError>;
}

/// Damping never grows past this before we declare the step search stuck.
const MAX_DAMPING: f64 = 1e32;

/// Levenberg–Marquardt with Marquardt diagonal scaling.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    pub config: SolverConfig,
}

impl LevenbergMarquardt {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    fn max_evaluations(&self, n_params: usize) -> usize {
        self.config
            .max_evaluations
            .unwrap_or(200 * (n_params + 1))
            .max(1)
    }
}

impl LeastSquaresSolver for LevenbergMarquardt {
    fn solve(
        &self,
        problem: &dyn LeastSquaresProblem,
        initial: &DVector<f64>,
    ) -> Result<SolverOutput, AppError> {
        let m = problem.n_params();
        if initial.len() != m {
            return Err(AppError::Fit(format!(
                "initial guess has {} values, problem has {m} parameters",
                initial.len()
            )));
        }
        if initial.iter().any(|v| !v.is_finite()) {
            return Err(AppError::Fit("initial guess is not finite".to_string()));
        }

        let cfg = &self.config;
        let max_evals = self.max_evaluations(m);

        let mut p = initial.clone();
        let mut r = problem.residuals(&p);
        let mut evaluations = 1usize;
        let mut cost = r.norm_squared();
        if !cost.is_finite() {
            return Err(AppError::Fit(
                "residuals are not finite at the initial guess".to_string(),
            ));
        }
        let mut jac = problem.jacobian(&p);

        let finish = |p: DVector<f64>,
                      jacobian: DMatrix<f64>,
                      cost: f64,
                      iterations: usize,
                      evaluations: usize,
                      termination: Termination|
         -> Result<SolverOutput, AppError> {
            debug!(
                iterations,
                evaluations,
                cost,
                reason = termination.describe(),
                "levenberg-marquardt finished"
            );
            Ok(SolverOutput {
                params: p,
                jacobian,
                cost,
                iterations,
                evaluations,
                termination,
            })
        };

        if cost == 0.0 {
            return finish(p, jac, cost, 0, evaluations, Termination::ExactFit);
        }

        // Dimensionless: the damping term is `λ · diag(JᵀJ)`.
        let mut lambda = cfg.initial_damping.max(f64::MIN_POSITIVE);

        let mut iterations = 0usize;
        loop {
            iterations += 1;
            let scale = column_norms(&jac);

            if cfg.gtol > 0.0 {
                let gradient = jac.transpose() * &r;
                let r_norm = cost.sqrt();
                let gnorm = gradient
                    .iter()
                    .zip(scale.iter())
                    .filter(|(_, s)| **s > 0.0)
                    .map(|(g, s)| (g / (s * r_norm)).abs())
                    .fold(0.0_f64, f64::max);
                if gnorm <= cfg.gtol {
                    return finish(
                        p,
                        jac,
                        cost,
                        iterations,
                        evaluations,
                        Termination::GradientTolerance,
                    );
                }
            }

            // Inner loop: raise damping until a step reduces the cost.
            loop {
                let step = damped_step(&jac, &r, &scale, lambda).ok_or_else(|| {
                    AppError::Fit("damped normal equations are singular".to_string())
                })?;
                let step_small = step.norm() <= cfg.xtol * (p.norm() + cfg.xtol);

                if evaluations >= max_evals {
                    return Err(AppError::Fit(format!(
                        "number of function evaluations reached {max_evals} without convergence"
                    )));
                }
                let p_trial = &p + &step;
                let r_trial = problem.residuals(&p_trial);
                evaluations += 1;
                let cost_trial = r_trial.norm_squared();

                if cost_trial.is_finite() && cost_trial < cost {
                    let reduction = (cost - cost_trial) / cost;
                    p = p_trial;
                    r = r_trial;
                    cost = cost_trial;
                    jac = problem.jacobian(&p);
                    lambda = (lambda / 10.0).max(f64::MIN_POSITIVE);

                    debug!(iterations, evaluations, cost, lambda, "accepted step");

                    if cost == 0.0 {
                        return finish(p, jac, cost, iterations, evaluations, Termination::ExactFit);
                    }
                    if reduction <= cfg.ftol {
                        return finish(
                            p,
                            jac,
                            cost,
                            iterations,
                            evaluations,
                            Termination::CostTolerance,
                        );
                    }
                    if step_small {
                        return finish(
                            p,
                            jac,
                            cost,
                            iterations,
                            evaluations,
                            Termination::StepTolerance,
                        );
                    }
                    break;
                }

                // Rejected. A vanishing step means no nearby point does better.
                if step_small {
                    return finish(p, jac, cost, iterations, evaluations, Termination::StepTolerance);
                }
                lambda *= 10.0;
                if lambda > MAX_DAMPING {
                    return Err(AppError::Fit(
                        "damping diverged without reducing chi-squared".to_string(),
                    ));
                }
            }
        }
    }
}

/// Euclidean norm of each Jacobian column.
fn column_norms(jac: &DMatrix<f64>) -> Vec<f64> {
    jac.column_iter().map(|c| c.norm()).collect()
}

/// Solve the augmented system for one damped step.
fn damped_step(
    jac: &DMatrix<f64>,
    r: &DVector<f64>,
    scale: &[f64],
    lambda: f64,
) -> Option<DVector<f64>> {
    let n = jac.nrows();
    let m = jac.ncols();
    let sqrt_lambda = lambda.sqrt();

    let mut a = DMatrix::<f64>::zeros(n + m, m);
    a.view_mut((0, 0), (n, m)).copy_from(jac);
    for k in 0..m {
        // Columns with zero norm still need damping to keep the system regular.
        let d = if scale[k] > 0.0 { scale[k] } else { 1.0 };
        a[(n + k, k)] = sqrt_lambda * d;
    }

    let mut rhs = DVector::<f64>::zeros(n + m);
    rhs.rows_mut(0, n).copy_from(r);

    solve_least_squares(&a, &rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Straight line `y = p0 + p1 x`, unit weights.
    struct Line {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for Line {
        fn n_params(&self) -> usize {
            2
        }

        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_iterator(
                self.x.len(),
                self.x.iter().zip(&self.y).map(|(x, y)| y - (p[0] + p[1] * x)),
            )
        }

        fn jacobian(&self, _p: &DVector<f64>) -> DMatrix<f64> {
            let mut j = DMatrix::zeros(self.x.len(), 2);
            for (i, x) in self.x.iter().enumerate() {
                j[(i, 0)] = 1.0;
                j[(i, 1)] = *x;
            }
            j
        }
    }

    /// Rosenbrock written as residuals `[10(x2 - x1²), 1 - x1]`.
    struct Rosenbrock;

    impl LeastSquaresProblem for Rosenbrock {
        fn n_params(&self) -> usize {
            2
        }

        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_row_slice(&[10.0 * (p[1] - p[0] * p[0]), 1.0 - p[0]])
        }

        fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
            // Model is [10(x1² - x2), x1] against targets [0, 1].
            DMatrix::from_row_slice(2, 2, &[20.0 * p[0], -10.0, 1.0, 0.0])
        }
    }

    #[test]
    fn linear_problem_matches_ordinary_least_squares() {
        let problem = Line {
            x: vec![0.0, 1.0, 2.0, 3.0],
            y: vec![1.1, 2.9, 5.2, 6.8],
        };
        let out = LevenbergMarquardt::default()
            .solve(&problem, &DVector::from_row_slice(&[0.0, 0.0]))
            .unwrap();

        // Closed form: slope = Sxy / Sxx = 9.7 / 5, intercept = ȳ - slope·x̄.
        assert!((out.params[1] - 1.94).abs() < 1e-5, "slope {}", out.params[1]);
        assert!((out.params[0] - 1.09).abs() < 1e-5, "intercept {}", out.params[0]);
        assert!(out.cost > 0.0);
    }

    #[test]
    fn rosenbrock_converges_from_classic_start() {
        let out = LevenbergMarquardt::default()
            .solve(&Rosenbrock, &DVector::from_row_slice(&[-1.2, 1.0]))
            .unwrap();
        assert!((out.params[0] - 1.0).abs() < 1e-6, "x1 {}", out.params[0]);
        assert!((out.params[1] - 1.0).abs() < 1e-6, "x2 {}", out.params[1]);
    }

    #[test]
    fn exact_start_finishes_immediately() {
        let out = LevenbergMarquardt::default()
            .solve(&Rosenbrock, &DVector::from_row_slice(&[1.0, 1.0]))
            .unwrap();
        assert_eq!(out.termination, Termination::ExactFit);
        assert_eq!(out.evaluations, 1);
    }

    #[test]
    fn gradient_tolerance_stops_before_any_step() {
        // The scaled gradient is a cosine, so gtol = 1 is met at the start.
        let solver = LevenbergMarquardt::new(SolverConfig {
            gtol: 1.0,
            ..SolverConfig::default()
        });
        let start = DVector::from_row_slice(&[-1.2, 1.0]);
        let out = solver.solve(&Rosenbrock, &start).unwrap();
        assert_eq!(out.termination, Termination::GradientTolerance);
        assert_eq!(out.params, start);
        assert_eq!(out.evaluations, 1);
    }

    #[test]
    fn small_gradient_tolerance_still_converges() {
        let solver = LevenbergMarquardt::new(SolverConfig {
            gtol: 1e-10,
            ..SolverConfig::default()
        });
        let out = solver
            .solve(&Rosenbrock, &DVector::from_row_slice(&[-1.2, 1.0]))
            .unwrap();
        assert!((out.params[0] - 1.0).abs() < 1e-6, "x1 {}", out.params[0]);
    }

    #[test]
    fn evaluation_budget_is_enforced() {
        let solver = LevenbergMarquardt::new(SolverConfig {
            max_evaluations: Some(2),
            ..SolverConfig::default()
        });
        let err = solver
            .solve(&Rosenbrock, &DVector::from_row_slice(&[-1.2, 1.0]))
            .unwrap_err();
        assert!(matches!(err, AppError::Fit(_)), "{err:?}");
    }

    #[test]
    fn wrong_initial_length_is_rejected() {
        let err = LevenbergMarquardt::default()
            .solve(&Rosenbrock, &DVector::from_row_slice(&[1.0]))
            .unwrap_err();
        assert!(matches!(err, AppError::Fit(_)));
    }
}
