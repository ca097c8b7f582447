//! Fit statistics: degrees of freedom, reduced chi-squared, parameter
//! uncertainties.

pub mod format;

pub use format::*;

use crate::domain::{
    FitReport, FitResult, N_PARAMS, PARAM_NAMES, ParameterEstimate, SampleSet,
};
use crate::error::AppError;
use crate::models::predict;

/// Observed minus fitted value for each sample, in sample order.
pub fn compute_residuals(samples: &SampleSet, fit: &FitResult) -> Vec<f64> {
    samples
        .iter()
        .map(|s| s.y - predict(s.x, &fit.params))
        .collect()
}

/// `n_samples - 3`, or `DegenerateFit` when that is not positive.
pub fn degrees_of_freedom(n_samples: usize) -> Result<usize, AppError> {
    match n_samples.checked_sub(N_PARAMS) {
        Some(dof) if dof > 0 => Ok(dof),
        _ => Err(AppError::DegenerateFit {
            n_samples,
            n_params: N_PARAMS,
        }),
    }
}

/// Summarize a fit.
///
/// Fails with `DegenerateFit` when there are not more samples than parameters,
/// since reduced chi-squared is undefined there.
pub fn summarize(samples: &SampleSet, fit: &FitResult) -> Result<FitReport, AppError> {
    let n = samples.len();
    let dof = degrees_of_freedom(n)?;

    let residuals = compute_residuals(samples, fit);
    let sum_sq: f64 = residuals.iter().map(|r| r * r).sum();
    let weighted_sum_sq: f64 = residuals
        .iter()
        .zip(samples.iter())
        .map(|(r, s)| (r / s.err).powi(2))
        .sum();

    let values = fit.params.to_array();
    let variances = fit.covariance.variances();
    let parameters: [ParameterEstimate; N_PARAMS] = std::array::from_fn(|i| {
        let value = values[i];
        let uncertainty = variances[i].sqrt();
        ParameterEstimate {
            name: PARAM_NAMES[i],
            value,
            uncertainty,
            percent: percent_error(uncertainty, value),
        }
    });

    Ok(FitReport {
        n_samples: n,
        dof,
        reduced_chi2: sum_sq / dof as f64,
        weighted_reduced_chi2: weighted_sum_sq / dof as f64,
        parameters,
    })
}

/// `uncertainty / value * 100`, or `None` for a zero value.
pub fn percent_error(uncertainty: f64, value: f64) -> Option<f64> {
    if value == 0.0 {
        None
    } else {
        Some(uncertainty / value * 100.0)
    }
}
