//! The fit pipeline shared by the text and JSON front-ends.
//!
//! Loader -> Fitter -> Reporter. Printing and plotting stay in `app` so this
//! part can run without touching stdout or the output file.

use tracing::info;

use crate::domain::{FitConfig, FitReport, FitResult, N_PARAMS, SampleSet};
use crate::error::AppError;
use crate::fit::fit_quadratic;
use crate::io::load_samples;
use crate::math::LevenbergMarquardt;
use crate::report::{degrees_of_freedom, summarize};

/// All computed outputs of a single `wls fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub samples: SampleSet,
    pub fit: FitResult,
    pub report: FitReport,
}

/// Load, fit and summarize the configured input file.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let samples = load_samples(&config.input)?;
    run_fit_with_samples(config, samples)
}

/// Fit and summarize samples that are already in memory.
pub fn run_fit_with_samples(config: &FitConfig, samples: SampleSet) -> Result<RunOutput, AppError> {
    // Fewer samples than parameters is reported by the fitter; exactly as many
    // has no degrees of freedom and is refused before the solver runs.
    if samples.len() >= N_PARAMS {
        degrees_of_freedom(samples.len())?;
    }

    let solver = LevenbergMarquardt::new(config.solver);
    let fit = fit_quadratic(&samples, config.initial, &solver)?;
    let report = summarize(&samples, &fit)?;

    info!(
        dof = report.dof,
        reduced_chi2 = report.reduced_chi2,
        "fit summarized"
    );

    Ok(RunOutput {
        samples,
        fit,
        report,
    })
}
