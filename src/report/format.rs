//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting and statistics code stays clean and testable
//! - output changes are localized

use serde::Serialize;

use crate::domain::{FitReport, FitResult, N_PARAMS, ParameterEstimate, ParameterVector, SampleSet, Termination};
use crate::error::AppError;

/// Indexed listing of the loaded samples.
pub fn format_samples(samples: &SampleSet) -> String {
    let mut out = String::new();
    for (i, s) in samples.iter().enumerate() {
        out.push_str(&format!(
            "(x_{i:02}, y_{i:02}, err_{i:02}) = ({:8.3}, {:8.3}, {:8.3})\n",
            s.x, s.y, s.err
        ));
    }
    out
}

/// Raw solver output: fitted vector and covariance matrix.
pub fn format_fit(fit: &FitResult) -> String {
    let mut out = String::new();
    out.push_str("popt:\n");
    out.push_str(&fmt_vec(&fit.params.to_array()));
    out.push('\n');
    out.push_str("pcov:\n");
    let rows = fit.covariance.rows();
    for (i, row) in rows.iter().enumerate() {
        let open = if i == 0 { "[" } else { " " };
        let close = if i + 1 == N_PARAMS { "]" } else { "" };
        out.push_str(&format!("{open}{}{close}\n", fmt_vec(row)));
    }
    out.push_str(&format!(
        "solver: {} iteration(s), {} evaluation(s), {}\n",
        fit.iterations,
        fit.evaluations,
        fit.termination.describe()
    ));
    out
}

/// Degrees of freedom, chi-squared and the parameter table.
pub fn format_report(report: &FitReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("dof = {}\n", report.dof));
    out.push_str(&format!("reduced chi-squared = {:.3}\n", report.reduced_chi2));
    out.push_str(&format!(
        "weighted reduced chi-squared = {:.3}\n",
        report.weighted_reduced_chi2
    ));
    for p in &report.parameters {
        out.push_str(&format_parameter(p));
        out.push('\n');
    }
    out
}

fn format_parameter(p: &ParameterEstimate) -> String {
    let percent = match p.percent {
        Some(v) => format!("{v:8.3}%"),
        None => format!("{:>8}", "n/a"),
    };
    format!(
        "{} = {:8.3} +/- {:8.3} ({percent})",
        p.name, p.value, p.uncertainty
    )
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    params: ParameterVector,
    covariance: [[f64; N_PARAMS]; N_PARAMS],
    iterations: usize,
    evaluations: usize,
    termination: Termination,
    report: &'a FitReport,
}

/// Machine-readable report.
pub fn format_json(fit: &FitResult, report: &FitReport) -> Result<String, AppError> {
    let out = JsonOutput {
        params: fit.params,
        covariance: fit.covariance.rows(),
        iterations: fit.iterations,
        evaluations: fit.evaluations,
        termination: fit.termination,
        report,
    };
    serde_json::to_string_pretty(&out)
        .map_err(|e| AppError::Render(format!("failed to serialize report: {e}")))
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:>14.6e}")).collect();
    format!("[{}]", parts.join(" "))
}
