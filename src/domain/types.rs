//! Shared domain types.
//!
//! These types are intentionally small and copyable where possible: a run
//! creates each of them once and only reads them afterwards.

use std::path::PathBuf;

use nalgebra::Matrix3;
use serde::Serialize;

/// Number of free parameters in `y = a(x-b)^2 + c`.
pub const N_PARAMS: usize = 3;

/// Parameter names, in vector order.
pub const PARAM_NAMES: [&str; N_PARAMS] = ["a", "b", "c"];

/// One observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    /// Standard deviation of `y`; the fit weight is `1 / err^2`.
    pub err: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, err: f64) -> Self {
        Self { x, y, err }
    }
}

/// Observations in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet(Vec<Sample>);

impl SampleSet {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self(samples)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.0
    }

    /// Minimum and maximum `x`, or `None` for an empty set.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        let first = self.0.first()?;
        let init = (first.x, first.x);
        Some(
            self.0
                .iter()
                .fold(init, |(lo, hi), s| (lo.min(s.x), hi.max(s.x))),
        )
    }
}

impl From<Vec<Sample>> for SampleSet {
    fn from(samples: Vec<Sample>) -> Self {
        Self(samples)
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Parameters `(a, b, c)` of the quadratic model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterVector {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl ParameterVector {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub fn to_array(self) -> [f64; N_PARAMS] {
        [self.a, self.b, self.c]
    }

    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [a, b, c] => Some(Self::new(*a, *b, *c)),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite()
    }
}

impl Default for ParameterVector {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

/// Parameter covariance estimated by the fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CovarianceMatrix(pub Matrix3<f64>);

impl CovarianceMatrix {
    pub fn variances(&self) -> [f64; N_PARAMS] {
        let d = self.0.diagonal();
        [d[0], d[1], d[2]]
    }

    pub fn rows(&self) -> [[f64; N_PARAMS]; N_PARAMS] {
        let m = &self.0;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Relative reduction of the cost fell below `ftol`.
    CostTolerance,
    /// Relative step size fell below `xtol`.
    StepTolerance,
    /// Gradient norm fell below `gtol`.
    GradientTolerance,
    /// Residuals are exactly zero.
    ExactFit,
}

impl Termination {
    pub fn describe(self) -> &'static str {
        match self {
            Termination::CostTolerance => "relative reduction in chi-squared below ftol",
            Termination::StepTolerance => "relative parameter step below xtol",
            Termination::GradientTolerance => "gradient below gtol",
            Termination::ExactFit => "residuals vanished",
        }
    }
}

/// Output of the fitter; the only thing the reporter needs from it.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub params: ParameterVector,
    pub covariance: CovarianceMatrix,
    /// Weighted residual sum of squares at the solution.
    pub weighted_chi2: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub termination: Termination,
}

/// One row of the parameter table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterEstimate {
    pub name: &'static str,
    pub value: f64,
    pub uncertainty: f64,
    /// `uncertainty / value * 100`; `None` when the value is exactly zero.
    pub percent: Option<f64>,
}

/// Derived fit statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitReport {
    pub n_samples: usize,
    pub dof: usize,
    /// `Σ (y - f(x))^2 / dof`.
    pub reduced_chi2: f64,
    /// `Σ ((y - f(x)) / err)^2 / dof`.
    pub weighted_reduced_chi2: f64,
    pub parameters: [ParameterEstimate; N_PARAMS],
}

/// Image format of the plot, from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Eps,
    Pdf,
    Png,
    Ps,
}

impl OutputFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "eps" => Some(OutputFormat::Eps),
            "pdf" => Some(OutputFormat::Pdf),
            "png" => Some(OutputFormat::Png),
            "ps" => Some(OutputFormat::Ps),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Eps => "eps",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Png => "png",
            OutputFormat::Ps => "ps",
        }
    }
}

/// Levenberg–Marquardt settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Relative tolerance on the reduction of the cost.
    pub ftol: f64,
    /// Relative tolerance on the parameter step.
    pub xtol: f64,
    /// Tolerance on the scaled gradient (0 disables the test).
    pub gtol: f64,
    /// Maximum residual evaluations; `None` means `200 * (n_params + 1)`.
    pub max_evaluations: Option<usize>,
    /// Initial damping, relative to the diagonal of `JᵀJ`.
    pub initial_damping: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 0.0,
            max_evaluations: None,
            initial_damping: 1e-3,
        }
    }
}

/// A `wls fit` run as understood by the pipeline.
///
/// Derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub resolution_dpi: f64,
    pub initial: ParameterVector,
    pub solver: SolverConfig,
    /// Print an ASCII preview of the plot to stdout.
    pub ascii_plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    /// Print the report as JSON instead of text.
    pub json: bool,
}

/// A `wls synth` run.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub params: ParameterVector,
    pub count: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub err_min: f64,
    pub err_max: f64,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_range_tracks_extremes() {
        let set = SampleSet::new(vec![
            Sample::new(3.0, 0.0, 1.0),
            Sample::new(-1.5, 0.0, 1.0),
            Sample::new(7.25, 0.0, 1.0),
        ]);
        assert_eq!(set.x_range(), Some((-1.5, 7.25)));
        assert_eq!(SampleSet::default().x_range(), None);
    }

    #[test]
    fn output_format_whitelist() {
        for ext in ["eps", "pdf", "png", "ps"] {
            let fmt = OutputFormat::from_extension(ext).unwrap();
            assert_eq!(fmt.extension(), ext);
        }
        assert_eq!(OutputFormat::from_extension("jpg"), None);
        assert_eq!(OutputFormat::from_extension("PNG"), None);
    }

    #[test]
    fn parameter_vector_slice_round_trip() {
        let p = ParameterVector::from_slice(&[2.0, -1.0, 0.5]).unwrap();
        assert_eq!(p.to_array(), [2.0, -1.0, 0.5]);
        assert!(ParameterVector::from_slice(&[1.0, 2.0]).is_none());
    }
}
