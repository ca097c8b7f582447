//! Command-line parsing for the weighted least-squares fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting and plotting code; `app` turns parsed arguments into configs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "wls",
    version,
    about = "Weighted least-squares fit of y = a(x-b)^2 + c"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a data file, print the report and write the plot.
    ///
    /// `wls FILE ...` is shorthand for `wls fit FILE ...`.
    Fit(FitArgs),
    /// Generate synthetic `x y err` data around a known quadratic.
    Synth(SynthArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Initial value of a for y=a(x-b)^2+c.
    #[arg(short = 'a', default_value_t = 1.0, allow_negative_numbers = true)]
    pub a: f64,

    /// Initial value of b for y=a(x-b)^2+c.
    #[arg(short = 'b', default_value_t = 1.0, allow_negative_numbers = true)]
    pub b: f64,

    /// Initial value of c for y=a(x-b)^2+c.
    #[arg(short = 'c', default_value_t = 1.0, allow_negative_numbers = true)]
    pub c: f64,

    /// Output file name (eps, pdf, png or ps).
    #[arg(short = 'o', long, default_value = "output.png")]
    pub output: PathBuf,

    /// Resolution of the plot in DPI.
    #[arg(short = 'r', long, default_value_t = 225.0, allow_negative_numbers = true)]
    pub resolution: f64,

    /// Also print an ASCII preview of the plot.
    #[arg(long)]
    pub ascii: bool,

    /// ASCII preview width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// ASCII preview height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Print the fit and report as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Maximum number of residual evaluations (default: 200 * (3 + 1)).
    #[arg(long)]
    pub max_evals: Option<usize>,

    /// Relative tolerance on the cost reduction.
    #[arg(long, default_value_t = 1.49012e-8, allow_negative_numbers = true)]
    pub ftol: f64,

    /// Relative tolerance on the parameter step.
    #[arg(long, default_value_t = 1.49012e-8, allow_negative_numbers = true)]
    pub xtol: f64,

    /// Tolerance on the scaled gradient (0 disables the test).
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub gtol: f64,

    /// Input data file: one `x y err` sample per line.
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// True value of a.
    #[arg(short = 'a', default_value_t = 2.0, allow_negative_numbers = true)]
    pub a: f64,

    /// True value of b.
    #[arg(short = 'b', default_value_t = 1.0, allow_negative_numbers = true)]
    pub b: f64,

    /// True value of c.
    #[arg(short = 'c', default_value_t = 4.0, allow_negative_numbers = true)]
    pub c: f64,

    /// Number of samples.
    #[arg(short = 'n', long, default_value_t = 20)]
    pub count: usize,

    #[arg(long, default_value_t = -5.0, allow_negative_numbers = true)]
    pub x_min: f64,

    #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
    pub x_max: f64,

    /// Smallest per-sample standard deviation.
    #[arg(long, default_value_t = 0.5)]
    pub err_min: f64,

    /// Largest per-sample standard deviation.
    #[arg(long, default_value_t = 2.0)]
    pub err_max: f64,

    /// Random seed (omit for a fresh draw).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output file (default: stdout). Never overwritten.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_defaults() {
        let cli = Cli::try_parse_from(["wls", "fit", "data.txt"]).unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!((args.a, args.b, args.c), (1.0, 1.0, 1.0));
        assert_eq!(args.output, PathBuf::from("output.png"));
        assert_eq!(args.resolution, 225.0);
        assert_eq!(args.file, PathBuf::from("data.txt"));
        assert!(!args.ascii && !args.json);
        assert_eq!(args.max_evals, None);
        assert_eq!(args.gtol, 0.0);
    }

    #[test]
    fn fit_accepts_negative_initial_values() {
        let cli = Cli::try_parse_from([
            "wls", "fit", "-a", "-2.5", "-b", "3", "-c", "-1e-3", "-o", "fit.pdf", "-r", "72",
            "data.txt",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!((args.a, args.b, args.c), (-2.5, 3.0, -1e-3));
        assert_eq!(args.output, PathBuf::from("fit.pdf"));
        assert_eq!(args.resolution, 72.0);
    }

    #[test]
    fn fit_requires_a_file() {
        assert!(Cli::try_parse_from(["wls", "fit"]).is_err());
    }

    #[test]
    fn synth_options() {
        let cli = Cli::try_parse_from([
            "wls", "synth", "-n", "7", "--x-min", "-1", "--x-max", "2", "--seed", "9",
        ])
        .unwrap();
        let Command::Synth(args) = cli.command else {
            panic!("expected synth");
        };
        assert_eq!(args.count, 7);
        assert_eq!((args.x_min, args.x_max), (-1.0, 2.0));
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.output, None);
    }
}
