//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - validates the input/output paths
//! - runs load, fit and summary
//! - prints the report
//! - renders the plot

use clap::Parser;
use tracing::info;

use crate::cli::{Command, FitArgs, SynthArgs};
use crate::domain::{FitConfig, ParameterVector, SolverConfig, SynthConfig};
use crate::error::AppError;
use crate::io::validate_paths;

pub mod pipeline;

/// Largest accepted plot resolution; bounds the bitmap allocation.
pub const MAX_RESOLUTION_DPI: f64 = 2400.0;

/// Entry point for the `wls` binary.
pub fn run() -> Result<(), AppError> {
    // `wls data.txt` keeps working as `wls fit data.txt`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    // Paths are checked before anything is read or computed.
    let format = validate_paths(&args.file, &args.output)?;
    let config = fit_config_from_args(&args)?;

    let run = pipeline::run_fit(&config)?;

    if config.json {
        println!("{}", crate::report::format_json(&run.fit, &run.report)?);
    } else {
        print!("{}", crate::report::format_samples(&run.samples));
        println!();
        print!("{}", crate::report::format_fit(&run.fit));
        println!();
        print!("{}", crate::report::format_report(&run.report));
    }

    if config.ascii_plot {
        let plot = crate::plot::render_ascii_plot(
            &run.samples,
            &run.fit.params,
            config.plot_width,
            config.plot_height,
        );
        println!();
        print!("{plot}");
    }

    crate::plot::render_plot(
        &config.output,
        format,
        config.resolution_dpi,
        &run.samples,
        &run.fit.params,
    )?;

    info!(output = %config.output.display(), "done");
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = synth_config_from_args(&args);
    let samples = crate::data::write_samples(&config)?;
    info!(n_samples = samples.len(), seed = ?config.seed, "synthetic data generated");
    Ok(())
}

/// Resolve `wls fit` flags into a run configuration.
pub fn fit_config_from_args(args: &FitArgs) -> Result<FitConfig, AppError> {
    if !(args.resolution.is_finite() && args.resolution > 0.0) {
        return Err(AppError::Config(format!(
            "resolution must be a positive number of DPI, got {}",
            args.resolution
        )));
    }
    if args.resolution > MAX_RESOLUTION_DPI {
        return Err(AppError::Config(format!(
            "resolution {} exceeds {MAX_RESOLUTION_DPI} DPI",
            args.resolution
        )));
    }

    let initial = ParameterVector::new(args.a, args.b, args.c);
    if !initial.is_finite() {
        return Err(AppError::Config("initial values must be finite".to_string()));
    }

    for (name, tol) in [("ftol", args.ftol), ("xtol", args.xtol), ("gtol", args.gtol)] {
        if !(tol.is_finite() && tol >= 0.0) {
            return Err(AppError::Config(format!(
                "{name} must be a non-negative number, got {tol}"
            )));
        }
    }
    if args.max_evals == Some(0) {
        return Err(AppError::Config("--max-evals must be > 0".to_string()));
    }

    Ok(FitConfig {
        input: args.file.clone(),
        output: args.output.clone(),
        resolution_dpi: args.resolution,
        initial,
        solver: SolverConfig {
            ftol: args.ftol,
            xtol: args.xtol,
            gtol: args.gtol,
            max_evaluations: args.max_evals,
            ..SolverConfig::default()
        },
        ascii_plot: args.ascii,
        plot_width: args.width,
        plot_height: args.height,
        json: args.json,
    })
}

pub fn synth_config_from_args(args: &SynthArgs) -> SynthConfig {
    SynthConfig {
        params: ParameterVector::new(args.a, args.b, args.c),
        count: args.count,
        x_min: args.x_min,
        x_max: args.x_max,
        err_min: args.err_min,
        err_max: args.err_max,
        seed: args.seed,
        output: args.output.clone(),
    }
}

/// Rewrite argv so the bare form `wls [OPTIONS] FILE` means `wls fit ...`.
///
/// Rules:
/// - `wls`                        -> unchanged (clap reports the missing subcommand)
/// - `wls --help/--version/help`  -> unchanged
/// - `wls fit|synth ...`          -> unchanged
/// - anything else                -> `wls fit ...`
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1) else {
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    let is_subcommand = matches!(arg1.as_str(), "fit" | "synth");
    if is_top_level_help_or_version || is_subcommand {
        return argv;
    }

    argv.insert(1, "fit".to_string());
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn fit_args(extra: &[&str]) -> FitArgs {
        let mut all = vec!["wls", "fit"];
        all.extend_from_slice(extra);
        all.push("data.txt");
        match crate::cli::Cli::parse_from(all).command {
            Command::Fit(args) => args,
            Command::Synth(_) => unreachable!(),
        }
    }

    #[test]
    fn bare_file_becomes_fit() {
        assert_eq!(rewrite_args(argv(&["wls", "data.txt"])), argv(&["wls", "fit", "data.txt"]));
        assert_eq!(
            rewrite_args(argv(&["wls", "-a", "2", "-o", "fit.pdf", "data.txt"])),
            argv(&["wls", "fit", "-a", "2", "-o", "fit.pdf", "data.txt"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for args in [
            &["wls"][..],
            &["wls", "--help"],
            &["wls", "-V"],
            &["wls", "fit", "data.txt"],
            &["wls", "synth", "-n", "5"],
        ] {
            assert_eq!(rewrite_args(argv(args)), argv(args));
        }
    }

    #[test]
    fn config_from_defaults() {
        let config = fit_config_from_args(&fit_args(&[])).unwrap();
        assert_eq!(config.input, PathBuf::from("data.txt"));
        assert_eq!(config.output, PathBuf::from("output.png"));
        assert_eq!(config.resolution_dpi, 225.0);
        assert_eq!(config.initial, ParameterVector::new(1.0, 1.0, 1.0));
        assert_eq!(config.solver, SolverConfig::default());
    }

    #[test]
    fn solver_flags_reach_the_config() {
        let config =
            fit_config_from_args(&fit_args(&["--max-evals", "50", "--ftol", "1e-10", "--gtol", "1e-6"]))
                .unwrap();
        assert_eq!(config.solver.max_evaluations, Some(50));
        assert_eq!(config.solver.ftol, 1e-10);
        assert_eq!(config.solver.gtol, 1e-6);
    }

    #[test]
    fn rejects_bad_resolution_and_tolerances() {
        for extra in [
            &["-r", "0"][..],
            &["-r", "-5"],
            &["-r", "NaN"],
            &["-r", "100000"],
            &["--ftol", "-1"],
            &["--gtol", "-1e-3"],
            &["--max-evals", "0"],
        ] {
            let err = fit_config_from_args(&fit_args(extra)).unwrap_err();
            assert!(matches!(err, AppError::Config(_)), "{extra:?}");
            assert_eq!(err.exit_code(), 2);
        }
    }
}
