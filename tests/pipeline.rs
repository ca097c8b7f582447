use std::fs;
use std::path::{Path, PathBuf};

use wls_fit::app::pipeline::run_fit;
use wls_fit::data::write_samples;
use wls_fit::domain::{FitConfig, OutputFormat, ParameterVector, SolverConfig, SynthConfig};
use wls_fit::error::AppError;
use wls_fit::io::validate_paths;
use wls_fit::plot::render_plot;
use wls_fit::report::{format_json, format_report};

fn write_input(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn config(input: PathBuf, output: PathBuf) -> FitConfig {
    FitConfig {
        input,
        output,
        resolution_dpi: 72.0,
        initial: ParameterVector::new(1.0, 1.0, 1.0),
        solver: SolverConfig::default(),
        ascii_plot: false,
        plot_width: 60,
        plot_height: 15,
        json: false,
    }
}

#[test]
fn five_point_example_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "data.txt", "1 5 1\n2 3 1\n3 5 1\n4 11 1\n5 21 1\n");
    let output = dir.path().join("fit.pdf");

    let format = validate_paths(&input, &output).unwrap();
    assert_eq!(format, OutputFormat::Pdf);

    let cfg = config(input, output.clone());
    let run = run_fit(&cfg).unwrap();
    let p = run.fit.params;
    assert!((p.a - 2.0).abs() < 1e-6, "{p:?}");
    assert!((p.b - 2.0).abs() < 1e-6, "{p:?}");
    assert!((p.c - 3.0).abs() < 1e-6, "{p:?}");
    assert_eq!(run.report.dof, 2);

    let text = format_report(&run.report);
    assert!(text.contains("dof = 2\n"));
    assert!(text.contains("reduced chi-squared = 0.000\n"));
    assert!(text.contains("a =    2.000 +/-"));

    let json: serde_json::Value =
        serde_json::from_str(&format_json(&run.fit, &run.report).unwrap()).unwrap();
    assert_eq!(json["report"]["n_samples"], 5);

    render_plot(&output, format, cfg.resolution_dpi, &run.samples, &p).unwrap();
    assert!(fs::read(&output).unwrap().starts_with(b"%PDF-1.4"));
}

#[test]
fn empty_file_is_underdetermined() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "empty.txt", "");
    let err = run_fit(&config(input, dir.path().join("out.png"))).unwrap_err();
    assert!(matches!(err, AppError::Underdetermined { n_samples: 0, .. }));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn three_samples_have_no_degrees_of_freedom() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "three.txt", "0 1 1\n1 2 1\n2 5 1\n");
    let err = run_fit(&config(input, dir.path().join("out.png"))).unwrap_err();
    assert!(matches!(err, AppError::DegenerateFit { n_samples: 3, .. }));

    let collinear = write_input(dir.path(), "line.txt", "0 0 1\n1 1 1\n2 2 1\n");
    let err = run_fit(&config(collinear, dir.path().join("out.png"))).unwrap_err();
    assert!(matches!(err, AppError::DegenerateFit { n_samples: 3, .. }), "{err:?}");
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn malformed_token_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "bad.txt", "1 5 1\n2 abc 1\n3 5 1\n4 11 1\n");
    let err = run_fit(&config(input, dir.path().join("out.png"))).unwrap_err();
    match err {
        AppError::Parse { line, token } => {
            assert_eq!(line, 2);
            assert_eq!(token, "abc");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn path_checks_run_before_loading() {
    let dir = tempfile::tempdir().unwrap();
    // Unparseable input, but the output already exists: the run is a no-op.
    let input = write_input(dir.path(), "bad.txt", "not numbers\n");
    let output = write_input(dir.path(), "output.png", "");
    let err = validate_paths(&input, &output).unwrap_err();
    assert!(err.is_noop());
    assert!(fs::read(&output).unwrap().is_empty());
}

#[test]
fn synthetic_data_fits_back() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("synth.txt");
    let truth = ParameterVector::new(2.0, 1.0, 4.0);
    write_samples(&SynthConfig {
        params: truth,
        count: 40,
        x_min: -4.0,
        x_max: 6.0,
        err_min: 0.05,
        err_max: 0.1,
        seed: Some(2024),
        output: Some(data.clone()),
    })
    .unwrap();

    let run = run_fit(&config(data, dir.path().join("synth.eps"))).unwrap();
    let p = run.fit.params;
    let [ua, ub, uc] = run.report.parameters.map(|e| e.uncertainty);
    // Small noise: estimates land within a few standard errors of the truth.
    assert!((p.a - truth.a).abs() < 5.0 * ua + 1e-3, "{p:?}");
    assert!((p.b - truth.b).abs() < 5.0 * ub + 1e-3, "{p:?}");
    assert!((p.c - truth.c).abs() < 5.0 * uc + 1e-3, "{p:?}");
    assert_eq!(run.report.dof, 37);
}
