//! Synthetic sample generation.
//!
//! Produces `(x, y, err)` triples around a known quadratic so the fitter can be
//! exercised end to end:
//!
//! - `x` evenly spaced over `[x_min, x_max]`
//! - `err ~ Uniform(err_min, err_max)`
//! - `y = a(x-b)^2 + c + N(0, err)`

use std::fs::File;
use std::io::{BufWriter, Write};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::info;

use crate::domain::{Sample, SampleSet, SynthConfig};
use crate::error::AppError;
use crate::io::ensure_output_absent;
use crate::models::predict;

pub fn generate_samples(config: &SynthConfig) -> Result<SampleSet, AppError> {
    validate(config)?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let n = config.count;
    let mut samples = Vec::with_capacity(n);
    for i in 0..n {
        let x = if n == 1 {
            config.x_min
        } else {
            let u = i as f64 / (n as f64 - 1.0);
            config.x_min + u * (config.x_max - config.x_min)
        };

        let err = if config.err_max > config.err_min {
            rng.gen_range(config.err_min..config.err_max)
        } else {
            config.err_min
        };
        let noise = Normal::new(0.0, err)
            .map_err(|e| AppError::Config(format!("noise distribution error: {e}")))?;

        let y = predict(x, &config.params) + noise.sample(&mut rng);
        samples.push(Sample::new(x, y, err));
    }

    Ok(SampleSet::new(samples))
}

fn validate(config: &SynthConfig) -> Result<(), AppError> {
    if config.count == 0 {
        return Err(AppError::Config("sample count must be > 0".to_string()));
    }
    if !(config.x_min.is_finite() && config.x_max.is_finite() && config.x_max >= config.x_min) {
        return Err(AppError::Config(format!(
            "invalid x range [{}, {}]",
            config.x_min, config.x_max
        )));
    }
    if !(config.err_min.is_finite()
        && config.err_max.is_finite()
        && config.err_min > 0.0
        && config.err_max >= config.err_min)
    {
        return Err(AppError::Config(format!(
            "invalid error range [{}, {}] (must satisfy 0 < min <= max)",
            config.err_min, config.err_max
        )));
    }
    if !config.params.is_finite() {
        return Err(AppError::Config("model parameters must be finite".to_string()));
    }
    Ok(())
}

/// Render samples in the loader's `x y err` line format.
pub fn format_sample_lines(samples: &SampleSet) -> String {
    let mut out = String::new();
    for s in samples {
        out.push_str(&format!("{:.6} {:.6} {:.6}\n", s.x, s.y, s.err));
    }
    out
}

/// Generate samples and write them to the configured file, or stdout.
pub fn write_samples(config: &SynthConfig) -> Result<SampleSet, AppError> {
    if let Some(path) = &config.output {
        ensure_output_absent(path)?;
    }

    let samples = generate_samples(config)?;
    let text = format_sample_lines(&samples);

    match &config.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                AppError::io(format!("failed to create \"{}\"", path.display()), e)
            })?;
            let mut writer = BufWriter::new(file);
            writer
                .write_all(text.as_bytes())
                .and_then(|_| writer.flush())
                .map_err(|e| AppError::io(format!("failed to write \"{}\"", path.display()), e))?;
            info!(path = %path.display(), n_samples = samples.len(), "wrote synthetic samples");
        }
        None => print!("{text}"),
    }

    Ok(samples)
}
