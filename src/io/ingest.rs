//! Sample file ingest.
//!
//! The input format is plain text, one observation per line:
//!
//! ```text
//! x y err
//! ```
//!
//! Design goals:
//! - **Total rejection**: one bad token fails the whole load; there are no
//!   partial sample sets
//! - **Clear errors**: parse failures name the 1-based line and the token
//! - **Separation of concerns**: no fitting logic here

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::domain::{Sample, SampleSet};
use crate::error::AppError;

/// Load samples from `path`.
///
/// The file handle is scoped to this call and dropped on every return path.
pub fn load_samples(path: &Path) -> Result<SampleSet, AppError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            AppError::io(format!("failed to open \"{}\"", path.display()), e)
        }
    })?;

    let samples = parse_samples(BufReader::new(file))?;
    info!(path = %path.display(), n_samples = samples.len(), "loaded samples");
    Ok(samples)
}

/// Parse samples from any buffered reader.
pub fn parse_samples<R: BufRead>(reader: R) -> Result<SampleSet, AppError> {
    let mut samples = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| AppError::io(format!("failed to read line {line_no}"), e))?;

        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => continue,
            [x, y, err] => samples.push(Sample::new(
                parse_field(x, line_no)?,
                parse_field(y, line_no)?,
                parse_field(err, line_no)?,
            )),
            other => {
                return Err(AppError::FieldCount {
                    line: line_no,
                    found: other.len(),
                });
            }
        }
    }

    Ok(SampleSet::new(samples))
}

fn parse_field(token: &str, line: usize) -> Result<f64, AppError> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AppError::Parse {
            line,
            token: token.to_string(),
        }),
    }
}
