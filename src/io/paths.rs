//! Pre-flight checks on the input and output paths.
//!
//! These run before any data is read. They return an error value rather than
//! exiting so the binary decides what a failure means for the process.

use std::path::Path;

use crate::domain::OutputFormat;
use crate::error::AppError;

/// Validate a `wls fit` invocation's paths, in this order:
///
/// 1. the input file exists
/// 2. the output file does not exist
/// 3. the output extension is one of `eps`, `pdf`, `png`, `ps`
///
/// On success the output format implied by the extension is returned.
pub fn validate_paths(input: &Path, output: &Path) -> Result<OutputFormat, AppError> {
    if !input.exists() {
        return Err(AppError::FileNotFound {
            path: input.to_path_buf(),
        });
    }
    ensure_output_absent(output)?;
    output_format(output)
}

/// Refuse to overwrite an existing file.
pub fn ensure_output_absent(output: &Path) -> Result<(), AppError> {
    if output.exists() {
        return Err(AppError::OutputExists {
            path: output.to_path_buf(),
        });
    }
    Ok(())
}

/// Resolve the plot format from the output extension (case-sensitive).
pub fn output_format(output: &Path) -> Result<OutputFormat, AppError> {
    output
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(OutputFormat::from_extension)
        .ok_or_else(|| AppError::UnsupportedExtension {
            path: output.to_path_buf(),
        })
}
