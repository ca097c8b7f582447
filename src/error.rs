//! Application error type.
//!
//! Every failure in the pipeline is terminal for the run, so a single enum is
//! enough. Each variant knows the process exit code it maps to; `main` prints
//! the message and exits with that code.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("input file \"{}\" does not exist", path.display())]
    FileNotFound { path: PathBuf },

    #[error("output file \"{}\" exists!", path.display())]
    OutputExists { path: PathBuf },

    #[error("output file \"{}\" must be either EPS or PDF or PNG or PS file", path.display())]
    UnsupportedExtension { path: PathBuf },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: cannot convert \"{token}\" into float")]
    Parse { line: usize, token: String },

    #[error("line {line}: expected 3 fields (x y err), found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("fit failed: {0}")]
    Fit(String),

    #[error("cannot fit {n_params} parameters to {n_samples} sample(s)")]
    Underdetermined { n_samples: usize, n_params: usize },

    #[error(
        "degrees of freedom must be positive: {n_samples} sample(s) for {n_params} parameters"
    )]
    DegenerateFit { n_samples: usize, n_params: usize },

    #[error("plot rendering failed: {0}")]
    Render(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AppError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit code for this error.
    ///
    /// Output-side validation failures are "nothing to do" outcomes and exit
    /// with status 0.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::OutputExists { .. } | AppError::UnsupportedExtension { .. } => 0,
            AppError::FileNotFound { .. }
            | AppError::Io { .. }
            | AppError::Parse { .. }
            | AppError::FieldCount { .. }
            | AppError::Config(_) => 2,
            AppError::Underdetermined { .. } | AppError::DegenerateFit { .. } => 3,
            AppError::Fit(_) | AppError::Render(_) => 4,
        }
    }

    /// Whether this error ends the run without anything having gone wrong.
    pub fn is_noop(&self) -> bool {
        self.exit_code() == 0
    }
}
