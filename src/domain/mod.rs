//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - observations (`Sample`, `SampleSet`)
//! - model parameters and fit outputs (`ParameterVector`, `FitResult`, `FitReport`)
//! - resolved run configuration (`FitConfig`, `SynthConfig`, `SolverConfig`)

pub mod types;

pub use types::*;
