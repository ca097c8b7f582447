//! Synthetic data for exercising the fitter.

pub mod synth;

pub use synth::*;
