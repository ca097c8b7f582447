//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - express the weighted quadratic as a least-squares problem
//! - run it through a pluggable solver
//! - turn the solver output into fitted parameters plus covariance

pub mod fitter;

pub use fitter::*;
