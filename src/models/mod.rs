//! Model evaluation.
//!
//! The model is implemented as small, pure functions so that the solver and
//! the plotting code can stay generic over parameters.

pub mod model;

pub use model::*;
