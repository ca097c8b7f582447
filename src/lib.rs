//! `wls-fit` library crate.
//!
//! Weighted least-squares fitting of `y = a(x-b)^2 + c` to `x y err` data.
//! The binary (`wls`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the solver, reporter and renderers are reusable on their own

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
