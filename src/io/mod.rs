//! Input/output helpers.
//!
//! - sample file ingest (`ingest`)
//! - input/output path validation (`paths`)

pub mod ingest;
pub mod paths;

pub use ingest::*;
pub use paths::*;
