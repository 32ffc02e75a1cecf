//! CPU-pinned two-way comparison harness for threading microbenchmarks.
//!
//! The harness spawns pairs of external benchmark executables pinned to
//! distinct logical cores, times each run wall-clock, optionally sweeps an
//! independent variable with median-of-N reduction, and renders the two
//! resulting series as a line or box chart. A companion suite runner executes
//! correctness tests in parallel and reports an aggregate verdict.

pub mod discover;
pub mod driver;
pub mod error;
pub mod plot;
pub mod pool;
pub mod schema;
pub mod suite;
pub mod sweep;
pub mod trial;

pub use error::{HarnessError, Result};
