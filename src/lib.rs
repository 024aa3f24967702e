#![warn(clippy::all, missing_docs)]
#![doc = include_str!("../README.md")]

/// Shared numerical primitives anchored on `nalgebra`.
pub mod math;
/// Error types shared across the crate.
pub mod errors;
/// DAE system assembly, sparse linear solve, and time integration.
pub mod algebra;
/// Blocks, nodes, parameters, and the 0D model container.
pub mod model;
/// Simulation parameters and the time-stepping driver.
pub mod solve;
/// Configuration reading and result writing.
pub mod io;

/// Common exports for downstream crates.
pub mod prelude;
