//! Shared error types used across submodules.

use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum HemoflowError {
    /// Raised when the configuration is internally inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Raised when the block/node graph is malformed.
    #[error("graph error: {0}")]
    Graph(String),
    /// Raised when a solution or derivative vector has the wrong size.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    Dimension {
        /// Expected vector length.
        expected: usize,
        /// Actual vector length.
        got: usize,
    },
    /// Raised when the Newton iteration fails to reach the tolerance.
    #[error(
        "nonlinear iteration diverged at t = {time}: residual {residual:.3e} after {iterations} iterations"
    )]
    NonlinearDivergence {
        /// Simulation time of the failed step.
        time: f64,
        /// Infinity norm of the residual at abort.
        residual: f64,
        /// Number of Newton iterations performed.
        iterations: usize,
    },
    /// Raised when the sparse LU factorization fails.
    #[error("linear solve failed: {0}")]
    LinearSolve(String),
    /// Wraps file-system errors from the driver layer.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Wraps JSON parse errors from the configuration reader.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, HemoflowError>;
