// ─────────────────────────────────────────────────────────────────────
// Scalaron — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all simulator failures.
#[derive(Error, Debug)]
pub enum ScalaronError {
    /// Invalid model parameters or run configuration. Fatal for the run.
    #[error("config error: {0}")]
    Config(String),

    /// A derived quantity hit a degenerate denominator or log argument.
    #[error("numerical domain error: {0}")]
    Domain(String),

    /// The adaptive integrator could not advance.
    #[error("solver failure: {0}")]
    Solver(String),

    /// Report output failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ScalaronResult<T> = Result<T, ScalaronError>;
