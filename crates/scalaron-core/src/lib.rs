// ─────────────────────────────────────────────────────────────────────
// Scalaron — Integration Core
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Adaptive integration of the f(R) background through inflation and
//! reheating, plus report writing and parameter sweeps.
//!
//! # Run Invariants
//!
//! 1. **Configuration errors stop a run before it starts**: invalid
//!    parameters, phase settings or initial states come back as `Err`
//!    and no integration is attempted.
//!
//! 2. **Solver failures are outcomes**: a run that cannot advance is
//!    returned as `RunStatus::Failed` with the solver's diagnostic and
//!    the samples reached so far.
//!
//! 3. **Samples live on a uniform grid**: the solver's internal steps
//!    never leak into a trajectory. Only grid times, and for inflation
//!    the located end-of-inflation crossing, appear in the output.
//!
//! 4. **No global state**: progress goes through an injected
//!    [`EventSink`], so concurrent runs share nothing writable.

pub mod driver;
pub mod grid;
pub mod report;
pub mod sink;
pub mod solver;
pub mod sweep;

pub use driver::{DriverState, EndOfInflation, IntegrationDriver};
pub use grid::{SampleGrid, MAX_SAMPLES};
pub use report::{write_run, write_sweep, ReportMetadata, RUN_COLUMNS, SWEEP_COLUMNS};
pub use sink::{EventSink, LogSink, MemorySink, NullSink, SinkLevel};
pub use solver::{Dopri5, Solution, SolveOutcome, SolverOptions, TerminationCondition};
pub use sweep::{ParameterSweep, SweepAxis, SweepRow};
