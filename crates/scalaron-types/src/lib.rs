// ─────────────────────────────────────────────────────────────────────
// Scalaron — Core Types
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Configuration, error hierarchy and plain-data run types shared by
//! the scalaron physics and integration crates.

pub mod config;
pub mod error;
pub mod series;

pub use config::{PhaseConfig, SimulationConfig};
pub use error::{ScalaronError, ScalaronResult};
pub use series::{
    DerivedSeries, Observables, Phase, RunResult, RunStatus, SampleQuality, StateVector,
    Trajectory,
};
