// ─────────────────────────────────────────────────────────────────────
// Scalaron — Parameter Sweep
// ─────────────────────────────────────────────────────────────────────
//! Runs the inflation pipeline over a one-dimensional grid in α or β
//! and collects (α, β, μ, n_s, r) per point.
//!
//! Points are independent, so they run in parallel on the rayon pool.
//! A point that fails to construct or integrate is recorded on its row
//! and never aborts the sweep. Rows come back ordered by index.

use std::ops::RangeInclusive;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use scalaron_physics::{ModelParameters, PhysicalConstants};
use scalaron_types::{Observables, RunStatus, SimulationConfig};

use crate::driver::IntegrationDriver;
use crate::sink::EventSink;

/// Which coupling varies across the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepAxis {
    Alpha,
    Beta,
}

/// Result for one parameter point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub index: u32,
    pub alpha: f64,
    pub beta: f64,
    pub mu: f64,
    pub observables: Option<Observables>,
    /// `None` when the run never started.
    pub status: Option<RunStatus>,
    /// Configuration, solver or observables failure for this point.
    pub error: Option<String>,
}

impl SweepRow {
    pub fn n_s(&self) -> Option<f64> {
        self.observables.map(|o| o.n_s)
    }

    pub fn r(&self) -> Option<f64> {
        self.observables.map(|o| o.r)
    }

    fn status_label(&self) -> &str {
        match &self.status {
            Some(s) => s.label(),
            None => "Not started",
        }
    }
}

/// Grid `(1 + i/4)·scale` for `i` in `indices` along one axis, the other
/// coupling held fixed.
#[derive(Debug, Clone)]
pub struct ParameterSweep {
    axis: SweepAxis,
    fixed: f64,
    scale: f64,
    mu: f64,
    energy: f64,
    omega: f64,
    indices: RangeInclusive<u32>,
    constants: PhysicalConstants,
    config: SimulationConfig,
}

impl ParameterSweep {
    /// β = (1 + i/4)·1e6, i = 1..=99, at fixed α.
    pub fn over_beta(alpha: f64, mu: f64, energy: f64, omega: f64) -> Self {
        Self::new(SweepAxis::Beta, alpha, 1e6, mu, energy, omega)
    }

    /// α = (1 + i/4), i = 1..=99, at fixed β.
    pub fn over_alpha(beta: f64, mu: f64, energy: f64, omega: f64) -> Self {
        Self::new(SweepAxis::Alpha, beta, 1.0, mu, energy, omega)
    }

    pub fn new(axis: SweepAxis, fixed: f64, scale: f64, mu: f64, energy: f64, omega: f64) -> Self {
        Self {
            axis,
            fixed,
            scale,
            mu,
            energy,
            omega,
            indices: 1..=99,
            constants: PhysicalConstants::codata(),
            config: SimulationConfig::default(),
        }
    }

    pub fn with_indices(mut self, indices: RangeInclusive<u32>) -> Self {
        self.indices = indices;
        self
    }

    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_constants(mut self, constants: PhysicalConstants) -> Self {
        self.constants = constants;
        self
    }

    pub fn axis(&self) -> SweepAxis {
        self.axis
    }

    /// `(index, α, β)` for every point.
    pub fn points(&self) -> Vec<(u32, f64, f64)> {
        self.indices
            .clone()
            .map(|i| {
                let varied = (1.0 + f64::from(i) / 4.0) * self.scale;
                match self.axis {
                    SweepAxis::Alpha => (i, varied, self.fixed),
                    SweepAxis::Beta => (i, self.fixed, varied),
                }
            })
            .collect()
    }

    /// Run every point in parallel, reporting per-point status to `sink`.
    pub fn run(&self, sink: Arc<dyn EventSink>) -> Vec<SweepRow> {
        self.points()
            .into_par_iter()
            .map(|(index, alpha, beta)| {
                let row = self.run_point(index, alpha, beta, Arc::clone(&sink));
                let msg = format!(
                    "sweep point {index}: alpha = {alpha:e}, beta = {beta:e}, status [{}]",
                    row.status_label()
                );
                match &row.error {
                    Some(e) if row.observables.is_none() => sink.error(&format!("{msg}: {e}")),
                    _ => sink.info(&msg),
                }
                row
            })
            .collect()
    }

    fn run_point(&self, index: u32, alpha: f64, beta: f64, sink: Arc<dyn EventSink>) -> SweepRow {
        let mut row = SweepRow {
            index,
            alpha,
            beta,
            mu: self.mu,
            observables: None,
            status: None,
            error: None,
        };

        let model = match ModelParameters::with_e_folds(
            &self.constants,
            self.config.e_folds,
            alpha,
            beta,
            self.mu,
            self.energy,
            self.omega,
        ) {
            Ok(m) => m,
            Err(e) => {
                row.error = Some(e.to_string());
                return row;
            }
        };

        let run = IntegrationDriver::new(self.config.clone(), sink)
            .and_then(|mut driver| driver.run_inflation(&model));
        match run {
            Ok(result) => {
                row.observables = result.observables;
                row.error = match &result.status {
                    RunStatus::Failed(msg) => Some(msg.clone()),
                    _ => result.observables_error,
                };
                row.status = Some(result.status);
            }
            Err(e) => row.error = Some(e.to_string()),
        }
        row
    }
}
