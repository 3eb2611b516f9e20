// ─────────────────────────────────────────────────────────────────────
// Scalaron — Trajectory and Run Result Types
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{ScalaronError, ScalaronResult};

/// Background state at one instant, in dimensionless units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StateVector {
    /// Ξ = H/H0.
    pub xi: f64,
    /// Ψ = dΞ/d(H0·t).
    pub psi: f64,
    /// Θ = ρ/E⁴.
    pub theta: f64,
}

impl StateVector {
    pub fn new(xi: f64, psi: f64, theta: f64) -> Self {
        Self { xi, psi, theta }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.xi, self.psi, self.theta]
    }

    pub fn from_array(y: [f64; 3]) -> Self {
        Self::new(y[0], y[1], y[2])
    }

    pub fn is_finite(&self) -> bool {
        self.xi.is_finite() && self.psi.is_finite() && self.theta.is_finite()
    }
}

/// Time-ordered samples of the background solution.
///
/// Timestamps are strictly increasing. Built once by the integration
/// driver and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<StateVector>,
}

impl Trajectory {
    /// Assemble a trajectory, rejecting mismatched lengths, non-finite
    /// times and non-increasing timestamps.
    pub fn from_samples(times: Vec<f64>, states: Vec<StateVector>) -> ScalaronResult<Self> {
        if times.len() != states.len() {
            return Err(ScalaronError::Config(format!(
                "trajectory length mismatch: {} times, {} states",
                times.len(),
                states.len()
            )));
        }
        if let Some(t) = times.iter().find(|t| !t.is_finite()) {
            return Err(ScalaronError::Config(format!(
                "trajectory time {t} is not finite"
            )));
        }
        if let Some(w) = times.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ScalaronError::Config(format!(
                "trajectory times must be strictly increasing ({} then {})",
                w[0], w[1]
            )));
        }
        Ok(Self { times, states })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[StateVector] {
        &self.states
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, StateVector)> + '_ {
        self.times.iter().copied().zip(self.states.iter().copied())
    }

    pub fn first(&self) -> Option<(f64, StateVector)> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<(f64, StateVector)> {
        match (self.times.last(), self.states.last()) {
            (Some(&t), Some(&s)) => Some((t, s)),
            _ => None,
        }
    }

    pub fn xi(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.xi).collect()
    }

    pub fn psi(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.psi).collect()
    }

    pub fn theta(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.theta).collect()
    }
}

/// Per-sample record of degenerate evaluations in the derived pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SampleQuality {
    /// R ≤ 0 was replaced by the positive floor before ln(R/μ²).
    pub ricci_clamped: bool,
    /// Ξ² was zero or non-finite; ε1 stored as NaN.
    pub epsilon1_singular: bool,
    /// Ξ·F was zero or non-finite; ε3 stored as NaN.
    pub epsilon3_singular: bool,
    /// Ξ·dF/dt was zero or non-finite; ε4 stored as NaN.
    pub epsilon4_singular: bool,
}

impl SampleQuality {
    pub fn is_clean(&self) -> bool {
        !(self.ricci_clamped
            || self.epsilon1_singular
            || self.epsilon3_singular
            || self.epsilon4_singular)
    }
}

/// Curvature, F(R) and slow-roll series aligned index-for-index with a
/// [`Trajectory`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedSeries {
    /// Ricci scalar in units of H0².
    pub ricci: Vec<f64>,
    pub ricci_dot: Vec<f64>,
    pub ricci_ddot: Vec<f64>,
    /// F(R) = df/dR.
    pub f: Vec<f64>,
    pub f_dot: Vec<f64>,
    pub f_ddot: Vec<f64>,
    pub epsilon_1: Vec<f64>,
    pub epsilon_3: Vec<f64>,
    pub epsilon_4: Vec<f64>,
    pub quality: Vec<SampleQuality>,
}

impl DerivedSeries {
    pub fn len(&self) -> usize {
        self.ricci.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ricci.is_empty()
    }

    /// Number of samples with at least one degenerate evaluation.
    pub fn degenerate_count(&self) -> usize {
        self.quality.iter().filter(|q| !q.is_clean()).count()
    }
}

/// Spectral observables at horizon crossing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observables {
    /// Scalar spectral index n_s.
    pub n_s: f64,
    /// Tensor-to-scalar ratio r.
    pub r: f64,
}

/// Which part of the background history a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Inflation,
    Reheating,
}

/// Outcome of a run as seen by consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Reached the horizon.
    Ok,
    /// A terminal condition fired before the horizon.
    StoppedByEvent,
    /// The integrator could not advance; carries its diagnostic.
    Failed(String),
}

impl RunStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::StoppedByEvent => "OK (event)",
            Self::Failed(_) => "Failed",
        }
    }
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub phase: Phase,
    pub status: RunStatus,
    pub trajectory: Trajectory,
    pub derived: DerivedSeries,
    /// Present for inflation runs whose first sample is non-degenerate.
    pub observables: Option<Observables>,
    /// Why observables are absent for an inflation run.
    pub observables_error: Option<String>,
    /// Crossing time of the terminal condition, if it fired.
    pub event_time: Option<f64>,
}

impl RunResult {
    /// Final sample, the hand-off point from inflation to reheating.
    pub fn end_state(&self) -> Option<(f64, StateVector)> {
        self.trajectory.last()
    }
}
