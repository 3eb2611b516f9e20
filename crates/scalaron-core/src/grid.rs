// ─────────────────────────────────────────────────────────────────────
// Scalaron — Output Sample Grid
// ─────────────────────────────────────────────────────────────────────
//! Uniform output grid, independent of the solver's internal steps.

use scalaron_physics::ModelParameters;
use scalaron_types::{PhaseConfig, ScalaronError, ScalaronResult};

/// Largest number of output samples a grid may hold.
pub const MAX_SAMPLES: usize = 100_000_000;

/// `count` points from `start` to `end` inclusive, evenly spaced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleGrid {
    start: f64,
    end: f64,
    count: usize,
}

impl SampleGrid {
    /// `floor((end − start)/spacing)` points over `[start, end]`.
    ///
    /// A ratio within 1e-9 of an integer snaps to it, so multiplier and
    /// divisor products come out exact despite rounding in the timescales.
    pub fn new(start: f64, end: f64, spacing: f64) -> ScalaronResult<Self> {
        if !start.is_finite() || !end.is_finite() || end <= start {
            return Err(ScalaronError::Config(format!(
                "sample grid needs finite start < end, got [{start}, {end}]"
            )));
        }
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(ScalaronError::Config(format!(
                "sample spacing must be finite and > 0, got {spacing}"
            )));
        }
        let ratio = (end - start) / spacing;
        let nearest = ratio.round();
        let count = if (ratio - nearest).abs() <= 1e-9 * nearest.max(1.0) {
            nearest
        } else {
            ratio.floor()
        };
        if count < 2.0 {
            return Err(ScalaronError::Config(format!(
                "sample grid over [{start}, {end}] with spacing {spacing} has fewer than 2 points"
            )));
        }
        if count > MAX_SAMPLES as f64 {
            return Err(ScalaronError::Config(format!(
                "sample grid over [{start}, {end}] with spacing {spacing} needs {count:e} points, \
                 more than the limit of {MAX_SAMPLES}"
            )));
        }
        Ok(Self {
            start,
            end,
            count: count as usize,
        })
    }

    /// Inflation grid: `[0, m·τ1]`, spacing `τ1/d`.
    pub fn inflation(model: &ModelParameters, phase: &PhaseConfig) -> ScalaronResult<Self> {
        let tau = model.timescales().tau_1;
        Self::new(
            0.0,
            phase.horizon_multiplier * tau,
            tau / phase.sample_divisor,
        )
    }

    /// Reheating grid: `[start, m·τ_osc]`, spacing `τ_osc/d`.
    pub fn reheating(
        model: &ModelParameters,
        phase: &PhaseConfig,
        start: f64,
    ) -> ScalaronResult<Self> {
        let tau = model.timescales().tau_osc;
        Self::new(
            start,
            phase.horizon_multiplier * tau,
            tau / phase.sample_divisor,
        )
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Grid times. First and last are exactly `start` and `end`.
    pub fn times(&self) -> Vec<f64> {
        let last = self.count - 1;
        let step = (self.end - self.start) / last as f64;
        (0..self.count)
            .map(|i| {
                if i == last {
                    self.end
                } else {
                    self.start + step * i as f64
                }
            })
            .collect()
    }
}
