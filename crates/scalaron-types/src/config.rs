// ─────────────────────────────────────────────────────────────────────
// Scalaron — Simulation Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{ScalaronError, ScalaronResult};

/// Integration and sampling settings for one phase.
///
/// The horizon is `horizon_multiplier` times the phase's characteristic
/// timescale, and output samples are spaced by that timescale divided by
/// `sample_divisor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub horizon_multiplier: f64,
    pub sample_divisor: f64,
    /// Absolute local error tolerance.
    pub atol: f64,
    /// Relative local error tolerance.
    pub rtol: f64,
}

impl PhaseConfig {
    /// Inflation defaults: horizon 50·τ1, spacing τ1/50, atol 1e-15, rtol 1e-13.
    pub fn inflation() -> Self {
        Self {
            horizon_multiplier: 50.0,
            sample_divisor: 50.0,
            atol: 1e-15,
            rtol: 1e-13,
        }
    }

    /// Reheating defaults: horizon 5000·τ_osc, spacing τ_osc/100,
    /// atol 1e-16, rtol 2.3e-14.
    pub fn reheating() -> Self {
        Self {
            horizon_multiplier: 5000.0,
            sample_divisor: 100.0,
            atol: 1e-16,
            rtol: 2.3e-14,
        }
    }

    pub fn validate(&self, name: &str) -> ScalaronResult<()> {
        let fields = [
            ("horizon_multiplier", self.horizon_multiplier),
            ("sample_divisor", self.sample_divisor),
            ("atol", self.atol),
            ("rtol", self.rtol),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(ScalaronError::Config(format!(
                    "{name}.{field} must be finite and > 0, got {value}"
                )));
            }
        }
        // Below ~100 ulp the embedded error estimate is pure rounding noise.
        if self.rtol < 100.0 * f64::EPSILON {
            return Err(ScalaronError::Config(format!(
                "{name}.rtol must be >= {:e}, got {:e}",
                100.0 * f64::EPSILON,
                self.rtol
            )));
        }
        Ok(())
    }
}

/// Runtime configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of e-foldings used to fix H0.
    /// Default: 60.
    pub e_folds: f64,

    /// Inflation phase: event-terminated.
    pub inflation: PhaseConfig,

    /// Reheating phase: always runs to the horizon.
    pub reheating: PhaseConfig,

    /// Optional cap on solver steps (accepted + rejected) per run.
    /// Default: unbounded; the phase horizon already ends every run.
    pub max_steps: Option<u64>,

    /// Positive floor substituted for R ≤ 0 before taking ln(R/μ²).
    /// Default: 1e-50.
    pub ricci_floor: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            e_folds: 60.0,
            inflation: PhaseConfig::inflation(),
            reheating: PhaseConfig::reheating(),
            max_steps: None,
            ricci_floor: 1e-50,
        }
    }
}

impl SimulationConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> ScalaronResult<()> {
        if !self.e_folds.is_finite() || self.e_folds <= 0.0 {
            return Err(ScalaronError::Config(format!(
                "e_folds must be finite and > 0, got {}",
                self.e_folds
            )));
        }
        self.inflation.validate("inflation")?;
        self.reheating.validate("reheating")?;
        if self.max_steps == Some(0) {
            return Err(ScalaronError::Config("max_steps must be > 0".to_string()));
        }
        if !self.ricci_floor.is_finite() || self.ricci_floor <= 0.0 {
            return Err(ScalaronError::Config(format!(
                "ricci_floor must be finite and > 0, got {}",
                self.ricci_floor
            )));
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ScalaronResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ScalaronError::Config(format!("JSON parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
