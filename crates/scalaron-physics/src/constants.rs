// ─────────────────────────────────────────────────────────────────────
// Scalaron — Physical Constants
// ─────────────────────────────────────────────────────────────────────
//! SI constants needed to convert between Planck units and the particle
//! production / decay timescales.

use serde::{Deserialize, Serialize};

/// Immutable set of physical constants (SI).
///
/// Built once and passed explicitly to [`crate::ModelParameters::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// Speed of light (m/s).
    pub c: f64,
    /// Newton's constant (m³ kg⁻¹ s⁻²).
    pub g: f64,
    /// Reduced Planck constant (J s).
    pub hbar: f64,
    /// Joules per GeV.
    pub gev_to_joule: f64,
    /// Conversion of E⁴ (GeV⁴) to an SI energy density scale.
    pub energy_density_factor: f64,
}

impl PhysicalConstants {
    /// CODATA 2018 values.
    pub fn codata() -> Self {
        Self {
            c: 299_792_458.0,
            g: 6.674_30e-11,
            hbar: 1.054_571_817e-34,
            gev_to_joule: 1.602_18e-10,
            energy_density_factor: 2.0852e37,
        }
    }

    /// Planck length √(ħG/c³) in metres.
    pub fn planck_length(&self) -> f64 {
        (self.hbar * self.g / self.c.powi(3)).sqrt()
    }

    /// Planck time l_P/c in seconds.
    pub fn planck_time(&self) -> f64 {
        self.planck_length() / self.c
    }

    /// Einstein coupling κ = 8πG/c².
    pub fn kappa(&self) -> f64 {
        8.0 * std::f64::consts::PI * self.g / (self.c * self.c)
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::codata()
    }
}
