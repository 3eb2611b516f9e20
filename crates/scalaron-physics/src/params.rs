// ─────────────────────────────────────────────────────────────────────
// Scalaron — Model Parameters
// ─────────────────────────────────────────────────────────────────────
//! Parameters of f(R) = R + αR² + βR² ln(R/μ²) and the constants
//! derived from them.
//!
//! Units: α, β in t_P², μ in t_P⁻¹, E in GeV, ω dimensionless.
//! H0 and HS are returned in t_P⁻¹, so the Hubble time τ1 = 1/H0 is
//! directly in Planck times.

use serde::{Deserialize, Serialize};

use scalaron_types::{ScalaronError, ScalaronResult};

use crate::constants::PhysicalConstants;

/// Number of e-foldings fixing H0 unless overridden.
pub const DEFAULT_E_FOLDS: f64 = 60.0;

/// Characteristic timescales of the field equations, in Planck times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timescales {
    /// Hubble time 1/H0.
    pub tau_1: f64,
    /// Scalaron oscillation period 2π√(6α).
    pub tau_osc: f64,
    /// Particle-production scale.
    pub tau_3: f64,
    /// Decay time 1/Γ.
    pub tau_4: f64,
}

/// Validated model parameters.
///
/// Immutable after construction; `Copy` so concurrent runs can each hold
/// their own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    alpha: f64,
    beta: f64,
    mu: f64,
    energy: f64,
    omega: f64,
    e_folds: f64,
    h0: f64,
    hs: f64,
    kappa: f64,
    gamma: f64,
    timescales: Timescales,
}

impl ModelParameters {
    /// Build with Ne = 60.
    pub fn new(
        constants: &PhysicalConstants,
        alpha: f64,
        beta: f64,
        mu: f64,
        energy: f64,
        omega: f64,
    ) -> ScalaronResult<Self> {
        Self::with_e_folds(constants, DEFAULT_E_FOLDS, alpha, beta, mu, energy, omega)
    }

    /// Build with an explicit number of e-foldings.
    ///
    /// Fails with [`ScalaronError::Config`] when α, β, μ, E are not finite
    /// and positive, when ω is not finite, or when the H0 radicand
    /// `1 − exp(−2βNe/3α)` falls outside (0, 1) in floating point.
    pub fn with_e_folds(
        constants: &PhysicalConstants,
        e_folds: f64,
        alpha: f64,
        beta: f64,
        mu: f64,
        energy: f64,
        omega: f64,
    ) -> ScalaronResult<Self> {
        for (name, value) in [
            ("alpha", alpha),
            ("beta", beta),
            ("mu", mu),
            ("E", energy),
            ("e_folds", e_folds),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ScalaronError::Config(format!(
                    "{name} must be finite and > 0, got {value}"
                )));
            }
        }
        if !omega.is_finite() {
            return Err(ScalaronError::Config(format!(
                "omega must be finite, got {omega}"
            )));
        }

        let hs = 1.0 / (12.0 * beta).sqrt();
        let exponent = 2.0 * beta * e_folds / (3.0 * alpha);
        // 1 − e^{−x}, accurate for small x.
        let radicand = -(-exponent).exp_m1();
        if !(radicand > 0.0 && radicand < 1.0) {
            return Err(ScalaronError::Config(format!(
                "H0 radicand 1 - exp(-2*beta*Ne/(3*alpha)) = {radicand} is outside (0, 1) \
                 (alpha = {alpha:e}, beta = {beta:e}, Ne = {e_folds})"
            )));
        }
        let h0 = hs * radicand.sqrt();
        if !(h0 > 0.0 && h0 < hs && hs.is_finite()) {
            return Err(ScalaronError::Config(format!(
                "H0 = {h0:e} must satisfy 0 < H0 < HS = {hs:e}"
            )));
        }

        let kappa = constants.kappa();
        let gamma = energy * constants.gev_to_joule / constants.hbar;
        let t_p = constants.planck_time();
        let timescales = Timescales {
            tau_1: 1.0 / h0,
            tau_osc: 2.0 * std::f64::consts::PI * (6.0 * alpha).sqrt(),
            tau_3: 1.0
                / ((kappa * energy.powi(4) * constants.energy_density_factor).sqrt() * t_p),
            tau_4: 1.0 / (gamma * t_p),
        };

        Ok(Self {
            alpha,
            beta,
            mu,
            energy,
            omega,
            e_folds,
            h0,
            hs,
            kappa,
            gamma,
            timescales,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Injected particle energy E (GeV).
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Equation-of-state parameter ω (P = ωρ).
    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn e_folds(&self) -> f64 {
        self.e_folds
    }

    /// Hubble rate at horizon crossing (t_P⁻¹).
    pub fn h0(&self) -> f64 {
        self.h0
    }

    /// de Sitter Hubble rate 1/√(12β) (t_P⁻¹).
    pub fn hs(&self) -> f64 {
        self.hs
    }

    /// κ = 8πG/c² (SI).
    pub fn kappa(&self) -> f64 {
        self.kappa
    }

    /// Particle decay rate Γ (s⁻¹).
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn timescales(&self) -> Timescales {
        self.timescales
    }

    /// Analytic Ψ at horizon crossing: β/(3α) − 1/(36αH0²).
    pub fn init_hubble_slope(&self) -> f64 {
        self.beta / (3.0 * self.alpha) - 1.0 / (36.0 * self.alpha * self.h0 * self.h0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Viable reference point: α = 2.572e8, β = 1.25e6, μ = 1e-4, E = 1e13 GeV, ω = 1/3.
    pub(crate) fn reference() -> ModelParameters {
        ModelParameters::new(
            &PhysicalConstants::codata(),
            2.572e8,
            1.25e6,
            1e-4,
            1e13,
            1.0 / 3.0,
        )
        .unwrap()
    }

    #[test]
    fn test_h0_below_hs() {
        let m = reference();
        assert!(m.h0() > 0.0 && m.h0() < m.hs());
        assert!((m.h0() / m.hs() - 0.4204).abs() < 1e-3, "H0/HS = {}", m.h0() / m.hs());
    }

    #[test]
    fn test_reference_timescales() {
        let ts = reference().timescales();
        assert!((ts.tau_1 - 9213.0).abs() / 9213.0 < 1e-3, "tau_1 = {}", ts.tau_1);
        assert!((ts.tau_osc - 2.4683e5).abs() / 2.4683e5 < 1e-3, "tau_osc = {}", ts.tau_osc);
        assert!(ts.tau_3 > ts.tau_1 && ts.tau_4 > ts.tau_1);
    }

    #[test]
    fn test_init_hubble_slope_negative() {
        let psi0 = reference().init_hubble_slope();
        assert!(psi0 < 0.0 && psi0 > -0.01, "psi0 = {psi0}");
    }

    #[test]
    fn test_rejects_non_positive() {
        let c = PhysicalConstants::codata();
        assert!(ModelParameters::new(&c, 0.0, 1.0, 1.0, 1.0, 0.0).is_err());
        assert!(ModelParameters::new(&c, 1.0, -1.0, 1.0, 1.0, 0.0).is_err());
        assert!(ModelParameters::new(&c, 1.0, 1.0, 0.0, 1.0, 0.0).is_err());
        assert!(ModelParameters::new(&c, 1.0, 1.0, 1.0, f64::NAN, 0.0).is_err());
        assert!(ModelParameters::new(&c, 1.0, 1.0, 1.0, 1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_rejects_saturated_radicand() {
        // 2βNe/3α ≈ 4e10: exp underflows, radicand rounds to exactly 1.
        let c = PhysicalConstants::codata();
        let err = ModelParameters::new(&c, 1e-3, 1e6, 1e-4, 1e13, 1.0 / 3.0).unwrap_err();
        assert!(matches!(err, ScalaronError::Config(_)));
        assert!(err.to_string().contains("radicand"));
    }

    #[test]
    fn test_rejects_vanishing_radicand() {
        // 2βNe/3α ≈ 4e-330 underflows to zero.
        let c = PhysicalConstants::codata();
        assert!(ModelParameters::new(&c, 1e300, 1e-30, 1e-4, 1e13, 0.0).is_err());
    }

    #[test]
    fn test_dust_equation_of_state_allowed() {
        let c = PhysicalConstants::codata();
        assert!(ModelParameters::new(&c, 2.572e8, 1.25e6, 1e-4, 1e13, 0.0).is_ok());
    }
}
