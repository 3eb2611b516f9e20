// ─────────────────────────────────────────────────────────────────────
// Scalaron — Background Field Equations
// ─────────────────────────────────────────────────────────────────────
//! Homogeneous background equations for Ξ = H/H0, Ψ = dΞ/dτ and
//! Θ = ρ/E⁴, with τ = H0·t:
//!
//!   dΞ/dτ = Ψ
//!   dΨ/dτ = 2π²(τ1/τ_osc)²(τ1/τ3)² Θ/(3Ξ) − 2π²(τ1/τ_osc)² Ξ
//!           − 3ΨΞ + Ψ²/(2Ξ) + (β/α)(Ξ³ + 3ΨΞ/2 + Ψ²/(2Ξ))
//!   dΘ/dτ = −3Ξ(1+ω)Θ + τ1/τ4
//!
//! Singular at Ξ = 0; callers keep Ξ away from zero.

use scalaron_types::StateVector;

use crate::params::ModelParameters;

/// A first-order system dy/dt = f(t, y) of fixed dimension.
pub trait OdeSystem<const N: usize> {
    fn rhs(&self, t: f64, y: &[f64; N]) -> [f64; N];
}

/// Right-hand side of the background equations for one model.
///
/// Coefficients are folded once from the model's timescales.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldEquationSystem {
    /// 2π²(τ1/τ_osc)²(τ1/τ3)²/3
    matter_coupling: f64,
    /// 2π²(τ1/τ_osc)² = M²/(2H0²)
    mass_term: f64,
    /// β/α
    log_coupling: f64,
    /// 1 + ω
    eos: f64,
    /// τ1/τ4
    source: f64,
}

impl FieldEquationSystem {
    pub fn new(model: &ModelParameters) -> Self {
        let ts = model.timescales();
        let pi2 = std::f64::consts::PI * std::f64::consts::PI;
        let osc = (ts.tau_1 / ts.tau_osc).powi(2);
        let prod = (ts.tau_1 / ts.tau_3).powi(2);
        Self {
            matter_coupling: 2.0 * pi2 * osc * prod / 3.0,
            mass_term: 2.0 * pi2 * osc,
            log_coupling: model.beta() / model.alpha(),
            eos: 1.0 + model.omega(),
            source: ts.tau_1 / ts.tau_4,
        }
    }

    /// Time derivative of the state. Autonomous: `t` is unused.
    pub fn derivative(&self, _t: f64, s: &StateVector) -> StateVector {
        let (xi, psi, theta) = (s.xi, s.psi, s.theta);
        let psi2_over_xi = 0.5 * psi * psi / xi;

        let dxi = psi;
        let dpsi = self.matter_coupling * theta / xi - self.mass_term * xi - 3.0 * psi * xi
            + psi2_over_xi
            + self.log_coupling * (xi * xi * xi + 1.5 * psi * xi + psi2_over_xi);
        let dtheta = -3.0 * xi * self.eos * theta + self.source;

        StateVector::new(dxi, dpsi, dtheta)
    }

    /// Scalaron mass over H0: 2π τ1/τ_osc.
    pub fn mass_ratio(&self) -> f64 {
        (2.0 * self.mass_term).sqrt()
    }
}

impl OdeSystem<3> for FieldEquationSystem {
    fn rhs(&self, t: f64, y: &[f64; 3]) -> [f64; 3] {
        self.derivative(t, &StateVector::from_array(*y)).to_array()
    }
}
