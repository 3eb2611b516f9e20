// ─────────────────────────────────────────────────────────────────────
// Scalaron — Analytic Slow-Roll Background
// ─────────────────────────────────────────────────────────────────────
//! Closed-form slow-roll solution H = HS·tanh((t_e − t)/(36αHS)),
//! rewritten in Ξ and τ = H0·t. It satisfies Ξ(0) = 1 and
//! Ψ(0) = [`ModelParameters::init_hubble_slope`], and is used to
//! cross-check the numerical inflation background away from its end.

use serde::{Deserialize, Serialize};

use crate::params::ModelParameters;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyticBackground {
    /// HS/H0.
    ratio: f64,
    /// 36αHS·H0: the tanh width in τ.
    width: f64,
    /// τ at which H reaches zero.
    t_zero: f64,
}

impl AnalyticBackground {
    pub fn new(model: &ModelParameters) -> Self {
        let ratio = model.hs() / model.h0();
        let width = 36.0 * model.alpha() * model.hs() * model.h0();
        let t_zero = width * (1.0 / ratio).atanh();
        Self {
            ratio,
            width,
            t_zero,
        }
    }

    /// Ξ(τ).
    pub fn xi(&self, t: f64) -> f64 {
        self.ratio * ((self.t_zero - t) / self.width).tanh()
    }

    /// Ψ(τ) = dΞ/dτ.
    pub fn psi(&self, t: f64) -> f64 {
        let sech = 1.0 / ((self.t_zero - t) / self.width).cosh();
        -self.ratio * sech * sech / self.width
    }

    /// ε1(τ) = −Ψ/Ξ².
    pub fn epsilon_1(&self, t: f64) -> f64 {
        let xi = self.xi(t);
        -self.psi(t) / (xi * xi)
    }

    /// τ where H would vanish.
    pub fn zero_crossing(&self) -> f64 {
        self.t_zero
    }

    /// τ where ε1 reaches 1: sinh²((τ_0 − τ)/w) = 1/(w·HS/H0).
    pub fn end_of_inflation(&self) -> f64 {
        let u = (1.0 / (self.width * self.ratio).sqrt()).asinh();
        self.t_zero - self.width * u
    }

    /// Slow-roll e-fold count ∫Ξ dτ from τ = 0 to `t`.
    pub fn e_folds_until(&self, t: f64) -> f64 {
        let c0 = (self.t_zero / self.width).cosh();
        let c1 = ((self.t_zero - t) / self.width).cosh();
        self.ratio * self.width * (c0 / c1).ln()
    }
}
