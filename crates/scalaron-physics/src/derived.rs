// ─────────────────────────────────────────────────────────────────────
// Scalaron — Derived Quantities and Spectral Observables
// ─────────────────────────────────────────────────────────────────────
//! Curvature, F(R) and slow-roll parameters along a sampled trajectory.
//!
//!   R    = 6(Ψ + 2Ξ²)                               [H0²]
//!   F(R) = 1 + (2α+β)R + 2βR ln(R/μ²)               [R in t_P⁻²]
//!   ε1   = −Ψ/Ξ²
//!   ε3   = Ḟ / (2ΞF)
//!   ε4   = F̈ / (ΞḞ)
//!
//! Time derivatives are finite differences on the sampled grid, so
//! second derivatives carry compounded truncation error. Degenerate
//! samples are flagged in [`SampleQuality`] and stored as NaN instead of
//! aborting the series.

use scalaron_types::{
    DerivedSeries, Observables, SampleQuality, ScalaronError, ScalaronResult, Trajectory,
};

use crate::params::ModelParameters;

/// Ricci scalar in units of H0².
#[inline]
pub fn ricci(xi: f64, psi: f64) -> f64 {
    6.0 * (psi + 2.0 * xi * xi)
}

/// First slow-roll parameter −Ψ/Ξ².
#[inline]
pub fn epsilon_1(xi: f64, psi: f64) -> f64 {
    -psi / (xi * xi)
}

/// Finite-difference derivative of `values` sampled at `times`.
///
/// Second-order central differences on the (possibly non-uniform)
/// interior, first-order one-sided differences at both ends. Fewer than
/// two samples give NaN.
pub fn gradient(values: &[f64], times: &[f64]) -> Vec<f64> {
    let n = values.len().min(times.len());
    if n < 2 {
        return vec![f64::NAN; n];
    }
    let mut out = vec![0.0; n];
    out[0] = (values[1] - values[0]) / (times[1] - times[0]);
    out[n - 1] = (values[n - 1] - values[n - 2]) / (times[n - 1] - times[n - 2]);
    for i in 1..n - 1 {
        let h1 = times[i] - times[i - 1];
        let h2 = times[i + 1] - times[i];
        let a = -h2 / (h1 * (h1 + h2));
        let b = (h2 - h1) / (h1 * h2);
        let c = h1 / (h2 * (h1 + h2));
        out[i] = a * values[i - 1] + b * values[i] + c * values[i + 1];
    }
    out
}

/// `num / den`, or `None` when the quotient is undefined.
#[inline]
fn checked_ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 || !den.is_finite() {
        return None;
    }
    let q = num / den;
    q.is_finite().then_some(q)
}

/// Maps a trajectory onto its [`DerivedSeries`] for one model.
#[derive(Debug, Clone, Copy)]
pub struct DerivedQuantityPipeline {
    model: ModelParameters,
    ricci_floor: f64,
}

impl DerivedQuantityPipeline {
    pub fn new(model: ModelParameters, ricci_floor: f64) -> Self {
        Self { model, ricci_floor }
    }

    /// F(R) for a Ricci value in H0² units.
    ///
    /// Returns `(F, clamped)`; `clamped` is set when R ≤ 0 (or NaN) and the
    /// floor was substituted before the log.
    pub fn f_of_r(&self, ricci: f64) -> (f64, bool) {
        let h0 = self.model.h0();
        let raw = h0 * h0 * ricci;
        let clamped = !(raw > 0.0);
        let r = if clamped { self.ricci_floor } else { raw };
        let alpha = self.model.alpha();
        let beta = self.model.beta();
        let mu = self.model.mu();
        let f = 1.0 + (2.0 * alpha + beta) * r + 2.0 * beta * r * (r / (mu * mu)).ln();
        (f, clamped)
    }

    /// Evaluate every derived quantity, index-aligned with `trajectory`.
    pub fn evaluate(&self, trajectory: &Trajectory) -> DerivedSeries {
        let times = trajectory.times();
        let n = trajectory.len();

        let ricci_series: Vec<f64> = trajectory
            .states()
            .iter()
            .map(|s| ricci(s.xi, s.psi))
            .collect();
        let ricci_dot = gradient(&ricci_series, times);
        let ricci_ddot = gradient(&ricci_dot, times);

        let mut quality = vec![SampleQuality::default(); n];
        let mut f = Vec::with_capacity(n);
        for (q, &r) in quality.iter_mut().zip(&ricci_series) {
            let (value, clamped) = self.f_of_r(r);
            q.ricci_clamped = clamped;
            f.push(value);
        }
        let f_dot = gradient(&f, times);
        let f_ddot = gradient(&f_dot, times);

        let mut epsilon_1 = Vec::with_capacity(n);
        let mut epsilon_3 = Vec::with_capacity(n);
        let mut epsilon_4 = Vec::with_capacity(n);
        for (i, s) in trajectory.states().iter().enumerate() {
            let e1 = checked_ratio(-s.psi, s.xi * s.xi);
            let e3 = checked_ratio(f_dot[i], 2.0 * s.xi * f[i]);
            let e4 = checked_ratio(f_ddot[i], s.xi * f_dot[i]);
            quality[i].epsilon1_singular = e1.is_none();
            quality[i].epsilon3_singular = e3.is_none();
            quality[i].epsilon4_singular = e4.is_none();
            epsilon_1.push(e1.unwrap_or(f64::NAN));
            epsilon_3.push(e3.unwrap_or(f64::NAN));
            epsilon_4.push(e4.unwrap_or(f64::NAN));
        }

        DerivedSeries {
            ricci: ricci_series,
            ricci_dot,
            ricci_ddot,
            f,
            f_dot,
            f_ddot,
            epsilon_1,
            epsilon_3,
            epsilon_4,
            quality,
        }
    }
}

/// Spectral index and tensor-to-scalar ratio from slow-roll values at
/// horizon crossing:
///
///   n_s = 4 − 2√(1/4 + (1+ε1−ε3+ε4)(2−ε3+ε4)/(1−ε3)²)
///   r   = 48ε3²/(1+ε3)²
pub fn observables(e1: f64, e3: f64, e4: f64) -> ScalaronResult<Observables> {
    if !(e1.is_finite() && e3.is_finite() && e4.is_finite()) {
        return Err(ScalaronError::Domain(format!(
            "non-finite slow-roll input (eps1 = {e1}, eps3 = {e3}, eps4 = {e4})"
        )));
    }
    if e3 == 1.0 {
        return Err(ScalaronError::Domain(
            "epsilon_3 = 1: spectral index denominator (1 - eps3)^2 vanishes".to_string(),
        ));
    }
    if e3 == -1.0 {
        return Err(ScalaronError::Domain(
            "epsilon_3 = -1: tensor ratio denominator (1 + eps3)^2 vanishes".to_string(),
        ));
    }
    let one_minus = 1.0 - e3;
    let radicand = 0.25 + (1.0 + e1 - e3 + e4) * (2.0 - e3 + e4) / (one_minus * one_minus);
    if !(radicand >= 0.0) {
        return Err(ScalaronError::Domain(format!(
            "negative spectral index radicand {radicand}"
        )));
    }
    let n_s = 4.0 - 2.0 * radicand.sqrt();
    let one_plus = 1.0 + e3;
    let r = 48.0 * e3 * e3 / (one_plus * one_plus);
    if !(n_s.is_finite() && r.is_finite()) {
        return Err(ScalaronError::Domain(format!(
            "non-finite observables (n_s = {n_s}, r = {r})"
        )));
    }
    Ok(Observables { n_s, r })
}

/// Observables at the first sample of a derived series.
pub fn observables_at_crossing(series: &DerivedSeries) -> ScalaronResult<Observables> {
    match (
        series.epsilon_1.first(),
        series.epsilon_3.first(),
        series.epsilon_4.first(),
    ) {
        (Some(&e1), Some(&e3), Some(&e4)) => observables(e1, e3, e4),
        _ => Err(ScalaronError::Domain(
            "empty derived series has no horizon-crossing sample".to_string(),
        )),
    }
}
