// ─────────────────────────────────────────────────────────────────────
// Scalaron — f(R) Background Physics
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Model parameters, background field equations, analytic slow-roll
//! reference and the derived-quantity pipeline for
//! f(R) = R + αR² + βR² ln(R/μ²).

pub mod analytic;
pub mod constants;
pub mod derived;
pub mod field;
pub mod params;

pub use analytic::AnalyticBackground;
pub use constants::PhysicalConstants;
pub use derived::{
    epsilon_1, gradient, observables, observables_at_crossing, ricci, DerivedQuantityPipeline,
};
pub use field::{FieldEquationSystem, OdeSystem};
pub use params::{ModelParameters, Timescales, DEFAULT_E_FOLDS};
