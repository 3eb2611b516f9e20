// ─────────────────────────────────────────────────────────────────────
// Scalaron — Text Report Writer
// ─────────────────────────────────────────────────────────────────────
//! Plain-text renderings of run results and sweep tables.
//!
//! Layout of a run report:
//!
//! ```text
//! Project Title: Reheating by Scalaron Decay
//! File Type: Data
//! Author: ...
//! Affiliation: ...
//!
//! Data: Inflation
//! Model Parameters:
//! alpha = 2.572e8 [t_P^2]
//! ...
//!
//! Time, Xi, Psi, Theta, Ricci, epsilon_1, epsilon_3, epsilon_4
//! <t> <Xi> <Psi> <Theta> <Ricci> <epsilon_1> <epsilon_3> <epsilon_4>
//! ...
//!
//! Scalar Spectral Index and Tensor-to-Scalar Ratio:
//! n_s = <n_s to 4 decimals>
//! r   = <r to 4 decimals>
//! ```
//!
//! Rows are fixed-point with six decimals. Writers target any `std::io::Write`; choosing a file is the caller's
//! business.

use std::io::Write;

use serde::{Deserialize, Serialize};

use scalaron_physics::ModelParameters;
use scalaron_types::{Phase, RunResult, ScalaronResult};

use crate::sweep::SweepRow;

pub const RUN_COLUMNS: &str = "Time, Xi, Psi, Theta, Ricci, epsilon_1, epsilon_3, epsilon_4";
pub const SWEEP_COLUMNS: &str = "alpha, beta, mu, n_s, r";

/// Header lines shared by every report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub project: String,
    pub author: String,
    pub affiliation: String,
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self {
            project: "Reheating by Scalaron Decay".to_string(),
            author: "unspecified".to_string(),
            affiliation: "unspecified".to_string(),
        }
    }
}

impl ReportMetadata {
    fn write_header<W: Write>(&self, out: &mut W, data: &str) -> ScalaronResult<()> {
        writeln!(out, "Project Title: {}", self.project)?;
        writeln!(out, "File Type: Data")?;
        writeln!(out, "Author: {}", self.author)?;
        writeln!(out, "Affiliation: {}", self.affiliation)?;
        writeln!(out)?;
        writeln!(out, "Data: {data}")?;
        Ok(())
    }
}

fn write_parameters<W: Write>(out: &mut W, model: &ModelParameters) -> ScalaronResult<()> {
    writeln!(out, "Model Parameters:")?;
    writeln!(out, "alpha = {:e} [t_P^2]", model.alpha())?;
    writeln!(out, "beta  = {:e} [t_P^2]", model.beta())?;
    writeln!(out, "mu    = {:e} [t_P^-1]", model.mu())?;
    writeln!(out, "E     = {:e} [GeV]", model.energy())?;
    writeln!(out, "omega = {}", model.omega())?;
    writeln!(out)?;
    Ok(())
}

/// Write one run: header, parameters, one row per sample, and for
/// inflation the n_s / r trailer.
pub fn write_run<W: Write>(
    out: &mut W,
    metadata: &ReportMetadata,
    model: &ModelParameters,
    run: &RunResult,
) -> ScalaronResult<()> {
    let data = match run.phase {
        Phase::Inflation => "Inflation",
        Phase::Reheating => "Reheating",
    };
    metadata.write_header(out, data)?;
    writeln!(out, "Status: {}", run.status.label())?;
    write_parameters(out, model)?;

    writeln!(out, "{RUN_COLUMNS}")?;
    let d = &run.derived;
    for (i, (t, s)) in run.trajectory.iter().enumerate() {
        writeln!(
            out,
            "{:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6}",
            t, s.xi, s.psi, s.theta, d.ricci[i], d.epsilon_1[i], d.epsilon_3[i], d.epsilon_4[i]
        )?;
    }

    if run.phase == Phase::Inflation {
        writeln!(out)?;
        writeln!(out, "Scalar Spectral Index and Tensor-to-Scalar Ratio:")?;
        match (&run.observables, &run.observables_error) {
            (Some(obs), _) => {
                writeln!(out, "n_s = {:.4}", obs.n_s)?;
                writeln!(out, "r   = {:.4}", obs.r)?;
            }
            (None, reason) => {
                let reason = reason.as_deref().unwrap_or("not computed");
                writeln!(out, "n_s = unavailable ({reason})")?;
                writeln!(out, "r   = unavailable ({reason})")?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// Write a parameter-space table. Points without observables get NaN.
pub fn write_sweep<W: Write>(
    out: &mut W,
    metadata: &ReportMetadata,
    rows: &[SweepRow],
) -> ScalaronResult<()> {
    metadata.write_header(out, "Parameter Space")?;
    writeln!(out)?;
    writeln!(out, "{SWEEP_COLUMNS}")?;
    for row in rows {
        let (n_s, r) = row
            .observables
            .map_or((f64::NAN, f64::NAN), |o| (o.n_s, o.r));
        writeln!(
            out,
            "{:e} {:e} {:e} {:.6} {:.6}",
            row.alpha, row.beta, row.mu, n_s, r
        )?;
    }
    out.flush()?;
    Ok(())
}
