// ─────────────────────────────────────────────────────────────────────
// Scalaron — Integration Driver
// ─────────────────────────────────────────────────────────────────────
//! Runs the background equations through the inflation and reheating
//! phases and packages each run as a [`RunResult`].
//!
//! - Inflation starts at τ = 0 from Ξ = 1, Ψ = initial slope, Θ = 0, and
//!   stops early when ε1 reaches 1 ([`EndOfInflation`]).
//! - Reheating starts from a caller-supplied state and time and always
//!   runs to its horizon.
//!
//! Solver failures are outcomes, not errors: they come back as
//! [`RunStatus::Failed`] with whatever samples were reached. Only
//! configuration problems are returned as `Err`.

use std::sync::Arc;

use scalaron_physics::{
    epsilon_1, observables_at_crossing, DerivedQuantityPipeline, FieldEquationSystem,
    ModelParameters,
};
use scalaron_types::{
    Phase, PhaseConfig, RunResult, RunStatus, ScalaronError, ScalaronResult, SimulationConfig,
    StateVector, Trajectory,
};

use crate::grid::SampleGrid;
use crate::sink::{EventSink, LogSink};
use crate::solver::{Dopri5, SolveOutcome, SolverOptions, TerminationCondition};

/// Fires when ε1 = −Ψ/Ξ² reaches 1: kinetic energy overtakes the
/// potential and inflation ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndOfInflation;

impl TerminationCondition<3> for EndOfInflation {
    fn value(&self, _t: f64, y: &[f64; 3]) -> f64 {
        1.0 - epsilon_1(y[0], y[1])
    }

    fn name(&self) -> &str {
        "end of inflation"
    }
}

/// Lifecycle of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    NotStarted,
    Running,
    StoppedByEvent,
    StoppedAtHorizon,
    Failed,
}

impl DriverState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::StoppedByEvent | Self::StoppedAtHorizon | Self::Failed
        )
    }
}

/// Adaptive integration of the field equations, one phase per call.
///
/// Holds no model: each run takes the [`ModelParameters`] it integrates,
/// so one driver can serve many parameter points in sequence.
pub struct IntegrationDriver {
    config: SimulationConfig,
    sink: Arc<dyn EventSink>,
    state: DriverState,
}

impl IntegrationDriver {
    /// Validates `config`; an invalid configuration never starts a run.
    pub fn new(config: SimulationConfig, sink: Arc<dyn EventSink>) -> ScalaronResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sink,
            state: DriverState::NotStarted,
        })
    }

    /// Default configuration, reporting through the `log` facade.
    pub fn with_defaults() -> Self {
        Self {
            config: SimulationConfig::default(),
            sink: Arc::new(LogSink),
            state: DriverState::NotStarted,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Inflation with the configured phase settings.
    pub fn run_inflation(&mut self, model: &ModelParameters) -> ScalaronResult<RunResult> {
        let phase = self.config.inflation;
        self.run_inflation_with(model, &phase)
    }

    /// Inflation over `horizon_multiplier·τ1`, sampled every
    /// `τ1/sample_divisor`, terminated early at ε1 = 1.
    pub fn run_inflation_with(
        &mut self,
        model: &ModelParameters,
        phase: &PhaseConfig,
    ) -> ScalaronResult<RunResult> {
        phase.validate("inflation")?;
        let grid = SampleGrid::inflation(model, phase)?;
        let initial = StateVector::new(1.0, model.init_hubble_slope(), 0.0);
        self.integrate(
            Phase::Inflation,
            model,
            phase,
            &grid,
            initial,
            Some(&EndOfInflation),
        )
    }

    /// Reheating with the configured phase settings.
    pub fn run_reheating(
        &mut self,
        model: &ModelParameters,
        start_time: f64,
        initial: StateVector,
    ) -> ScalaronResult<RunResult> {
        let phase = self.config.reheating;
        self.run_reheating_with(model, start_time, initial, &phase)
    }

    /// Reheating from `(start_time, initial)` to the absolute horizon
    /// `horizon_multiplier·τ_osc`. No termination condition.
    pub fn run_reheating_with(
        &mut self,
        model: &ModelParameters,
        start_time: f64,
        initial: StateVector,
        phase: &PhaseConfig,
    ) -> ScalaronResult<RunResult> {
        phase.validate("reheating")?;
        let grid = SampleGrid::reheating(model, phase, start_time)?;
        self.integrate(Phase::Reheating, model, phase, &grid, initial, None)
    }

    /// Inflation, then reheating from the final inflation sample.
    ///
    /// Reheating is skipped (`None`) when inflation failed.
    pub fn run_inflation_then_reheating(
        &mut self,
        model: &ModelParameters,
    ) -> ScalaronResult<(RunResult, Option<RunResult>)> {
        let inflation = self.run_inflation(model)?;
        if inflation.status.is_failed() {
            self.sink
                .error("skipping reheating: inflation run did not complete");
            return Ok((inflation, None));
        }
        let (t_end, end_state) = inflation.end_state().ok_or_else(|| {
            ScalaronError::Solver("inflation produced no samples".to_string())
        })?;
        let reheating = self.run_reheating(model, t_end, end_state)?;
        Ok((inflation, Some(reheating)))
    }

    fn integrate(
        &mut self,
        phase: Phase,
        model: &ModelParameters,
        phase_config: &PhaseConfig,
        grid: &SampleGrid,
        initial: StateVector,
        condition: Option<&dyn TerminationCondition<3>>,
    ) -> ScalaronResult<RunResult> {
        let name = phase_name(phase);
        if model.e_folds() != self.config.e_folds {
            return Err(ScalaronError::Config(format!(
                "{name}: model built with Ne = {} but configuration expects Ne = {}",
                model.e_folds(),
                self.config.e_folds
            )));
        }
        if !initial.is_finite() || initial.xi == 0.0 {
            return Err(ScalaronError::Config(format!(
                "{name}: initial state must be finite with Xi != 0, got {initial:?}"
            )));
        }

        self.state = DriverState::Running;
        self.sink.info(&format!(
            "{name}: start t = {:.6}, [Xi, Psi, Theta] = [{:e}, {:e}, {:e}], horizon t = {:.6}, {} samples",
            grid.start(),
            initial.xi,
            initial.psi,
            initial.theta,
            grid.end(),
            grid.len()
        ));

        let system = FieldEquationSystem::new(model);
        if phase == Phase::Reheating {
            self.sink.info(&format!(
                "{name}: scalaron mass M/H0 = {:.6}",
                system.mass_ratio()
            ));
        }
        let options = SolverOptions {
            atol: phase_config.atol,
            rtol: phase_config.rtol,
            max_steps: self.config.max_steps,
        };
        let mut solver = Dopri5::new(&system, options);
        let solution = solver.solve(grid.start(), initial.to_array(), &grid.times(), condition);

        let (status, event_time) = match &solution.outcome {
            SolveOutcome::Completed => {
                self.state = DriverState::StoppedAtHorizon;
                self.sink
                    .info(&format!("{name}: reached horizon t = {:.6}", grid.end()));
                (RunStatus::Ok, None)
            }
            SolveOutcome::Terminated { t, .. } => {
                self.state = DriverState::StoppedByEvent;
                let label = condition.map_or("event", |c| c.name());
                self.sink
                    .info(&format!("{name}: {label} at t_e = {t:.6} (epsilon_1 = 1)"));
                (RunStatus::StoppedByEvent, Some(*t))
            }
            SolveOutcome::Failed { message, .. } => {
                self.state = DriverState::Failed;
                self.sink
                    .error(&format!("{name}: integration failed: {message}"));
                (RunStatus::Failed(message.clone()), None)
            }
        };
        self.sink.info(&format!(
            "{name}: {} accepted, {} rejected steps, {} evaluations",
            solution.accepted_steps, solution.rejected_steps, solution.evaluations
        ));

        let states = solution
            .states
            .into_iter()
            .map(StateVector::from_array)
            .collect();
        let trajectory = Trajectory::from_samples(solution.times, states)?;
        let derived =
            DerivedQuantityPipeline::new(*model, self.config.ricci_floor).evaluate(&trajectory);
        if derived.degenerate_count() > 0 {
            self.sink.info(&format!(
                "{name}: {} of {} samples degenerate",
                derived.degenerate_count(),
                derived.len()
            ));
        }

        let (observables, observables_error) = match phase {
            Phase::Inflation => match observables_at_crossing(&derived) {
                Ok(obs) => {
                    self.sink
                        .info(&format!("{name}: n_s = {:.4}, r = {:.4}", obs.n_s, obs.r));
                    (Some(obs), None)
                }
                Err(e) => {
                    self.sink.error(&format!("{name}: {e}"));
                    (None, Some(e.to_string()))
                }
            },
            Phase::Reheating => (None, None),
        };

        Ok(RunResult {
            phase,
            status,
            trajectory,
            derived,
            observables,
            observables_error,
            event_time,
        })
    }
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Inflation => "inflation",
        Phase::Reheating => "reheating",
    }
}
