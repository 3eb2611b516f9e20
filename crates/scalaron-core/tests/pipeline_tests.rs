//! End-to-end runs of the inflation/reheating pipeline on the reference
//! parameter set (α = 2.572e8, β = 1.25e6, μ = 1e-4, E = 1e13, ω = 1/3).
//!
//! Reheating runs use shortened horizons so the suite stays fast.

use std::sync::Arc;

use scalaron_core::{
    write_run, IntegrationDriver, MemorySink, NullSink, ParameterSweep, ReportMetadata,
    SampleGrid, SinkLevel, RUN_COLUMNS,
};
use scalaron_physics::{
    epsilon_1, ricci, AnalyticBackground, FieldEquationSystem, ModelParameters, PhysicalConstants,
};
use scalaron_types::{
    Phase, PhaseConfig, RunStatus, ScalaronError, SimulationConfig, StateVector,
};

fn reference() -> ModelParameters {
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

fn default_driver() -> IntegrationDriver {
    IntegrationDriver::new(SimulationConfig::default(), Arc::new(NullSink)).unwrap()
}

fn short_reheating() -> PhaseConfig {
    PhaseConfig {
        horizon_multiplier: 2e-4,
        sample_divisor: 1e5,
        ..PhaseConfig::reheating()
    }
}

// ── Inflation ───────────────────────────────────────────────────────

#[test]
fn test_inflation_stops_when_epsilon_reaches_one() {
    let m = reference();
    let run = default_driver().run_inflation(&m).unwrap();

    assert_eq!(run.phase, Phase::Inflation);
    assert_eq!(run.status, RunStatus::StoppedByEvent);
    let (t_last, last) = run.trajectory.last().unwrap();
    assert!(epsilon_1(last.xi, last.psi) >= 1.0);
    assert_eq!(run.event_time, Some(t_last));
    assert!(t_last < 50.0 * m.timescales().tau_1);
}

#[test]
fn test_inflation_times_start_at_zero_and_increase() {
    let run = default_driver().run_inflation(&reference()).unwrap();
    let times = run.trajectory.times();
    assert_eq!(times[0], 0.0);
    assert!(times.windows(2).all(|w| w[1] > w[0]));
    let (_, first) = run.trajectory.first().unwrap();
    assert_eq!(first.xi, 1.0);
    assert_eq!(first.psi, reference().init_hubble_slope());
    assert_eq!(first.theta, 0.0);
}

#[test]
fn test_reference_observables_in_viable_window() {
    let run = default_driver().run_inflation(&reference()).unwrap();
    let obs = run.observables.expect("observables at crossing");
    assert!((0.9..=1.0).contains(&obs.n_s), "n_s = {}", obs.n_s);
    assert!((0.0..=0.01).contains(&obs.r), "r = {}", obs.r);
    assert!(run.observables_error.is_none());
}

#[test]
fn test_ricci_round_trip_on_run() {
    let mut config = SimulationConfig::default();
    config.inflation.sample_divisor = 5000.0;
    let mut driver = IntegrationDriver::new(config, Arc::new(NullSink)).unwrap();
    let run = driver.run_inflation(&reference()).unwrap();
    assert_eq!(run.derived.len(), run.trajectory.len());
    for (i, (_, s)) in run.trajectory.iter().enumerate() {
        assert_eq!(run.derived.ricci[i], ricci(s.xi, s.psi));
    }
}

#[test]
fn test_numerical_background_tracks_slow_roll_solution() {
    let m = reference();
    let bg = AnalyticBackground::new(&m);
    let mut config = SimulationConfig::default();
    config.inflation.sample_divisor = 5000.0;
    let mut driver = IntegrationDriver::new(config, Arc::new(NullSink)).unwrap();
    let run = driver.run_inflation(&m).unwrap();

    let t_end = bg.end_of_inflation();
    let mut checked = 0;
    for (t, s) in run.trajectory.iter().filter(|(t, _)| *t < 0.5 * t_end) {
        let expected = bg.xi(t);
        assert!(
            (s.xi - expected).abs() / expected < 0.05,
            "t = {t}: Xi = {}, slow-roll {expected}",
            s.xi
        );
        checked += 1;
    }
    assert!(checked > 10, "only {checked} samples compared");

    let te = run.event_time.unwrap();
    assert!((te - t_end).abs() / t_end < 0.15, "t_e = {te}, slow-roll {t_end}");
    assert!(te < bg.zero_crossing(), "t_e = {te}, H = 0 at {}", bg.zero_crossing());
}

#[test]
fn test_numerical_e_folds_track_slow_roll_count() {
    let m = reference();
    let bg = AnalyticBackground::new(&m);
    let mut config = SimulationConfig::default();
    config.inflation.sample_divisor = 5000.0;
    let mut driver = IntegrationDriver::new(config, Arc::new(NullSink)).unwrap();
    let run = driver.run_inflation(&m).unwrap();

    // Trapezoidal ∫Ξ dτ over the first half of inflation.
    let limit = 0.5 * bg.end_of_inflation();
    let samples: Vec<(f64, f64)> = run
        .trajectory
        .iter()
        .take_while(|(t, _)| *t <= limit)
        .map(|(t, s)| (t, s.xi))
        .collect();
    let numeric: f64 = samples
        .windows(2)
        .map(|w| 0.5 * (w[0].1 + w[1].1) * (w[1].0 - w[0].0))
        .sum();
    let t_last = samples.last().unwrap().0;
    let analytic = bg.e_folds_until(t_last);
    assert!(analytic > 0.0);
    assert!(
        (numeric - analytic).abs() / analytic < 0.05,
        "numeric {numeric}, slow-roll {analytic}"
    );
}

// ── Reheating ───────────────────────────────────────────────────────

#[test]
fn test_reheating_reaches_horizon_with_configured_count() {
    let m = reference();
    let phase = short_reheating();
    let start = 10.0;
    let grid = SampleGrid::reheating(&m, &phase, start).unwrap();

    let mut driver = default_driver();
    let initial = StateVector::new(1.0, m.init_hubble_slope(), 0.0);
    let run = driver.run_reheating_with(&m, start, initial, &phase).unwrap();

    assert_eq!(run.phase, Phase::Reheating);
    assert_eq!(run.status, RunStatus::Ok);
    assert_eq!(run.trajectory.len(), grid.len());
    assert_eq!(run.trajectory.times()[0], start);
    assert_eq!(run.trajectory.last().unwrap().0, grid.end());
    assert!(run.trajectory.times().windows(2).all(|w| w[1] > w[0]));
    assert!(run.observables.is_none());
}

#[test]
fn test_reheating_continues_from_inflation_end() {
    let mut config = SimulationConfig::default();
    config.reheating.horizon_multiplier = 1e-3;
    config.reheating.sample_divisor = 1e5;
    let mut driver = IntegrationDriver::new(config, Arc::new(NullSink)).unwrap();

    let (inflation, reheating) = driver.run_inflation_then_reheating(&reference()).unwrap();
    let reheating = reheating.expect("inflation completed");
    let (t_e, end) = inflation.end_state().unwrap();
    let (t0, first) = reheating.trajectory.first().unwrap();
    assert_eq!(t0, t_e);
    assert_eq!(first, end);
    assert_ne!(reheating.status, RunStatus::StoppedByEvent);
}

#[test]
fn test_reheating_start_past_horizon_is_config_error() {
    let m = reference();
    let mut driver = default_driver();
    let err = driver
        .run_reheating_with(&m, 1e9, StateVector::new(0.1, -0.01, 0.0), &short_reheating())
        .unwrap_err();
    assert!(matches!(err, ScalaronError::Config(_)), "{err}");
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_invalid_model_never_runs() {
    let c = PhysicalConstants::codata();
    assert!(matches!(
        ModelParameters::new(&c, -1.0, 1.25e6, 1e-4, 1e13, 1.0 / 3.0),
        Err(ScalaronError::Config(_))
    ));
    assert!(matches!(
        ModelParameters::new(&c, 2.572e8, 1.25e6, 0.0, 1e13, 1.0 / 3.0),
        Err(ScalaronError::Config(_))
    ));
}

#[test]
fn test_config_from_json_drives_run() {
    let config = SimulationConfig::from_json(
        r#"{"inflation": {"horizon_multiplier": 0.005, "sample_divisor": 5000.0,
                          "atol": 1e-15, "rtol": 1e-13}}"#,
    )
    .unwrap();
    let mut driver = IntegrationDriver::new(config, Arc::new(NullSink)).unwrap();
    let run = driver.run_inflation(&reference()).unwrap();
    assert_eq!(run.status, RunStatus::Ok);
    assert_eq!(run.trajectory.len(), 25);
}

// ── Event reporting ─────────────────────────────────────────────────

#[test]
fn test_sink_receives_run_events() {
    let sink = Arc::new(MemorySink::new());
    let mut driver = IntegrationDriver::new(SimulationConfig::default(), sink.clone()).unwrap();
    driver.run_inflation(&reference()).unwrap();

    let infos = sink.messages(SinkLevel::Info);
    assert!(infos[0].starts_with("inflation: start t = 0"), "{}", infos[0]);
    assert!(infos.iter().any(|m| m.contains("end of inflation at t_e =")));
    assert!(infos.iter().any(|m| m.contains("n_s =")));
    assert!(sink.messages(SinkLevel::Error).is_empty());
}

#[test]
fn test_reheating_reports_scalaron_mass() {
    let m = reference();
    let sink = Arc::new(MemorySink::new());
    let mut driver = IntegrationDriver::new(SimulationConfig::default(), sink.clone()).unwrap();
    let initial = StateVector::new(1.0, m.init_hubble_slope(), 0.0);
    driver
        .run_reheating_with(&m, 10.0, initial, &short_reheating())
        .unwrap();

    let expected = FieldEquationSystem::new(&m).mass_ratio();
    let line = format!("reheating: scalaron mass M/H0 = {expected:.6}");
    assert!(sink.messages(SinkLevel::Info).contains(&line), "{line}");
    // M² = 1/(6α) in Planck units.
    let direct = 1.0 / (m.h0() * (6.0 * m.alpha()).sqrt());
    assert!((expected - direct).abs() / direct < 1e-12);
}

#[test]
fn test_e_folds_must_match_model() {
    let config = SimulationConfig::from_json(r#"{"e_folds": 30.0}"#).unwrap();
    let mut driver = IntegrationDriver::new(config, Arc::new(NullSink)).unwrap();
    assert!(matches!(
        driver.run_inflation(&reference()),
        Err(ScalaronError::Config(_))
    ));
}

#[test]
fn test_huge_sample_divisor_rejected_before_allocation() {
    let phase = PhaseConfig {
        sample_divisor: 1e18,
        ..PhaseConfig::inflation()
    };
    let err = default_driver()
        .run_inflation_with(&reference(), &phase)
        .unwrap_err();
    assert!(matches!(err, ScalaronError::Config(_)), "{err}");
}

// ── Reports and sweeps ──────────────────────────────────────────────

#[test]
fn test_report_for_reference_run() {
    let m = reference();
    let run = default_driver().run_inflation(&m).unwrap();
    let mut buf = Vec::new();
    write_run(&mut buf, &ReportMetadata::default(), &m, &run).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let header = text.lines().position(|l| l == RUN_COLUMNS).unwrap();
    let rows = text
        .lines()
        .skip(header + 1)
        .take_while(|l| !l.is_empty())
        .count();
    assert_eq!(rows, run.trajectory.len());
    assert!(text.lines().any(|l| l.starts_with("n_s = 0.9")), "{text}");
}

#[test]
fn test_parallel_sweep_matches_sequential_runs() {
    let sweep = ParameterSweep::over_beta(2.572e8, 1e-4, 1e13, 1.0 / 3.0).with_indices(1..=2);
    let rows = sweep.run(Arc::new(NullSink));
    let c = PhysicalConstants::codata();
    for row in &rows {
        let m = ModelParameters::new(&c, row.alpha, row.beta, row.mu, 1e13, 1.0 / 3.0).unwrap();
        let run = default_driver().run_inflation(&m).unwrap();
        assert_eq!(row.observables, run.observables);
        assert_eq!(row.status.as_ref(), Some(&run.status));
    }
}

#[test]
fn test_sweep_rows_serialize() {
    let sweep = ParameterSweep::over_beta(2.572e8, 1e-4, 1e13, 1.0 / 3.0).with_indices(1..=1);
    let rows = sweep.run(Arc::new(NullSink));
    let json = serde_json::to_string(&rows).unwrap();
    let back: Vec<scalaron_core::SweepRow> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, rows);
}
