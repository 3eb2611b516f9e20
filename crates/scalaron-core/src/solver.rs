// ─────────────────────────────────────────────────────────────────────
// Scalaron — Adaptive Dormand–Prince Integrator
// ─────────────────────────────────────────────────────────────────────
//! Explicit Runge–Kutta 5(4) with embedded error control, automatic
//! initial step, 4th-order continuous extension and terminal-event
//! location.
//!
//! The solver steps freely between output times. Samples are taken from
//! the dense output on a caller-supplied grid, so output spacing is
//! independent of the internal step size.

use scalaron_physics::OdeSystem;

// Butcher tableau.
const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];
const A: [[f64; 5]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
    ],
];
const B: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];
/// Difference between the 5th- and 4th-order weights (7 stages, FSAL).
const E: [f64; 7] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];
/// Continuous extension: y(t + θh) = y + h Σ_k K_k Σ_j P[k][j] θ^(j+1).
const P: [[f64; 4]; 7] = [
    [
        1.0,
        -8048581381.0 / 2820520608.0,
        8663915743.0 / 2820520608.0,
        -12715105075.0 / 11282082432.0,
    ],
    [0.0, 0.0, 0.0, 0.0],
    [
        0.0,
        131558114200.0 / 32700410799.0,
        -68118460800.0 / 10900136933.0,
        87487479700.0 / 32700410799.0,
    ],
    [
        0.0,
        -1754552775.0 / 470086768.0,
        14199869525.0 / 1410260304.0,
        -10690763975.0 / 1880347072.0,
    ],
    [
        0.0,
        127303824393.0 / 49829197408.0,
        -318862633887.0 / 49829197408.0,
        701980252875.0 / 199316789632.0,
    ],
    [
        0.0,
        -282668133.0 / 205662961.0,
        2019193451.0 / 616988883.0,
        -1453857185.0 / 822651844.0,
    ],
    [
        0.0,
        40617522.0 / 29380423.0,
        -110615467.0 / 29380423.0,
        69997945.0 / 29380423.0,
    ],
];

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
/// 1 / (error estimator order + 1).
const ERROR_EXPONENT: f64 = -1.0 / 5.0;
const BISECTION_LIMIT: usize = 200;

/// A scalar function of the state whose sign change marks an event.
///
/// Evaluated after every accepted step. A terminal condition stops the
/// integration at the located crossing.
pub trait TerminationCondition<const N: usize>: Send + Sync {
    fn value(&self, t: f64, y: &[f64; N]) -> f64;

    fn is_terminal(&self) -> bool {
        true
    }

    fn name(&self) -> &str;
}

/// Error-control and budget settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    pub atol: f64,
    pub rtol: f64,
    /// Cap on attempted steps; `None` relies on the finite horizon.
    pub max_steps: Option<u64>,
}

/// How a call to [`Dopri5::solve`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome<const N: usize> {
    /// Reached the final grid time.
    Completed,
    /// A terminal condition crossed at `t`.
    Terminated { t: f64, y: [f64; N] },
    /// Could not advance past `t`.
    Failed { t: f64, message: String },
}

/// Sampled solution plus integration statistics.
#[derive(Debug, Clone)]
pub struct Solution<const N: usize> {
    pub times: Vec<f64>,
    pub states: Vec<[f64; N]>,
    pub outcome: SolveOutcome<N>,
    pub accepted_steps: u64,
    pub rejected_steps: u64,
    pub evaluations: u64,
}

/// Polynomial interpolant over one accepted step.
struct DenseStep<const N: usize> {
    t_old: f64,
    h: f64,
    y_old: [f64; N],
    q: [[f64; 4]; N],
}

impl<const N: usize> DenseStep<N> {
    fn new(t_old: f64, h: f64, y_old: [f64; N], k: &[[f64; N]; 7]) -> Self {
        let mut q = [[0.0; 4]; N];
        for (i, qi) in q.iter_mut().enumerate() {
            for (j, qij) in qi.iter_mut().enumerate() {
                *qij = (0..7).map(|s| k[s][i] * P[s][j]).sum();
            }
        }
        Self { t_old, h, y_old, q }
    }

    fn eval(&self, t: f64) -> [f64; N] {
        let x = (t - self.t_old) / self.h;
        let powers = [x, x * x, x * x * x, x * x * x * x];
        let mut y = self.y_old;
        for (yi, qi) in y.iter_mut().zip(&self.q) {
            let poly: f64 = qi.iter().zip(&powers).map(|(a, p)| a * p).sum();
            *yi += self.h * poly;
        }
        y
    }
}

fn rms_norm<const N: usize>(v: &[f64; N]) -> f64 {
    (v.iter().map(|x| x * x).sum::<f64>() / N as f64).sqrt()
}

fn all_finite<const N: usize>(v: &[f64; N]) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Dormand–Prince 5(4) driver for an [`OdeSystem`].
pub struct Dopri5<'a, S, const N: usize> {
    system: &'a S,
    options: SolverOptions,
    evaluations: u64,
}

impl<'a, S: OdeSystem<N>, const N: usize> Dopri5<'a, S, N> {
    pub fn new(system: &'a S, options: SolverOptions) -> Self {
        Self {
            system,
            options,
            evaluations: 0,
        }
    }

    fn rhs(&mut self, t: f64, y: &[f64; N]) -> [f64; N] {
        self.evaluations += 1;
        self.system.rhs(t, y)
    }

    fn scale(&self, a: &[f64; N], b: &[f64; N]) -> [f64; N] {
        let mut s = [0.0; N];
        for i in 0..N {
            s[i] = self.options.atol + a[i].abs().max(b[i].abs()) * self.options.rtol;
        }
        s
    }

    /// Starting step from the local derivative scales.
    fn initial_step(&mut self, t0: f64, y0: &[f64; N], f0: &[f64; N], interval: f64) -> f64 {
        let scale = self.scale(y0, y0);
        let mut ys = [0.0; N];
        let mut fs = [0.0; N];
        for i in 0..N {
            ys[i] = y0[i] / scale[i];
            fs[i] = f0[i] / scale[i];
        }
        let d0 = rms_norm(&ys);
        let d1 = rms_norm(&fs);
        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };
        let h0 = h0.min(interval);

        let mut y1 = [0.0; N];
        for i in 0..N {
            y1[i] = y0[i] + h0 * f0[i];
        }
        let f1 = self.rhs(t0 + h0, &y1);
        let mut df = [0.0; N];
        for i in 0..N {
            df[i] = (f1[i] - f0[i]) / scale[i];
        }
        let d2 = rms_norm(&df) / h0;

        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(-ERROR_EXPONENT)
        };
        (100.0 * h0).min(h1).min(interval)
    }

    /// Integrate from `(t0, y0)` to the last entry of `grid`.
    ///
    /// `grid` must be sorted ascending with `grid[0] >= t0`. Grid times
    /// equal to `t0` receive `y0` verbatim. If `condition` fires, samples
    /// stop strictly before the crossing and the located crossing is
    /// appended as the final sample.
    pub fn solve(
        &mut self,
        t0: f64,
        y0: [f64; N],
        grid: &[f64],
        condition: Option<&dyn TerminationCondition<N>>,
    ) -> Solution<N> {
        let mut times = Vec::with_capacity(grid.len());
        let mut states = Vec::with_capacity(grid.len());
        let mut accepted = 0u64;
        let mut rejected = 0u64;

        let t_end = match grid.last() {
            Some(&t) => t,
            None => {
                return Solution {
                    times,
                    states,
                    outcome: SolveOutcome::Completed,
                    accepted_steps: 0,
                    rejected_steps: 0,
                    evaluations: self.evaluations,
                }
            }
        };

        let mut next = 0usize;
        while next < grid.len() && grid[next] <= t0 {
            if grid[next] == t0 {
                times.push(t0);
                states.push(y0);
            }
            next += 1;
        }

        let fail = |t: f64, message: String| SolveOutcome::Failed { t, message };

        if !all_finite(&y0) {
            let outcome = fail(t0, format!("non-finite initial state {y0:?}"));
            return self.finish(times, states, outcome, accepted, rejected);
        }

        let mut t = t0;
        let mut y = y0;
        let mut f = self.rhs(t, &y);
        if !all_finite(&f) {
            let outcome = fail(t, format!("non-finite derivative at t = {t}"));
            return self.finish(times, states, outcome, accepted, rejected);
        }
        let mut g_old = condition.map(|c| c.value(t, &y));
        let mut h = if t_end > t0 {
            self.initial_step(t, &y, &f, t_end - t0)
        } else {
            0.0
        };

        while t < t_end {
            let min_step = 10.0 * f64::EPSILON * t.abs().max(f64::MIN_POSITIVE);
            h = h.max(min_step);
            let mut step_rejected = false;

            // Attempt steps until one is accepted.
            let (t_new, y_new, k) = loop {
                if let Some(limit) = self.options.max_steps {
                    if accepted + rejected >= limit {
                        let outcome = fail(
                            t,
                            format!("maximum number of steps ({limit}) exceeded at t = {t}"),
                        );
                        return self.finish(times, states, outcome, accepted, rejected);
                    }
                }
                if h < min_step {
                    let outcome = fail(
                        t,
                        format!(
                            "required step size {h:e} is less than spacing between numbers at t = {t}"
                        ),
                    );
                    return self.finish(times, states, outcome, accepted, rejected);
                }

                let t_new = if t + h > t_end { t_end } else { t + h };
                let h_step = t_new - t;

                let mut k = [[0.0; N]; 7];
                k[0] = f;
                for s in 1..6 {
                    let mut ys = y;
                    for i in 0..N {
                        let mut acc = 0.0;
                        for j in 0..s {
                            acc += A[s][j] * k[j][i];
                        }
                        ys[i] += h_step * acc;
                    }
                    k[s] = self.rhs(t + C[s] * h_step, &ys);
                }
                let mut y_new = y;
                for i in 0..N {
                    let mut acc = 0.0;
                    for s in 0..6 {
                        acc += B[s] * k[s][i];
                    }
                    y_new[i] += h_step * acc;
                }
                k[6] = self.rhs(t_new, &y_new);

                let scale = self.scale(&y, &y_new);
                let mut err = [0.0; N];
                for i in 0..N {
                    let mut acc = 0.0;
                    for s in 0..7 {
                        acc += E[s] * k[s][i];
                    }
                    err[i] = h_step * acc / scale[i];
                }
                let err_norm = rms_norm(&err);

                if err_norm < 1.0 && all_finite(&y_new) && all_finite(&k[6]) {
                    let mut factor = if err_norm == 0.0 {
                        MAX_FACTOR
                    } else {
                        (SAFETY * err_norm.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
                    };
                    if step_rejected {
                        factor = factor.min(1.0);
                    }
                    h = h_step * factor;
                    accepted += 1;
                    break (t_new, y_new, k);
                }

                // NaN error norms shrink by the minimum factor.
                h = h_step * MIN_FACTOR.max(SAFETY * err_norm.powf(ERROR_EXPONENT));
                step_rejected = true;
                rejected += 1;
            };

            let dense = DenseStep::new(t, t_new - t, y, &k);

            // Terminal event inside this step?
            let mut crossing = None;
            if let (Some(cond), Some(g0)) = (condition, g_old) {
                let g1 = cond.value(t_new, &y_new);
                if (g0 > 0.0) != (g1 > 0.0) && cond.is_terminal() {
                    crossing = Some(locate(cond, &dense, t, g0, t_new, y_new));
                }
                g_old = Some(g1);
            }

            let sample_limit = crossing.map_or(t_new, |(tc, _)| tc);
            while next < grid.len() {
                let tg = grid[next];
                let inside = match crossing {
                    Some(_) => tg < sample_limit,
                    None => tg <= sample_limit,
                };
                if !inside {
                    break;
                }
                times.push(tg);
                states.push(if tg == t_new { y_new } else { dense.eval(tg) });
                next += 1;
            }

            if let Some((tc, yc)) = crossing {
                if times.last().map_or(true, |&last| tc > last) {
                    times.push(tc);
                    states.push(yc);
                }
                let outcome = SolveOutcome::Terminated { t: tc, y: yc };
                return self.finish(times, states, outcome, accepted, rejected);
            }

            t = t_new;
            y = y_new;
            f = k[6];
        }

        self.finish(times, states, SolveOutcome::Completed, accepted, rejected)
    }

    fn finish(
        &self,
        times: Vec<f64>,
        states: Vec<[f64; N]>,
        outcome: SolveOutcome<N>,
        accepted_steps: u64,
        rejected_steps: u64,
    ) -> Solution<N> {
        Solution {
            times,
            states,
            outcome,
            accepted_steps,
            rejected_steps,
            evaluations: self.evaluations,
        }
    }
}

/// Bisect the dense output for the sign change of `cond` in
/// `(t_lo, t_hi]`, returning the earliest bracket end on the far side.
fn locate<const N: usize>(
    cond: &dyn TerminationCondition<N>,
    dense: &DenseStep<N>,
    t_lo: f64,
    g_lo: f64,
    t_hi: f64,
    y_hi: [f64; N],
) -> (f64, [f64; N]) {
    let side = g_lo > 0.0;
    let (mut lo, mut hi, mut y_at_hi) = (t_lo, t_hi, y_hi);
    for _ in 0..BISECTION_LIMIT {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        let y_mid = dense.eval(mid);
        if (cond.value(mid, &y_mid) > 0.0) == side {
            lo = mid;
        } else {
            hi = mid;
            y_at_hi = y_mid;
        }
    }
    (hi, y_at_hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// dy/dt = −y.
    struct Decay;

    impl OdeSystem<1> for Decay {
        fn rhs(&self, _t: f64, y: &[f64; 1]) -> [f64; 1] {
            [-y[0]]
        }
    }

    /// x'' = −x as a first-order pair.
    struct Oscillator;

    impl OdeSystem<2> for Oscillator {
        fn rhs(&self, _t: f64, y: &[f64; 2]) -> [f64; 2] {
            [y[1], -y[0]]
        }
    }

    /// Fires when y drops to `level`.
    struct Below(f64);

    impl TerminationCondition<1> for Below {
        fn value(&self, _t: f64, y: &[f64; 1]) -> f64 {
            y[0] - self.0
        }

        fn name(&self) -> &str {
            "below"
        }
    }

    fn opts(tol: f64) -> SolverOptions {
        SolverOptions {
            atol: tol,
            rtol: tol,
            max_steps: None,
        }
    }

    fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| if i == n - 1 { b } else { a + (b - a) * i as f64 / (n - 1) as f64 })
            .collect()
    }

    #[test]
    fn test_exponential_decay_accuracy() {
        let mut solver = Dopri5::new(&Decay, opts(1e-12));
        let grid = linspace(0.0, 5.0, 11);
        let sol = solver.solve(0.0, [1.0], &grid, None);
        assert_eq!(sol.outcome, SolveOutcome::Completed);
        assert_eq!(sol.times, grid);
        for (t, y) in sol.times.iter().zip(&sol.states) {
            assert!((y[0] - (-t).exp()).abs() < 1e-9, "t = {t}: {} vs {}", y[0], (-t).exp());
        }
    }

    #[test]
    fn test_dense_output_between_steps() {
        // Many samples per step: accuracy comes from the interpolant.
        let mut solver = Dopri5::new(&Oscillator, opts(1e-10));
        let grid = linspace(0.0, 6.0, 601);
        let sol = solver.solve(0.0, [1.0, 0.0], &grid, None);
        assert!(sol.accepted_steps < 600);
        for (t, y) in sol.times.iter().zip(&sol.states) {
            assert!((y[0] - t.cos()).abs() < 1e-6, "t = {t}");
            assert!((y[1] + t.sin()).abs() < 1e-6, "t = {t}");
        }
    }

    #[test]
    fn test_grid_may_start_after_t0() {
        let mut solver = Dopri5::new(&Decay, opts(1e-10));
        let sol = solver.solve(0.0, [1.0], &[1.0, 2.0], None);
        assert_eq!(sol.times, vec![1.0, 2.0]);
        assert!((sol.states[0][0] - (-1.0f64).exp()).abs() < 1e-8);
    }

    #[test]
    fn test_terminal_event_located() {
        let mut solver = Dopri5::new(&Decay, opts(1e-12));
        let grid = linspace(0.0, 10.0, 11);
        let cond = Below(0.5);
        let sol = solver.solve(0.0, [1.0], &grid, Some(&cond));
        let expected = std::f64::consts::LN_2;
        match sol.outcome {
            SolveOutcome::Terminated { t, y } => {
                assert!((t - expected).abs() < 1e-9, "t = {t}");
                assert!(y[0] <= 0.5);
            }
            other => panic!("expected termination, got {other:?}"),
        }
        // Grid point 0.0 plus the crossing.
        assert_eq!(sol.times.len(), 2);
        assert_eq!(sol.times[0], 0.0);
        assert!(sol.states.last().unwrap()[0] <= 0.5);
    }

    #[test]
    fn test_max_steps_reported_as_failure() {
        let mut solver = Dopri5::new(
            &Oscillator,
            SolverOptions {
                atol: 1e-12,
                rtol: 1e-12,
                max_steps: Some(5),
            },
        );
        let sol = solver.solve(0.0, [1.0, 0.0], &[0.0, 100.0], None);
        match sol.outcome {
            SolveOutcome::Failed { message, .. } => {
                assert!(message.contains("maximum number of steps"), "{message}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(sol.times, vec![0.0]);
    }

    #[test]
    fn test_non_finite_initial_state_fails() {
        let mut solver = Dopri5::new(&Decay, opts(1e-10));
        let sol = solver.solve(0.0, [f64::NAN], &[0.0, 1.0], None);
        assert!(matches!(sol.outcome, SolveOutcome::Failed { .. }));
    }

    #[test]
    fn test_empty_grid() {
        let mut solver = Dopri5::new(&Decay, opts(1e-10));
        let sol = solver.solve(0.0, [1.0], &[], None);
        assert!(sol.times.is_empty());
        assert_eq!(sol.outcome, SolveOutcome::Completed);
    }
}
