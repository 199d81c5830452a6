//! task_optimizer::line_search — reverse-communication line searches.
//!
//! Purpose
//! -------
//! Choose a step length `α` along a descent direction `d` for the function
//! `φ(α) = f(x₀ + α·d)` without ever calling the objective: the caller starts
//! a search with `φ(0)` and `φ'(0)`, evaluates `φ` at the trial step reported
//! by [`LineSearch::step`], and feeds the value back through
//! [`LineSearch::iterate`] until the search converges or fails.
//!
//! Key behaviors
//! -------------
//! - `Quadratic`: Armijo test with safeguarded quadratic backtracking
//!   (new step kept inside `[0.1·α, 0.5·α]`).
//! - `Armijo`: Armijo test with step halving.
//! - `Cubic`: Moré–Thuente search enforcing the strong Wolfe conditions
//!   with bracketing and cubic/quadratic safeguarded interpolation.
//! - `Nonmonotone`: Armijo test against the maximum of the last `W` accepted
//!   function values (Grippo–Lampariello–Lucidi), quadratic backtracking.
//!
//! Invariants & assumptions
//! ------------------------
//! - A search may only start from a descent direction (`φ'(0) < 0`);
//!   otherwise [`OptError::NotDescentDirection`] is returned and the caller
//!   is expected to restart with another direction.
//! - Every trial step stays inside `[stpmin, stpmax]`.
//! - The search never evaluates anything itself; it is a pure state machine.
//!
//! Conventions
//! -----------
//! - `Converged` and `Warning` both mean the current trial step is
//!   acceptable. `Warning` is only reported when sufficient decrease holds
//!   but a secondary test (curvature, interval width) could not be met.
//! - `Failure` means no acceptable step can be produced; [`LineSearch::reason`]
//!   explains why.
use std::collections::VecDeque;

use crate::optimization::{
    errors::{OptError, OptResult},
    task_optimizer::{
        traits::{LineSearchKind, SolverConfig},
        types::Real,
    },
};

/// Outcome of one line-search step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearchStatus {
    /// Evaluate `φ` at [`LineSearch::step`] and call `iterate` again.
    Search,
    /// The current step satisfies the acceptance conditions.
    Converged,
    /// The current step is acceptable but a secondary test failed.
    Warning,
    /// No acceptable step can be found.
    Failure,
}

/// Reverse-communication line search; see the module documentation.
#[derive(Debug, Clone)]
pub struct LineSearch<F> {
    kind: LineSearchKind,
    sftol: F,
    sgtol: F,
    sxtol: F,
    max_backtracks: Option<usize>,
    window: usize,
    history: VecDeque<F>,
    f0: F,
    dg0: F,
    fref: F,
    stp: F,
    stpmin: F,
    stpmax: F,
    trials: usize,
    status: LineSearchStatus,
    reason: &'static str,
    mt: MoreThuente<F>,
}

impl<F: Real> LineSearch<F> {
    /// Build a line search from the optimizer configuration.
    pub fn new(config: &SolverConfig<F>) -> Self {
        Self {
            kind: config.line_search,
            sftol: config.sftol,
            sgtol: config.effective_sgtol(),
            sxtol: config.sxtol,
            max_backtracks: config.max_backtracks,
            window: config.nonmonotone_window,
            history: VecDeque::with_capacity(config.nonmonotone_window),
            f0: F::zero(),
            dg0: F::zero(),
            fref: F::zero(),
            stp: F::zero(),
            stpmin: F::zero(),
            stpmax: F::infinity(),
            trials: 0,
            status: LineSearchStatus::Converged,
            reason: "",
            mt: MoreThuente::new(),
        }
    }

    /// Trial step to evaluate next (or the accepted step once finished).
    pub fn step(&self) -> F {
        self.stp
    }

    /// Explanation attached to the last `Warning` or `Failure`.
    pub fn reason(&self) -> &'static str {
        self.reason
    }

    /// `true` when the cubic search stopped because rounding errors prevent
    /// further progress inside the bracket.
    pub fn hit_rounding_errors(&self) -> bool {
        matches!(self.status, LineSearchStatus::Warning | LineSearchStatus::Failure)
            && self.reason == ROUNDING_ERRORS
    }

    /// Collapse the Moré–Thuente bracket onto the current trial step so the
    /// next `iterate` reports rounding errors.
    #[cfg(test)]
    pub(crate) fn collapse_bracket(&mut self) {
        self.mt.brackt = true;
        self.mt.stmin = F::zero();
        self.mt.stmax = self.stp;
    }

    /// Record the function value at a newly accepted iterate. Only the
    /// nonmonotone search keeps a history; the others ignore the call.
    pub fn record_accepted(&mut self, f: F) {
        if self.kind != LineSearchKind::Nonmonotone {
            return;
        }
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(f);
    }

    /// Start a new search.
    ///
    /// Parameters
    /// ----------
    /// - `f0`, `dg0`: `φ(0)` and `φ'(0)`.
    /// - `stp`: first trial step, clamped into `[stpmin, stpmax]`.
    /// - `stpmin`, `stpmax`: admissible step range, `0 <= stpmin <= stpmax`.
    ///
    /// # Errors
    /// - [`OptError::NotDescentDirection`] if `dg0 >= 0`.
    /// - [`OptError::LineSearchFailure`] if the step range is empty or the
    ///   first step is not positive.
    pub fn start(&mut self, f0: F, dg0: F, stp: F, stpmin: F, stpmax: F) -> OptResult<F> {
        if !(dg0 < F::zero()) {
            return Err(OptError::NotDescentDirection { slope: dg0.as_f64() });
        }
        if !(stpmin >= F::zero()) || !(stpmax >= stpmin) || !(stp > F::zero()) {
            return Err(OptError::LineSearchFailure {
                step: stp.as_f64(),
                reason: "invalid step bounds",
            });
        }
        self.f0 = f0;
        self.dg0 = dg0;
        self.stpmin = stpmin;
        self.stpmax = stpmax;
        self.stp = stp.max(stpmin).min(stpmax);
        self.trials = 0;
        self.reason = "";
        self.status = LineSearchStatus::Search;
        self.fref = match self.kind {
            LineSearchKind::Nonmonotone => {
                self.history.iter().fold(f0, |acc, &v| if v > acc { v } else { acc })
            }
            _ => f0,
        };
        if self.kind == LineSearchKind::Cubic {
            self.mt.start(f0, dg0, self.stp, stpmin, stpmax);
        }
        Ok(self.stp)
    }

    /// Feed `φ(stp)` (and `φ'(stp)` for the cubic search) back into the
    /// search. On `Search`, [`LineSearch::step`] holds the next trial.
    pub fn iterate(&mut self, f: F, dg: F) -> LineSearchStatus {
        if self.status != LineSearchStatus::Search {
            return self.status;
        }
        self.trials += 1;
        self.status = match self.kind {
            LineSearchKind::Cubic => self.iterate_cubic(f, dg),
            _ => self.iterate_backtracking(f),
        };
        self.status
    }

    fn iterate_backtracking(&mut self, f: F) -> LineSearchStatus {
        if f <= self.fref + self.sftol * self.stp * self.dg0 {
            return LineSearchStatus::Converged;
        }
        if let Some(limit) = self.max_backtracks {
            if self.trials >= limit {
                return self.fail("too many backtracking steps");
            }
        }
        let half = F::lit(0.5);
        let next = match self.kind {
            LineSearchKind::Armijo => half * self.stp,
            _ => {
                let lo = F::lit(0.1) * self.stp;
                let hi = half * self.stp;
                // Minimizer of the quadratic through φ(0), φ'(0), and φ(stp).
                let curvature = f - self.f0 - self.dg0 * self.stp;
                let q = if curvature > F::zero() {
                    -self.dg0 * self.stp * self.stp / (F::lit(2.0) * curvature)
                } else {
                    hi
                };
                if q.is_finite() { q.max(lo).min(hi) } else { hi }
            }
        };
        if next < self.stpmin {
            return self.fail("step is below the minimum step");
        }
        self.stp = next;
        LineSearchStatus::Search
    }

    fn iterate_cubic(&mut self, f: F, dg: F) -> LineSearchStatus {
        let ftest = self.f0 + self.stp * self.sftol * self.dg0;
        let sufficient = f <= ftest;
        match self.mt.iterate(&mut self.stp, f, dg, self.sftol, self.sgtol, self.sxtol) {
            MtOutcome::Converged => LineSearchStatus::Converged,
            MtOutcome::Warning(reason) => {
                self.reason = reason;
                if sufficient {
                    LineSearchStatus::Warning
                } else {
                    LineSearchStatus::Failure
                }
            }
            MtOutcome::Search => {
                if let Some(limit) = self.max_backtracks {
                    if self.trials >= limit {
                        return self.fail("too many line-search trials");
                    }
                }
                LineSearchStatus::Search
            }
        }
    }

    fn fail(&mut self, reason: &'static str) -> LineSearchStatus {
        self.reason = reason;
        LineSearchStatus::Failure
    }
}

// ---- Moré–Thuente ----

enum MtOutcome {
    Search,
    Converged,
    Warning(&'static str),
}

const ROUNDING_ERRORS: &str = "rounding errors prevent progress";
const XTRAPL: f64 = 1.1;
const XTRAPU: f64 = 4.0;

/// State of the Moré–Thuente search (`dcsrch`).
#[derive(Debug, Clone)]
struct MoreThuente<F> {
    brackt: bool,
    stage: u8,
    finit: F,
    ginit: F,
    stx: F,
    fx: F,
    gx: F,
    sty: F,
    fy: F,
    gy: F,
    stmin: F,
    stmax: F,
    stpmin: F,
    stpmax: F,
    width: F,
    width1: F,
}

impl<F: Real> MoreThuente<F> {
    fn new() -> Self {
        let zero = F::zero();
        Self {
            brackt: false,
            stage: 1,
            finit: zero,
            ginit: zero,
            stx: zero,
            fx: zero,
            gx: zero,
            sty: zero,
            fy: zero,
            gy: zero,
            stmin: zero,
            stmax: zero,
            stpmin: zero,
            stpmax: zero,
            width: zero,
            width1: zero,
        }
    }

    fn start(&mut self, f: F, g: F, stp: F, stpmin: F, stpmax: F) {
        self.brackt = false;
        self.stage = 1;
        self.finit = f;
        self.ginit = g;
        self.stpmin = stpmin;
        self.stpmax = stpmax;
        self.width = stpmax - stpmin;
        self.width1 = F::lit(2.0) * self.width;
        self.stx = F::zero();
        self.fx = f;
        self.gx = g;
        self.sty = F::zero();
        self.fy = f;
        self.gy = g;
        self.stmin = F::zero();
        self.stmax = stp + F::lit(XTRAPU) * stp;
    }

    fn iterate(&mut self, stp: &mut F, f: F, g: F, ftol: F, gtol: F, xtol: F) -> MtOutcome {
        let gtest = ftol * self.ginit;
        let ftest = self.finit + *stp * gtest;

        if self.stage == 1 && f <= ftest && g >= F::zero() {
            self.stage = 2;
        }

        // Convergence first, then the warnings.
        if f <= ftest && g.abs() <= gtol * (-self.ginit) {
            return MtOutcome::Converged;
        }
        if self.brackt && (*stp <= self.stmin || *stp >= self.stmax) {
            return MtOutcome::Warning(ROUNDING_ERRORS);
        }
        if self.brackt && self.stmax - self.stmin <= xtol * self.stmax {
            return MtOutcome::Warning("xtol test satisfied");
        }
        if *stp == self.stpmax && f <= ftest && g <= gtest {
            return MtOutcome::Warning("step is at the maximum step");
        }
        if *stp == self.stpmin && (f > ftest || g >= gtest) {
            return MtOutcome::Warning("step is at the minimum step");
        }

        let mut step = *stp;
        if self.stage == 1 && f <= self.fx && f > ftest {
            // Modified function ψ(α) = φ(α) - φ(0) - α·gtest.
            let mut fxm = self.fx - self.stx * gtest;
            let mut fym = self.fy - self.sty * gtest;
            let mut gxm = self.gx - gtest;
            let mut gym = self.gy - gtest;
            let fm = f - step * gtest;
            let gm = g - gtest;
            dcstep(
                &mut self.stx,
                &mut fxm,
                &mut gxm,
                &mut self.sty,
                &mut fym,
                &mut gym,
                &mut step,
                fm,
                gm,
                &mut self.brackt,
                self.stmin,
                self.stmax,
            );
            self.fx = fxm + self.stx * gtest;
            self.fy = fym + self.sty * gtest;
            self.gx = gxm + gtest;
            self.gy = gym + gtest;
        } else {
            dcstep(
                &mut self.stx,
                &mut self.fx,
                &mut self.gx,
                &mut self.sty,
                &mut self.fy,
                &mut self.gy,
                &mut step,
                f,
                g,
                &mut self.brackt,
                self.stmin,
                self.stmax,
            );
        }

        if self.brackt {
            if (self.sty - self.stx).abs() >= F::lit(0.66) * self.width1 {
                step = self.stx + F::lit(0.5) * (self.sty - self.stx);
            }
            self.width1 = self.width;
            self.width = (self.sty - self.stx).abs();
        }

        if self.brackt {
            self.stmin = self.stx.min(self.sty);
            self.stmax = self.stx.max(self.sty);
        } else {
            self.stmin = step + F::lit(XTRAPL) * (step - self.stx);
            self.stmax = step + F::lit(XTRAPU) * (step - self.stx);
        }

        step = step.max(self.stpmin).min(self.stpmax);

        if (self.brackt && (step <= self.stmin || step >= self.stmax))
            || (self.brackt && self.stmax - self.stmin <= xtol * self.stmax)
        {
            step = self.stx;
        }
        *stp = step;
        MtOutcome::Search
    }
}

/// Safeguarded step of the Moré–Thuente search.
///
/// Updates the interval `[stx, sty]` that contains a step satisfying the
/// sufficient decrease and curvature conditions and computes the next trial
/// step `stp` from the cubic and quadratic (secant) interpolants.
#[allow(clippy::too_many_arguments)]
fn dcstep<F: Real>(
    stx: &mut F, fx: &mut F, dx: &mut F, sty: &mut F, fy: &mut F, dy: &mut F, stp: &mut F,
    fp: F, dp: F, brackt: &mut bool, stpmin: F, stpmax: F,
) {
    let two = F::lit(2.0);
    let three = F::lit(3.0);
    let p66 = F::lit(0.66);
    let sgnd = dp * (*dx / dx.abs());

    let stpf;
    if fp > *fx {
        // Case 1: higher function value, the minimum is bracketed.
        let theta = three * (*fx - fp) / (*stp - *stx) + *dx + dp;
        let s = theta.abs().max(dx.abs()).max(dp.abs());
        let mut gamma = s * ((theta / s).powi(2) - (*dx / s) * (dp / s)).sqrt();
        if *stp < *stx {
            gamma = -gamma;
        }
        let p = (gamma - *dx) + theta;
        let q = ((gamma - *dx) + gamma) + dp;
        let r = p / q;
        let stpc = *stx + r * (*stp - *stx);
        let stpq = *stx + ((*dx / ((*fx - fp) / (*stp - *stx) + *dx)) / two) * (*stp - *stx);
        stpf = if (stpc - *stx).abs() < (stpq - *stx).abs() {
            stpc
        } else {
            stpc + (stpq - stpc) / two
        };
        *brackt = true;
    } else if sgnd < F::zero() {
        // Case 2: lower value, derivatives of opposite sign.
        let theta = three * (*fx - fp) / (*stp - *stx) + *dx + dp;
        let s = theta.abs().max(dx.abs()).max(dp.abs());
        let mut gamma = s * ((theta / s).powi(2) - (*dx / s) * (dp / s)).sqrt();
        if *stp > *stx {
            gamma = -gamma;
        }
        let p = (gamma - dp) + theta;
        let q = ((gamma - dp) + gamma) + *dx;
        let r = p / q;
        let stpc = *stp + r * (*stx - *stp);
        let stpq = *stp + (dp / (dp - *dx)) * (*stx - *stp);
        stpf = if (stpc - *stp).abs() > (stpq - *stp).abs() { stpc } else { stpq };
        *brackt = true;
    } else if dp.abs() < dx.abs() {
        // Case 3: lower value, same sign, derivative decreases in magnitude.
        let theta = three * (*fx - fp) / (*stp - *stx) + *dx + dp;
        let s = theta.abs().max(dx.abs()).max(dp.abs());
        let mut gamma = s * F::zero().max((theta / s).powi(2) - (*dx / s) * (dp / s)).sqrt();
        if *stp > *stx {
            gamma = -gamma;
        }
        let p = (gamma - dp) + theta;
        let q = (gamma + (*dx - dp)) + gamma;
        let r = p / q;
        let stpc = if r < F::zero() && gamma != F::zero() {
            *stp + r * (*stx - *stp)
        } else if *stp > *stx {
            stpmax
        } else {
            stpmin
        };
        let stpq = *stp + (dp / (dp - *dx)) * (*stx - *stp);
        if *brackt {
            let candidate = if (stpc - *stp).abs() < (stpq - *stp).abs() { stpc } else { stpq };
            let limit = *stp + p66 * (*sty - *stp);
            stpf = if *stp > *stx { candidate.min(limit) } else { candidate.max(limit) };
        } else {
            let candidate = if (stpc - *stp).abs() > (stpq - *stp).abs() { stpc } else { stpq };
            stpf = candidate.min(stpmax).max(stpmin);
        }
    } else {
        // Case 4: lower value, same sign, derivative does not decrease.
        stpf = if *brackt {
            let theta = three * (fp - *fy) / (*sty - *stp) + *dy + dp;
            let s = theta.abs().max(dy.abs()).max(dp.abs());
            let mut gamma = s * ((theta / s).powi(2) - (*dy / s) * (dp / s)).sqrt();
            if *stp > *sty {
                gamma = -gamma;
            }
            let p = (gamma - dp) + theta;
            let q = ((gamma - dp) + gamma) + *dy;
            let r = p / q;
            *stp + r * (*sty - *stp)
        } else if *stp > *stx {
            stpmax
        } else {
            stpmin
        };
    }

    if fp > *fx {
        *sty = *stp;
        *fy = fp;
        *dy = dp;
    } else {
        if sgnd < F::zero() {
            *sty = *stx;
            *fy = *fx;
            *dy = *dx;
        }
        *stx = *stp;
        *fx = fp;
        *dx = dp;
    }
    *stp = stpf;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Acceptance and backtracking of the Armijo-type searches.
    // - Moré–Thuente convergence on a one-dimensional quadratic.
    // - Nonmonotone reference values and failure reporting.
    //
    // They intentionally DO NOT cover:
    // - Interaction with direction engines (see `optimizer`).
    // -------------------------------------------------------------------------

    fn config(kind: LineSearchKind) -> SolverConfig<f64> {
        SolverConfig::default().with_line_search(kind)
    }

    /// φ(α) = (α - 1)², φ'(α) = 2(α - 1): minimum at α = 1.
    fn phi(alpha: f64) -> (f64, f64) {
        ((alpha - 1.0).powi(2), 2.0 * (alpha - 1.0))
    }

    fn run(ls: &mut LineSearch<f64>, stp0: f64) -> (LineSearchStatus, usize) {
        let (f0, g0) = phi(0.0);
        ls.start(f0, g0, stp0, 1e-20, 1e20).expect("start should succeed");
        let mut trials = 0;
        loop {
            let (f, g) = phi(ls.step());
            trials += 1;
            let status = ls.iterate(f, g);
            if status != LineSearchStatus::Search || trials > 100 {
                return (status, trials);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Starting from a non-descent direction is rejected.
    //
    // Given
    // -----
    // - φ'(0) = +1.
    //
    // Expect
    // ------
    // - `NotDescentDirection`.
    fn start_rejects_non_descent_direction() {
        let mut ls = LineSearch::new(&config(LineSearchKind::Quadratic));
        assert!(matches!(
            ls.start(1.0, 1.0, 1.0, 0.0, 10.0),
            Err(OptError::NotDescentDirection { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // An acceptable first step is accepted without backtracking.
    //
    // Given
    // -----
    // - φ(α) = (α - 1)² and first trial α = 1.
    //
    // Expect
    // ------
    // - Converged after one trial with step 1.
    fn quadratic_accepts_good_first_step() {
        let mut ls = LineSearch::new(&config(LineSearchKind::Quadratic));
        let (status, trials) = run(&mut ls, 1.0);
        assert_eq!(status, LineSearchStatus::Converged);
        assert_eq!(trials, 1);
        assert_relative_eq!(ls.step(), 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Quadratic backtracking from an overlong step lands inside the
    // safeguard interval and then satisfies the Armijo test.
    //
    // Given
    // -----
    // - First trial α = 10 (φ(10) = 81 > φ(0)).
    //
    // Expect
    // ------
    // - Second trial within [1, 5]; search converges.
    fn quadratic_backtracks_within_safeguards() {
        let mut ls = LineSearch::new(&config(LineSearchKind::Quadratic));
        let (f0, g0) = phi(0.0);
        ls.start(f0, g0, 10.0, 1e-20, 1e20).expect("start should succeed");
        let (f, g) = phi(10.0);

        let status = ls.iterate(f, g);

        assert_eq!(status, LineSearchStatus::Search);
        assert!(ls.step() >= 1.0 && ls.step() <= 5.0);
        let (f, g) = phi(ls.step());
        assert_eq!(ls.iterate(f, g), LineSearchStatus::Converged);
    }

    #[test]
    // Purpose
    // -------
    // Armijo halves the step until sufficient decrease.
    //
    // Given
    // -----
    // - First trial α = 8.
    //
    // Expect
    // ------
    // - Steps 8 → 4 → 2 → 1; converged at α = 1 after four trials.
    fn armijo_halves_until_sufficient_decrease() {
        let mut ls = LineSearch::new(&config(LineSearchKind::Armijo));
        let (status, trials) = run(&mut ls, 8.0);
        assert_eq!(status, LineSearchStatus::Converged);
        assert_eq!(trials, 4);
        assert_relative_eq!(ls.step(), 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Moré–Thuente satisfies the strong Wolfe conditions on a quadratic,
    // both when extrapolating from a short step and when interpolating
    // from a long one.
    //
    // Given
    // -----
    // - First trials α = 0.01 and α = 25.
    //
    // Expect
    // ------
    // - Converged with |φ'(α)| <= 0.9·|φ'(0)| and sufficient decrease.
    fn more_thuente_satisfies_strong_wolfe() {
        for stp0 in [0.01, 25.0] {
            let mut ls = LineSearch::new(&config(LineSearchKind::Cubic));
            let (status, trials) = run(&mut ls, stp0);
            let (f, g) = phi(ls.step());

            assert_eq!(status, LineSearchStatus::Converged, "stp0 = {stp0}");
            assert!(trials < 20);
            assert!(f <= 1.0 + 1e-4 * ls.step() * -2.0);
            assert!(g.abs() <= 0.9 * 2.0);
        }
    }

    #[test]
    // Purpose
    // -------
    // A collapsed Moré–Thuente bracket is reported as rounding errors: a
    // warning when the trial still decreases f enough, a failure otherwise.
    //
    // Given
    // -----
    // - φ(0) = 1, φ'(0) = -2, trial α = 0.5 with the bracket collapsed on it.
    // - Trial values (φ, φ') = (0.5, 1.9) and (2, 1.9).
    //
    // Expect
    // ------
    // - `Warning` then `Failure`, both flagged by `hit_rounding_errors`.
    fn collapsed_bracket_reports_rounding_errors() {
        for (f, status) in [(0.5, LineSearchStatus::Warning), (2.0, LineSearchStatus::Failure)] {
            let mut ls = LineSearch::new(&config(LineSearchKind::Cubic));
            ls.start(1.0, -2.0, 0.5, 1e-20, 1e20).expect("start should succeed");
            assert!(!ls.hit_rounding_errors());
            ls.collapse_bracket();

            assert_eq!(ls.iterate(f, 1.9), status);
            assert!(ls.hit_rounding_errors());
        }
    }

    #[test]
    // Purpose
    // -------
    // The nonmonotone search accepts a step that increases f relative to
    // φ(0) as long as it stays below the recent maximum.
    //
    // Given
    // -----
    // - History containing f = 10, φ(0) = 1, trial with φ = 2.
    // - The same trial in a search without history.
    //
    // Expect
    // ------
    // - Converged on the first trial with history, `Search` without.
    fn nonmonotone_accepts_increase_below_history_max() {
        let mut ls = LineSearch::new(&config(LineSearchKind::Nonmonotone));
        ls.record_accepted(10.0);
        ls.record_accepted(1.0);
        ls.start(1.0, -1.0, 1.0, 1e-20, 1e20).expect("start should succeed");

        assert_eq!(ls.iterate(2.0, 0.0), LineSearchStatus::Converged);

        let mut fresh = LineSearch::new(&config(LineSearchKind::Nonmonotone));
        fresh.start(1.0, -1.0, 1.0, 1e-20, 1e20).expect("start should succeed");
        assert_eq!(fresh.iterate(2.0, 0.0), LineSearchStatus::Search);
    }

    #[test]
    // Purpose
    // -------
    // A search that can never satisfy the Armijo test fails once the
    // backtracking limit is exhausted.
    //
    // Given
    // -----
    // - `max_backtracks = 3` and a constant φ = φ(0) + 1.
    //
    // Expect
    // ------
    // - `Failure` on the third trial with a reason attached.
    fn backtracking_limit_produces_failure() {
        let mut ls = LineSearch::new(&config(LineSearchKind::Armijo).with_max_backtracks(3));
        ls.start(0.0, -1.0, 1.0, 1e-20, 1e20).expect("start should succeed");

        assert_eq!(ls.iterate(1.0, 0.0), LineSearchStatus::Search);
        assert_eq!(ls.iterate(1.0, 0.0), LineSearchStatus::Search);
        assert_eq!(ls.iterate(1.0, 0.0), LineSearchStatus::Failure);
        assert!(!ls.reason().is_empty());
    }
}
