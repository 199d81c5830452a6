//! task_optimizer::step — initial trial step and descent test.
//!
//! Each line search needs a first trial step. When the previous iteration
//! left usable history the step is estimated from it (Shanno–Phua,
//! Oren–Spedicato, or Barzilai–Borwein); otherwise the `delta` rule picks a
//! step that moves `x` by a small relative amount. The same module owns the
//! `epsilon` test deciding whether a direction descends enough to be kept.
use crate::optimization::task_optimizer::{
    traits::{AutoStep, SolverConfig},
    types::Real,
};

/// What the previous accepted iteration left behind.
///
/// - `stp`, `dg`: accepted step and the directional derivative `gᵀd` at the
///   start of that search.
/// - `sty`, `sts`, `yty`: inner products of `s = x₊ - x` and `y = g₊ - g`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepHistory<F> {
    pub stp: F,
    pub dg: F,
    pub sty: F,
    pub sts: F,
    pub yty: F,
}

/// Chooses the first trial step of every line search.
#[derive(Debug, Clone)]
pub struct StepSelector<F> {
    autostep: AutoStep,
    delta: F,
    epsilon: F,
    history: Option<StepHistory<F>>,
}

impl<F: Real> StepSelector<F> {
    pub fn new(config: &SolverConfig<F>) -> Self {
        Self {
            autostep: config.autostep,
            delta: config.delta,
            epsilon: config.epsilon,
            history: None,
        }
    }

    pub fn record(&mut self, history: StepHistory<F>) {
        self.history = Some(history);
    }

    /// Initial step for a search along `d` from `x`.
    ///
    /// Parameters
    /// ----------
    /// - `dg`: `gᵀd` at the current point (negative).
    /// - `d_norm`: `‖d‖`.
    /// - `x_norm`: `‖x‖`.
    ///
    /// Falls back to [`StepSelector::delta_step`] when there is no history or
    /// the estimate is not finite and positive.
    pub fn initial_step(&self, dg: F, d_norm: F, x_norm: F) -> F {
        let estimate = self.history.and_then(|h| match self.autostep {
            AutoStep::ShannoPhua => Some(h.stp * h.dg / dg),
            AutoStep::OrenSpedicato if h.sty > F::zero() => {
                let mu = h.yty / h.sty;
                Some(-dg / (mu * d_norm * d_norm))
            }
            AutoStep::BarzilaiBorwein if h.sty > F::zero() => {
                let mu = h.sty / h.sts;
                Some(-dg / (mu * d_norm * d_norm))
            }
            _ => None,
        });
        match estimate {
            Some(stp) if stp.is_finite() && stp > F::zero() => stp,
            _ => self.delta_step(d_norm, x_norm),
        }
    }

    /// Step moving `x` by `delta·‖x‖` along `d`, or `1/‖d‖` when `x = 0`.
    pub fn delta_step(&self, d_norm: F, x_norm: F) -> F {
        if x_norm > F::zero() { self.delta * x_norm / d_norm } else { F::one() / d_norm }
    }

    /// `true` when `d` descends enough: `gᵀd <= -epsilon·‖pg‖·‖d‖` and
    /// `gᵀd < 0`.
    pub fn is_sufficient_descent(&self, dg: F, pg_norm: F, d_norm: F) -> bool {
        dg < F::zero() && dg <= -self.epsilon * pg_norm * d_norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Each step heuristic against hand-computed values.
    // - The `delta` fallback and the `epsilon` descent test.
    // -------------------------------------------------------------------------

    fn selector(autostep: AutoStep) -> StepSelector<f64> {
        StepSelector::new(&SolverConfig::default().with_autostep(autostep))
    }

    fn history() -> StepHistory<f64> {
        StepHistory { stp: 0.5, dg: -4.0, sty: 2.0, sts: 1.0, yty: 8.0 }
    }

    #[test]
    // Purpose
    // -------
    // Without history every heuristic uses the delta rule.
    //
    // Given
    // -----
    // - delta = 0.05, ‖x‖ = 2, ‖d‖ = 4; and ‖x‖ = 0.
    //
    // Expect
    // ------
    // - 0.05·2/4 = 0.025; 1/4 when x = 0.
    fn no_history_uses_delta_rule() {
        let s = selector(AutoStep::ShannoPhua);
        assert_relative_eq!(s.initial_step(-1.0, 4.0, 2.0), 0.025);
        assert_relative_eq!(s.initial_step(-1.0, 4.0, 0.0), 0.25);
    }

    #[test]
    // Purpose
    // -------
    // Shanno–Phua scales the previous step by the ratio of slopes.
    //
    // Given
    // -----
    // - Previous stp 0.5, dg -4; current dg -2.
    //
    // Expect
    // ------
    // - 0.5·(-4)/(-2) = 1.
    fn shanno_phua_scales_previous_step() {
        let mut s = selector(AutoStep::ShannoPhua);
        s.record(history());
        assert_relative_eq!(s.initial_step(-2.0, 1.0, 1.0), 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Oren–Spedicato and Barzilai–Borwein use the curvature estimates.
    //
    // Given
    // -----
    // - sᵀy = 2, sᵀs = 1, yᵀy = 8; dg = -2, ‖d‖ = 1.
    //
    // Expect
    // ------
    // - OS: μ = 4, step 0.5. BB: μ = 2, step 1.
    fn curvature_based_steps() {
        let mut os = selector(AutoStep::OrenSpedicato);
        os.record(history());
        assert_relative_eq!(os.initial_step(-2.0, 1.0, 1.0), 0.5);

        let mut bb = selector(AutoStep::BarzilaiBorwein);
        bb.record(history());
        assert_relative_eq!(bb.initial_step(-2.0, 1.0, 1.0), 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Negative curvature disables the curvature-based estimates.
    //
    // Given
    // -----
    // - sᵀy = -1 with Barzilai–Borwein.
    //
    // Expect
    // ------
    // - Delta rule result.
    fn negative_curvature_falls_back_to_delta() {
        let mut bb = selector(AutoStep::BarzilaiBorwein);
        bb.record(StepHistory { sty: -1.0, ..history() });
        assert_relative_eq!(bb.initial_step(-2.0, 1.0, 2.0), 0.1);
    }

    #[test]
    // Purpose
    // -------
    // The descent test requires a slope at least `epsilon·‖pg‖·‖d‖`.
    //
    // Given
    // -----
    // - epsilon = 0.01, ‖pg‖ = ‖d‖ = 10.
    //
    // Expect
    // ------
    // - dg = -2 passes, dg = -0.5 and dg = 0 fail.
    fn descent_test_uses_epsilon() {
        let s = selector(AutoStep::ShannoPhua);
        assert!(s.is_sufficient_descent(-2.0, 10.0, 10.0));
        assert!(!s.is_sufficient_descent(-0.5, 10.0, 10.0));
        assert!(!s.is_sufficient_descent(0.0, 0.0, 10.0));
    }
}
