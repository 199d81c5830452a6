//! Adapter that exposes a user [`Objective`] as an `argmin` problem.
//!
//! The optimizer minimizes `f(x)` directly, so values and analytic
//! gradients pass through unchanged. When the objective does not implement
//! `grad`, the gradient is obtained by finite differences of the cost
//! closure: central differences first, forward differences as a fallback.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    task_optimizer::{traits::Objective, types::Vector, validation::validate_grad},
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user [`Objective`] to `argmin`'s `CostFunction` and `Gradient`.
///
/// - `CostFunction::cost` returns `f(x)` and rejects non-finite values.
/// - `Gradient::gradient` returns the analytic gradient when available,
///   otherwise a validated finite-difference estimate.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, O: Objective> {
    pub objective: &'a O,
}

impl<'a, O: Objective> CostFunction for ArgMinAdapter<'a, O> {
    type Param = Vector<f64>;
    type Output = f64;

    /// Evaluate `f(x)`.
    ///
    /// # Errors
    /// - Propagates any `OptError` from the user's `value`.
    /// - `NonFiniteCost` if the value is NaN or infinite.
    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.objective.value(x)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<'a, O: Objective> Gradient for ArgMinAdapter<'a, O> {
    type Param = Vector<f64>;
    type Gradient = Vector<f64>;

    /// Evaluate `∇f(x)`.
    ///
    /// Behavior:
    /// - With an analytic `grad`, validate and return it.
    /// - On `GradientNotImplemented`, finite-difference the cost:
    ///   - central differences first;
    ///   - if a cost evaluation failed inside the closure (captured in
    ///     `closure_err`) or the estimate is not finite, retry once with
    ///     forward differences and validate again.
    ///
    /// The FD closure must return `f64`, so the first error raised inside it
    /// is stored and the closure returns `NaN`.
    ///
    /// # Errors
    /// - User errors from `grad` other than `GradientNotImplemented`.
    /// - Errors raised by cost evaluations during the forward-difference pass.
    /// - Validation errors for wrong dimension or non-finite entries.
    fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = x.len();
        match self.objective.grad(x) {
            Ok(g) => {
                validate_grad(g.view(), dim)?;
                Ok(g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |x: &Vector<f64>| -> f64 {
                    match self.cost(x) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = x.central_diff(&cost_func);
                if closure_err.borrow().is_some() {
                    return run_fd_diff(x, &cost_func, &closure_err);
                }
                match validate_grad(fd_grad.view(), dim) {
                    Ok(()) => Ok(fd_grad),
                    Err(_) => run_fd_diff(x, &cost_func, &closure_err),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<'a, O: Objective> ArgMinAdapter<'a, O> {
    pub fn new(objective: &'a O) -> Self {
        Self { objective }
    }
}

/// Forward-difference gradient of `func` at `x`, with error capture.
///
/// Clears `closure_err`, runs `forward_diff`, returns any captured error,
/// then validates the estimate.
fn run_fd_diff<G: Fn(&Vector<f64>) -> f64>(
    x: &Vector<f64>, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Vector<f64>, Error> {
    closure_err.replace(None);
    let fd_grad = x.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(fd_grad.view(), x.len())?;
    Ok(fd_grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Pass-through of values and analytic gradients.
    // - Finite-difference fallback when `grad` is not implemented.
    // - Error propagation for non-finite values and user errors.
    // -------------------------------------------------------------------------

    /// f(x) = (x₀ - 1)² + 3·x₁², analytic gradient optional.
    struct Bowl {
        analytic: bool,
    }

    impl Objective for Bowl {
        fn value(&self, x: &Vector<f64>) -> OptResult<f64> {
            Ok((x[0] - 1.0).powi(2) + 3.0 * x[1] * x[1])
        }

        fn grad(&self, x: &Vector<f64>) -> OptResult<Vector<f64>> {
            if self.analytic {
                Ok(array![2.0 * (x[0] - 1.0), 6.0 * x[1]])
            } else {
                Err(OptError::GradientNotImplemented)
            }
        }
    }

    struct Broken;

    impl Objective for Broken {
        fn value(&self, _x: &Vector<f64>) -> OptResult<f64> {
            Ok(f64::NAN)
        }

        fn grad(&self, _x: &Vector<f64>) -> OptResult<Vector<f64>> {
            Err(OptError::InvalidTask { task: "COMPUTE_FG" })
        }
    }

    #[test]
    // Purpose
    // -------
    // Analytic gradients pass through unchanged.
    //
    // Given
    // -----
    // - Bowl with analytic gradient at x = [2, 1].
    //
    // Expect
    // ------
    // - cost 4, gradient [2, 6].
    fn analytic_gradient_passes_through() {
        let bowl = Bowl { analytic: true };
        let adapter = ArgMinAdapter::new(&bowl);
        let x = array![2.0, 1.0];

        assert_relative_eq!(adapter.cost(&x).expect("finite cost"), 4.0);
        let g = adapter.gradient(&x).expect("gradient should succeed");
        assert_eq!(g, array![2.0, 6.0]);
    }

    #[test]
    // Purpose
    // -------
    // Without an analytic gradient, finite differences approximate it.
    //
    // Given
    // -----
    // - Bowl without gradient at x = [2, 1].
    //
    // Expect
    // ------
    // - FD gradient ≈ [2, 6].
    fn finite_difference_fallback_matches_analytic() {
        let bowl = Bowl { analytic: false };
        let adapter = ArgMinAdapter::new(&bowl);
        let x = array![2.0, 1.0];

        let g = adapter.gradient(&x).expect("gradient should succeed");

        assert_relative_eq!(g[0], 2.0, epsilon = 1e-5);
        assert_relative_eq!(g[1], 6.0, epsilon = 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // Non-finite values and user gradient errors surface as errors.
    //
    // Given
    // -----
    // - An objective returning NaN and a custom gradient error.
    //
    // Expect
    // ------
    // - `NonFiniteCost` from `cost`; the user error from `gradient`.
    fn errors_are_propagated() {
        let adapter = ArgMinAdapter::new(&Broken);
        let x = array![0.0];

        let cost_err = OptError::from(adapter.cost(&x).expect_err("NaN must be rejected"));
        assert!(matches!(cost_err, OptError::NonFiniteCost { .. }));

        let grad_err = OptError::from(adapter.gradient(&x).expect_err("user error expected"));
        assert_eq!(grad_err, OptError::InvalidTask { task: "COMPUTE_FG" });
    }
}
