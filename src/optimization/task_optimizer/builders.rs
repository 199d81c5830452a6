//! task_optimizer::builders — optimizer and solver construction helpers.
//!
//! Purpose
//! -------
//! Turn a [`SolverConfig`] and [`Bounds`] into ready-to-run objects while
//! converting the optimizer's non-throwing `INPUT_ERROR` protocol into
//! ordinary `OptResult` errors for Rust callers.
//!
//! Key behaviors
//! -------------
//! - [`build_optimizer`] initializes an [`Optimizer`] and fails with the
//!   stored reason when initialization yields `INPUT_ERROR`.
//! - [`build_task_solver`] validates the configuration up front and wraps it
//!   in a [`TaskSolver`] for argmin's `Executor`; the starting point is
//!   supplied later by the runner.
//!
//! Conventions
//! -----------
//! - Builders have no side effects and never evaluate the objective.
use crate::optimization::{
    errors::{OptError, OptResult},
    task_optimizer::{
        optimizer::Optimizer,
        run::TaskSolver,
        traits::{Bounds, SolverConfig},
        types::{Real, Task},
    },
};
use ndarray::ArrayView1;

/// Initialize an [`Optimizer`] at `x`, failing loudly on invalid input.
///
/// # Errors
/// The [`OptError`] recorded by [`Optimizer::initialize`] when the task is
/// `INPUT_ERROR` (invalid option, bounds, or starting point).
pub fn build_optimizer<F: Real>(
    x: ArrayView1<F>, config: &SolverConfig<F>, bounds: &Bounds<F>,
) -> OptResult<Optimizer<F>> {
    let optimizer = Optimizer::initialize(x, config.clone(), bounds.clone());
    if optimizer.task() == Task::InputError {
        return Err(optimizer.last_error().cloned().unwrap_or(OptError::UnknownError));
    }
    Ok(optimizer)
}

/// Build a [`TaskSolver`] hosting the task loop inside argmin's executor.
///
/// # Errors
/// Configuration errors from [`SolverConfig::validate`]. Errors that depend
/// on the starting point are reported when the executor initializes the
/// solver.
pub fn build_task_solver<F: Real>(
    config: &SolverConfig<F>, bounds: &Bounds<F>,
) -> OptResult<TaskSolver<F>> {
    config.validate()?;
    Ok(TaskSolver::new(config.clone(), bounds.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::task_optimizer::traits::{Algorithm, BoundValue, VmlmbMethod};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Conversion of `INPUT_ERROR` into `Err`.
    // - Early configuration validation in `build_task_solver`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Valid input yields an optimizer waiting for the first evaluation.
    //
    // Given
    // -----
    // - VMLMB (blmvm) with a feasible box.
    //
    // Expect
    // ------
    // - `Ok` with task COMPUTE_FG.
    fn build_optimizer_accepts_valid_input() {
        let x = array![0.5_f64, 0.5];
        let config = SolverConfig::default()
            .with_algorithm(Algorithm::Vmlmb)
            .with_vmlmb_method(VmlmbMethod::Blmvm);
        let bounds = Bounds::new(BoundValue::Scalar(0.0), BoundValue::Scalar(1.0));

        let opt = build_optimizer(x.view(), &config, &bounds).expect("valid input");

        assert_eq!(opt.task(), Task::ComputeFg);
    }

    #[test]
    // Purpose
    // -------
    // Input errors become `Err` carrying the stored reason.
    //
    // Given
    // -----
    // - A NaN starting component.
    //
    // Expect
    // ------
    // - `InvalidStartingPoint` at index 1.
    fn build_optimizer_reports_input_error() {
        let x = array![0.0_f64, f64::NAN];

        let err = build_optimizer(x.view(), &SolverConfig::default(), &Bounds::none())
            .expect_err("NaN start must be rejected");

        assert!(matches!(err, OptError::InvalidStartingPoint { index: 1, .. }));
    }

    #[test]
    // Purpose
    // -------
    // `build_task_solver` rejects invalid configurations before any run.
    //
    // Given
    // -----
    // - `mem = 0`.
    //
    // Expect
    // ------
    // - `InvalidMemory`.
    fn build_task_solver_validates_config() {
        let config = SolverConfig::<f64>::default().with_mem(0);

        let err = build_task_solver(&config, &Bounds::none()).expect_err("mem must be >= 1");

        assert!(matches!(err, OptError::InvalidMemory { .. }));
    }
}
