//! High-level entry point for minimizing a user-provided [`Objective`].
//!
//! Validates the starting point with the objective's `check` hook, wraps
//! the objective in an [`ArgMinAdapter`], builds a [`TaskSolver`] from the
//! configuration, and delegates the run to [`run_task_solver`].
use crate::optimization::{
    errors::OptResult,
    task_optimizer::{
        adapter::ArgMinAdapter,
        builders::build_task_solver,
        run::run_task_solver,
        traits::{Bounds, MinimizeOutcome, Objective, SolverConfig},
        types::Vector,
    },
};

/// Minimize `f(x)` from `x0` with the algorithm selected in `config`.
///
/// # Behavior
/// - Calls `objective.check(&x0)`.
/// - Builds a [`TaskSolver`](super::run::TaskSolver) (validating `config`).
/// - Runs the reverse-communication loop inside argmin's executor, using
///   analytic gradients when `objective.grad` is implemented and finite
///   differences otherwise.
///
/// # Parameters
/// - `objective`: the function to minimize.
/// - `x0`: starting point (consumed; the result holds the final iterate).
/// - `config`: algorithm, line search, tolerances, and budgets.
/// - `bounds`: optional box constraints (VMLMB `blmvm` / `vmlmb` only).
/// - `verbose`: attach the slog observer when built with `obs_slog`.
///
/// # Errors
/// - Errors from `objective.check`, configuration and bound validation.
/// - Errors raised by `objective.value` / `objective.grad` during the run.
/// - The recorded optimizer error when the run ends with `ERROR`
///   (e.g. line-search failure or non-descent direction).
///
/// # Returns
/// A [`MinimizeOutcome`]; `converged` is `false` when the run stopped with
/// `WARNING` (budget exhausted).
///
/// # Example
/// ```
/// use ndarray::array;
/// use rust_optimpack::optimization::errors::OptResult;
/// use rust_optimpack::optimization::task_optimizer::{
///     minimize, Bounds, Objective, SolverConfig, Vector,
/// };
///
/// struct Bowl;
/// impl Objective for Bowl {
///     fn value(&self, x: &Vector<f64>) -> OptResult<f64> {
///         Ok((x[0] - 2.0).powi(2) + x[1] * x[1])
///     }
///     fn grad(&self, x: &Vector<f64>) -> OptResult<Vector<f64>> {
///         Ok(array![2.0 * (x[0] - 2.0), 2.0 * x[1]])
///     }
/// }
///
/// let out = minimize(&Bowl, array![0.0, 1.0], &SolverConfig::default(), Bounds::none(), false)?;
/// assert!(out.converged);
/// # Ok::<(), rust_optimpack::optimization::errors::OptError>(())
/// ```
pub fn minimize<O: Objective>(
    objective: &O, x0: Vector<f64>, config: &SolverConfig<f64>, bounds: Bounds<f64>,
    verbose: bool,
) -> OptResult<MinimizeOutcome<f64>> {
    objective.check(&x0)?;
    let solver = build_task_solver(config, &bounds)?;
    let problem = ArgMinAdapter::new(objective);
    run_task_solver(x0, problem, solver, verbose)
}
