//! Execution helpers: the argmin-hosted task loop and a plain callback
//! driver.
//!
//! [`TaskSolver`] implements argmin's `Solver` so that the reverse-
//! communication [`Optimizer`] can be run by an `Executor` against any
//! `CostFunction + Gradient` problem over `Array1<F>`. One argmin iteration
//! corresponds to one accepted step (`NEW_X`); every `COMPUTE_FG` request in
//! between is answered through `Problem::cost` / `Problem::gradient`, so
//! argmin's function counters match the optimizer's evaluation count.
//!
//! [`drive`] runs the same loop without argmin, for callers that hold a
//! plain `fg` callback (the Python bindings).
use argmin::core::{
    CostFunction, Error, Executor, Gradient, IterState, KV, Problem, Solver, State,
    TerminationReason,
};
use argmin_math::ArgminL2Norm;
use ndarray::{ArrayView1, ArrayViewMut1};

use crate::optimization::{
    errors::{OptError, OptResult},
    task_optimizer::{
        builders::build_optimizer,
        optimizer::Optimizer,
        traits::{Bounds, MinimizeOutcome, SolverConfig},
        types::{Real, Task, Vector},
    },
};

/// argmin state used by [`TaskSolver`].
pub type TaskState<F> = IterState<Vector<F>, Vector<F>, (), (), (), F>;

/// argmin `Solver` wrapping one [`Optimizer`] run.
///
/// The optimizer itself is created in `init` from the executor's initial
/// parameter, so a `TaskSolver` can be built before the starting point is
/// known (see [`build_task_solver`](super::builders::build_task_solver)).
#[derive(Debug, Clone)]
pub struct TaskSolver<F: Real> {
    config: SolverConfig<F>,
    bounds: Bounds<F>,
    optimizer: Option<Optimizer<F>>,
    x: Vector<F>,
    fx: F,
    g: Vector<F>,
}

impl<F: Real> TaskSolver<F> {
    pub fn new(config: SolverConfig<F>, bounds: Bounds<F>) -> Self {
        Self {
            config,
            bounds,
            optimizer: None,
            x: Vector::zeros(0),
            fx: F::zero(),
            g: Vector::zeros(0),
        }
    }

    /// The optimizer driven by this solver, once `init` has run.
    pub fn optimizer(&self) -> Option<&Optimizer<F>> {
        self.optimizer.as_ref()
    }

    /// Answer `COMPUTE_FG` requests until the optimizer asks for something
    /// else. With `step`, a pending `NEW_X` is advanced first.
    fn advance<O>(&mut self, problem: &mut Problem<O>, step: bool) -> Result<Task, Error>
    where
        O: CostFunction<Param = Vector<F>, Output = F>
            + Gradient<Param = Vector<F>, Gradient = Vector<F>>,
    {
        let optimizer = self.optimizer.as_mut().ok_or_else(missing_optimizer)?;
        let mut task = optimizer.task();
        if step && task == Task::NewX {
            task = optimizer.iterate(self.x.view_mut(), self.fx, self.g.view())?;
        }
        while task == Task::ComputeFg {
            self.fx = problem.cost(&self.x)?;
            self.g = problem.gradient(&self.x)?;
            task = optimizer.iterate(self.x.view_mut(), self.fx, self.g.view())?;
        }
        Ok(task)
    }

    /// Publish the last accepted point and map terminal tasks onto argmin
    /// termination reasons.
    fn publish(&self, state: TaskState<F>, task: Task) -> Result<TaskState<F>, Error> {
        let optimizer = self.optimizer.as_ref().ok_or_else(missing_optimizer)?;
        if matches!(task, Task::Error | Task::InputError) {
            let err = optimizer.last_error().cloned().unwrap_or(OptError::UnknownError);
            return Err(err.into());
        }
        let (x, fx, g) = optimizer
            .accepted()
            .map(|(x, fx, g)| (x.to_owned(), fx, g.to_owned()))
            .ok_or_else(missing_optimizer)?;
        let state = state.param(x).cost(fx).gradient(g);
        Ok(match task {
            Task::FinalX => state.terminate_with(TerminationReason::SolverConverged),
            Task::Warning => {
                state.terminate_with(TerminationReason::SolverExit(optimizer.status().to_string()))
            }
            _ => state,
        })
    }
}

impl<O, F> Solver<O, TaskState<F>> for TaskSolver<F>
where
    O: CostFunction<Param = Vector<F>, Output = F>
        + Gradient<Param = Vector<F>, Gradient = Vector<F>>,
    F: Real,
{
    const NAME: &'static str = "Reverse-communication NLCG/VMLMB";

    fn init(
        &mut self, problem: &mut Problem<O>, mut state: TaskState<F>,
    ) -> Result<(TaskState<F>, Option<KV>), Error> {
        let x0 = state.take_param().ok_or_else(|| OptError::NotInitialized {
            text: "initial parameter vector is required".to_string(),
        })?;
        let optimizer = build_optimizer(x0.view(), &self.config, &self.bounds)?;
        self.g = Vector::zeros(x0.len());
        self.x = x0;
        self.optimizer = Some(optimizer);
        let task = self.advance(problem, false)?;
        Ok((self.publish(state, task)?, None))
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, state: TaskState<F>,
    ) -> Result<(TaskState<F>, Option<KV>), Error> {
        let task = self.advance(problem, true)?;
        Ok((self.publish(state, task)?, None))
    }
}

fn missing_optimizer() -> OptError {
    OptError::NotInitialized { text: "solver has not been initialized".to_string() }
}

/// Run a [`TaskSolver`] on `problem` from `x0` and collect the outcome.
///
/// # Feature flags
/// With `obs_slog` and `verbose == true`, a terminal slog observer is
/// attached with `ObserverMode::Always` and one line with `f(x₀)` and
/// `‖g(x₀)‖` is printed before the first iteration.
///
/// # Errors
/// - Input errors detected when the optimizer is initialized.
/// - Errors raised by the problem's `cost` / `gradient`.
/// - The recorded error when the optimizer ends with `ERROR`.
///
/// `WARNING` is not an error: the outcome reports it with
/// `converged == false`.
pub fn run_task_solver<O, F>(
    x0: Vector<F>, problem: O, solver: TaskSolver<F>, verbose: bool,
) -> OptResult<MinimizeOutcome<F>>
where
    O: CostFunction<Param = Vector<F>, Output = F>
        + Gradient<Param = Vector<F>, Gradient = Vector<F>>,
    F: Real,
    Vector<F>: ArgminL2Norm<F>,
{
    #[cfg(feature = "obs_slog")]
    if verbose {
        log_initial_state(&x0, &problem)?;
    }
    #[cfg(not(feature = "obs_slog"))]
    let _ = verbose;

    #[allow(unused_mut)]
    let mut executor = Executor::new(problem, solver).configure(|state| state.param(x0));
    #[cfg(feature = "obs_slog")]
    if verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        executor = executor.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }

    let result = executor.run()?;
    let state = result.state();
    let optimizer = result.solver().optimizer().ok_or_else(missing_optimizer)?;
    MinimizeOutcome::new(
        state.get_param().cloned(),
        state.get_cost(),
        optimizer.task(),
        optimizer.status(),
        optimizer.iterations(),
        optimizer.evaluations(),
        optimizer.restarts(),
        state.get_func_counts().clone(),
        state.get_gradient().cloned(),
    )
}

/// Run the task loop with a plain callback until a terminal task.
///
/// `fg(x, g)` must fill `g` with the gradient at `x` and return `f(x)`; it
/// is called for every `COMPUTE_FG`. `x` and `g` are the caller's buffers
/// and are updated in place. Does not close the optimizer.
///
/// # Errors
/// Errors returned by `fg` and protocol errors from
/// [`Optimizer::iterate`]. Terminal tasks, including `ERROR`, are returned
/// as `Ok`.
pub fn drive<F, C>(
    optimizer: &mut Optimizer<F>, mut x: ArrayViewMut1<F>, mut g: ArrayViewMut1<F>, mut fg: C,
) -> OptResult<Task>
where
    F: Real,
    C: FnMut(ArrayView1<F>, ArrayViewMut1<F>) -> OptResult<F>,
{
    let mut fx = F::zero();
    let mut task = optimizer.task();
    while matches!(task, Task::ComputeFg | Task::NewX) {
        if task == Task::ComputeFg {
            fx = fg(x.view(), g.view_mut())?;
        }
        task = optimizer.iterate(x.view_mut(), fx, g.view())?;
    }
    Ok(task)
}

/// Run `body` on the optimizer, then close it whatever `body` returned.
pub fn close_after<F, T, B>(optimizer: &mut Optimizer<F>, body: B) -> T
where
    F: Real,
    B: FnOnce(&mut Optimizer<F>) -> T,
{
    let outcome = body(optimizer);
    optimizer.close();
    outcome
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<O, F>(x0: &Vector<F>, problem: &O) -> OptResult<()>
where
    O: CostFunction<Param = Vector<F>, Output = F>
        + Gradient<Param = Vector<F>, Gradient = Vector<F>>,
    F: Real,
    Vector<F>: ArgminL2Norm<F>,
{
    let f0 = problem.cost(x0)?;
    let g0n = problem.gradient(x0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: f(x0) = {:.6}{}",
        f0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::task_optimizer::traits::{Algorithm, LineSearchKind};
    use crate::optimization::task_optimizer::types::Status;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `TaskSolver` under argmin's `Executor` in both precisions.
    // - Mapping of FINAL_X / WARNING onto outcomes.
    // - The plain `drive` loop and `close_after`.
    // -------------------------------------------------------------------------

    /// f(x) = Σ (x_i - 1)² in single precision.
    struct Shifted;

    impl CostFunction for Shifted {
        type Param = Vector<f32>;
        type Output = f32;

        fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
            Ok(x.iter().map(|v| (v - 1.0) * (v - 1.0)).sum())
        }
    }

    impl Gradient for Shifted {
        type Param = Vector<f32>;
        type Gradient = Vector<f32>;

        fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, Error> {
            Ok(x.mapv(|v| 2.0 * (v - 1.0)))
        }
    }

    /// f(x) = x₀² + 10·x₁² in double precision.
    struct Elliptic;

    impl CostFunction for Elliptic {
        type Param = Vector<f64>;
        type Output = f64;

        fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
            Ok(x[0] * x[0] + 10.0 * x[1] * x[1])
        }
    }

    impl Gradient for Elliptic {
        type Param = Vector<f64>;
        type Gradient = Vector<f64>;

        fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, Error> {
            Ok(array![2.0 * x[0], 20.0 * x[1]])
        }
    }

    #[test]
    // Purpose
    // -------
    // The executor runs a single-precision problem to convergence.
    //
    // Given
    // -----
    // - VMLMB (lbfgs) on Σ (x_i - 1)² from zero, gatol = 1e-4.
    //
    // Expect
    // ------
    // - Converged outcome with x ≈ 1 and argmin counters populated.
    fn executor_converges_in_single_precision() {
        let config = SolverConfig::<f32>::default()
            .with_algorithm(Algorithm::Vmlmb)
            .with_gatol(1e-4);
        let solver = TaskSolver::new(config, Bounds::none());

        let out = run_task_solver(Vector::<f32>::zeros(3), Shifted, solver, false)
            .expect("run should succeed");

        assert!(out.converged);
        assert_eq!(out.task, Task::FinalX);
        for &xi in out.x.iter() {
            assert_relative_eq!(xi, 1.0, epsilon = 1e-3);
        }
        assert_eq!(out.fn_evals.get("cost_count").copied(), Some(out.evaluations as u64));
    }

    #[test]
    // Purpose
    // -------
    // An iteration budget ends the run as a non-converged outcome instead
    // of an error.
    //
    // Given
    // -----
    // - NLCG with `max_iter = 2` and a tight tolerance.
    //
    // Expect
    // ------
    // - Task WARNING, status TOO_MANY_ITERATIONS, two iterations, f below
    //   f(x₀) = 14.
    fn iteration_budget_is_reported_as_warning() {
        let config = SolverConfig::default().with_max_iter(2).with_gatol(1e-12);
        let solver = TaskSolver::new(config, Bounds::none());

        let out = run_task_solver(array![2.0, 1.0], Elliptic, solver, false)
            .expect("run should succeed");

        assert!(!out.converged);
        assert_eq!(out.task, Task::Warning);
        assert_eq!(out.status, Status::TooManyIterations);
        assert_eq!(out.iterations, 2);
        assert!(out.value < 14.0);
    }

    #[test]
    // Purpose
    // -------
    // Invalid input surfaces from the executor as the recorded error.
    //
    // Given
    // -----
    // - An empty starting vector.
    //
    // Expect
    // ------
    // - `Err(EmptyVariables)`.
    fn executor_reports_input_errors() {
        let solver = TaskSolver::new(SolverConfig::default(), Bounds::none());

        let err = run_task_solver(Vector::<f64>::zeros(0), Elliptic, solver, false)
            .expect_err("empty x must be rejected");

        assert_eq!(err, OptError::EmptyVariables);
    }

    #[test]
    // Purpose
    // -------
    // `drive` answers every COMPUTE_FG with the callback and stops at a
    // terminal task.
    //
    // Given
    // -----
    // - Cubic line search, NLCG, on x₀² + 10·x₁².
    //
    // Expect
    // ------
    // - FINAL_X with one callback call per counted evaluation.
    fn drive_runs_callback_loop() {
        let mut x = array![3.0_f64, -1.0];
        let mut g = array![0.0_f64, 0.0];
        let config = SolverConfig::default().with_line_search(LineSearchKind::Cubic);
        let mut opt = Optimizer::initialize(x.view(), config, Bounds::none());
        let mut calls = 0;

        let task = drive(&mut opt, x.view_mut(), g.view_mut(), |x, mut g| {
            calls += 1;
            g[0] = 2.0 * x[0];
            g[1] = 20.0 * x[1];
            Ok(x[0] * x[0] + 10.0 * x[1] * x[1])
        })
        .expect("drive should succeed");

        assert_eq!(task, Task::FinalX);
        assert_eq!(calls, opt.evaluations());
        assert!(x[0].abs() < 1e-6 && x[1].abs() < 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // `close_after` closes the optimizer even when the loop it wraps stops
    // on a callback error.
    //
    // Given
    // -----
    // - `drive` with a callback that fails on its first call.
    //
    // Expect
    // ------
    // - The callback's error is returned and the optimizer is closed.
    fn close_after_closes_when_callback_fails() {
        let mut x = array![1.0_f64, 1.0];
        let mut g = array![0.0_f64, 0.0];
        let mut opt = Optimizer::initialize(x.view(), SolverConfig::default(), Bounds::none());

        let outcome = close_after(&mut opt, |opt| {
            drive(opt, x.view_mut(), g.view_mut(), |_, _| Err(OptError::EmptyVariables))
        });

        assert_eq!(outcome, Err(OptError::EmptyVariables));
        assert!(opt.is_closed());
        assert_eq!(opt.task_info("Get_task"), Err(OptError::UseAfterClose));
    }
}
