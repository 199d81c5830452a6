//! task_optimizer::optimizer — the reverse-communication task machine.
//!
//! Purpose
//! -------
//! Own the solver state of one minimization and advance it each time the
//! caller reports `f(x)` and `g(x)`. The optimizer never evaluates the
//! objective: it tells the caller what to do next through a [`Task`].
//!
//! Key behaviors
//! -------------
//! - [`Optimizer::initialize`] validates the configuration, bounds, and
//!   starting point. It never fails loudly: invalid input yields the
//!   `INPUT_ERROR` task with [`Optimizer::last_error`] describing why.
//! - [`Optimizer::iterate`] consumes `(x, f, g)`:
//!   - after `COMPUTE_FG` it checks the values, feeds the line search, and
//!     either proposes another trial point (`COMPUTE_FG`) or accepts the
//!     point, tests convergence, and returns `NEW_X` / `FINAL_X` /
//!     `WARNING`;
//!   - after `NEW_X` it computes a new direction and initial step, writes
//!     the first trial point into `x`, and returns `COMPUTE_FG`.
//! - [`Optimizer::close`] releases the state; later calls to `iterate` or
//!   `task_info` fail with [`OptError::UseAfterClose`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `x` is never modified by `initialize`. The first evaluation point is
//!   projected into the box if needed (and must then be re-evaluated).
//! - On `WARNING` or `ERROR` after the first accepted point, `x` holds the
//!   last accepted iterate.
//! - Terminal tasks are sticky.
//! - Evaluations are counted for every `COMPUTE_FG` answered at a feasible
//!   point; iterations for every accepted line-search step.
//!
//! Conventions
//! -----------
//! - Convergence: `‖pg‖ <= max(gatol, grtol·‖pg₀‖)` where `pg` is the
//!   projected gradient (the plain gradient without bounds).
//! - Budgets: `iterations >= max_iter` is checked at each accepted point
//!   (after the convergence test); `evaluations >= max_eval` whenever a new
//!   evaluation would be requested. Both record
//!   [`OptError::BudgetExceeded`] in [`Optimizer::last_error`].
//! - A Moré–Thuente search that stalls on rounding errors maps to
//!   `ROUNDING_ERRORS`: `WARNING` if the step was still accepted, `ERROR`
//!   otherwise.
use ndarray::{ArrayView1, ArrayViewMut1, Zip};

use crate::optimization::{
    errors::{OptError, OptResult},
    task_optimizer::{
        bounds::BoundProjector,
        line_search::{LineSearch, LineSearchStatus},
        nlcg::Nlcg,
        step::{StepHistory, StepSelector},
        traits::{Algorithm, Bounds, SolverConfig, VmlmbMethod},
        types::{Real, STPMAX_FACTOR, STPMIN_FACTOR, Status, Task, TaskKey, Vector},
        validation::{validate_grad, validate_start, validate_value, verify_dimension},
        vmlmb::Vmlmb,
    },
    vector_ops::{dot, norm2},
};

/// Reverse-communication optimizer over `f32` or `f64` variables.
///
/// Typical loop:
///
/// ```
/// use ndarray::array;
/// use rust_optimpack::optimization::task_optimizer::{Bounds, Optimizer, SolverConfig, Task};
///
/// let mut x = array![3.0_f64, -4.0];
/// let mut g = array![0.0_f64, 0.0];
/// let mut opt = Optimizer::initialize(x.view(), SolverConfig::default(), Bounds::none());
/// let mut task = opt.task();
/// while task == Task::ComputeFg || task == Task::NewX {
///     g.assign(&(&x * 2.0));
///     let fx = x.dot(&x);
///     task = opt.iterate(x.view_mut(), fx, g.view()).unwrap();
/// }
/// assert_eq!(task, Task::FinalX);
/// opt.close();
/// ```
#[derive(Debug, Clone)]
pub struct Optimizer<F: Real> {
    config: SolverConfig<F>,
    n: usize,
    task: Task,
    status: Status,
    last_error: Option<OptError>,
    iterations: usize,
    evaluations: usize,
    restarts: usize,
    step: F,
    gnorm: Option<F>,
    closed: bool,
    work: Option<Workspace<F>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Waiting for the values at the starting point.
    Initial,
    /// A line search is in progress; `x` holds the trial point.
    Search,
    /// `x` holds an accepted iterate.
    Accepted,
}

#[derive(Debug, Clone)]
enum Engine<F> {
    Nlcg(Nlcg<F>),
    Vmlmb(Vmlmb<F>),
}

#[derive(Debug, Clone)]
struct Workspace<F> {
    stage: Stage,
    projector: BoundProjector<F>,
    line_search: LineSearch<F>,
    selector: StepSelector<F>,
    engine: Engine<F>,
    x0: Vector<F>,
    g0: Vector<F>,
    pg: Vector<F>,
    d: Vector<F>,
    f0: F,
    dg0: F,
    pg0_norm: F,
    first_hit: F,
}

impl<F: Real> Workspace<F> {
    fn new(x: ArrayView1<F>, config: &SolverConfig<F>, bounds: &Bounds<F>) -> OptResult<Self> {
        config.validate()?;
        validate_start(x)?;
        let n = x.len();
        let projector = BoundProjector::new(bounds, n)?;
        if projector.has_bounds() {
            match (config.algorithm, config.vmlmb_method) {
                (Algorithm::Nlcg, _) => {
                    return Err(OptError::BoundsNotSupported { method: "nlcg" });
                }
                (Algorithm::Vmlmb, VmlmbMethod::Lbfgs) => {
                    return Err(OptError::BoundsNotSupported { method: "lbfgs" });
                }
                _ => {}
            }
        }
        let engine = match config.algorithm {
            Algorithm::Nlcg => Engine::Nlcg(Nlcg::new(config, n)),
            Algorithm::Vmlmb => Engine::Vmlmb(Vmlmb::new(config, n)),
        };
        Ok(Self {
            stage: Stage::Initial,
            projector,
            line_search: LineSearch::new(config),
            selector: StepSelector::new(config),
            engine,
            x0: Vector::zeros(n),
            g0: Vector::zeros(n),
            pg: Vector::zeros(n),
            d: Vector::zeros(n),
            f0: F::zero(),
            dg0: F::zero(),
            pg0_norm: F::zero(),
            first_hit: F::infinity(),
        })
    }

    /// Record `(x, f, g)` as the current iterate; returns `‖pg‖`.
    fn record_point(&mut self, x: ArrayView1<F>, fx: F, g: ArrayView1<F>) -> F {
        self.x0.assign(&x);
        self.g0.assign(&g);
        self.f0 = fx;
        self.line_search.record_accepted(fx);
        self.stage = Stage::Accepted;
        if self.projector.has_bounds() {
            self.projector.projected_gradient(x, g, self.pg.view_mut());
            self.projector.projected_gradient_norm(x, g)
        } else {
            self.pg.assign(&g);
            norm2(g)
        }
    }

    /// `x ← P(x0 + stp·d)`.
    fn trial_point(&self, mut x: ArrayViewMut1<F>, stp: F) {
        Zip::from(&mut x).and(&self.x0).and(&self.d).for_each(|xi, &x0i, &di| {
            *xi = x0i + stp * di;
        });
        self.projector.project(x);
    }

    fn steepest_descent(&mut self) {
        match &mut self.engine {
            Engine::Nlcg(nlcg) => nlcg.restart(self.g0.view()),
            Engine::Vmlmb(vm) => {
                vm.reset();
                vm.steepest(self.pg.view());
            }
        }
        self.copy_direction();
    }

    fn copy_direction(&mut self) {
        let d = match &self.engine {
            Engine::Nlcg(nlcg) => nlcg.direction(),
            Engine::Vmlmb(vm) => vm.direction(),
        };
        self.d.assign(&d);
    }

    fn memory_len(&self) -> usize {
        match &self.engine {
            Engine::Nlcg(_) => 0,
            Engine::Vmlmb(vm) => vm.memory_len(),
        }
    }
}

impl<F: Real> Optimizer<F> {
    /// Create an optimizer for the starting point `x`.
    ///
    /// Never fails: on invalid input the returned optimizer reports
    /// [`Task::InputError`] and [`Optimizer::last_error`] holds the reason.
    /// On success the task is [`Task::ComputeFg`]; `x` is left untouched.
    pub fn initialize(x: ArrayView1<F>, config: SolverConfig<F>, bounds: Bounds<F>) -> Self {
        let mut opt = Self {
            n: x.len(),
            task: Task::Start,
            status: Status::Success,
            last_error: None,
            iterations: 0,
            evaluations: 0,
            restarts: 0,
            step: F::zero(),
            gnorm: None,
            closed: false,
            work: None,
            config,
        };
        match Workspace::new(x, &opt.config, &bounds) {
            Ok(work) => {
                opt.work = Some(work);
                opt.task = Task::ComputeFg;
            }
            Err(err) => {
                opt.status = match err {
                    OptError::InfeasibleBounds { .. } => Status::InfeasibleBounds,
                    _ => Status::InvalidArgument,
                };
                opt.task = Task::InputError;
                opt.last_error = Some(err);
            }
        }
        opt
    }

    /// Advance the machine with the caller's values at `x`.
    ///
    /// `x` may be rewritten (next trial point, projection, or restoration of
    /// the last accepted iterate). Returns the next task.
    ///
    /// # Errors
    /// - [`OptError::UseAfterClose`] after [`Optimizer::close`].
    /// - [`OptError::DimensionMismatch`] if `x` or `g` changed length.
    ///
    /// Numerical problems are not errors here: they produce the `ERROR` task
    /// with [`Optimizer::last_error`] set.
    pub fn iterate(&mut self, x: ArrayViewMut1<F>, fx: F, g: ArrayView1<F>) -> OptResult<Task> {
        if self.closed {
            return Err(OptError::UseAfterClose);
        }
        if self.task.is_terminal() {
            return Ok(self.task);
        }
        verify_dimension("x", x.len(), self.n)?;
        verify_dimension("gradient", g.len(), self.n)?;
        let mut work = self.work.take().ok_or(OptError::NotInitialized {
            text: "optimizer has no solver state".to_string(),
        })?;
        let task = self.advance(&mut work, x, fx, g);
        self.work = Some(work);
        task
    }

    /// Release the solver state. Idempotent.
    pub fn close(&mut self) {
        self.work = None;
        self.closed = true;
    }

    /// Text value of a `Get_*` query.
    ///
    /// # Errors
    /// - [`OptError::UseAfterClose`] after [`Optimizer::close`].
    /// - [`OptError::InvalidTaskKey`] for an unknown key.
    pub fn task_info(&self, key: &str) -> OptResult<String> {
        if self.closed {
            return Err(OptError::UseAfterClose);
        }
        let key: TaskKey = key.parse()?;
        Ok(match key {
            TaskKey::Task => self.task.to_string(),
            TaskKey::Status => self.status.to_string(),
            TaskKey::Iterations => self.iterations.to_string(),
            TaskKey::Evaluations => self.evaluations.to_string(),
            TaskKey::Restarts => self.restarts.to_string(),
            TaskKey::Step => self.step.to_string(),
        })
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Reason for the last `INPUT_ERROR`, `ERROR`, or budget `WARNING`.
    pub fn last_error(&self) -> Option<&OptError> {
        self.last_error.as_ref()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn restarts(&self) -> usize {
        self.restarts
    }

    /// Last accepted step length.
    pub fn step(&self) -> F {
        self.step
    }

    /// Number of stored curvature pairs (always 0 for NLCG).
    pub fn memory_len(&self) -> usize {
        self.work.as_ref().map_or(0, Workspace::memory_len)
    }

    /// Projected-gradient norm at the last accepted iterate.
    pub fn gradient_norm(&self) -> Option<F> {
        self.gnorm
    }

    /// Last accepted iterate `(x, f(x), g(x))`; `None` before the first
    /// accepted evaluation or after `close`.
    pub fn accepted(&self) -> Option<(ArrayView1<'_, F>, F, ArrayView1<'_, F>)> {
        let w = self.work.as_ref()?;
        if w.stage == Stage::Initial {
            return None;
        }
        Some((w.x0.view(), w.f0, w.g0.view()))
    }

    pub fn config(&self) -> &SolverConfig<F> {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // ---- Transitions ----

    fn advance(
        &mut self, w: &mut Workspace<F>, x: ArrayViewMut1<F>, fx: F, g: ArrayView1<F>,
    ) -> OptResult<Task> {
        match self.task {
            Task::ComputeFg => Ok(self.on_evaluation(w, x, fx, g)),
            Task::NewX => Ok(self.on_new_x(w, x)),
            other => Err(OptError::InvalidTask { task: other.as_str() }),
        }
    }

    fn on_evaluation(
        &mut self, w: &mut Workspace<F>, mut x: ArrayViewMut1<F>, fx: F, g: ArrayView1<F>,
    ) -> Task {
        match w.stage {
            Stage::Initial => {
                if !w.projector.is_feasible(x.view()) {
                    w.projector.project(x);
                    return self.set(Task::ComputeFg, Status::Success);
                }
                self.evaluations += 1;
                if let Err(err) = check_values(fx, g) {
                    return self.fail(Status::UndefinedValue, err);
                }
                let gnorm = w.record_point(x.view(), fx, g);
                w.pg0_norm = gnorm;
                self.gnorm = Some(gnorm);
                self.at_accepted_point(w)
            }
            Stage::Search => {
                self.evaluations += 1;
                if let Err(err) = check_values(fx, g) {
                    x.assign(&w.x0);
                    return self.fail(Status::UndefinedValue, err);
                }
                let stp = w.line_search.step();
                // Slope along the actual (possibly projected) displacement.
                let dg = Zip::from(&g)
                    .and(&x)
                    .and(&w.x0)
                    .fold(F::zero(), |acc, &gi, &xi, &x0i| acc + gi * (xi - x0i))
                    / stp;
                match w.line_search.iterate(fx, dg) {
                    LineSearchStatus::Search => {
                        if self.evaluations >= self.config.max_eval {
                            x.assign(&w.x0);
                            return self.exhausted(Status::TooManyEvaluations);
                        }
                        w.trial_point(x, w.line_search.step());
                        self.set(Task::ComputeFg, Status::Success)
                    }
                    LineSearchStatus::Converged => {
                        self.accept(w, x.view(), fx, g);
                        self.at_accepted_point(w)
                    }
                    LineSearchStatus::Warning => {
                        self.accept(w, x.view(), fx, g);
                        let task = self.at_accepted_point(w);
                        if task == Task::NewX && w.line_search.hit_rounding_errors() {
                            return self.set(Task::Warning, Status::RoundingErrors);
                        }
                        task
                    }
                    LineSearchStatus::Failure => {
                        x.assign(&w.x0);
                        let status = if w.line_search.hit_rounding_errors() {
                            Status::RoundingErrors
                        } else {
                            Status::LineSearchFailure
                        };
                        let err = OptError::LineSearchFailure {
                            step: w.line_search.step().as_f64(),
                            reason: w.line_search.reason(),
                        };
                        self.fail(status, err)
                    }
                }
            }
            Stage::Accepted => {
                self.fail(Status::InvalidArgument, OptError::InvalidTask { task: "COMPUTE_FG" })
            }
        }
    }

    fn accept(&mut self, w: &mut Workspace<F>, x: ArrayView1<F>, fx: F, g: ArrayView1<F>) {
        let stp = w.line_search.step();
        self.iterations += 1;
        self.step = stp;

        let s = &x - &w.x0;
        let y = &g - &w.g0;
        let sty = dot(s.view(), y.view());
        let sts = dot(s.view(), s.view());
        let yty = dot(y.view(), y.view());
        w.selector.record(StepHistory { stp, dg: w.dg0, sty, sts, yty });

        // Steps cut short by a bound do not describe the curvature along d.
        let clipped = stp > w.first_hit;
        if let Engine::Vmlmb(vm) = &mut w.engine {
            if !clipped {
                vm.update(s, y);
            }
        }

        let gnorm = w.record_point(x, fx, g);
        self.gnorm = Some(gnorm);
    }

    fn at_accepted_point(&mut self, w: &Workspace<F>) -> Task {
        let gnorm = self.gnorm.unwrap_or_else(F::infinity);
        let threshold = self.config.gatol.max(self.config.grtol * w.pg0_norm);
        if gnorm <= threshold {
            return self.set(Task::FinalX, Status::GradientConvergence);
        }
        if self.iterations >= self.config.max_iter {
            return self.exhausted(Status::TooManyIterations);
        }
        self.set(Task::NewX, Status::Success)
    }

    fn on_new_x(&mut self, w: &mut Workspace<F>, mut x: ArrayViewMut1<F>) -> Task {
        x.assign(&w.x0);
        let gnorm = self.gnorm.unwrap_or_else(F::zero);

        let restarted = match &mut w.engine {
            Engine::Nlcg(nlcg) => nlcg.compute(w.g0.view(), self.step),
            Engine::Vmlmb(vm) => {
                vm.compute(w.x0.view(), w.g0.view(), w.pg.view(), &w.projector);
                false
            }
        };
        w.copy_direction();
        if restarted {
            self.restarts += 1;
        }

        let mut dg0 = dot(w.g0.view(), w.d.view());
        let mut d_norm = norm2(w.d.view());
        if !w.selector.is_sufficient_descent(dg0, gnorm, d_norm) {
            self.restarts += 1;
            w.steepest_descent();
            dg0 = dot(w.g0.view(), w.d.view());
            d_norm = norm2(w.d.view());
            if !(dg0 < F::zero()) {
                let err = OptError::NotDescentDirection { slope: dg0.as_f64() };
                return self.fail(Status::NotADescent, err);
            }
        }

        let stp = if w.memory_len() > 0 {
            F::one()
        } else {
            w.selector.initial_step(dg0, d_norm, norm2(w.x0.view()))
        };
        let stpmin = stp * F::lit(STPMIN_FACTOR);
        let mut stpmax = stp * F::lit(STPMAX_FACTOR);
        w.first_hit = F::infinity();
        if w.projector.has_bounds() {
            let limits = w.projector.step_limits(w.x0.view(), w.d.view());
            w.first_hit = limits.first;
            if limits.last < stpmax {
                stpmax = limits.last.max(stpmin);
            }
        }

        if self.evaluations >= self.config.max_eval {
            return self.exhausted(Status::TooManyEvaluations);
        }
        let first = match w.line_search.start(w.f0, dg0, stp, stpmin, stpmax) {
            Ok(first) => first,
            Err(err) => {
                let status = match err {
                    OptError::NotDescentDirection { .. } => Status::NotADescent,
                    _ => Status::LineSearchFailure,
                };
                return self.fail(status, err);
            }
        };
        w.dg0 = dg0;
        w.stage = Stage::Search;
        w.trial_point(x, first);
        self.set(Task::ComputeFg, Status::Success)
    }

    fn set(&mut self, task: Task, status: Status) -> Task {
        self.task = task;
        self.status = status;
        task
    }

    /// `WARNING` for an exhausted budget, with the limit recorded.
    fn exhausted(&mut self, status: Status) -> Task {
        let err = match status {
            Status::TooManyIterations => {
                OptError::BudgetExceeded { what: "iterations", limit: self.config.max_iter }
            }
            _ => OptError::BudgetExceeded { what: "evaluations", limit: self.config.max_eval },
        };
        self.last_error = Some(err);
        self.set(Task::Warning, status)
    }

    fn fail(&mut self, status: Status, err: OptError) -> Task {
        self.last_error = Some(err);
        self.set(Task::Error, status)
    }
}

fn check_values<F: Real>(fx: F, g: ArrayView1<F>) -> OptResult<()> {
    validate_value(fx)?;
    validate_grad(g, g.len())
}
