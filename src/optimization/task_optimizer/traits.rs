//! Public configuration and result surface for the task optimizer.
//!
//! - [`Objective`]: trait users implement to drive the optimizer through
//!   [`minimize`](crate::optimization::task_optimizer::minimize).
//! - [`SolverConfig`]: every tunable of the optimizer, validated once at
//!   initialization.
//! - [`Algorithm`], [`LineSearchKind`], [`AutoStep`], [`NlcgMethod`],
//!   [`VmlmbMethod`]: closed choices parsed case-insensitively from strings.
//! - [`BoundValue`] / [`Bounds`]: optional box constraints.
//! - [`MinimizeOutcome`]: normalized result returned by the driver.
use std::str::FromStr;

use argmin_math::ArgminL2Norm;

use crate::optimization::{
    errors::{OptError, OptResult},
    task_optimizer::{
        types::{
            DEFAULT_DELTA, DEFAULT_EPSILON, DEFAULT_GATOL, DEFAULT_GRTOL, DEFAULT_MAX_EVAL,
            DEFAULT_MAX_ITER, DEFAULT_MEM, DEFAULT_NONMONOTONE_WINDOW, DEFAULT_SFTOL,
            DEFAULT_SGTOL, DEFAULT_SGTOL_NLCG_CUBIC, DEFAULT_SXTOL, FnEvalMap, Real, Status, Task,
            Vector,
        },
        validation::{
            validate_start, validate_value, verify_delta, verify_epsilon,
            verify_line_search_params, verify_memory, verify_tolerance, verify_window,
        },
    },
};

/// User-implemented objective interface for the high-level driver.
///
/// Required:
/// - `value(&x) -> OptResult<f64>`: evaluate `f(x)`.
///   - Errors: return a descriptive `OptError` for invalid inputs.
///
/// Optional:
/// - `grad(&x) -> OptResult<Vector<f64>>`: analytic gradient `∇f(x)`.
///   If not implemented, finite differences are used automatically.
/// - `check(&x) -> OptResult<()>`: validation hook called once before the
///   run starts.
pub trait Objective {
    // Required methods
    fn value(&self, x: &Vector<f64>) -> OptResult<f64>;

    // Optional methods
    fn grad(&self, _x: &Vector<f64>) -> OptResult<Vector<f64>> {
        Err(OptError::GradientNotImplemented)
    }

    fn check(&self, _x: &Vector<f64>) -> OptResult<()> {
        Ok(())
    }
}

/// Optimization family.
///
/// - `Nlcg`: nonlinear conjugate gradient (unconstrained only).
/// - `Vmlmb`: limited-memory variable metric, optionally with bounds.
///
/// Parses `"nlcg"` / `"vmlmb"` case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    Nlcg,
    Vmlmb,
}

impl FromStr for Algorithm {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nlcg" => Ok(Algorithm::Nlcg),
            "vmlmb" => Ok(Algorithm::Vmlmb),
            _ => Err(OptError::InvalidAlgorithm {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'nlcg' or 'vmlmb'.",
            }),
        }
    }
}

/// Line-search strategy.
///
/// Parses `"quadratic"`, `"armijo"`, `"cubic"` (Moré–Thuente), or
/// `"nonmonotone"` case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSearchKind {
    #[default]
    Quadratic,
    Armijo,
    Cubic,
    Nonmonotone,
}

impl FromStr for LineSearchKind {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quadratic" => Ok(LineSearchKind::Quadratic),
            "armijo" => Ok(LineSearchKind::Armijo),
            "cubic" | "morethuente" => Ok(LineSearchKind::Cubic),
            "nonmonotone" => Ok(LineSearchKind::Nonmonotone),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'quadratic', 'armijo', 'cubic', \
                         or 'nonmonotone'.",
            }),
        }
    }
}

/// Heuristic for the initial trial step of each line search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoStep {
    #[default]
    ShannoPhua,
    OrenSpedicato,
    BarzilaiBorwein,
}

impl FromStr for AutoStep {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shannophua" => Ok(AutoStep::ShannoPhua),
            "orenspedicato" => Ok(AutoStep::OrenSpedicato),
            "barzilaiborwein" => Ok(AutoStep::BarzilaiBorwein),
            _ => Err(OptError::InvalidAutoStep {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'ShannoPhua', 'OrenSpedicato', \
                         or 'BarzilaiBorwein'.",
            }),
        }
    }
}

/// Conjugate-gradient update formula for β.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NlcgMethod {
    #[default]
    FletcherReeves,
    HestenesStiefel,
    PolakRibierePolyak,
    Fletcher,
    LiuStorey,
    DaiYuan,
    PerryShanno,
    HagerZhang,
}

impl FromStr for NlcgMethod {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fletcherreeves" => Ok(NlcgMethod::FletcherReeves),
            "hestenesstiefel" => Ok(NlcgMethod::HestenesStiefel),
            "polakribierepolyak" => Ok(NlcgMethod::PolakRibierePolyak),
            "fletcher" => Ok(NlcgMethod::Fletcher),
            "liustorey" => Ok(NlcgMethod::LiuStorey),
            "daiyuan" => Ok(NlcgMethod::DaiYuan),
            "perryshanno" => Ok(NlcgMethod::PerryShanno),
            "hagerzhang" => Ok(NlcgMethod::HagerZhang),
            _ => Err(OptError::InvalidNlcgMethod {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'FletcherReeves', \
                         'HestenesStiefel', 'PolakRibierePolyak', 'Fletcher', 'LiuStorey', \
                         'DaiYuan', 'PerryShanno', or 'HagerZhang'.",
            }),
        }
    }
}

/// Variable-metric variant.
///
/// - `Lbfgs`: plain L-BFGS, no bounds.
/// - `Blmvm`: recursion on the projected gradient, projected direction.
/// - `Vmlmb`: recursion restricted to the free variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VmlmbMethod {
    Blmvm,
    Vmlmb,
    #[default]
    Lbfgs,
}

impl FromStr for VmlmbMethod {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blmvm" => Ok(VmlmbMethod::Blmvm),
            "vmlmb" => Ok(VmlmbMethod::Vmlmb),
            "lbfgs" => Ok(VmlmbMethod::Lbfgs),
            _ => Err(OptError::InvalidVmlmbMethod {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'blmvm', 'vmlmb', or 'lbfgs'.",
            }),
        }
    }
}

/// One side of the box constraints.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BoundValue<F> {
    #[default]
    Unbounded,
    Scalar(F),
    PerComponent(Vector<F>),
}

impl<F> BoundValue<F> {
    pub fn is_unbounded(&self) -> bool {
        matches!(self, BoundValue::Unbounded)
    }
}

/// Box constraints `lower <= x <= upper`; either side may be absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bounds<F> {
    pub lower: BoundValue<F>,
    pub upper: BoundValue<F>,
}

impl<F> Bounds<F> {
    pub fn new(lower: BoundValue<F>, upper: BoundValue<F>) -> Self {
        Self { lower, upper }
    }

    /// No constraint on either side.
    pub fn none() -> Self {
        Self { lower: BoundValue::Unbounded, upper: BoundValue::Unbounded }
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_unbounded() && self.upper.is_unbounded()
    }
}

/// Optimizer configuration.
///
/// Fields and defaults:
/// - `algorithm`: `Nlcg`
/// - `line_search`: `Quadratic`
/// - `autostep`: `ShannoPhua`
/// - `nlcg_method`: `FletcherReeves`
/// - `vmlmb_method`: `Lbfgs`
/// - `delta = 5e-2`, `epsilon = 1e-2`
/// - `gatol = 1e-6`, `grtol = 0`
/// - `max_iter = 500`, `max_eval = 500`
/// - `mem = 5`, `powell = false`
/// - `sftol = 1e-4`, `sgtol = None` (0.9, or 0.1 for NLCG with the cubic
///   search), `sxtol = 1e-17`
/// - `nonmonotone_window = 10`, `max_backtracks = None`
///
/// The configuration is immutable once handed to an optimizer. Use the
/// `with_*` setters to build one and [`SolverConfig::validate`] to check it
/// ahead of time; `Optimizer::initialize` validates it again.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig<F> {
    pub algorithm: Algorithm,
    pub line_search: LineSearchKind,
    pub autostep: AutoStep,
    pub nlcg_method: NlcgMethod,
    pub vmlmb_method: VmlmbMethod,
    pub delta: F,
    pub epsilon: F,
    pub gatol: F,
    pub grtol: F,
    pub max_iter: usize,
    pub max_eval: usize,
    pub mem: usize,
    pub powell: bool,
    pub sftol: F,
    pub sgtol: Option<F>,
    pub sxtol: F,
    pub nonmonotone_window: usize,
    pub max_backtracks: Option<usize>,
}

impl<F: Real> Default for SolverConfig<F> {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            line_search: LineSearchKind::default(),
            autostep: AutoStep::default(),
            nlcg_method: NlcgMethod::default(),
            vmlmb_method: VmlmbMethod::default(),
            delta: F::lit(DEFAULT_DELTA),
            epsilon: F::lit(DEFAULT_EPSILON),
            gatol: F::lit(DEFAULT_GATOL),
            grtol: F::lit(DEFAULT_GRTOL),
            max_iter: DEFAULT_MAX_ITER,
            max_eval: DEFAULT_MAX_EVAL,
            mem: DEFAULT_MEM,
            powell: false,
            sftol: F::lit(DEFAULT_SFTOL),
            sgtol: None,
            sxtol: F::lit(DEFAULT_SXTOL),
            nonmonotone_window: DEFAULT_NONMONOTONE_WINDOW,
            max_backtracks: None,
        }
    }
}

impl<F: Real> SolverConfig<F> {
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_line_search(mut self, line_search: LineSearchKind) -> Self {
        self.line_search = line_search;
        self
    }

    pub fn with_autostep(mut self, autostep: AutoStep) -> Self {
        self.autostep = autostep;
        self
    }

    pub fn with_nlcg_method(mut self, method: NlcgMethod) -> Self {
        self.nlcg_method = method;
        self
    }

    pub fn with_vmlmb_method(mut self, method: VmlmbMethod) -> Self {
        self.vmlmb_method = method;
        self
    }

    pub fn with_delta(mut self, delta: F) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_epsilon(mut self, epsilon: F) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_gatol(mut self, gatol: F) -> Self {
        self.gatol = gatol;
        self
    }

    pub fn with_grtol(mut self, grtol: F) -> Self {
        self.grtol = grtol;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_max_eval(mut self, max_eval: usize) -> Self {
        self.max_eval = max_eval;
        self
    }

    pub fn with_mem(mut self, mem: usize) -> Self {
        self.mem = mem;
        self
    }

    pub fn with_powell(mut self, powell: bool) -> Self {
        self.powell = powell;
        self
    }

    pub fn with_sftol(mut self, sftol: F) -> Self {
        self.sftol = sftol;
        self
    }

    pub fn with_sgtol(mut self, sgtol: F) -> Self {
        self.sgtol = Some(sgtol);
        self
    }

    pub fn with_sxtol(mut self, sxtol: F) -> Self {
        self.sxtol = sxtol;
        self
    }

    pub fn with_nonmonotone_window(mut self, window: usize) -> Self {
        self.nonmonotone_window = window;
        self
    }

    pub fn with_max_backtracks(mut self, max_backtracks: usize) -> Self {
        self.max_backtracks = Some(max_backtracks);
        self
    }

    /// Curvature tolerance actually used by the line search.
    ///
    /// An explicit `sgtol` wins; otherwise `0.1` for NLCG with the cubic
    /// search and `0.9` everywhere else.
    pub fn effective_sgtol(&self) -> F {
        match self.sgtol {
            Some(sgtol) => sgtol,
            None if self.algorithm == Algorithm::Nlcg
                && self.line_search == LineSearchKind::Cubic =>
            {
                F::lit(DEFAULT_SGTOL_NLCG_CUBIC)
            }
            None => F::lit(DEFAULT_SGTOL),
        }
    }

    /// Validate every numeric field.
    ///
    /// # Errors
    /// The first failing check among tolerances, `delta`, `epsilon`,
    /// line-search constants, `mem`, and `nonmonotone_window`.
    pub fn validate(&self) -> OptResult<()> {
        verify_tolerance("gatol", self.gatol)?;
        verify_tolerance("grtol", self.grtol)?;
        verify_delta(self.delta)?;
        verify_epsilon(self.epsilon)?;
        verify_line_search_params(
            self.sftol,
            self.effective_sgtol(),
            self.sxtol,
            self.max_backtracks,
        )?;
        verify_memory(self.mem)?;
        verify_window(self.nonmonotone_window)?;
        Ok(())
    }
}

/// Canonical result returned by the driver.
///
/// - `x`: final iterate (last accepted point).
/// - `value`: `f(x)`.
/// - `task`: terminal task (`FinalX` or `Warning`).
/// - `status`: reason attached to the terminal task.
/// - `converged`: `true` only for `FinalX`.
/// - `iterations`, `evaluations`, `restarts`: optimizer counters.
/// - `fn_evals`: argmin's counters (`cost_count`, `gradient_count`).
/// - `grad_norm`: Euclidean norm of the final gradient, when available.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizeOutcome<F> {
    pub x: Vector<F>,
    pub value: F,
    pub task: Task,
    pub status: Status,
    pub converged: bool,
    pub iterations: usize,
    pub evaluations: usize,
    pub restarts: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<F>,
}

impl<F> MinimizeOutcome<F>
where
    F: Real,
    Vector<F>: ArgminL2Norm<F>,
{
    /// Build a validated [`MinimizeOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - [`OptError::NotInitialized`] if the executor produced no parameter.
    /// - Validation errors if `x` or `value` are not finite.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        x: Option<Vector<F>>, value: F, task: Task, status: Status, iterations: usize,
        evaluations: usize, restarts: usize, fn_evals: FnEvalMap, grad: Option<Vector<F>>,
    ) -> OptResult<Self> {
        let x = x.ok_or(OptError::NotInitialized {
            text: "executor finished without a parameter vector".to_string(),
        })?;
        validate_start(x.view())?;
        validate_value(value)?;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            x,
            value,
            task,
            status,
            converged: task == Task::FinalX,
            iterations,
            evaluations,
            restarts,
            fn_evals,
            grad_norm,
        })
    }
}
