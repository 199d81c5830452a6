//! task_optimizer::types — numeric model and task/status vocabularies.
//!
//! Purpose
//! -------
//! Centralize the scalar trait, vector aliases, default constants, and the
//! closed vocabularies (`Task`, `Status`, `TaskKey`) shared by the
//! reverse-communication optimizer. Everything that is visible across module
//! boundaries as a plain value lives here.
//!
//! Key behaviors
//! -------------
//! - [`Real`] restricts the optimizer to `f32` or `f64`; the precision of an
//!   optimizer is fixed by its type parameter and can never change at run
//!   time.
//! - [`Task`] and [`Status`] render as the upper-case names callers compare
//!   against (`"COMPUTE_FG"`, `"GRADIENT_CONVERGENCE"`, ...).
//! - [`TaskKey`] parses the `Get_*` query names accepted by `task_info`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Terminal tasks (`FinalX`, `Warning`, `Error`, `InputError`) are sticky:
//!   once reached the optimizer never leaves them.
//!
//! Downstream usage
//! ----------------
//! - Engines import [`Real`] and [`Vector`]; front-ends use the `Display`
//!   implementations of [`Task`] and [`Status`] for reporting.
use std::{collections::HashMap, fmt, str::FromStr};

use argmin::core::ArgminFloat;
use ndarray::{Array1, LinalgScalar, ScalarOperand};
use num_traits::{FromPrimitive, ToPrimitive};

use crate::optimization::errors::OptError;

/// Floating-point scalar accepted by the optimizer (`f32` or `f64`).
pub trait Real:
    ArgminFloat + LinalgScalar + ScalarOperand + FromPrimitive + ToPrimitive
{
    /// Convert an `f64` literal into `Self` (NaN if unrepresentable).
    #[inline]
    fn lit(v: f64) -> Self {
        <Self as FromPrimitive>::from_f64(v).unwrap_or_else(Self::nan)
    }

    /// Widen to `f64` for error payloads and reporting.
    #[inline]
    fn as_f64(self) -> f64 {
        ToPrimitive::to_f64(&self).unwrap_or(f64::NAN)
    }
}

impl Real for f32 {}
impl Real for f64 {}

/// Variable, gradient, and direction vectors.
pub type Vector<F> = Array1<F>;

/// Function-evaluation counters as reported by the argmin executor.
pub type FnEvalMap = HashMap<String, u64>;

pub const DEFAULT_DELTA: f64 = 5e-2;
pub const DEFAULT_EPSILON: f64 = 1e-2;
pub const DEFAULT_GATOL: f64 = 1e-6;
pub const DEFAULT_GRTOL: f64 = 0.0;
pub const DEFAULT_MAX_ITER: usize = 500;
pub const DEFAULT_MAX_EVAL: usize = 500;
pub const DEFAULT_MEM: usize = 5;
pub const DEFAULT_SFTOL: f64 = 1e-4;
pub const DEFAULT_SGTOL: f64 = 0.9;
/// Curvature tolerance used by the cubic search when driving conjugate
/// gradients, which need a tighter line search than quasi-Newton methods.
pub const DEFAULT_SGTOL_NLCG_CUBIC: f64 = 0.1;
pub const DEFAULT_SXTOL: f64 = 1e-17;
pub const DEFAULT_NONMONOTONE_WINDOW: usize = 10;

/// Relative lower/upper limits of the line-search step w.r.t. the first trial.
pub const STPMIN_FACTOR: f64 = 1e-20;
pub const STPMAX_FACTOR: f64 = 1e20;

/// Instruction returned to the caller after each `iterate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Start,
    ComputeFg,
    NewX,
    FinalX,
    Warning,
    Error,
    InputError,
}

impl Task {
    /// `true` for `FinalX`, `Warning`, `Error`, and `InputError`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Task::FinalX | Task::Warning | Task::Error | Task::InputError)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Task::Start => "START",
            Task::ComputeFg => "COMPUTE_FG",
            Task::NewX => "NEW_X",
            Task::FinalX => "FINAL_X",
            Task::Warning => "WARNING",
            Task::Error => "ERROR",
            Task::InputError => "INPUT_ERROR",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason attached to the current task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    InvalidArgument,
    InfeasibleBounds,
    GradientConvergence,
    NotADescent,
    LineSearchFailure,
    RoundingErrors,
    UndefinedValue,
    TooManyIterations,
    TooManyEvaluations,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::InvalidArgument => "INVALID_ARGUMENT",
            Status::InfeasibleBounds => "INFEASIBLE_BOUNDS",
            Status::GradientConvergence => "GRADIENT_CONVERGENCE",
            Status::NotADescent => "NOT_A_DESCENT",
            Status::LineSearchFailure => "LINE_SEARCH_FAILURE",
            Status::RoundingErrors => "ROUNDING_ERRORS",
            Status::UndefinedValue => "UNDEFINED_VALUE",
            Status::TooManyIterations => "TOO_MANY_ITERATIONS",
            Status::TooManyEvaluations => "TOO_MANY_EVALUATIONS",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query accepted by `Optimizer::task_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKey {
    Task,
    Status,
    Iterations,
    Evaluations,
    Restarts,
    Step,
}

impl FromStr for TaskKey {
    type Err = OptError;

    /// Parse `Get_task`, `Get_status`, `Get_iterations`, `Get_evaluations`,
    /// `Get_restarts`, or `Get_step` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "get_task" => Ok(TaskKey::Task),
            "get_status" => Ok(TaskKey::Status),
            "get_iterations" => Ok(TaskKey::Iterations),
            "get_evaluations" => Ok(TaskKey::Evaluations),
            "get_restarts" => Ok(TaskKey::Restarts),
            "get_step" => Ok(TaskKey::Step),
            _ => Err(OptError::InvalidTaskKey { key: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Rendering of task/status names.
    // - Parsing of `task_info` keys.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Task names and terminal classification match the protocol vocabulary.
    //
    // Given
    // -----
    // - Every `Task` variant.
    //
    // Expect
    // ------
    // - Only FINAL_X, WARNING, ERROR, INPUT_ERROR are terminal.
    fn task_names_and_terminal_flags() {
        assert_eq!(Task::ComputeFg.to_string(), "COMPUTE_FG");
        assert_eq!(Task::InputError.to_string(), "INPUT_ERROR");
        assert!(!Task::Start.is_terminal());
        assert!(!Task::NewX.is_terminal());
        assert!(Task::FinalX.is_terminal());
        assert!(Task::Warning.is_terminal());
        assert!(Task::Error.is_terminal());
        assert!(Task::InputError.is_terminal());
    }

    #[test]
    // Purpose
    // -------
    // `TaskKey` parsing accepts the documented names in any case and rejects
    // anything else with `InvalidTaskKey`.
    //
    // Given
    // -----
    // - "Get_iterations", "GET_STEP", and "Get_foo".
    //
    // Expect
    // ------
    // - The first two parse; the last is an error carrying the key.
    fn task_key_parses_known_names_only() {
        assert_eq!("Get_iterations".parse::<TaskKey>(), Ok(TaskKey::Iterations));
        assert_eq!("GET_STEP".parse::<TaskKey>(), Ok(TaskKey::Step));
        assert_eq!(
            "Get_foo".parse::<TaskKey>(),
            Err(OptError::InvalidTaskKey { key: "Get_foo".to_string() })
        );
    }

    #[test]
    // Purpose
    // -------
    // `Real::lit` and `Real::as_f64` convert literals for both precisions.
    //
    // Given
    // -----
    // - The literal 0.5.
    //
    // Expect
    // ------
    // - Exact conversion for f32 and f64.
    fn real_literal_conversion() {
        assert_eq!(<f32 as Real>::lit(0.5), 0.5_f32);
        assert_eq!(<f64 as Real>::lit(0.5), 0.5_f64);
        assert_eq!(0.25_f32.as_f64(), 0.25_f64);
    }
}
