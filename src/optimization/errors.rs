//! Unified error surface for the task-driven optimizer.
//!
//! Every fallible entry point in [`crate::optimization`] returns
//! [`OptResult<T>`]. Configuration problems detected at `initialize` are also
//! stored on the optimizer and surfaced through the `INPUT_ERROR` task so that
//! reverse-communication callers can branch on the task code alone.
//!
//! ## Conventions
//! - **Indices are 0-based** (match Rust/NumPy).
//! - Recoverable numerical conditions (non-descent directions, rejected
//!   curvature pairs) are handled inside the solver and never escape as errors
//!   unless the recovery itself fails.
//! - Argmin runtime errors raised by the driver are normalized into the
//!   wrapper variants at the bottom of [`OptError`].
use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Variables / dimensions ----
    /// The variable vector has no components.
    EmptyVariables,

    /// A vector does not have the dimension fixed at initialization.
    DimensionMismatch { what: &'static str, expected: usize, found: usize },

    /// Starting point elements need to be finite.
    InvalidStartingPoint { index: usize, value: f64 },

    // ---- SolverConfig ----
    /// Gradient tolerances need to be finite and non-negative.
    InvalidTolerance { name: &'static str, value: f64, reason: &'static str },

    /// Relative small-step size must be finite and strictly positive.
    InvalidDelta { value: f64, reason: &'static str },

    /// Descent threshold must lie in `[0, 1)`.
    InvalidEpsilon { value: f64, reason: &'static str },

    /// Line-search constants must satisfy `0 < sftol < sgtol < 1`.
    InvalidLineSearchParam { name: &'static str, value: f64, reason: &'static str },

    /// Limited-memory size needs to be at least 1.
    InvalidMemory { mem: usize, reason: &'static str },

    /// Nonmonotone window needs to be at least 1.
    InvalidWindow { window: usize, reason: &'static str },

    /// Invalid algorithm name.
    InvalidAlgorithm { name: String, reason: &'static str },

    /// Invalid line searcher name.
    InvalidLineSearch { name: String, reason: &'static str },

    /// Invalid step-length heuristic name.
    InvalidAutoStep { name: String, reason: &'static str },

    /// Invalid conjugate-gradient update name.
    InvalidNlcgMethod { name: String, reason: &'static str },

    /// Invalid variable-metric variant name.
    InvalidVmlmbMethod { name: String, reason: &'static str },

    // ---- Bounds ----
    /// Lower bound exceeds upper bound for some component.
    InfeasibleBounds { index: usize, lower: f64, upper: f64 },

    /// A bound value is NaN.
    InvalidBound { index: usize, value: f64 },

    /// Bounds were supplied to a method that cannot handle them.
    BoundsNotSupported { method: &'static str },

    // ---- Evaluation ----
    /// Objective returned a non-finite value.
    NonFiniteCost { value: f64 },

    /// Gradient elements need to be finite.
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    /// Implies that finite differences should be used.
    GradientNotImplemented,

    // ---- Search ----
    /// The search direction is not a descent direction (`gᵀd >= 0`).
    NotDescentDirection { slope: f64 },

    /// The line search could not find an acceptable step.
    LineSearchFailure { step: f64, reason: &'static str },

    /// Iteration or evaluation cap reached before convergence.
    BudgetExceeded { what: &'static str, limit: usize },

    // ---- Protocol ----
    /// The optimizer has been closed; its state is gone.
    UseAfterClose,

    /// Unknown `task_info` key.
    InvalidTaskKey { key: String },

    /// `iterate` was called in a state that cannot accept it.
    InvalidTask { task: &'static str },

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter { text: String },
    /// Wrapper for argmin::NotImplemented
    NotImplemented { text: String },
    /// Wrapper for argmin::NotInitialized
    NotInitialized { text: String },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated { text: String },
    /// Wrapper for argmin::PotentialBug
    PotentialBug { text: String },
    /// Wrapper for other argmin::Error types
    BackendError { text: String },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Variables / dimensions ----
            OptError::EmptyVariables => {
                write!(f, "Variable vector must have at least one component")
            }
            OptError::DimensionMismatch { what, expected, found } => {
                write!(f, "Dimension mismatch for {what}: expected {expected}, found {found}")
            }
            OptError::InvalidStartingPoint { index, value } => {
                write!(f, "Invalid starting point at index {index}: {value}, must be finite")
            }

            // ---- SolverConfig ----
            OptError::InvalidTolerance { name, value, reason } => {
                write!(f, "Invalid tolerance {name} = {value}: {reason}")
            }
            OptError::InvalidDelta { value, reason } => {
                write!(f, "Invalid delta {value}: {reason}")
            }
            OptError::InvalidEpsilon { value, reason } => {
                write!(f, "Invalid epsilon {value}: {reason}")
            }
            OptError::InvalidLineSearchParam { name, value, reason } => {
                write!(f, "Invalid line-search parameter {name} = {value}: {reason}")
            }
            OptError::InvalidMemory { mem, reason } => {
                write!(f, "Invalid variable-metric memory {mem}: {reason}")
            }
            OptError::InvalidWindow { window, reason } => {
                write!(f, "Invalid nonmonotone window {window}: {reason}")
            }
            OptError::InvalidAlgorithm { name, reason } => {
                write!(f, "Invalid algorithm '{name}': {reason}")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidAutoStep { name, reason } => {
                write!(f, "Invalid autostep '{name}': {reason}")
            }
            OptError::InvalidNlcgMethod { name, reason } => {
                write!(f, "Invalid nlcg method '{name}': {reason}")
            }
            OptError::InvalidVmlmbMethod { name, reason } => {
                write!(f, "Invalid vmlmb method '{name}': {reason}")
            }

            // ---- Bounds ----
            OptError::InfeasibleBounds { index, lower, upper } => {
                write!(f, "Infeasible bounds at index {index}: lower {lower} > upper {upper}")
            }
            OptError::InvalidBound { index, value } => {
                write!(f, "Invalid bound at index {index}: {value}")
            }
            OptError::BoundsNotSupported { method } => {
                write!(f, "Bounds are not supported by {method}; use algorithm 'vmlmb'")
            }

            // ---- Evaluation ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite objective value: {value}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }
            OptError::GradientNotImplemented => {
                write!(f, "Analytic gradient not implemented")
            }

            // ---- Search ----
            OptError::NotDescentDirection { slope } => {
                write!(f, "Search direction is not a descent direction (slope {slope})")
            }
            OptError::LineSearchFailure { step, reason } => {
                write!(f, "Line search failed at step {step}: {reason}")
            }
            OptError::BudgetExceeded { what, limit } => {
                write!(f, "Too many {what} (limit {limit})")
            }

            // ---- Protocol ----
            OptError::UseAfterClose => {
                write!(f, "Optimizer used after close")
            }
            OptError::InvalidTaskKey { key } => {
                write!(
                    f,
                    "Unknown task_info key '{key}'; valid keys are Get_task, Get_status, \
                     Get_iterations, Get_evaluations, Get_restarts, Get_step"
                )
            }
            OptError::InvalidTask { task } => {
                write!(f, "Cannot iterate from task {task}")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // Our own errors travel through argmin boxed; recover them first.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

/// Convert an [`OptError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl std::convert::From<OptError> for pyo3::PyErr {
    fn from(err: OptError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Messages of the runtime errors reported through the task protocol.
    // - Recovery of `OptError` values that travelled through `argmin::Error`.
    //
    // They intentionally DO NOT cover:
    // - Display formatting of every variant.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Budget and line-search messages name the exhausted resource and the
    // failing step, since they are shown verbatim to Python callers.
    //
    // Given
    // -----
    // - A `BudgetExceeded` for evaluations and a `LineSearchFailure`.
    //
    // Expect
    // ------
    // - Both messages carry their fields.
    fn display_names_budget_and_line_search_failures() {
        // Arrange
        let budget = OptError::BudgetExceeded { what: "evaluations", limit: 3 };
        let search = OptError::LineSearchFailure { step: 0.5, reason: "step below stpmin" };

        // Act / Assert
        assert_eq!(budget.to_string(), "Too many evaluations (limit 3)");
        assert_eq!(search.to_string(), "Line search failed at step 0.5: step below stpmin");
    }

    #[test]
    // Purpose
    // -------
    // An `OptError` boxed into `argmin::core::Error` must come back unchanged.
    //
    // Given
    // -----
    // - `OptError::NonFiniteCost` converted into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - `OptError::from` recovers the original variant and payload.
    fn from_argmin_error_recovers_original_opt_error() {
        // Arrange
        let original = OptError::NonFiniteCost { value: f64::INFINITY };
        let boxed: Error = original.clone().into();

        // Act
        let recovered = OptError::from(boxed);

        // Assert
        assert_eq!(recovered, original);
    }

    #[test]
    // Purpose
    // -------
    // Argmin's own error kinds map onto the wrapper variants.
    //
    // Given
    // -----
    // - `ArgminError::InvalidParameter` wrapped into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - The conversion yields `OptError::InvalidParameter` with the same text.
    fn from_argmin_error_maps_invalid_parameter() {
        // Arrange
        let err: Error = ArgminError::InvalidParameter { text: "bad".to_string() }.into();

        // Act
        let mapped = OptError::from(err);

        // Assert
        assert_eq!(mapped, OptError::InvalidParameter { text: "bad".to_string() });
    }
}
