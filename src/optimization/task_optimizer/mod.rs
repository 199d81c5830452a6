//! task_optimizer — reverse-communication NLCG and VMLM-B minimizers.
//!
//! Purpose
//! -------
//! Minimize a smooth function `f(x)` over `x ∈ ℝⁿ`, optionally subject to
//! box constraints `l ≤ x ≤ u`, without ever calling `f` directly. The
//! caller owns the variables and the gradient buffer, evaluates `f(x)` and
//! `∇f(x)` when asked, and advances an [`Optimizer`] until it reports a
//! terminal [`Task`].
//!
//! Key behaviors
//! -------------
//! - [`Optimizer`] implements the task machine
//!   `START → COMPUTE_FG ⇄ NEW_X → FINAL_X | WARNING | ERROR`, with
//!   `INPUT_ERROR` for rejected input.
//! - Directions come from [`nlcg`] (eight conjugate-gradient formulas) or
//!   [`vmlmb`] (L-BFGS two-loop recursion with `lbfgs`, `blmvm`, and `vmlmb`
//!   variants); steps from [`line_search`] (quadratic, Armijo, Moré–Thuente,
//!   nonmonotone) seeded by [`step`].
//! - [`bounds`] projects points, gradients, and directions onto the box.
//! - [`minimize`] runs the whole loop for a user [`Objective`] inside
//!   argmin's `Executor` ([`run::TaskSolver`]); [`run::drive`] does the same
//!   for a plain callback.
//!
//! Invariants & assumptions
//! ------------------------
//! - One optimizer owns its state exclusively; independent optimizers share
//!   nothing and may live on different threads.
//! - Every iterate handed back to the caller lies inside the box.
//! - Accepted function values never increase unless the nonmonotone line
//!   search is selected.
//!
//! Conventions
//! -----------
//! - The precision is the type parameter `F` ([`Real`]: `f32` or `f64`).
//! - Configuration is a typed [`SolverConfig`]; names accepted by Python
//!   callers parse through `FromStr` on the option enums.
//! - Numerical trouble is reported through the task protocol
//!   (`ERROR` plus [`Optimizer::last_error`]); only protocol misuse such as
//!   use after `close` returns `Err`.
//!
//! Testing notes
//! -------------
//! - Each engine module has unit tests against hand-computed values.
//! - Crate-level tests under `tests/` drive the full protocol on quadratic
//!   and Rosenbrock-like problems.

pub mod adapter;
pub mod api;
pub mod bounds;
pub mod builders;
pub mod line_search;
pub mod nlcg;
pub mod optimizer;
pub mod run;
pub mod step;
pub mod traits;
pub mod types;
pub mod validation;
pub mod vmlmb;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::minimize;
pub use self::optimizer::Optimizer;
pub use self::run::{TaskSolver, drive, run_task_solver};
pub use self::traits::{
    Algorithm, AutoStep, BoundValue, Bounds, LineSearchKind, MinimizeOutcome, NlcgMethod,
    Objective, SolverConfig, VmlmbMethod,
};
pub use self::types::{FnEvalMap, Real, Status, Task, TaskKey, Vector};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_optimpack::optimization::task_optimizer::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::minimize;
    pub use super::optimizer::Optimizer;
    pub use super::traits::{Bounds, BoundValue, MinimizeOutcome, Objective, SolverConfig};
    pub use super::types::{Status, Task, Vector};
}
