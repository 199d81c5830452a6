//! optimization — reverse-communication minimizers, vector kernels, and the
//! unified error surface.
//!
//! Purpose
//! -------
//! Provide a self-contained layer for large-scale smooth minimization:
//! conjugate-gradient and limited-memory variable-metric methods driven by
//! the caller through a task protocol, the dense vector kernels they run on,
//! and a single error/result type shared by every entry point.
//!
//! Key behaviors
//! -------------
//! - `task_optimizer`: the optimizer state machine, its direction engines
//!   and line searches, box projections, and the argmin-hosted driver.
//! - `vector_ops`: dot products, norms, and `axpy`-style updates over
//!   `ndarray` views in `f32` or `f64`.
//! - `errors`: configuration issues, numerical failures, and backend errors
//!   normalized into `OptError` with the alias `OptResult<T>`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are validated once at the boundary (initialization, driver
//!   entry); engines assume finite data afterwards.
//! - Invalid states are reported as `OptError` values or as `ERROR` tasks,
//!   never as panics.
//!
//! Conventions
//! -----------
//! - Vectors are `ndarray::Array1<F>` and are passed as views so caller
//!   buffers are updated in place.
//! - This module and its submodules avoid I/O; progress reporting belongs to
//!   the driver (`obs_slog` feature) and the Python bindings.
//!
//! Downstream usage
//! ----------------
//! - Rust callers either drive `task_optimizer::Optimizer` themselves or call
//!   `task_optimizer::minimize` with an `Objective`.
//! - Front-ends typically import `optimization::prelude::*`.

pub mod errors;
pub mod task_optimizer;
pub mod vector_ops;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_optimpack::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::task_optimizer::prelude::*;
}
