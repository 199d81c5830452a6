//! vector_ops — dense vector kernels shared by every optimizer component.
//!
//! Purpose
//! -------
//! Collect the handful of level-1 operations the optimizer needs (dot
//! products, norms, scaled updates, copies) behind small
//! free functions over `ndarray` views, so direction engines, line searches,
//! and the task machine never hand-roll loops.
//!
//! Invariants & assumptions
//! ------------------------
//! - All vectors taking part in one call have the same length. The callers
//!   validate dimensions once at initialization; these kernels only
//!   `debug_assert!` it.
//! - Operations are generic over [`Real`] (`f32` or `f64`) and never mix
//!   precisions.
//!
//! Conventions
//! -----------
//! - Outputs are written through `ArrayViewMut1` arguments; nothing here
//!   allocates.
use ndarray::{ArrayView1, ArrayViewMut1, Zip};

use crate::optimization::task_optimizer::types::Real;

/// Inner product `xᵀy`.
#[inline]
pub fn dot<F: Real>(x: ArrayView1<F>, y: ArrayView1<F>) -> F {
    debug_assert_eq!(x.len(), y.len());
    x.dot(&y)
}

/// Inner product restricted to the components where `mask` is non-zero.
#[inline]
pub fn masked_dot<F: Real>(mask: ArrayView1<F>, x: ArrayView1<F>, y: ArrayView1<F>) -> F {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.len(), mask.len());
    Zip::from(&mask).and(&x).and(&y).fold(F::zero(), |acc, &w, &a, &b| {
        if w != F::zero() { acc + a * b } else { acc }
    })
}

/// Euclidean norm `‖x‖₂`.
#[inline]
pub fn norm2<F: Real>(x: ArrayView1<F>) -> F {
    dot(x, x).sqrt()
}

/// `y ← y + a·x`.
#[inline]
pub fn axpy<F: Real>(a: F, x: ArrayView1<F>, mut y: ArrayViewMut1<F>) {
    debug_assert_eq!(x.len(), y.len());
    y.scaled_add(a, &x);
}

/// `z ← a·x + b·y`.
#[inline]
pub fn combine<F: Real>(mut z: ArrayViewMut1<F>, a: F, x: ArrayView1<F>, b: F, y: ArrayView1<F>) {
    debug_assert_eq!(z.len(), x.len());
    debug_assert_eq!(z.len(), y.len());
    Zip::from(&mut z).and(&x).and(&y).for_each(|zi, &xi, &yi| *zi = a * xi + b * yi);
}

/// `x ← a·x`.
#[inline]
pub fn scale<F: Real>(mut x: ArrayViewMut1<F>, a: F) {
    x.mapv_inplace(|v| a * v);
}

/// `dst ← src`.
#[inline]
pub fn copy_into<F: Real>(mut dst: ArrayViewMut1<F>, src: ArrayView1<F>) {
    dst.assign(&src);
}
