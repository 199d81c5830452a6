//! task_optimizer::bounds — projection onto the feasible box.
//!
//! Purpose
//! -------
//! Resolve user [`Bounds`] into dense per-component limits once, then provide
//! the box operations the variable-metric engine and the task machine need:
//! projection of points, projected gradients, projected directions, free
//! variable masks, and the step limits along a direction.
//!
//! Invariants & assumptions
//! ------------------------
//! - `lower[i] <= upper[i]` for every component (checked by
//!   [`BoundProjector::new`]).
//! - Missing sides are stored as `-∞` / `+∞`, so every comparison below is
//!   valid with or without constraints.
//! - A component is *blocked* when it sits on a bound and the steepest
//!   descent direction `-g` points outside the box.
use ndarray::{ArrayView1, ArrayViewMut1, Zip};

use crate::optimization::{
    errors::{OptError, OptResult},
    task_optimizer::{
        traits::{BoundValue, Bounds},
        types::{Real, Vector},
        validation::verify_dimension,
    },
};

/// Which sides of the box are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundMode {
    None,
    Lower,
    Upper,
    Both,
}

/// Step lengths along `d` at which the projected path changes.
///
/// - `first`: smallest positive step at which some free component hits its
///   bound (`+∞` if none does).
/// - `last`: step beyond which no component moves any more (`+∞` if some
///   component moves without limit).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLimits<F> {
    pub first: F,
    pub last: F,
}

/// Dense box `[lower, upper]` with the projection operators.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundProjector<F> {
    lower: Vector<F>,
    upper: Vector<F>,
    mode: BoundMode,
}

impl<F: Real> BoundProjector<F> {
    /// Resolve `bounds` for `n` variables.
    ///
    /// # Errors
    /// - [`OptError::DimensionMismatch`] if a per-component bound has the
    ///   wrong length.
    /// - [`OptError::InvalidBound`] if a bound value is NaN.
    /// - [`OptError::InfeasibleBounds`] if `lower[i] > upper[i]`.
    pub fn new(bounds: &Bounds<F>, n: usize) -> OptResult<Self> {
        if bounds.is_empty() {
            return Ok(Self::unbounded(n));
        }
        let lower = resolve(&bounds.lower, n, F::neg_infinity(), "lower bound")?;
        let upper = resolve(&bounds.upper, n, F::infinity(), "upper bound")?;
        for (index, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if lo > hi {
                return Err(OptError::InfeasibleBounds {
                    index,
                    lower: lo.as_f64(),
                    upper: hi.as_f64(),
                });
            }
        }
        let mode = match (bounds.lower.is_unbounded(), bounds.upper.is_unbounded()) {
            (true, true) => BoundMode::None,
            (false, true) => BoundMode::Lower,
            (true, false) => BoundMode::Upper,
            (false, false) => BoundMode::Both,
        };
        Ok(Self { lower, upper, mode })
    }

    /// Projector for an unconstrained problem of size `n`.
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: Vector::from_elem(n, F::neg_infinity()),
            upper: Vector::from_elem(n, F::infinity()),
            mode: BoundMode::None,
        }
    }

    pub fn has_bounds(&self) -> bool {
        self.mode != BoundMode::None
    }

    /// Clamp `x` into the box in place.
    pub fn project(&self, mut x: ArrayViewMut1<F>) {
        if !self.has_bounds() {
            return;
        }
        Zip::from(&mut x).and(&self.lower).and(&self.upper).for_each(|xi, &lo, &hi| {
            if *xi < lo {
                *xi = lo;
            } else if *xi > hi {
                *xi = hi;
            }
        });
    }

    pub fn is_feasible(&self, x: ArrayView1<F>) -> bool {
        Zip::from(&x).and(&self.lower).and(&self.upper).all(|&xi, &lo, &hi| lo <= xi && xi <= hi)
    }

    /// `pg ← g` with blocked components zeroed.
    pub fn projected_gradient(&self, x: ArrayView1<F>, g: ArrayView1<F>, mut pg: ArrayViewMut1<F>) {
        Zip::from(&mut pg).and(&x).and(&g).and(&self.lower).and(&self.upper).for_each(
            |pgi, &xi, &gi, &lo, &hi| {
                *pgi = if is_blocked(xi, gi, lo, hi) { F::zero() } else { gi };
            },
        );
    }

    /// Euclidean norm of the projected gradient without materializing it.
    pub fn projected_gradient_norm(&self, x: ArrayView1<F>, g: ArrayView1<F>) -> F {
        Zip::from(&x)
            .and(&g)
            .and(&self.lower)
            .and(&self.upper)
            .fold(F::zero(), |acc, &xi, &gi, &lo, &hi| {
                if is_blocked(xi, gi, lo, hi) { acc } else { acc + gi * gi }
            })
            .sqrt()
    }

    /// Zero the components of the search direction `d` that would leave the
    /// box from an active bound.
    pub fn project_direction(&self, x: ArrayView1<F>, mut d: ArrayViewMut1<F>) {
        if !self.has_bounds() {
            return;
        }
        Zip::from(&mut d).and(&x).and(&self.lower).and(&self.upper).for_each(
            |di, &xi, &lo, &hi| {
                if (xi <= lo && *di < F::zero()) || (xi >= hi && *di > F::zero()) {
                    *di = F::zero();
                }
            },
        );
    }

    /// `mask[i] = 1` for free variables, `0` for blocked ones.
    pub fn free_variables(&self, x: ArrayView1<F>, g: ArrayView1<F>, mut mask: ArrayViewMut1<F>) {
        Zip::from(&mut mask).and(&x).and(&g).and(&self.lower).and(&self.upper).for_each(
            |wi, &xi, &gi, &lo, &hi| {
                *wi = if is_blocked(xi, gi, lo, hi) { F::zero() } else { F::one() };
            },
        );
    }

    /// Step limits along `d` from the feasible point `x`.
    pub fn step_limits(&self, x: ArrayView1<F>, d: ArrayView1<F>) -> StepLimits<F> {
        let inf = F::infinity();
        let mut first = inf;
        let mut last = F::zero();
        for (((&xi, &di), &lo), &hi) in
            x.iter().zip(d.iter()).zip(self.lower.iter()).zip(self.upper.iter())
        {
            let limit = if di < F::zero() {
                (lo - xi) / di
            } else if di > F::zero() {
                (hi - xi) / di
            } else {
                continue;
            };
            // `limit` is +∞ for a missing side and 0 for a component already
            // pushed against its bound.
            if limit > F::zero() && limit < first {
                first = limit;
            }
            if limit > last {
                last = limit;
            }
        }
        StepLimits { first, last }
    }
}

#[inline]
fn is_blocked<F: Real>(x: F, g: F, lo: F, hi: F) -> bool {
    (x <= lo && g > F::zero()) || (x >= hi && g < F::zero())
}

fn resolve<F: Real>(
    value: &BoundValue<F>, n: usize, missing: F, what: &'static str,
) -> OptResult<Vector<F>> {
    let dense = match value {
        BoundValue::Unbounded => return Ok(Vector::from_elem(n, missing)),
        BoundValue::Scalar(v) => Vector::from_elem(n, *v),
        BoundValue::PerComponent(v) => {
            verify_dimension(what, v.len(), n)?;
            v.clone()
        }
    };
    for (index, &value) in dense.iter().enumerate() {
        if value.is_nan() {
            return Err(OptError::InvalidBound { index, value: value.as_f64() });
        }
    }
    Ok(dense)
}
