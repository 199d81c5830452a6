//! Validation helpers for the task optimizer.
//!
//! This module centralizes the consistency checks used when an optimizer is
//! configured and while it consumes caller-provided values:
//!
//! - **Configuration checks**: [`verify_tolerance`], [`verify_delta`],
//!   [`verify_epsilon`], [`verify_line_search_params`], [`verify_memory`],
//!   [`verify_window`].
//! - **Vector checks**: [`verify_dimension`], [`validate_start`],
//!   [`validate_grad`].
//! - **Objective values**: [`validate_value`].
//!
//! All helpers report the first offending value through a dedicated
//! [`OptError`] variant so callers can surface precise messages.
use ndarray::ArrayView1;

use crate::optimization::{
    errors::{OptError, OptResult},
    task_optimizer::types::Real,
};

/// Validate an absolute or relative gradient tolerance (`gatol`, `grtol`).
///
/// # Errors
/// Returns [`OptError::InvalidTolerance`] if the value is non-finite or negative.
pub fn verify_tolerance<F: Real>(name: &'static str, tol: F) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidTolerance {
            name,
            value: tol.as_f64(),
            reason: "Tolerance must be finite.",
        });
    }
    if tol < F::zero() {
        return Err(OptError::InvalidTolerance {
            name,
            value: tol.as_f64(),
            reason: "Tolerance must be non-negative.",
        });
    }
    Ok(())
}

/// Validate the relative small-step size `delta` (finite, `> 0`).
pub fn verify_delta<F: Real>(delta: F) -> OptResult<()> {
    if !delta.is_finite() {
        return Err(OptError::InvalidDelta { value: delta.as_f64(), reason: "Must be finite." });
    }
    if delta <= F::zero() {
        return Err(OptError::InvalidDelta {
            value: delta.as_f64(),
            reason: "Must be strictly positive.",
        });
    }
    Ok(())
}

/// Validate the descent threshold `epsilon` (`0 <= epsilon < 1`).
pub fn verify_epsilon<F: Real>(epsilon: F) -> OptResult<()> {
    if !epsilon.is_finite() || epsilon < F::zero() || epsilon >= F::one() {
        return Err(OptError::InvalidEpsilon {
            value: epsilon.as_f64(),
            reason: "Must satisfy 0 <= epsilon < 1.",
        });
    }
    Ok(())
}

/// Validate the line-search constants.
///
/// Rules:
/// - `0 < sftol < sgtol < 1`
/// - `0 <= sxtol < 1`
/// - `max_backtracks`, when provided, is at least 1.
///
/// # Errors
/// Returns [`OptError::InvalidLineSearchParam`] naming the offending constant.
pub fn verify_line_search_params<F: Real>(
    sftol: F, sgtol: F, sxtol: F, max_backtracks: Option<usize>,
) -> OptResult<()> {
    if !sftol.is_finite() || sftol <= F::zero() || sftol >= F::one() {
        return Err(OptError::InvalidLineSearchParam {
            name: "sftol",
            value: sftol.as_f64(),
            reason: "Must satisfy 0 < sftol < 1.",
        });
    }
    if !sgtol.is_finite() || sgtol <= sftol || sgtol >= F::one() {
        return Err(OptError::InvalidLineSearchParam {
            name: "sgtol",
            value: sgtol.as_f64(),
            reason: "Must satisfy sftol < sgtol < 1.",
        });
    }
    if !sxtol.is_finite() || sxtol < F::zero() || sxtol >= F::one() {
        return Err(OptError::InvalidLineSearchParam {
            name: "sxtol",
            value: sxtol.as_f64(),
            reason: "Must satisfy 0 <= sxtol < 1.",
        });
    }
    if max_backtracks == Some(0) {
        return Err(OptError::InvalidLineSearchParam {
            name: "max_backtracks",
            value: 0.0,
            reason: "Must be at least 1 when provided.",
        });
    }
    Ok(())
}

/// Validate the variable-metric memory size (`mem >= 1`).
pub fn verify_memory(mem: usize) -> OptResult<()> {
    if mem == 0 {
        return Err(OptError::InvalidMemory { mem, reason: "Memory must be greater than zero." });
    }
    Ok(())
}

/// Validate the nonmonotone window length (`window >= 1`).
pub fn verify_window(window: usize) -> OptResult<()> {
    if window == 0 {
        return Err(OptError::InvalidWindow {
            window,
            reason: "Window must be greater than zero.",
        });
    }
    Ok(())
}

/// Check that a vector has the dimension fixed at initialization.
pub fn verify_dimension(what: &'static str, found: usize, expected: usize) -> OptResult<()> {
    if found != expected {
        return Err(OptError::DimensionMismatch { what, expected, found });
    }
    Ok(())
}

/// Validate a starting point: non-empty with finite entries.
///
/// # Errors
/// - [`OptError::EmptyVariables`] if `x` has no components.
/// - [`OptError::InvalidStartingPoint`] for the first non-finite element.
pub fn validate_start<F: Real>(x: ArrayView1<F>) -> OptResult<()> {
    if x.is_empty() {
        return Err(OptError::EmptyVariables);
    }
    for (index, &value) in x.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidStartingPoint { index, value: value.as_f64() });
        }
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::DimensionMismatch`] if the length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value of the first
///   offending element.
pub fn validate_grad<F: Real>(grad: ArrayView1<F>, dim: usize) -> OptResult<()> {
    verify_dimension("gradient", grad.len(), dim)?;
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value: value.as_f64(),
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate that an objective value is finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value<F: Real>(value: F) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value: value.as_f64() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Acceptance and rejection boundaries of each configuration check.
    // - Vector validation for starting points and gradients.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Tolerances accept zero and reject negatives and non-finite values.
    //
    // Given
    // -----
    // - gatol = 0, -1e-3, NaN.
    //
    // Expect
    // ------
    // - Only 0 is accepted.
    fn verify_tolerance_accepts_zero_rejects_negative() {
        assert!(verify_tolerance("gatol", 0.0_f64).is_ok());
        assert!(matches!(
            verify_tolerance("gatol", -1e-3_f64),
            Err(OptError::InvalidTolerance { name: "gatol", .. })
        ));
        assert!(verify_tolerance("grtol", f64::NAN).is_err());
    }

    #[test]
    // Purpose
    // -------
    // `delta` must be strictly positive; `epsilon` must lie in [0, 1).
    //
    // Given
    // -----
    // - delta = 0 and epsilon = 1.
    //
    // Expect
    // ------
    // - Both rejected; the defaults pass.
    fn verify_delta_and_epsilon_ranges() {
        assert!(verify_delta(5e-2_f64).is_ok());
        assert!(matches!(verify_delta(0.0_f64), Err(OptError::InvalidDelta { .. })));
        assert!(verify_epsilon(0.0_f64).is_ok());
        assert!(matches!(verify_epsilon(1.0_f64), Err(OptError::InvalidEpsilon { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Line-search constants must be ordered `0 < sftol < sgtol < 1`.
    //
    // Given
    // -----
    // - sftol = 0.5, sgtol = 0.1 (inverted).
    //
    // Expect
    // ------
    // - Error naming `sgtol`; the default triple passes.
    fn verify_line_search_params_requires_ordering() {
        assert!(verify_line_search_params(1e-4_f64, 0.9, 1e-17, None).is_ok());
        assert!(matches!(
            verify_line_search_params(0.5_f64, 0.1, 1e-17, None),
            Err(OptError::InvalidLineSearchParam { name: "sgtol", .. })
        ));
        assert!(matches!(
            verify_line_search_params(1e-4_f64, 0.9, 1e-17, Some(0)),
            Err(OptError::InvalidLineSearchParam { name: "max_backtracks", .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Starting points must be non-empty and finite.
    //
    // Given
    // -----
    // - An empty vector and one containing +inf at index 1.
    //
    // Expect
    // ------
    // - `EmptyVariables` and `InvalidStartingPoint { index: 1, .. }`.
    fn validate_start_rejects_empty_and_non_finite() {
        let empty = ndarray::Array1::<f64>::zeros(0);
        let bad = array![0.0_f64, f64::INFINITY];

        assert_eq!(validate_start(empty.view()), Err(OptError::EmptyVariables));
        assert!(matches!(
            validate_start(bad.view()),
            Err(OptError::InvalidStartingPoint { index: 1, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Gradients are checked for dimension first, then finiteness.
    //
    // Given
    // -----
    // - A length-2 gradient validated against dim 3, and a NaN gradient.
    //
    // Expect
    // ------
    // - `DimensionMismatch` then `InvalidGradient`.
    fn validate_grad_checks_dimension_then_values() {
        let g = array![1.0_f32, 2.0];
        let nan_g = array![1.0_f32, f32::NAN];

        assert!(matches!(
            validate_grad(g.view(), 3),
            Err(OptError::DimensionMismatch { expected: 3, found: 2, .. })
        ));
        assert!(matches!(
            validate_grad(nan_g.view(), 2),
            Err(OptError::InvalidGradient { index: 1, .. })
        ));
        assert!(validate_value(1.0_f32).is_ok());
        assert!(validate_value(f32::NAN).is_err());
    }
}
