//! utils — PyO3 extraction helpers for the Python bindings.
//!
//! Converts Python keyword options into a typed [`SolverConfig`] and
//! [`Bounds`], and borrows NumPy buffers with the precision of the running
//! optimizer. Every helper reports bad input as a Python exception.
#[cfg(feature = "python-bindings")]
use std::str::FromStr;

#[cfg(feature = "python-bindings")]
use numpy::{Element, PyReadonlyArray1, PyReadwriteArray1};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::optimization::task_optimizer::{
    Algorithm, AutoStep, BoundValue, Bounds, LineSearchKind, NlcgMethod, Real, SolverConfig,
    Vector, VmlmbMethod,
};

/// Options accepted by `Optimizer(...)` and `minimize(...)`.
#[cfg(feature = "python-bindings")]
#[derive(Debug, Clone)]
pub struct PyOptions<F> {
    pub config: SolverConfig<F>,
    pub bounds: Bounds<F>,
    pub verbose: bool,
}

/// Parse keyword options into a configuration of precision `F`.
///
/// Recognized keys: `algorithm`, `linesearch`, `autostep`, `nlcg`, `vmlmb`,
/// `delta`, `epsilon`, `gatol`, `grtol`, `maxiter`, `maxeval`, `mem`,
/// `powell`, `bl`, `bu`, `verbose`. Unknown keys raise `ValueError`;
/// `None` values keep the default.
///
/// Range checks are left to the optimizer, which reports them as
/// `INPUT_ERROR`.
#[cfg(feature = "python-bindings")]
pub fn extract_options<F: Real>(options: Option<&Bound<'_, PyDict>>) -> PyResult<PyOptions<F>> {
    let mut config = SolverConfig::<F>::default();
    let mut bounds = Bounds::none();
    let mut verbose = false;
    let Some(options) = options else {
        return Ok(PyOptions { config, bounds, verbose });
    };
    for (key, value) in options.iter() {
        let key: String = key.extract()?;
        if value.is_none() {
            continue;
        }
        match key.as_str() {
            "algorithm" => config.algorithm = parse_named::<Algorithm>(&value)?,
            "linesearch" => config.line_search = parse_named::<LineSearchKind>(&value)?,
            "autostep" => config.autostep = parse_named::<AutoStep>(&value)?,
            "nlcg" => config.nlcg_method = parse_named::<NlcgMethod>(&value)?,
            "vmlmb" => config.vmlmb_method = parse_named::<VmlmbMethod>(&value)?,
            "delta" => config.delta = extract_real(&value)?,
            "epsilon" => config.epsilon = extract_real(&value)?,
            "gatol" => config.gatol = extract_real(&value)?,
            "grtol" => config.grtol = extract_real(&value)?,
            "maxiter" => config.max_iter = value.extract()?,
            "maxeval" => config.max_eval = value.extract()?,
            "mem" => config.mem = value.extract()?,
            "powell" => config.powell = value.is_truthy()?,
            "bl" => bounds.lower = extract_bound(&value)?,
            "bu" => bounds.upper = extract_bound(&value)?,
            "verbose" => verbose = value.is_truthy()?,
            other => {
                return Err(PyValueError::new_err(format!("unknown option {:?}", other)));
            }
        }
    }
    Ok(PyOptions { config, bounds, verbose })
}

#[cfg(feature = "python-bindings")]
fn parse_named<T>(value: &Bound<'_, PyAny>) -> PyResult<T>
where
    T: FromStr<Err = crate::optimization::errors::OptError>,
{
    let name: String = value.extract()?;
    Ok(T::from_str(&name)?)
}

#[cfg(feature = "python-bindings")]
fn extract_real<F: Real>(value: &Bound<'_, PyAny>) -> PyResult<F> {
    let v: f64 = value.extract()?;
    Ok(F::lit(v))
}

/// `None` → unbounded, a number → the same bound for every variable, a
/// sequence or array → one bound per variable.
#[cfg(feature = "python-bindings")]
fn extract_bound<F: Real>(value: &Bound<'_, PyAny>) -> PyResult<BoundValue<F>> {
    if value.is_none() {
        return Ok(BoundValue::Unbounded);
    }
    if let Ok(v) = value.extract::<f64>() {
        return Ok(BoundValue::Scalar(F::lit(v)));
    }
    let values: Vec<f64> = value.extract().map_err(|_| {
        PyTypeError::new_err("bounds must be None, a float, or a 1-D sequence of floats")
    })?;
    Ok(BoundValue::PerComponent(values.into_iter().map(F::lit).collect::<Vector<F>>()))
}

/// Borrow a writable 1-D NumPy array of element type `F`.
#[cfg(feature = "python-bindings")]
pub fn extract_readwrite<'py, F: Real + Element>(
    raw: &Bound<'py, PyAny>, name: &str,
) -> PyResult<PyReadwriteArray1<'py, F>> {
    raw.extract::<PyReadwriteArray1<F>>().map_err(|_| {
        PyTypeError::new_err(format!(
            "{name} must be a writable 1-D numpy.ndarray of {}",
            dtype_name::<F>()
        ))
    })
}

/// Borrow a read-only 1-D NumPy array of element type `F`.
#[cfg(feature = "python-bindings")]
pub fn extract_readonly<'py, F: Real + Element>(
    raw: &Bound<'py, PyAny>, name: &str,
) -> PyResult<PyReadonlyArray1<'py, F>> {
    raw.extract::<PyReadonlyArray1<F>>().map_err(|_| {
        PyTypeError::new_err(format!("{name} must be a 1-D numpy.ndarray of {}", dtype_name::<F>()))
    })
}

/// `true` if `raw` is a 1-D `float32` array; `float64` otherwise.
#[cfg(feature = "python-bindings")]
pub fn is_single_precision(raw: &Bound<'_, PyAny>) -> PyResult<bool> {
    if raw.extract::<PyReadonlyArray1<f64>>().is_ok() {
        return Ok(false);
    }
    if raw.extract::<PyReadonlyArray1<f32>>().is_ok() {
        return Ok(true);
    }
    Err(PyTypeError::new_err("x must be a 1-D numpy.ndarray of float32 or float64"))
}

#[cfg(feature = "python-bindings")]
fn dtype_name<F: Real>() -> &'static str {
    if std::mem::size_of::<F>() == 4 { "float32" } else { "float64" }
}
