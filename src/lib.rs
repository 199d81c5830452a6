//! rust_optimpack — reverse-communication NLCG and VMLM-B minimizers with
//! Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the optimizer to Python via the `_rust_optimpack` extension
//! module. When the `python-bindings` feature is enabled, this module defines
//! the Python-facing `Optimizer` class and the `minimize` function of the
//! `rust_optimpack.optimizers` submodule.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`optimization`, `utils`) as the public
//!   crate surface.
//! - Wrap [`Optimizer`] for `float32` and `float64` NumPy arrays; the dtype
//!   of the starting point selects the precision.
//! - Provide `minimize(x, fg, g, **options)`, which runs the whole task loop
//!   against a Python callback and returns the final point.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work happens in `optimization`; this file performs only
//!   FFI glue, dtype dispatch, and error mapping.
//! - Arrays passed to `iterate` must keep the dtype and length used at
//!   construction.
//!
//! Conventions
//! -----------
//! - Tasks and statuses cross the boundary as their upper-case names
//!   (`"COMPUTE_FG"`, `"FINAL_X"`, ...).
//! - Errors from core Rust code are converted to `ValueError` / `TypeError`
//!   at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend on `optimization::task_optimizer`
//!   directly and can ignore the PyO3 items.
//! - The Python packaging layer imports `_rust_optimpack` and re-exports
//!   `rust_optimpack.optimizers`.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by the
//!   crate-level tests under `tests/`.

pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::{ArrayView1, ArrayViewMut1};

#[cfg(feature = "python-bindings")]
use numpy::{Element, PyArray1, PyArrayMethods, ToPyArray};

#[cfg(feature = "python-bindings")]
use pyo3::{
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    optimization::{
        errors::OptError,
        task_optimizer::{Optimizer, Real, Task, builders::build_optimizer, run::close_after},
    },
    utils::{
        PyOptions, extract_options, extract_readonly, extract_readwrite, is_single_precision,
    },
};

/// Precision-tagged optimizer held by the Python class.
#[cfg(feature = "python-bindings")]
enum Precision {
    Single(Optimizer<f32>),
    Double(Optimizer<f64>),
}

/// Optimizer — Python-facing wrapper for the reverse-communication optimizer.
///
/// Purpose
/// -------
/// Let Python code own the variables and the objective while the Rust
/// optimizer decides what to do next.
///
/// Key behaviors
/// -------------
/// - `Optimizer(x, **options)` initializes; the `task` property then reads
///   `"COMPUTE_FG"` or `"INPUT_ERROR"`.
/// - `iterate(x, fx, g)` updates `x` in place and returns the next task.
/// - `task_info(key)` answers `Get_task`, `Get_status`, `Get_iterations`,
///   `Get_evaluations`, `Get_restarts`, `Get_step`.
/// - `close()` releases the state.
///
/// Parameters
/// ----------
/// - `x`: 1-D `float32` or `float64` array; its dtype fixes the precision.
/// - `options`: see [`extract_options`].
///
/// Invariants
/// ----------
/// - `x` is not modified by the constructor.
///
/// Notes
/// -----
/// - Rust callers should use [`Optimizer`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_optimpack.optimizers", name = "Optimizer")]
pub struct PyOptimizer {
    inner: Precision,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyOptimizer {
    #[new]
    #[pyo3(signature = (x, **options), text_signature = "(x, /, **options)")]
    pub fn new<'py>(x: &Bound<'py, PyAny>, options: Option<&Bound<'py, PyDict>>) -> PyResult<Self> {
        let inner = if is_single_precision(x)? {
            Precision::Single(initialize::<f32>(x, options)?)
        } else {
            Precision::Double(initialize::<f64>(x, options)?)
        };
        Ok(Self { inner })
    }

    /// Current task name.
    #[getter]
    pub fn task(&self) -> String {
        match &self.inner {
            Precision::Single(opt) => opt.task().to_string(),
            Precision::Double(opt) => opt.task().to_string(),
        }
    }

    /// Reason attached to the current task.
    #[getter]
    pub fn status(&self) -> String {
        match &self.inner {
            Precision::Single(opt) => opt.status().to_string(),
            Precision::Double(opt) => opt.status().to_string(),
        }
    }

    /// Message attached to the last `INPUT_ERROR`, `ERROR`, or `WARNING`.
    #[getter]
    pub fn reason(&self) -> Option<String> {
        match &self.inner {
            Precision::Single(opt) => opt.last_error().map(ToString::to_string),
            Precision::Double(opt) => opt.last_error().map(ToString::to_string),
        }
    }

    #[pyo3(text_signature = "(self, x, fx, g, /)")]
    pub fn iterate<'py>(
        &mut self, x: &Bound<'py, PyAny>, fx: f64, g: &Bound<'py, PyAny>,
    ) -> PyResult<String> {
        let task = match &mut self.inner {
            Precision::Single(opt) => iterate_once(opt, x, fx, g)?,
            Precision::Double(opt) => iterate_once(opt, x, fx, g)?,
        };
        Ok(task.to_string())
    }

    #[pyo3(text_signature = "(self, key, /)")]
    pub fn task_info(&self, key: &str) -> PyResult<String> {
        let info = match &self.inner {
            Precision::Single(opt) => opt.task_info(key)?,
            Precision::Double(opt) => opt.task_info(key)?,
        };
        Ok(info)
    }

    pub fn close(&mut self) {
        match &mut self.inner {
            Precision::Single(opt) => opt.close(),
            Precision::Double(opt) => opt.close(),
        }
    }
}

/// minimize — run the task loop against a Python callback.
///
/// Parameters
/// ----------
/// - `x`: starting point (left untouched).
/// - `fg`: callable `fg(x, g) -> float` that stores `∇f(x)` in `g` and
///   returns `f(x)`.
/// - `g`: gradient buffer with the dtype and length of `x`; holds the last
///   evaluated gradient on return.
/// - `options`: see [`extract_options`]; `verbose=True` prints one line per
///   accepted iterate to stderr.
///
/// Returns
/// -------
/// A new array with the final point.
///
/// Errors
/// ------
/// - `ValueError` on `INPUT_ERROR` or `ERROR`, with the reason.
/// - Any exception raised by `fg`.
///
/// `WARNING` (budget exhausted) is not an error: the best point so far is
/// returned.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (x, fg, g, **options), text_signature = "(x, fg, g, /, **options)")]
pub fn minimize<'py>(
    py: Python<'py>, x: &Bound<'py, PyAny>, fg: &Bound<'py, PyAny>, g: &Bound<'py, PyAny>,
    options: Option<&Bound<'py, PyDict>>,
) -> PyResult<Bound<'py, PyAny>> {
    if is_single_precision(x)? {
        Ok(minimize_typed::<f32>(py, x, fg, g, options)?.into_any())
    } else {
        Ok(minimize_typed::<f64>(py, x, fg, g, options)?.into_any())
    }
}

// ---- Helper Methods ----

#[cfg(feature = "python-bindings")]
fn initialize<F: Real + Element>(
    x: &Bound<'_, PyAny>, options: Option<&Bound<'_, PyDict>>,
) -> PyResult<Optimizer<F>> {
    let PyOptions { config, bounds, .. } = extract_options::<F>(options)?;
    let x = extract_readonly::<F>(x, "x")?;
    Ok(Optimizer::initialize(x.as_array(), config, bounds))
}

#[cfg(feature = "python-bindings")]
fn iterate_once<F: Real + Element>(
    opt: &mut Optimizer<F>, x: &Bound<'_, PyAny>, fx: f64, g: &Bound<'_, PyAny>,
) -> PyResult<Task> {
    let mut x = extract_readwrite::<F>(x, "x")?;
    let g = extract_readonly::<F>(g, "g")?;
    Ok(opt.iterate(x.as_array_mut(), F::lit(fx), g.as_array())?)
}

#[cfg(feature = "python-bindings")]
fn minimize_typed<'py, F: Real + Element>(
    py: Python<'py>, x: &Bound<'py, PyAny>, fg: &Bound<'py, PyAny>, g: &Bound<'py, PyAny>,
    options: Option<&Bound<'py, PyDict>>,
) -> PyResult<Bound<'py, PyArray1<F>>> {
    let PyOptions { config, bounds, verbose } = extract_options::<F>(options)?;
    let x_out = extract_readonly::<F>(x, "x")?.as_array().to_pyarray(py);
    let mut opt = build_optimizer(x_out.readonly().as_array(), &config, &bounds)?;

    let task = close_after(&mut opt, |opt| run_loop(py, opt, &x_out, fg, g, verbose))?;

    if verbose {
        eprintln!(
            "{}: {} iterations, {} evaluations, {} restarts",
            task,
            opt.iterations(),
            opt.evaluations(),
            opt.restarts()
        );
    }
    match task {
        Task::Error => Err(input_error(&opt).into()),
        _ => Ok(x_out),
    }
}

/// Answer `COMPUTE_FG` requests with `fg` until a terminal task, updating
/// `x_out` and `g` in place.
#[cfg(feature = "python-bindings")]
fn run_loop<'py, F: Real + Element>(
    py: Python<'py>, opt: &mut Optimizer<F>, x_out: &Bound<'py, PyArray1<F>>,
    fg: &Bound<'py, PyAny>, g: &Bound<'py, PyAny>, verbose: bool,
) -> PyResult<Task> {
    let mut x_rw = x_out.readwrite();
    let mut g_rw = extract_readwrite::<F>(g, "g")?;
    let mut x_view = x_rw.as_array_mut();
    let mut g_view = g_rw.as_array_mut();
    let mut fx = F::zero();
    let mut task = opt.task();
    while matches!(task, Task::ComputeFg | Task::NewX) {
        if task == Task::ComputeFg {
            fx = call_fg(py, fg, x_view.view(), g_view.view_mut())?;
        } else if verbose {
            eprintln!(
                "iter {:>4}: f(x) = {:.6e}, step = {:.3e}, evals = {}",
                opt.iterations(),
                fx.as_f64(),
                opt.step().as_f64(),
                opt.evaluations()
            );
        }
        task = opt.iterate(x_view.view_mut(), fx, g_view.view())?;
    }
    Ok(task)
}

/// Evaluate the Python callback on copies of `x` and `g`, then copy the
/// gradient it wrote back into `g`.
#[cfg(feature = "python-bindings")]
fn call_fg<'py, F: Real + Element>(
    py: Python<'py>, fg: &Bound<'py, PyAny>, x: ArrayView1<F>, mut g: ArrayViewMut1<F>,
) -> PyResult<F> {
    let x_py = x.to_pyarray(py);
    let g_py = g.to_pyarray(py);
    let value: f64 = fg.call1((x_py, &g_py))?.extract()?;
    g.assign(&g_py.readonly().as_array());
    Ok(F::lit(value))
}

#[cfg(feature = "python-bindings")]
fn input_error<F: Real>(opt: &Optimizer<F>) -> OptError {
    opt.last_error().cloned().unwrap_or(OptError::UnknownError)
}

/// _rust_optimpack — PyO3 module initializer for the Python extension.
///
/// Purpose
/// -------
/// Define the `_rust_optimpack` Python module and register its
/// `optimizers` submodule.
///
/// Key behaviors
/// -------------
/// - Create the `optimizers` submodule holding `Optimizer` and `minimize`.
/// - Register it in `sys.modules` so dotted imports work from Python.
///
/// Errors
/// ------
/// - `PyErr` if creating the submodule or manipulating `sys.modules` fails.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_optimpack<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let optimizers_mod = PyModule::new(_py, "optimizers")?;
    optimizers(_py, m, &optimizers_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("rust_optimpack.optimizers", optimizers_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn optimizers<'py>(
    _py: Python, rust_optimpack: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<PyOptimizer>()?;
    m.add_function(wrap_pyfunction!(minimize, m)?)?;
    m.add("DEFAULT_DELTA", crate::optimization::task_optimizer::types::DEFAULT_DELTA)?;
    m.add("DEFAULT_EPSILON", crate::optimization::task_optimizer::types::DEFAULT_EPSILON)?;
    rust_optimpack.add_submodule(m)?;
    Ok(())
}
