//! task_optimizer::nlcg — nonlinear conjugate-gradient directions.
//!
//! Purpose
//! -------
//! Produce search directions `d = -g + β·d_prev` for unconstrained problems,
//! with `β` given by one of the classical update formulas. The engine keeps
//! the previous gradient and direction between calls and falls back to the
//! steepest descent direction whenever the update is unusable.
//!
//! Key behaviors
//! -------------
//! With `y = g - g_prev`, `d = d_prev`, and `s = α_prev·d_prev`:
//!
//! | method | β |
//! |---|---|
//! | `FletcherReeves` | `gᵀg / g_prevᵀg_prev` |
//! | `HestenesStiefel` | `gᵀy / dᵀy` |
//! | `PolakRibierePolyak` | `max(0, gᵀy / g_prevᵀg_prev)` |
//! | `Fletcher` | `gᵀg / -dᵀg_prev` |
//! | `LiuStorey` | `gᵀy / -dᵀg_prev` |
//! | `DaiYuan` | `gᵀg / dᵀy` |
//! | `PerryShanno` | `gᵀ(y - s) / dᵀy` |
//! | `HagerZhang` | `(y - 2d·‖y‖²/dᵀy)ᵀg / dᵀy`, truncated below by `η_k` |
//!
//! Invariants & assumptions
//! ------------------------
//! - The first direction after construction or [`Nlcg::restart`] is `-g`.
//! - A non-finite β, and with `powell` either `n` consecutive updates or
//!   loss of orthogonality (`|gᵀg_prev| >= 0.2·‖g‖²`), yield `-g` and are
//!   reported as a restart.
use ndarray::{ArrayView1, Zip};

use crate::optimization::{
    task_optimizer::{
        traits::{NlcgMethod, SolverConfig},
        types::{Real, Vector},
    },
    vector_ops::{combine, copy_into, dot},
};

/// Lower-bound constant of the Hager–Zhang truncation.
const HAGER_ZHANG_ETA: f64 = 0.01;

/// Powell's orthogonality threshold.
const POWELL_ORTHOGONALITY: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct Nlcg<F> {
    method: NlcgMethod,
    powell: bool,
    d: Vector<F>,
    g_prev: Vector<F>,
    has_prev: bool,
    since_restart: usize,
}

impl<F: Real> Nlcg<F> {
    pub fn new(config: &SolverConfig<F>, n: usize) -> Self {
        Self {
            method: config.nlcg_method,
            powell: config.powell,
            d: Vector::zeros(n),
            g_prev: Vector::zeros(n),
            has_prev: false,
            since_restart: 0,
        }
    }

    pub fn direction(&self) -> ArrayView1<'_, F> {
        self.d.view()
    }

    /// Compute the next direction from the gradient `g` at the new iterate
    /// and the step `stp_prev` accepted along the previous direction.
    ///
    /// Returns `true` if the update was abandoned for `-g` (a restart). The
    /// very first direction is steepest descent but not a restart.
    pub fn compute(&mut self, g: ArrayView1<F>, stp_prev: F) -> bool {
        if !self.has_prev {
            self.steepest(g);
            return false;
        }
        let gg = dot(g, g);
        if self.powell {
            let n = self.d.len();
            let orthogonality = dot(g, self.g_prev.view()).abs();
            if self.since_restart >= n || orthogonality >= F::lit(POWELL_ORTHOGONALITY) * gg {
                self.steepest(g);
                return true;
            }
        }
        let beta = self.beta(g, gg, stp_prev);
        if !beta.is_finite() {
            self.steepest(g);
            return true;
        }
        let d_prev = self.d.clone();
        combine(self.d.view_mut(), -F::one(), g, beta, d_prev.view());
        copy_into(self.g_prev.view_mut(), g);
        self.since_restart += 1;
        false
    }

    /// Replace the direction by `-g` and forget the previous iterate.
    pub fn restart(&mut self, g: ArrayView1<F>) {
        self.steepest(g);
    }

    fn steepest(&mut self, g: ArrayView1<F>) {
        Zip::from(&mut self.d).and(&g).for_each(|di, &gi| *di = -gi);
        copy_into(self.g_prev.view_mut(), g);
        self.has_prev = true;
        self.since_restart = 0;
    }

    fn beta(&self, g: ArrayView1<F>, gg: F, stp_prev: F) -> F {
        let d = self.d.view();
        let g_prev = self.g_prev.view();
        let y = &g - &g_prev;
        let gy = dot(g, y.view());
        let dy = dot(d, y.view());
        let dg_prev = dot(d, g_prev);
        match self.method {
            NlcgMethod::FletcherReeves => gg / dot(g_prev, g_prev),
            NlcgMethod::HestenesStiefel => gy / dy,
            NlcgMethod::PolakRibierePolyak => {
                let beta = gy / dot(g_prev, g_prev);
                if beta > F::zero() { beta } else { F::zero() }
            }
            NlcgMethod::Fletcher => gg / -dg_prev,
            NlcgMethod::LiuStorey => gy / -dg_prev,
            NlcgMethod::DaiYuan => gg / dy,
            NlcgMethod::PerryShanno => {
                // gᵀ(y - s) with s = α_prev·d_prev.
                (gy - stp_prev * dot(g, d)) / dy
            }
            NlcgMethod::HagerZhang => {
                let yy = dot(y.view(), y.view());
                let gd = dot(g, d);
                let beta = (gy - F::lit(2.0) * yy * gd / dy) / dy;
                let d_norm = dot(d, d).sqrt();
                let g_prev_norm = dot(g_prev, g_prev).sqrt();
                let eta = -F::one() / (d_norm * g_prev_norm.min(F::lit(HAGER_ZHANG_ETA)));
                beta.max(eta)
            }
        }
    }
}
