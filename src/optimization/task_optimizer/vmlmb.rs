//! task_optimizer::vmlmb — limited-memory variable-metric directions.
//!
//! Purpose
//! -------
//! Approximate the inverse Hessian from the last `mem` curvature pairs
//! `(s, y)` and apply it to the (projected) gradient with the L-BFGS two-loop
//! recursion. Three variants share the same memory:
//!
//! - `Lbfgs`: recursion on `g`; no bounds.
//! - `Blmvm`: recursion on the projected gradient, then the direction is
//!   projected so it does not leave the box at active bounds.
//! - `Vmlmb`: recursion restricted to the free variables (inner products and
//!   updates ignore blocked components).
//!
//! Invariants & assumptions
//! ------------------------
//! - Stored pairs always satisfy `sᵀy > 0` (after Powell damping when
//!   enabled); a pair that does not is never stored.
//! - The memory is a FIFO of at most `mem` pairs; the oldest is evicted
//!   first.
//! - The initial inverse Hessian is `γ·I` with `γ = sᵀy / yᵀy` of the newest
//!   pair, or `I` without pairs.
use std::collections::VecDeque;

use ndarray::{ArrayView1, Zip};

use crate::optimization::{
    task_optimizer::{
        bounds::BoundProjector,
        traits::{SolverConfig, VmlmbMethod},
        types::{Real, Vector},
    },
    vector_ops::{axpy, dot, masked_dot, scale},
};

/// Powell damping factor for the modified secant pair.
const POWELL_DAMPING: f64 = 0.8;

/// One curvature pair with `rho = 1 / sᵀy`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvaturePair<F> {
    pub s: Vector<F>,
    pub y: Vector<F>,
    pub rho: F,
}

#[derive(Debug, Clone)]
pub struct Vmlmb<F> {
    method: VmlmbMethod,
    mem: usize,
    powell: bool,
    pairs: VecDeque<CurvaturePair<F>>,
    alpha: Vec<F>,
    d: Vector<F>,
    mask: Vector<F>,
}

impl<F: Real> Vmlmb<F> {
    pub fn new(config: &SolverConfig<F>, n: usize) -> Self {
        Self {
            method: config.vmlmb_method,
            mem: config.mem,
            powell: config.powell,
            pairs: VecDeque::with_capacity(config.mem),
            alpha: Vec::with_capacity(config.mem),
            d: Vector::zeros(n),
            mask: Vector::ones(n),
        }
    }

    pub fn direction(&self) -> ArrayView1<'_, F> {
        self.d.view()
    }

    /// Number of stored curvature pairs.
    pub fn memory_len(&self) -> usize {
        self.pairs.len()
    }

    /// Drop every stored pair.
    pub fn reset(&mut self) {
        self.pairs.clear();
    }

    /// Compute `d = -H·v` at `x` with gradient `g` and projected gradient
    /// `pg`, where `v` depends on the variant (see the module docs).
    pub fn compute(
        &mut self, x: ArrayView1<F>, g: ArrayView1<F>, pg: ArrayView1<F>,
        projector: &BoundProjector<F>,
    ) {
        match self.method {
            VmlmbMethod::Lbfgs => {
                self.d.assign(&g);
                self.mask.fill(F::one());
                self.two_loop(false);
            }
            VmlmbMethod::Blmvm => {
                self.d.assign(&pg);
                self.mask.fill(F::one());
                self.two_loop(false);
            }
            VmlmbMethod::Vmlmb => {
                projector.free_variables(x, g, self.mask.view_mut());
                Zip::from(&mut self.d).and(&g).and(&self.mask).for_each(|di, &gi, &wi| {
                    *di = gi * wi;
                });
                self.two_loop(true);
            }
        }
        scale(self.d.view_mut(), -F::one());
        if self.method != VmlmbMethod::Lbfgs {
            projector.project_direction(x, self.d.view_mut());
        }
    }

    /// Steepest (projected) descent `d = -pg`.
    pub fn steepest(&mut self, pg: ArrayView1<F>) {
        Zip::from(&mut self.d).and(&pg).for_each(|di, &gi| *di = -gi);
    }

    /// Offer the pair `s = x₊ - x`, `y = g₊ - g` to the memory.
    ///
    /// Returns `true` if a pair was stored. With `sᵀy <= 0` the pair is
    /// skipped unless `powell` is set, in which case `y` is replaced by the
    /// damped `θ·y + (1 - θ)·B·s` with `B = I/γ`.
    pub fn update(&mut self, s: Vector<F>, y: Vector<F>) -> bool {
        let sty = dot(s.view(), y.view());
        let (y, sty) = if sty > F::zero() {
            (y, sty)
        } else if self.powell {
            let gamma = self.gamma();
            let sts = dot(s.view(), s.view());
            let sbs = sts / gamma;
            let theta = F::lit(POWELL_DAMPING) * sbs / (sbs - sty);
            let mut damped = y;
            scale(damped.view_mut(), theta);
            axpy((F::one() - theta) / gamma, s.view(), damped.view_mut());
            let sty = dot(s.view(), damped.view());
            (damped, sty)
        } else {
            return false;
        };
        if !(sty > F::zero()) || !sty.is_finite() {
            return false;
        }
        if self.pairs.len() == self.mem {
            self.pairs.pop_front();
        }
        self.pairs.push_back(CurvaturePair { s, y, rho: F::one() / sty });
        true
    }

    /// Scaling `γ = sᵀy / yᵀy` of the newest pair (1 without pairs).
    fn gamma(&self) -> F {
        match self.pairs.back() {
            Some(pair) => {
                let yty = dot(pair.y.view(), pair.y.view());
                let gamma = F::one() / (pair.rho * yty);
                if gamma.is_finite() && gamma > F::zero() { gamma } else { F::one() }
            }
            None => F::one(),
        }
    }

    /// In-place two-loop recursion on `self.d`; `masked` restricts inner
    /// products and updates to the components where `self.mask` is 1.
    fn two_loop(&mut self, masked: bool) {
        let Self { pairs, alpha, d, mask, .. } = self;
        alpha.clear();
        let inner = |a: ArrayView1<F>, b: ArrayView1<F>| {
            if masked { masked_dot(mask.view(), a, b) } else { dot(a, b) }
        };

        let mut gamma = F::zero();
        let mut rhos: Vec<F> = Vec::with_capacity(pairs.len());
        for pair in pairs.iter() {
            let rho = if masked {
                let sty = inner(pair.s.view(), pair.y.view());
                if sty > F::zero() { F::one() / sty } else { F::zero() }
            } else {
                pair.rho
            };
            rhos.push(rho);
        }

        for (pair, &rho) in pairs.iter().zip(rhos.iter()).rev() {
            if rho == F::zero() {
                alpha.push(F::zero());
                continue;
            }
            let a = rho * inner(pair.s.view(), d.view());
            alpha.push(a);
            axpy_masked(-a, pair.y.view(), d, mask.view(), masked);
            if gamma == F::zero() {
                let yty = inner(pair.y.view(), pair.y.view());
                gamma = F::one() / (rho * yty);
            }
        }

        if gamma.is_finite() && gamma > F::zero() {
            scale(d.view_mut(), gamma);
        }

        for ((pair, &rho), &a) in pairs.iter().zip(rhos.iter()).zip(alpha.iter().rev()) {
            if rho == F::zero() {
                continue;
            }
            let b = rho * inner(pair.y.view(), d.view());
            axpy_masked(a - b, pair.s.view(), d, mask.view(), masked);
        }
    }
}

fn axpy_masked<F: Real>(
    a: F, x: ArrayView1<F>, y: &mut Vector<F>, mask: ArrayView1<F>, masked: bool,
) {
    if masked {
        Zip::from(y).and(&x).and(&mask).for_each(|yi, &xi, &wi| {
            if wi != F::zero() {
                *yi = *yi + a * xi;
            }
        });
    } else {
        axpy(a, x, y.view_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::task_optimizer::traits::{BoundValue, Bounds};
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Pair acceptance (sᵀy > 0), rejection, FIFO eviction, Powell damping.
    // - The two-loop recursion against an exact inverse Hessian.
    // - Projection behavior of the bounded variants.
    // -------------------------------------------------------------------------

    fn engine(method: VmlmbMethod, mem: usize, powell: bool) -> Vmlmb<f64> {
        let config =
            SolverConfig::default().with_vmlmb_method(method).with_mem(mem).with_powell(powell);
        Vmlmb::new(&config, 2)
    }

    #[test]
    // Purpose
    // -------
    // Without pairs the direction is steepest descent.
    //
    // Given
    // -----
    // - Empty memory, g = [1, -3].
    //
    // Expect
    // ------
    // - d = [-1, 3].
    fn empty_memory_gives_steepest_descent() {
        let mut vm = engine(VmlmbMethod::Lbfgs, 3, false);
        let proj = BoundProjector::unbounded(2);
        let x = array![0.0, 0.0];
        let g = array![1.0, -3.0];

        vm.compute(x.view(), g.view(), g.view(), &proj);

        assert_eq!(vm.direction().to_owned(), array![-1.0, 3.0]);
    }

    #[test]
    // Purpose
    // -------
    // Pairs with sᵀy <= 0 are never stored without damping.
    //
    // Given
    // -----
    // - s = [1, 0], y = [-1, 0].
    //
    // Expect
    // ------
    // - `update` returns false and memory stays empty.
    fn non_positive_curvature_pair_is_skipped() {
        let mut vm = engine(VmlmbMethod::Lbfgs, 3, false);

        let stored = vm.update(array![1.0, 0.0], array![-1.0, 0.0]);

        assert!(!stored);
        assert_eq!(vm.memory_len(), 0);
    }

    #[test]
    // Purpose
    // -------
    // Powell damping turns a negative-curvature pair into a usable one.
    //
    // Given
    // -----
    // - `powell = true`, s = [1, 0], y = [-1, 0].
    //
    // Expect
    // ------
    // - Pair stored with positive sᵀy.
    fn powell_damping_stores_modified_pair() {
        let mut vm = engine(VmlmbMethod::Lbfgs, 3, true);

        let stored = vm.update(array![1.0, 0.0], array![-1.0, 0.0]);

        assert!(stored);
        assert_eq!(vm.memory_len(), 1);
        assert!(vm.pairs[0].rho > 0.0);
    }

    #[test]
    // Purpose
    // -------
    // The memory evicts the oldest pair once full.
    //
    // Given
    // -----
    // - mem = 2 and three valid pairs.
    //
    // Expect
    // ------
    // - Two pairs kept; the first one is the second pair offered.
    fn memory_is_fifo() {
        let mut vm = engine(VmlmbMethod::Lbfgs, 2, false);
        vm.update(array![1.0, 0.0], array![1.0, 0.0]);
        vm.update(array![0.0, 1.0], array![0.0, 2.0]);
        vm.update(array![1.0, 1.0], array![3.0, 3.0]);

        assert_eq!(vm.memory_len(), 2);
        assert_eq!(vm.pairs[0].s, array![0.0, 1.0]);
    }

    #[test]
    // Purpose
    // -------
    // With exact pairs for a diagonal quadratic, the two-loop recursion
    // reproduces the Newton direction.
    //
    // Given
    // -----
    // - H = diag(1, 4); pairs s = e₁, y = e₁ and s = e₂, y = 4e₂.
    // - g = [2, 8].
    //
    // Expect
    // ------
    // - d = -H⁻¹g = [-2, -2].
    fn two_loop_recovers_newton_direction_on_diagonal_quadratic() {
        let mut vm = engine(VmlmbMethod::Lbfgs, 2, false);
        vm.update(array![1.0, 0.0], array![1.0, 0.0]);
        vm.update(array![0.0, 1.0], array![0.0, 4.0]);
        let proj = BoundProjector::unbounded(2);
        let x = array![0.0, 0.0];
        let g = array![2.0, 8.0];

        vm.compute(x.view(), g.view(), g.view(), &proj);

        let d = vm.direction();
        assert_relative_eq!(d[0], -2.0, epsilon = 1e-12);
        assert_relative_eq!(d[1], -2.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // BLMVM and VMLMB never move blocked variables out of the box.
    //
    // Given
    // -----
    // - Box x >= 0, x = [0, 1], g = [1, 1] (component 0 blocked).
    //
    // Expect
    // ------
    // - d[0] == 0 and d[1] < 0 for both variants.
    fn bounded_variants_keep_blocked_components_fixed() {
        let bounds = Bounds::new(BoundValue::Scalar(0.0), BoundValue::Unbounded);
        let proj = BoundProjector::new(&bounds, 2).expect("bounds should be valid");
        let x = array![0.0, 1.0];
        let g = array![1.0, 1.0];
        let mut pg = array![0.0, 0.0];
        proj.projected_gradient(x.view(), g.view(), pg.view_mut());

        for method in [VmlmbMethod::Blmvm, VmlmbMethod::Vmlmb] {
            let mut vm = engine(method, 3, false);
            vm.update(array![1.0, 1.0], array![1.0, 2.0]);

            vm.compute(x.view(), g.view(), pg.view(), &proj);

            let d = vm.direction();
            assert_eq!(d[0], 0.0, "{method:?}");
            assert!(d[1] < 0.0, "{method:?}");
        }
    }
}
