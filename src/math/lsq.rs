//! Damped linear least squares for Levenberg–Marquardt.
//!
//! Every Levenberg–Marquardt iteration solves
//!
//! ```text
//! minimize ‖J p + f‖² + μ ‖D p‖²
//! ```
//!
//! for one or more trial values of `μ` while `J`, `f` and the scaling `D` stay
//! fixed. With the thin SVD `J D⁻¹ = U Σ Vᵀ` the minimizer is
//!
//! ```text
//! p = -D⁻¹ V diag(σ / (σ² + μ)) Uᵀ f
//! ```
//!
//! so one factorization per iteration serves every trial step. SVD stays
//! well-defined for tall systems and for Jacobians with nearly collinear
//! columns.

use nalgebra::{DMatrix, DVector};

/// Singular values at or below `RANK_CUTOFF · σ_max` are treated as zero.
const RANK_CUTOFF: f64 = 1e-14;

/// Factorization state and working vectors for damped steps of an
/// `n × p` Jacobian.
///
/// All buffers are sized in [`DampedStepSolver::new`];
/// [`DampedStepSolver::factor`] and [`DampedStepSolver::step`] only write into
/// them.
#[derive(Debug, Clone)]
pub struct DampedStepSolver {
    scaled: DMatrix<f64>,
    v_t: DMatrix<f64>,
    sigma: DVector<f64>,
    utf: DVector<f64>,
    diag: DVector<f64>,
    work: DVector<f64>,
}

impl DampedStepSolver {
    pub fn new(n: usize, p: usize) -> Self {
        let k = n.min(p);
        Self {
            scaled: DMatrix::zeros(n, p),
            v_t: DMatrix::zeros(k, p),
            sigma: DVector::zeros(k),
            utf: DVector::zeros(k),
            diag: DVector::zeros(p),
            work: DVector::zeros(k),
        }
    }

    /// Factor `jac · diag⁻¹` and project `f` for the steps that follow.
    ///
    /// Returns `false` when the inputs are not finite, a scale entry is not
    /// positive, the shapes disagree, or the decomposition fails.
    pub fn factor(&mut self, jac: &DMatrix<f64>, f: &DVector<f64>, diag: &DVector<f64>) -> bool {
        if jac.shape() != self.scaled.shape() || f.len() != jac.nrows() || diag.len() != jac.ncols() {
            return false;
        }
        if jac.iter().chain(f.iter()).any(|v| !v.is_finite()) || diag.iter().any(|d| !(d.is_finite() && *d > 0.0)) {
            return false;
        }

        self.diag.copy_from(diag);
        self.scaled.copy_from(jac);
        for (mut col, d) in self.scaled.column_iter_mut().zip(diag.iter()) {
            col /= *d;
        }

        let svd = self.scaled.clone().svd(true, true);
        let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
            return false;
        };
        if v_t.shape() != self.v_t.shape() {
            return false;
        }
        self.v_t.copy_from(&v_t);
        self.sigma.copy_from(&svd.singular_values);
        u.tr_mul_to(f, &mut self.utf);
        true
    }

    /// Damped step for `mu` from the last [`DampedStepSolver::factor`], written
    /// to `out` (length `p`).
    ///
    /// Returns `false` if `mu` is negative or not finite, or the step is not
    /// finite.
    pub fn step(&mut self, mu: f64, out: &mut DVector<f64>) -> bool {
        if !(mu.is_finite() && mu >= 0.0) || out.len() != self.diag.len() {
            return false;
        }

        let cutoff = RANK_CUTOFF * self.sigma.max();
        for ((w, &s), &b) in self.work.iter_mut().zip(self.sigma.iter()).zip(self.utf.iter()) {
            *w = if s > cutoff { -s / (s * s + mu) * b } else { 0.0 };
        }
        self.v_t.tr_mul_to(&self.work, out);
        out.component_div_assign(&self.diag);
        out.iter().all(|v| v.is_finite())
    }
}
