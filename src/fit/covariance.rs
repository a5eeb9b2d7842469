//! Parameter uncertainties from the Jacobian at the best fit.
//!
//! `cov = (JᵀJ)⁻¹` is built from the SVD of `J`, dropping singular values
//! below `ε · σ_max`. Standard deviations are scaled by
//! `max(1, χ / √dof)` so that a poor fit widens them but a good one never
//! narrows them.

use nalgebra::{DMatrix, DVector};

use crate::fit::adapter::{LeastSquaresProblem, LineShapeProblem};
use crate::models::LineShapeModel;

/// Covariance matrix `(JᵀJ)⁻¹` of the parameters at `params`.
///
/// Returns `None` when the Jacobian is not finite or has no usable rank.
pub fn covariance(model: &dyn LineShapeModel, params: &[f64]) -> Option<DMatrix<f64>> {
    let mut problem = LineShapeProblem::new(model);
    let (n, p) = (problem.residual_count(), problem.parameter_count());
    if n == 0 || params.len() != p {
        return None;
    }

    let mut jac = DMatrix::zeros(n, p);
    problem.jacobian(&DVector::from_column_slice(params), &mut jac);
    if jac.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let svd = jac.svd(false, true);
    let v_t = svd.v_t?;
    let s = svd.singular_values;
    let cutoff = f64::EPSILON * s.max();
    if s.max() <= 0.0 {
        return None;
    }

    let mut cov = DMatrix::zeros(p, p);
    for (k, &sigma) in s.iter().enumerate() {
        if sigma <= cutoff {
            continue;
        }
        let v = v_t.row(k);
        let w = 1.0 / (sigma * sigma);
        for i in 0..p {
            for j in 0..p {
                cov[(i, j)] += w * v[i] * v[j];
            }
        }
    }
    Some(cov)
}

/// One standard deviation per parameter, or `None` if the covariance is
/// unavailable or there are no degrees of freedom left.
pub fn parameter_uncertainties(
    model: &dyn LineShapeModel,
    params: &[f64],
    residual_norm: f64,
) -> Option<Vec<f64>> {
    let dof = model.dataset().len().saturating_sub(params.len());
    if dof == 0 {
        return None;
    }
    let cov = covariance(model, params)?;
    let scale = (residual_norm / (dof as f64).sqrt()).max(1.0);

    let stdev: Vec<f64> = (0..params.len()).map(|i| scale * cov[(i, i)].max(0.0).sqrt()).collect();
    if stdev.iter().all(|v| v.is_finite()) {
        Some(stdev)
    } else {
        log::warn!("non-finite parameter covariance");
        None
    }
}
