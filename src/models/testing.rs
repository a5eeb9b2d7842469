//! Helpers shared by the model tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::LineShapeModel;

/// `count` parameter vectors drawn uniformly from `ranges` (one per parameter).
pub fn sample_params(seed: u64, count: usize, ranges: &[(f64, f64)]) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| ranges.iter().map(|&(lo, hi)| rng.gen_range(lo..hi)).collect())
        .collect()
}

/// Central-difference gradient of the residual at `params`.
pub fn numerical_gradient(model: &dyn LineShapeModel, params: &[f64], x: f64, f: f64) -> Vec<f64> {
    let mut p = params.to_vec();
    (0..params.len())
        .map(|k| {
            let h = 1e-6 * params[k].abs().max(1e-3);
            p[k] = params[k] + h;
            let up = model.residual(&p, x, f);
            p[k] = params[k] - h;
            let down = model.residual(&p, x, f);
            p[k] = params[k];
            (up - down) / (2.0 * h)
        })
        .collect()
}

pub fn assert_jacobian_matches(model: &dyn LineShapeModel, params: &[f64], x: f64, f: f64, rtol: f64) {
    let mut analytic = vec![0.0; model.nfit()];
    model.jacobian(params, x, f, &mut analytic);
    let numeric = numerical_gradient(model, params, x, f);
    let scale = model.residual(params, x, f).abs().max(1.0);

    for k in 0..analytic.len() {
        let (a, n) = (analytic[k], numeric[k]);
        let tol = rtol * a.abs().max(n.abs()) + 1e-8 * scale;
        assert!(
            (a - n).abs() <= tol,
            "{}: d/d{} at x={x}, p={params:?}: analytic {a:e} vs numeric {n:e}",
            model.name(),
            model.parameter_names()[k],
        );
    }
}

/// `resid_j` must agree with separate `residual` and `jacobian` calls.
pub fn assert_resid_j_consistent(model: &dyn LineShapeModel, params: &[f64], x: f64, f: f64, rtol: f64) {
    let mut separate = vec![0.0; model.nfit()];
    model.jacobian(params, x, f, &mut separate);
    let r = model.residual(params, x, f);

    let mut joint = vec![0.0; model.nfit()];
    let rj = model.resid_j(params, x, f, &mut joint);

    assert!((r - rj).abs() <= rtol * r.abs().max(1e-12), "residual {r:e} vs {rj:e}");
    for k in 0..joint.len() {
        assert!(
            (separate[k] - joint[k]).abs() <= rtol * separate[k].abs().max(1e-12),
            "{}: component {k}: {:e} vs {:e}",
            model.name(),
            separate[k],
            joint[k]
        );
    }
}
