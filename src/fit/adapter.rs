//! Least-squares view of a line-shape model.
//!
//! The solver only sees [`LeastSquaresProblem`]: whole-dataset residual
//! vectors and Jacobian matrices. [`LineShapeProblem`] produces them by
//! walking the model's dataset once per call and delegating each point to
//! the model.

use nalgebra::{DMatrix, DVector};

use crate::models::LineShapeModel;

/// Residual/Jacobian callbacks for a nonlinear least-squares solver.
///
/// `residuals` fills a vector of length [`residual_count`]; `jacobian` fills
/// a `residual_count × parameter_count` matrix.
///
/// [`residual_count`]: LeastSquaresProblem::residual_count
pub trait LeastSquaresProblem {
    fn residual_count(&self) -> usize;
    fn parameter_count(&self) -> usize;

    fn residuals(&mut self, params: &DVector<f64>, out: &mut DVector<f64>);
    fn jacobian(&mut self, params: &DVector<f64>, out: &mut DMatrix<f64>);

    fn residuals_and_jacobian(
        &mut self,
        params: &DVector<f64>,
        f: &mut DVector<f64>,
        jac: &mut DMatrix<f64>,
    ) {
        self.residuals(params, f);
        self.jacobian(params, jac);
    }
}

pub struct LineShapeProblem<'m> {
    model: &'m dyn LineShapeModel,
    row: Vec<f64>,
}

impl<'m> LineShapeProblem<'m> {
    pub fn new(model: &'m dyn LineShapeModel) -> Self {
        Self {
            model,
            row: vec![0.0; model.nfit()],
        }
    }
}

impl LeastSquaresProblem for LineShapeProblem<'_> {
    fn residual_count(&self) -> usize {
        self.model.dataset().len()
    }

    fn parameter_count(&self) -> usize {
        self.model.nfit()
    }

    fn residuals(&mut self, params: &DVector<f64>, out: &mut DVector<f64>) {
        let p = params.as_slice();
        for (i, pt) in self.model.dataset().iter().enumerate() {
            out[i] = self.model.residual(p, pt.x, pt.observed);
        }
    }

    fn jacobian(&mut self, params: &DVector<f64>, out: &mut DMatrix<f64>) {
        let p = params.as_slice();
        for (i, pt) in self.model.dataset().iter().enumerate() {
            self.model.jacobian(p, pt.x, pt.observed, &mut self.row);
            for (k, &v) in self.row.iter().enumerate() {
                out[(i, k)] = v;
            }
        }
    }

    fn residuals_and_jacobian(
        &mut self,
        params: &DVector<f64>,
        f: &mut DVector<f64>,
        jac: &mut DMatrix<f64>,
    ) {
        let p = params.as_slice();
        for (i, pt) in self.model.dataset().iter().enumerate() {
            f[i] = self.model.resid_j(p, pt.x, pt.observed, &mut self.row);
            for (k, &v) in self.row.iter().enumerate() {
                jac[(i, k)] = v;
            }
        }
    }
}
