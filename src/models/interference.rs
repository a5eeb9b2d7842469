//! Transport near a destructive-interference feature.
//!
//! `P(g) = N / √g · exp(-cω² g / 2)`, with relative residuals `(P - f) / f`.

use crate::domain::Dataset;
use crate::models::model::{LineShapeModel, product_grid};

pub const COMEGA: usize = 0;
pub const NORM: usize = 1;

const NAMES: &[&str] = &["comega", "norm"];
const REQUIRED: &[&str] = &["comega"];

pub struct Interference<'a> {
    data: &'a Dataset,
}

impl<'a> Interference<'a> {
    pub fn new(data: &'a Dataset) -> Self {
        Self { data }
    }
}

pub(crate) fn create(data: &Dataset) -> Box<dyn LineShapeModel + '_> {
    Box::new(Interference::new(data))
}

impl LineShapeModel for Interference<'_> {
    fn name(&self) -> &'static str {
        "Interference"
    }

    fn parameter_names(&self) -> &'static [&'static str] {
        NAMES
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        REQUIRED
    }

    fn dataset(&self) -> &Dataset {
        self.data
    }

    fn evaluate(&self, params: &[f64], g: f64) -> f64 {
        let c = params[COMEGA];
        params[NORM] * (-0.5 * c * c * g).exp() / g.sqrt()
    }

    fn residual(&self, params: &[f64], g: f64, f: f64) -> f64 {
        (self.evaluate(params, g) - f) / f
    }

    fn jacobian(&self, params: &[f64], g: f64, f: f64, out: &mut [f64]) {
        let c = params[COMEGA];
        let e = (-0.5 * c * c * g).exp();
        out[COMEGA] = -params[NORM] * c * g.sqrt() * e / f;
        out[NORM] = e / g.sqrt() / f;
    }

    fn default_guesses(&self) -> Vec<Vec<f64>> {
        product_grid(&[&[1.0, 10.0, 100.0], &[1.0]])
    }

    fn process_fit_parameters(&self, params: &mut [f64]) {
        params[COMEGA] = params[COMEGA].abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::{assert_jacobian_matches, sample_params};

    #[test]
    fn jacobian_matches_finite_differences() {
        let d = Dataset::from_pairs(&[(1e-4, 80.0), (1e-3, 30.0), (1e-2, 9.0), (0.1, 1.5)]);
        let m = Interference::new(&d);
        for p in sample_params(3, 25, &[(0.5, 20.0), (0.2, 4.0)]) {
            for pt in d.iter() {
                assert_jacobian_matches(&m, &p, pt.x, pt.observed, 1e-5);
            }
        }
    }

    #[test]
    fn canonical_comega_is_non_negative() {
        let d = Dataset::default();
        let m = Interference::new(&d);
        let mut p = vec![-3.0, 1.0];
        m.process_fit_parameters(&mut p);
        m.process_fit_parameters(&mut p);
        assert_eq!(p, vec![3.0, 1.0]);
    }
}
