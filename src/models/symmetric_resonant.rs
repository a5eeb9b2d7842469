//! Resonant tunneling through a single level coupled equally to both leads.
//!
//! With `g` the conductance, the line shape is
//!
//! ```text
//! P(g) = N / sqrt(g³ (1 - g)) · exp(-γ² (1 - g) / (2 g))
//! ```
//!
//! The density diverges as `g → 1`, so residuals are taken relative to the
//! observation: `(P(g) - f) / f`.

use crate::domain::Dataset;
use crate::models::model::{LineShapeModel, product_grid};

pub const GAMMA: usize = 0;
pub const NORM: usize = 1;

const NAMES: &[&str] = &["gamma", "norm"];
const REQUIRED: &[&str] = &["gamma"];

pub struct SymmetricResonant<'a> {
    data: &'a Dataset,
}

impl<'a> SymmetricResonant<'a> {
    pub fn new(data: &'a Dataset) -> Self {
        Self { data }
    }

    /// `(exp(...), 1 / sqrt(g³(1-g)))`
    fn factors(params: &[f64], g: f64) -> (f64, f64) {
        let gamma = params[GAMMA];
        let e = (-0.5 * gamma * gamma * (1.0 - g) / g).exp();
        let pre = 1.0 / (g * g * g * (1.0 - g)).sqrt();
        (e, pre)
    }
}

pub(crate) fn create(data: &Dataset) -> Box<dyn LineShapeModel + '_> {
    Box::new(SymmetricResonant::new(data))
}

impl LineShapeModel for SymmetricResonant<'_> {
    fn name(&self) -> &'static str {
        "SymmetricResonant"
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
        let (e, pre) = Self::factors(params, g);
        params[NORM] * pre * e
    }

    fn residual(&self, params: &[f64], g: f64, f: f64) -> f64 {
        (self.evaluate(params, g) - f) / f
    }

    fn jacobian(&self, params: &[f64], g: f64, f: f64, out: &mut [f64]) {
        let gamma = params[GAMMA];
        let norm = params[NORM];
        let (e, pre) = Self::factors(params, g);

        out[GAMMA] = -gamma * norm * ((1.0 - g) / g).sqrt() * e / (g * g) / f;
        out[NORM] = e * pre / f;
    }

    fn default_guesses(&self) -> Vec<Vec<f64>> {
        product_grid(&[&[5.0, 10.0, 20.0, 35.0, 50.0], &[1.0]])
    }

    fn process_fit_parameters(&self, params: &mut [f64]) {
        // only γ² enters the line shape
        params[GAMMA] = params[GAMMA].abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::{assert_jacobian_matches, sample_params};

    fn data() -> Dataset {
        Dataset::from_pairs(&[(0.3, 0.4), (0.6, 1.2), (0.85, 2.5)])
    }

    #[test]
    fn residual_is_relative_to_observation() {
        let d = data();
        let m = SymmetricResonant::new(&d);
        let p = [3.0, 2.0];
        let value = m.evaluate(&p, 0.6);
        assert!((m.residual(&p, 0.6, value) - 0.0).abs() < 1e-14);
        assert!((m.residual(&p, 0.6, 2.0 * value) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let d = data();
        let m = SymmetricResonant::new(&d);
        for p in sample_params(7, 25, &[(1.0, 6.0), (0.5, 3.0)]) {
            for pt in d.iter() {
                assert_jacobian_matches(&m, &p, pt.x, pt.observed, 1e-5);
            }
        }
    }

    #[test]
    fn canonical_gamma_is_positive_and_stable() {
        let d = data();
        let m = SymmetricResonant::new(&d);
        let mut p = vec![-7.5, 1.3];
        m.process_fit_parameters(&mut p);
        assert_eq!(p, vec![7.5, 1.3]);
        let once = p.clone();
        m.process_fit_parameters(&mut p);
        assert_eq!(p, once);
    }

    #[test]
    fn default_grid_varies_gamma_only() {
        let d = data();
        let m = SymmetricResonant::new(&d);
        let guesses = m.default_guesses();
        assert_eq!(guesses.len(), 5);
        assert!(guesses.iter().all(|g| g.len() == 2 && g[NORM] == 1.0));
        assert_eq!(guesses[1][GAMMA], 10.0);
    }
}
