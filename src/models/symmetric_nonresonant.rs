//! Nonresonant (off-resonance) tunneling, symmetric coupling.
//!
//! ```text
//! d    = cε √g - cγ √(1 - g)
//! P(g) = N / sqrt(g (1 - g)³) · exp(-d² / (2 (1 - g)))
//! ```
//!
//! Residuals are plain differences `P(g) - f`.

use crate::domain::Dataset;
use crate::models::model::{LineShapeModel, product_grid};

pub const CEPSILON: usize = 0;
pub const CGAMMA: usize = 1;
pub const NORM: usize = 2;

const NAMES: &[&str] = &["cepsilon", "cgamma", "norm"];
const REQUIRED: &[&str] = &["cepsilon", "cgamma"];

pub struct SymmetricNonresonant<'a> {
    data: &'a Dataset,
}

impl<'a> SymmetricNonresonant<'a> {
    pub fn new(data: &'a Dataset) -> Self {
        Self { data }
    }
}

pub(crate) fn create(data: &Dataset) -> Box<dyn LineShapeModel + '_> {
    Box::new(SymmetricNonresonant::new(data))
}

impl LineShapeModel for SymmetricNonresonant<'_> {
    fn name(&self) -> &'static str {
        "SymmetricNonresonant"
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
        let cd = params[CEPSILON] * g.sqrt() - params[CGAMMA] * (1.0 - g).sqrt();
        let e = (-0.5 * cd * cd / (1.0 - g)).exp();
        params[NORM] * e / (g * (1.0 - g).powi(3)).sqrt()
    }

    fn residual(&self, params: &[f64], g: f64, f: f64) -> f64 {
        self.evaluate(params, g) - f
    }

    fn jacobian(&self, params: &[f64], g: f64, _f: f64, out: &mut [f64]) {
        let norm = params[NORM];
        let one_m = 1.0 - g;
        let cd = params[CEPSILON] * g.sqrt() - params[CGAMMA] * one_m.sqrt();
        let e = (-0.5 * cd * cd / one_m).exp();

        out[CEPSILON] = -norm * cd * e / (one_m * one_m * one_m.sqrt());
        out[CGAMMA] = norm * cd * e / (one_m * one_m * g.sqrt());
        out[NORM] = e / (one_m * (g * one_m).sqrt());
    }

    fn default_guesses(&self) -> Vec<Vec<f64>> {
        product_grid(&[
            &[50.0, 100.0, 200.0, 300.0, 400.0, 500.0],
            &[5.0, 10.0, 20.0, 30.0, 40.0, 50.0],
            &[1.0],
        ])
    }

    fn process_fit_parameters(&self, params: &mut [f64]) {
        // (cε, cγ) -> (-cε, -cγ) leaves d² unchanged
        if params[CEPSILON] < 0.0 && params[CGAMMA] < 0.0 {
            params[CEPSILON] = -params[CEPSILON];
            params[CGAMMA] = -params[CGAMMA];
        }
    }

    fn is_good_fit(&self, params: &[f64]) -> bool {
        params[CEPSILON] > 0.0 && params[CGAMMA] > 0.0
    }
}
