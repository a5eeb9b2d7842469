//! The line-shape model abstraction.
//!
//! A model knows the physics: how to evaluate its line shape, the residual
//! against an observed density, and the partial derivatives of that residual
//! with respect to each fit parameter. It knows nothing about optimization;
//! `fit::adapter` turns a model into a least-squares problem.

use std::collections::BTreeMap;

use crate::domain::Dataset;
use crate::error::GuessError;

/// A physics line shape bound to one dataset.
///
/// Parameter vectors passed to these methods always have length
/// [`LineShapeModel::nfit`]; index meaning is fixed by
/// [`LineShapeModel::parameter_names`].
pub trait LineShapeModel {
    /// Display name used in messages.
    fn name(&self) -> &'static str;

    /// Lowercase parameter names in canonical order.
    fn parameter_names(&self) -> &'static [&'static str];

    /// Names as printed in reports; same order as `parameter_names`.
    fn display_names(&self) -> &'static [&'static str] {
        self.parameter_names()
    }

    /// Names that a user guess must supply.
    fn required_parameters(&self) -> &'static [&'static str];

    fn nfit(&self) -> usize {
        self.parameter_names().len()
    }

    /// The dataset this model was constructed for.
    fn dataset(&self) -> &Dataset;

    /// Line-shape value at `x`.
    fn evaluate(&self, params: &[f64], x: f64) -> f64;

    /// Signed deviation of the model from `observed` at `x`.
    ///
    /// Each model chooses its own weighting; heavy-tailed line shapes divide
    /// by the observation.
    fn residual(&self, params: &[f64], x: f64, observed: f64) -> f64;

    /// Partial derivatives of [`LineShapeModel::residual`], written to `out`
    /// (length `nfit`).
    fn jacobian(&self, params: &[f64], x: f64, observed: f64, out: &mut [f64]);

    /// Residual and Jacobian together.
    ///
    /// Models that share work between the two override this.
    fn resid_j(&self, params: &[f64], x: f64, observed: f64, out: &mut [f64]) -> f64 {
        self.jacobian(params, x, observed, out);
        self.residual(params, x, observed)
    }

    /// Literal default starting points.
    fn default_guesses(&self) -> Vec<Vec<f64>>;

    /// Build a starting vector from named values.
    ///
    /// Names are already lowercased and checked against
    /// [`LineShapeModel::parameter_names`]. Every name in
    /// [`LineShapeModel::required_parameters`] must be present; the rest
    /// default to 1.
    fn initial_guess(&self, values: &BTreeMap<String, f64>) -> Result<Vec<f64>, GuessError> {
        guess_from_values(self.name(), self.parameter_names(), self.required_parameters(), 1.0, values)
    }

    /// Bring a fitted vector into canonical form (e.g. positive couplings).
    ///
    /// Must be idempotent.
    fn process_fit_parameters(&self, _params: &mut [f64]) {}

    /// Whether fitted parameters satisfy the model's physical constraints.
    fn is_good_fit(&self, _params: &[f64]) -> bool {
        true
    }
}

/// Body of the default [`LineShapeModel::initial_guess`]: every name in
/// `required` must be present; anything else in `names` defaults to
/// `optional_default`.
pub(crate) fn guess_from_values(
    model: &'static str,
    names: &'static [&'static str],
    required: &'static [&'static str],
    optional_default: f64,
    values: &BTreeMap<String, f64>,
) -> Result<Vec<f64>, GuessError> {
    if required.iter().any(|r| !values.contains_key(*r)) {
        return Err(GuessError::MissingRequired { model, required });
    }
    Ok(names
        .iter()
        .map(|n| values.get(*n).copied().unwrap_or(optional_default))
        .collect())
}

/// Cross product of per-parameter value lists, first axis outermost.
pub fn product_grid(axes: &[&[f64]]) -> Vec<Vec<f64>> {
    let mut out: Vec<Vec<f64>> = vec![Vec::with_capacity(axes.len())];
    for axis in axes {
        let mut next = Vec::with_capacity(out.len() * axis.len());
        for prefix in &out {
            for &v in axis.iter() {
                let mut row = prefix.clone();
                row.push(v);
                next.push(row);
            }
        }
        out = next;
    }
    out
}
