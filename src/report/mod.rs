//! Reporting: turning the best fit into user-facing output.

pub mod format;

pub use format::*;

use crate::domain::{BestFit, FittedCurve, NamedParameter};
use crate::error::AppError;
use crate::fit::parameter_uncertainties;
use crate::models::LineShapeModel;

/// Canonical best-fit parameters ready for printing and export.
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub model: &'static str,
    pub residual_norm: f64,
    pub names: Vec<&'static str>,
    pub params: Vec<f64>,
    pub stdev: Option<Vec<f64>>,
}

impl FitReport {
    /// The `Resid = ...` block.
    pub fn render(&self) -> String {
        format_result(self.residual_norm, &self.names, &self.params, self.stdev.as_deref())
    }

    pub fn named_parameters(&self) -> Vec<NamedParameter> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| NamedParameter {
                name: name.to_string(),
                value: self.params[i],
                stdev: self.stdev.as_ref().map(|s| s[i]),
            })
            .collect()
    }
}

/// Canonicalize the best fit, check it is physical, and optionally attach
/// standard deviations.
pub fn report_best_fit(model: &dyn LineShapeModel, best: &BestFit, uncertainties: bool) -> Result<FitReport, AppError> {
    let mut params = best.params.clone();
    model.process_fit_parameters(&mut params);

    if !model.is_good_fit(&params) {
        return Err(AppError::new(
            4,
            format!(
                "Error: best fit is unphysical for the {} model ({}).",
                model.name(),
                format_parameters(model.display_names(), &params, None)
            ),
        ));
    }

    let stdev = if uncertainties {
        let s = parameter_uncertainties(model, &params, best.residual_norm);
        if s.is_none() {
            log::warn!("parameter uncertainties unavailable");
        }
        s
    } else {
        None
    };

    Ok(FitReport {
        model: model.name(),
        residual_norm: best.residual_norm,
        names: model.display_names().to_vec(),
        params,
        stdev,
    })
}

/// Observed and fitted densities at every data point.
pub fn fitted_curve(model: &dyn LineShapeModel, params: &[f64]) -> FittedCurve {
    let data = model.dataset();
    FittedCurve {
        x: data.iter().map(|p| p.x).collect(),
        observed: data.iter().map(|p| p.observed).collect(),
        fitted: data.iter().map(|p| model.evaluate(params, p.x)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttemptOutcome, Dataset};
    use crate::models::{AsymmetricResonant, SymmetricNonresonant, SymmetricResonant};

    fn best(params: Vec<f64>, residual_norm: f64) -> BestFit {
        BestFit {
            candidate: 0,
            initial: params.clone(),
            params,
            residual_norm,
            outcome: AttemptOutcome::Converged,
            iterations: 4,
        }
    }

    #[test]
    fn report_canonicalizes_before_printing() {
        let data = Dataset::from_pairs(&[(0.5, 1.0)]);
        let model = SymmetricResonant::new(&data);
        let report = report_best_fit(&model, &best(vec![-9.9462, 3.9567], 0.4310146), false).unwrap();
        assert_eq!(report.render(), "Resid = 4.310146e-01\ngamma=9.9462e+00, norm=3.9567e+00\n");
    }

    #[test]
    fn asymmetric_report_uses_display_names_and_order() {
        let data = Dataset::from_pairs(&[(0.5, 1.0)]);
        let model = AsymmetricResonant::new(&data);
        let report = report_best_fit(&model, &best(vec![11.731, 17.085, -25.489, 8.2639], 4.895159), false).unwrap();
        assert_eq!(
            report.render(),
            "Resid = 4.895159e+00\ngammaL=1.1731e+01, gammaR=1.7085e+01, r=2.5489e+01, norm=8.2639e+00\n"
        );
    }

    #[test]
    fn unphysical_fit_is_rejected() {
        let data = Dataset::from_pairs(&[(0.5, 1.0)]);
        let model = SymmetricNonresonant::new(&data);
        let err = report_best_fit(&model, &best(vec![30.0, -4.0, 1.0], 1.0), false).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.message().contains("SymmetricNonresonant"));
    }

    #[test]
    fn uncertainties_are_named() {
        let data = Dataset::from_pairs(&[(0.4, 0.8), (0.6, 1.1), (0.8, 2.0), (0.9, 3.5)]);
        let model = SymmetricResonant::new(&data);
        let report = report_best_fit(&model, &best(vec![4.0, 1.2], 0.3), true).unwrap();
        let named = report.named_parameters();
        assert_eq!(named[0].name, "gamma");
        assert!(named.iter().all(|p| p.stdev.is_some_and(|s| s > 0.0)));
        assert!(report.render().contains("gamma_err="));
    }

    #[test]
    fn fitted_curve_follows_dataset_order() {
        let data = Dataset::from_pairs(&[(0.8, 2.0), (0.4, 0.8)]);
        let model = SymmetricResonant::new(&data);
        let curve = fitted_curve(&model, &[4.0, 1.2]);
        assert_eq!(curve.x, vec![0.8, 0.4]);
        assert_eq!(curve.fitted[1], model.evaluate(&[4.0, 1.2], 0.4));
    }
}
