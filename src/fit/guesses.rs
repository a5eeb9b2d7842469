//! Initial-guess collection.
//!
//! User guesses arrive as `name value name value ...` token lists. Each one is
//! validated against the model and either becomes a candidate or is rejected
//! on its own; a bad guess never aborts the run. The model's default grid is
//! appended once, after every explicit guess, when a `guess default` was
//! requested or when no explicit guess survived.

use std::collections::BTreeMap;

use crate::domain::GuessDirective;
use crate::error::GuessError;
use crate::models::LineShapeModel;

/// Ordered starting vectors for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialGuessSource {
    pub candidates: Vec<Vec<f64>>,
    /// Rejected explicit guesses with their script line, if known.
    pub rejected: Vec<(Option<usize>, GuessError)>,
    pub used_defaults: bool,
}

impl InitialGuessSource {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Parse one explicit guess into a parameter vector.
pub fn parse_guess_tokens<S: AsRef<str>>(
    model: &dyn LineShapeModel,
    tokens: &[S],
) -> Result<Vec<f64>, GuessError> {
    if tokens.is_empty() {
        return Err(GuessError::Empty);
    }

    let mut values = BTreeMap::new();
    for pair in tokens.chunks(2) {
        let name = pair[0].as_ref().to_ascii_lowercase();
        let Some(raw) = pair.get(1).map(|s| s.as_ref()) else {
            return Err(GuessError::MissingValue { name });
        };
        if !model.parameter_names().contains(&name.as_str()) {
            return Err(GuessError::UnknownParameter {
                model: model.name(),
                name,
            });
        }
        let value = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| GuessError::InvalidValue {
                name: name.clone(),
                value: raw.to_string(),
            })?;
        if values.insert(name.clone(), value).is_some() {
            return Err(GuessError::DuplicateParameter { name });
        }
    }

    model.initial_guess(&values)
}

/// Parse `tokens` and push the result onto `out`.
pub fn append_initial_guess<S: AsRef<str>>(
    model: &dyn LineShapeModel,
    tokens: &[S],
    out: &mut Vec<Vec<f64>>,
) -> Result<(), GuessError> {
    out.push(parse_guess_tokens(model, tokens)?);
    Ok(())
}

/// Resolve every guess directive into the candidate list.
pub fn collect_candidates(model: &dyn LineShapeModel, directives: &[GuessDirective]) -> InitialGuessSource {
    let mut source = InitialGuessSource::default();
    let mut want_defaults = false;

    for directive in directives {
        match directive {
            GuessDirective::Default => want_defaults = true,
            GuessDirective::Explicit { line, tokens } => {
                if let Err(err) = append_initial_guess(model, tokens, &mut source.candidates) {
                    log::debug!("dropping guess {tokens:?}: {err}");
                    source.rejected.push((*line, err));
                }
            }
        }
    }

    if want_defaults || source.candidates.is_empty() {
        source.candidates.extend(model.default_guesses());
        source.used_defaults = true;
    }

    log::debug!(
        "{} starting points for {} ({} rejected, defaults {})",
        source.candidates.len(),
        model.name(),
        source.rejected.len(),
        if source.used_defaults { "on" } else { "off" }
    );
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Dataset;
    use crate::models::{AsymmetricResonant, SymmetricNonresonant, SymmetricResonant};

    fn explicit(tokens: &[&str]) -> GuessDirective {
        GuessDirective::Explicit {
            line: None,
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn names_are_case_insensitive_and_optional_defaults_fill_in() {
        let data = Dataset::default();
        let m = SymmetricResonant::new(&data);
        assert_eq!(parse_guess_tokens(&m, &["GAMMA", "7.5"]).unwrap(), vec![7.5, 1.0]);
        assert_eq!(parse_guess_tokens(&m, &["norm", "3", "gamma", "2"]).unwrap(), vec![2.0, 3.0]);
    }

    #[test]
    fn malformed_guesses_are_reported() {
        let data = Dataset::default();
        let m = SymmetricResonant::new(&data);
        let empty: [&str; 0] = [];
        assert_eq!(parse_guess_tokens(&m, &empty), Err(GuessError::Empty));
        assert!(matches!(
            parse_guess_tokens(&m, &["gamma"]),
            Err(GuessError::MissingValue { .. })
        ));
        assert!(matches!(
            parse_guess_tokens(&m, &["gamma", "ten"]),
            Err(GuessError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_guess_tokens(&m, &["gamma", "1", "width", "2"]),
            Err(GuessError::UnknownParameter { .. })
        ));
        assert!(matches!(
            parse_guess_tokens(&m, &["gamma", "1", "Gamma", "2"]),
            Err(GuessError::DuplicateParameter { .. })
        ));
        assert!(matches!(
            parse_guess_tokens(&m, &["norm", "2"]),
            Err(GuessError::MissingRequired { .. })
        ));
    }

    #[test]
    fn explicit_guesses_come_first_then_defaults_once() {
        let data = Dataset::default();
        let m = SymmetricResonant::new(&data);
        let source = collect_candidates(
            &m,
            &[
                GuessDirective::Default,
                explicit(&["gamma", "3"]),
                GuessDirective::Default,
                explicit(&["gamma", "4", "norm", "2"]),
            ],
        );
        assert_eq!(source.candidates[0], vec![3.0, 1.0]);
        assert_eq!(source.candidates[1], vec![4.0, 2.0]);
        assert_eq!(source.len(), 2 + m.default_guesses().len());
        assert!(source.used_defaults);
        assert!(source.rejected.is_empty());
    }

    #[test]
    fn explicit_guesses_alone_skip_defaults() {
        let data = Dataset::default();
        let m = SymmetricNonresonant::new(&data);
        let source = collect_candidates(&m, &[explicit(&["cepsilon", "20", "cgamma", "4"])]);
        assert_eq!(source.candidates, vec![vec![20.0, 4.0, 1.0]]);
        assert!(!source.used_defaults);
    }

    #[test]
    fn incomplete_asymmetric_guess_falls_back_to_defaults() {
        let data = Dataset::default();
        let m = AsymmetricResonant::new(&data);
        let source = collect_candidates(
            &m,
            &[GuessDirective::Explicit {
                line: Some(4),
                tokens: vec!["gammal".into(), "5".into()],
            }],
        );
        assert_eq!(source.rejected.len(), 1);
        assert_eq!(source.rejected[0].0, Some(4));
        assert!(matches!(source.rejected[0].1, GuessError::MissingRequired { .. }));
        assert_eq!(source.len(), 125);
        assert!(source.used_defaults);
    }

    #[test]
    fn no_directives_means_defaults() {
        let data = Dataset::default();
        let m = SymmetricResonant::new(&data);
        let source = collect_candidates(&m, &[]);
        assert_eq!(source.candidates, m.default_guesses());
    }
}
