//! Directive script reader.
//!
//! A script is the line-oriented form of a fit request:
//!
//! ```text
//! SymmetricResonant          <- line 1: model name
//! histogram.dat              <- line 2: dataset file
//! print                      <- options, one per line, until EOF
//! guess gamma 8. norm 3.
//! guess default
//! ```
//!
//! Keywords are case-insensitive. Unknown keywords are logged and ignored.

use std::io::BufRead;
use std::path::PathBuf;

use crate::domain::{FitConfig, GuessDirective};
use crate::error::AppError;

/// A fatal problem with the script header.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error: {} in line {}.", self.message, self.line)
    }
}

impl std::error::Error for ScriptError {}

impl From<ScriptError> for AppError {
    fn from(err: ScriptError) -> Self {
        AppError::new(2, err.to_string())
    }
}

/// Everything a script can set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FitScript {
    pub model_name: String,
    pub data_path: PathBuf,
    pub print_iterations: bool,
    pub guesses: Vec<GuessDirective>,
}

impl FitScript {
    /// Fold the script into `config`; script guesses come after any already
    /// there.
    pub fn apply(self, config: &mut FitConfig) {
        config.model_name = self.model_name;
        config.data_path = self.data_path;
        config.print_iterations |= self.print_iterations;
        config.guesses.extend(self.guesses);
    }
}

/// Parse a script from any reader.
pub fn parse_script<R: BufRead>(reader: R) -> Result<FitScript, AppError> {
    let mut lines = reader.lines().enumerate().map(|(i, l)| (i + 1, l));

    let model_name = header_token(lines.next(), 1, "model name expected")?;
    let data_path = PathBuf::from(header_token(lines.next(), 2, "file name expected")?);

    let mut script = FitScript {
        model_name,
        data_path,
        ..FitScript::default()
    };

    for (line_no, line) in lines {
        let line = line.map_err(|e| AppError::new(2, format!("Error reading script: {e}")))?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(keyword) = tokens.first() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "print" => script.print_iterations = true,
            "noprint" => script.print_iterations = false,
            "guess" => script.guesses.push(GuessDirective::from_tokens(Some(line_no), &tokens[1..])),
            other => log::warn!("line {line_no}: ignoring unknown directive '{other}'"),
        }
    }

    Ok(script)
}

fn header_token(
    entry: Option<(usize, std::io::Result<String>)>,
    line_no: usize,
    what: &str,
) -> Result<String, AppError> {
    let missing = || ScriptError {
        line: line_no,
        message: what.to_string(),
    };
    let (_, line) = entry.ok_or_else(missing)?;
    let line = line.map_err(|e| AppError::new(2, format!("Error reading script: {e}")))?;
    let token = line.split_whitespace().next().ok_or_else(missing)?;
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_header_and_directives() {
        let text = "SymmetricResonant\nhist.dat extra\n\nPRINT\nguess gamma 8. norm 3.\nGuess Default\nnoprint\n";
        let script = parse_script(text.as_bytes()).unwrap();
        assert_eq!(script.model_name, "SymmetricResonant");
        assert_eq!(script.data_path, PathBuf::from("hist.dat"));
        assert!(!script.print_iterations);
        assert_eq!(
            script.guesses,
            vec![
                GuessDirective::Explicit {
                    line: Some(5),
                    tokens: vec!["gamma".into(), "8.".into(), "norm".into(), "3.".into()],
                },
                GuessDirective::Default,
            ]
        );
    }

    #[test]
    fn bare_guess_is_kept_as_an_empty_guess() {
        let script = parse_script("m\nd\nguess\nfrobnicate 3\n".as_bytes()).unwrap();
        assert_eq!(
            script.guesses,
            vec![GuessDirective::Explicit {
                line: Some(3),
                tokens: vec![],
            }]
        );
    }

    #[test]
    fn missing_header_lines_are_fatal() {
        let err = parse_script("".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.message(), "Error: model name expected in line 1.");

        let err = parse_script("SymmetricResonant\n   \n".as_bytes()).unwrap_err();
        assert_eq!(err.message(), "Error: file name expected in line 2.");
    }

    #[test]
    fn apply_appends_guesses_and_keeps_cli_print() {
        let mut config = FitConfig::new("x", "y");
        config.print_iterations = true;
        config.guesses.push(GuessDirective::Default);
        let script = parse_script("interference\nh.dat\nguess comega 3\n".as_bytes()).unwrap();
        script.apply(&mut config);
        assert_eq!(config.model_name, "interference");
        assert!(config.print_iterations);
        assert_eq!(config.guesses.len(), 2);
        assert_eq!(config.guesses[0], GuessDirective::Default);
    }
}
