//! Error types.
//!
//! [`AppError`] is the process-level error: it carries the exit code the
//! `fitter` binary returns. Codes in use:
//!
//! - `2`: bad input (usage, unreadable files, malformed dataset)
//! - `3`: the dataset holds no points
//! - `4`: fitting failed (no accepted attempt, or the best fit was rejected)
//!
//! The smaller enums describe failures that are reported and skipped while the
//! run continues.

use std::fmt;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// A user-supplied initial guess that could not be turned into a parameter
/// vector. Only the one guess is dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum GuessError {
    /// `guess` with nothing after it.
    Empty,
    /// A parameter name with no value following it.
    MissingValue { name: String },
    /// A value that does not parse as a number.
    InvalidValue { name: String, value: String },
    /// A name the model does not know.
    UnknownParameter { model: &'static str, name: String },
    /// The same name given twice in one guess.
    DuplicateParameter { name: String },
    /// A required name is absent.
    MissingRequired {
        model: &'static str,
        required: &'static [&'static str],
    },
}

impl fmt::Display for GuessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuessError::Empty => write!(f, "No initial guess specified. Skipping line."),
            GuessError::MissingValue { name } => {
                write!(f, "No value given for parameter \"{name}\".")
            }
            GuessError::InvalidValue { name, value } => {
                write!(f, "Invalid value '{value}' for parameter \"{name}\".")
            }
            GuessError::UnknownParameter { model, name } => {
                write!(f, "The {model} model has no parameter \"{name}\".")
            }
            GuessError::DuplicateParameter { name } => {
                write!(f, "Parameter \"{name}\" specified more than once.")
            }
            GuessError::MissingRequired { model, required } => {
                let names: Vec<String> = required.iter().map(|n| format!("\"{n}\"")).collect();
                write!(
                    f,
                    "Initial guesses for the {model} model must specify {}.",
                    names.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for GuessError {}

/// Hard failure inside one Levenberg–Marquardt attempt.
///
/// The attempt is abandoned and never competes for the best fit.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The starting vector does not have one entry per fit parameter.
    DimensionMismatch { expected: usize, found: usize },
    /// A residual evaluated to NaN or infinity at an accepted point.
    NonFiniteResidual,
    /// A Jacobian entry evaluated to NaN or infinity at an accepted point.
    NonFiniteJacobian,
    /// The damped step could not be solved.
    SingularStep,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::DimensionMismatch { expected, found } => write!(
                f,
                "initial guess has {found} parameters, model expects {expected}"
            ),
            SolverError::NonFiniteResidual => write!(f, "residual is not finite"),
            SolverError::NonFiniteJacobian => write!(f, "Jacobian is not finite"),
            SolverError::SingularStep => write!(f, "damped step system is singular"),
        }
    }
}

impl std::error::Error for SolverError {}
