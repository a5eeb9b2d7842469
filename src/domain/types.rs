//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - shared by reference across every fit attempt (`Dataset`)
//! - exported to JSON after a run (`FitReportFile`)
//! - built once from CLI flags or a directive script (`FitConfig`)

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One histogram bin: the independent variable and the observed density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub observed: f64,
}

impl DataPoint {
    pub fn new(x: f64, observed: f64) -> Self {
        Self { x, observed }
    }
}

/// Ordered, read-only collection of data points.
///
/// Models borrow a `Dataset` for their whole lifetime; nothing in the crate
/// mutates it after loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    points: Vec<DataPoint>,
}

impl Dataset {
    pub fn new(points: Vec<DataPoint>) -> Self {
        Self { points }
    }

    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        Self::new(pairs.iter().map(|&(x, f)| DataPoint::new(x, f)).collect())
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataPoint> {
        self.points.iter()
    }

    /// Smallest and largest `x`, if the dataset has a non-degenerate range.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        for p in &self.points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
        }
        if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
            Some((min_x, max_x))
        } else {
            None
        }
    }
}

/// How a single optimization attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The step-size test passed.
    Converged,
    /// Iteration cap reached, or no acceptable step could be found.
    /// Still eligible for the best fit.
    NoProgress,
    /// Hard solver failure; never competes for the best fit.
    Error,
}

impl AttemptOutcome {
    pub fn is_accepted(self) -> bool {
        !matches!(self, AttemptOutcome::Error)
    }

    pub fn label(self) -> &'static str {
        match self {
            AttemptOutcome::Converged => "converged",
            AttemptOutcome::NoProgress => "no progress",
            AttemptOutcome::Error => "error",
        }
    }
}

/// Per-attempt summary kept after the attempt's vectors are discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Position of the candidate in the guess list (0-based).
    pub index: usize,
    pub outcome: AttemptOutcome,
    pub iterations: usize,
    /// `None` for attempts that ended in error.
    pub residual_norm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The winning attempt of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct BestFit {
    pub candidate: usize,
    pub initial: Vec<f64>,
    pub params: Vec<f64>,
    pub residual_norm: f64,
    pub outcome: AttemptOutcome,
    pub iterations: usize,
}

/// One `guess` request, in the order it was given.
#[derive(Debug, Clone, PartialEq)]
pub enum GuessDirective {
    /// `guess default`
    Default,
    /// `guess name value ...`; `line` is the script line, when there is one.
    Explicit { line: Option<usize>, tokens: Vec<String> },
}

impl GuessDirective {
    /// Classify the words after `guess`: a leading `default` (any case)
    /// selects the model's default grid.
    pub fn from_tokens<S: AsRef<str>>(line: Option<usize>, tokens: &[S]) -> Self {
        match tokens.first() {
            Some(first) if first.as_ref().eq_ignore_ascii_case("default") => GuessDirective::Default,
            _ => GuessDirective::Explicit {
                line,
                tokens: tokens.iter().map(|s| s.as_ref().to_string()).collect(),
            },
        }
    }
}

/// Full configuration for one run.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub model_name: String,
    pub data_path: PathBuf,
    pub guesses: Vec<GuessDirective>,

    /// Echo parameters after every iteration.
    pub print_iterations: bool,

    /// Step-size convergence tolerances and iteration cap.
    pub epsabs: f64,
    pub epsrel: f64,
    pub max_iterations: usize,

    /// Report covariance-based standard deviations.
    pub uncertainties: bool,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_json: Option<PathBuf>,
}

impl FitConfig {
    /// Config with the stock tolerances and no output extras.
    pub fn new(model_name: impl Into<String>, data_path: impl Into<PathBuf>) -> Self {
        Self {
            model_name: model_name.into(),
            data_path: data_path.into(),
            guesses: Vec::new(),
            print_iterations: false,
            epsabs: 1e-4,
            epsrel: 1e-4,
            max_iterations: 1000,
            uncertainties: false,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_json: None,
        }
    }
}

/// A fitted parameter as exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedParameter {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdev: Option<f64>,
}

/// Observed and fitted values at every data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedCurve {
    pub x: Vec<f64>,
    pub observed: Vec<f64>,
    pub fitted: Vec<f64>,
}

/// JSON export schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReportFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub data_file: String,
    pub points: usize,
    pub residual_norm: f64,
    pub parameters: Vec<NamedParameter>,
    pub attempts: Vec<AttemptRecord>,
    pub curve: FittedCurve,
}
