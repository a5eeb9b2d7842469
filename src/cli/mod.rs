//! Command-line parsing for the line-shape fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting code. Everything resolves into a `domain::FitConfig` in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "fitter",
    version,
    about = "Fit conductance-histogram line shapes by multi-start Levenberg–Marquardt"
)]
pub struct Cli {
    /// Diagnostic output level (stderr).
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a model to a dataset file.
    Fit(FitArgs),
    /// Read a directive script (model, data file, options) from a file or stdin.
    Run(RunArgs),
    /// List the available models.
    Models,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Model name (case-insensitive), see `fitter models`.
    #[arg(short, long)]
    pub model: String,

    /// Dataset file: one `<x> <observed>` pair per line.
    #[arg(short, long, value_name = "FILE")]
    pub data: PathBuf,

    /// Initial guess as `name value ...`; repeat for several starting points.
    #[arg(short, long = "guess", value_name = "NAME VALUE ...")]
    pub guesses: Vec<String>,

    /// Also run the model's default starting points.
    #[arg(long)]
    pub default_guesses: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Script file; reads stdin when omitted or `-`.
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options shared by `fit` and `run`.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Print parameters after every iteration.
    #[arg(short, long)]
    pub print: bool,

    /// Absolute step tolerance.
    #[arg(long, default_value_t = 1e-4)]
    pub epsabs: f64,

    /// Relative step tolerance.
    #[arg(long, default_value_t = 1e-4)]
    pub epsrel: f64,

    /// Iteration cap per starting point.
    #[arg(long, default_value_t = 1000)]
    pub max_iter: usize,

    /// Report one-sigma parameter uncertainties.
    #[arg(long)]
    pub uncertainties: bool,

    /// Render an ASCII plot of data and fit.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Write the fit report to a JSON file.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}
