//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - resolves the run configuration (flags or directive script)
//! - runs the fit pipeline

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use clap::Parser;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use crate::cli::{Command, FitArgs, OutputArgs, RunArgs};
use crate::domain::{FitConfig, GuessDirective};
use crate::error::AppError;
use crate::io::parse_script;
use crate::models::ModelRegistry;

pub mod pipeline;

/// Entry point for the `fitter` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_logging(cli.log_level.filter());

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Run(args) => handle_run(args),
        Command::Models => {
            println!("{}", ModelRegistry::builtin().describe());
            Ok(())
        }
    }
}

fn init_logging(level: log::LevelFilter) {
    let config = ConfigBuilder::new()
        .set_time_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .build();
    // an already-installed logger wins
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    execute(&config)
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = match args.script.as_deref() {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path)
                .map_err(|e| AppError::new(2, format!("Error opening {} for input: {e}", path.display())))?;
            config_from_script(BufReader::new(file), &args.output)?
        }
        _ => config_from_script(io::stdin().lock(), &args.output)?,
    };
    execute(&config)
}

fn execute(config: &FitConfig) -> Result<(), AppError> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    let Some(output) = pipeline::run_fit(config, &mut stdout.lock(), &mut stderr.lock())? else {
        log::info!("no fit attempted");
        return Ok(());
    };
    log::info!(
        "{} of {} attempts accepted",
        output.attempts.iter().filter(|a| a.outcome.is_accepted()).count(),
        output.candidates
    );
    Ok(())
}

/// Resolve `fitter fit` flags into a run configuration.
pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    let mut config = FitConfig::new(args.model.clone(), args.data.clone());
    apply_output_args(&mut config, &args.output);

    config.guesses = args
        .guesses
        .iter()
        .map(|g| {
            let tokens: Vec<&str> = g.split_whitespace().collect();
            GuessDirective::from_tokens(None, tokens.as_slice())
        })
        .collect();
    if args.default_guesses {
        config.guesses.push(GuessDirective::Default);
    }
    config
}

/// Read a directive script and layer the output flags on top.
pub fn config_from_script<R: io::BufRead>(reader: R, output: &OutputArgs) -> Result<FitConfig, AppError> {
    let script = parse_script(reader)?;
    let mut config = FitConfig::new(String::new(), String::new());
    apply_output_args(&mut config, output);
    script.apply(&mut config);
    Ok(config)
}

fn apply_output_args(config: &mut FitConfig, output: &OutputArgs) {
    config.print_iterations = output.print;
    config.epsabs = output.epsabs;
    config.epsrel = output.epsrel;
    config.max_iterations = output.max_iter;
    config.uncertainties = output.uncertainties;
    config.plot = output.plot;
    config.plot_width = output.width;
    config.plot_height = output.height;
    config.export_json = output.export_json.clone();
}
