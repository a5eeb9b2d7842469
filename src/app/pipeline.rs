//! Shared "fit pipeline" logic used by both `fitter fit` and `fitter run`.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! dataset -> model -> starting points -> multi-start fit -> report -> extras
//!
//! Output goes to the writers passed in, so tests can capture it.

use std::io::{self, Write};

use crate::domain::{AttemptRecord, FitConfig};
use crate::error::AppError;
use crate::fit::{DriverSettings, FitAttempt, FitObserver, LmSettings, collect_candidates, fit_candidates};
use crate::io::{build_report_file, read_dataset, write_report_json};
use crate::models::ModelRegistry;
use crate::report::{FitReport, fitted_curve, format_attempt_end, format_iteration, report_best_fit};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub report: FitReport,
    pub attempts: Vec<AttemptRecord>,
    pub candidates: usize,
    pub rejected_guesses: usize,
}

/// Echoes iterations to `out` when enabled.
struct TraceObserver<'w> {
    enabled: bool,
    names: &'static [&'static str],
    out: &'w mut dyn Write,
    failed: Option<io::Error>,
}

impl TraceObserver<'_> {
    fn emit(&mut self, text: &str) {
        if self.failed.is_none() {
            if let Err(e) = self.out.write_all(text.as_bytes()) {
                self.failed = Some(e);
            }
        }
    }
}

impl FitObserver for TraceObserver<'_> {
    fn on_iteration(&mut self, _candidate: usize, iteration: usize, params: &[f64]) {
        if self.enabled {
            let line = format_iteration(iteration, self.names, params);
            self.emit(&format!("{line}\n"));
        }
    }

    fn on_attempt(&mut self, attempt: &FitAttempt) {
        if self.enabled {
            let text = format_attempt_end(attempt);
            self.emit(&text);
        }
    }
}

fn write_failed(e: io::Error) -> AppError {
    AppError::new(2, format!("Failed to write output: {e}"))
}

/// Execute the full fitting pipeline.
///
/// Results and the iteration echo go to `out`; skipped guesses are reported on
/// `err`. An unrecognized model name is reported on `err` with the list of
/// known models and yields `Ok(None)` without fitting.
pub fn run_fit(config: &FitConfig, out: &mut dyn Write, err: &mut dyn Write) -> Result<Option<RunOutput>, AppError> {
    // 1) Load the dataset.
    let dataset = read_dataset(&config.data_path)?;

    // 2) Bind the model.
    let registry = ModelRegistry::builtin();
    let model = match registry.create(&config.model_name, &dataset) {
        Ok(model) => model,
        Err(unknown) => {
            writeln!(err, "{unknown}").map_err(write_failed)?;
            return Ok(None);
        }
    };
    let model = model.as_ref();

    // 3) Starting points.
    let source = collect_candidates(model, &config.guesses);
    for (line, e) in &source.rejected {
        let msg = match line {
            Some(n) => format!("Error in line {n}: {e}"),
            None => format!("Error: {e}"),
        };
        writeln!(err, "{msg}").map_err(write_failed)?;
    }

    // 4) Fit from every starting point.
    let settings = DriverSettings {
        epsabs: config.epsabs,
        epsrel: config.epsrel,
        max_iterations: config.max_iterations,
        solver: LmSettings::default(),
    };
    let mut trace = TraceObserver {
        enabled: config.print_iterations,
        names: model.display_names(),
        out: &mut *out,
        failed: None,
    };
    let run = fit_candidates(model, &source.candidates, &settings, &mut trace);
    if let Some(e) = trace.failed.take() {
        return Err(write_failed(e));
    }

    // 5) Best fit -> report.
    let best = run.best.as_ref().ok_or_else(|| AppError::new(4, "Error fitting."))?;
    let report = report_best_fit(model, best, config.uncertainties)?;
    out.write_all(report.render().as_bytes()).map_err(write_failed)?;

    // 6) Extras.
    if config.plot {
        let plot = crate::plot::render_fit_plot(model, &report.params, config.plot_width, config.plot_height);
        write!(out, "\n{plot}").map_err(write_failed)?;
    }
    if let Some(path) = &config.export_json {
        let file = build_report_file(&report, &config.data_path, &run.attempts, fitted_curve(model, &report.params));
        write_report_json(path, &file)?;
    }

    Ok(Some(RunOutput {
        report,
        attempts: run.attempts,
        candidates: source.len(),
        rejected_guesses: source.rejected.len(),
    }))
}
