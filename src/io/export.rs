//! Read/write fit report JSON files.
//!
//! The report is the portable record of a run:
//! - model, dataset path and point count
//! - best-fit parameters (with standard deviations when computed)
//! - every attempt's outcome
//! - observed versus fitted values for quick plotting
//!
//! The schema is defined by `domain::FitReportFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{AttemptRecord, FitReportFile, FittedCurve};
use crate::error::AppError;
use crate::report::FitReport;

/// Assemble the export record for a finished run.
pub fn build_report_file(
    report: &FitReport,
    data_file: &Path,
    attempts: &[AttemptRecord],
    curve: FittedCurve,
) -> FitReportFile {
    FitReportFile {
        tool: env!("CARGO_PKG_NAME").to_string(),
        generated_at: Utc::now(),
        model: report.model.to_string(),
        data_file: data_file.display().to_string(),
        points: curve.x.len(),
        residual_norm: report.residual_norm,
        parameters: report.named_parameters(),
        attempts: attempts.to_vec(),
        curve,
    }
}

/// Write a report JSON file.
pub fn write_report_json(path: &Path, report: &FitReportFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;

    log::info!("wrote {}", path.display());
    Ok(())
}

/// Read a report JSON file.
pub fn read_report_json(path: &Path) -> Result<FitReportFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open report JSON '{}': {e}", path.display())))?;
    let report: FitReportFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid report JSON: {e}")))?;
    Ok(report)
}
