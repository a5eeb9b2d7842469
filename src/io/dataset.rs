//! Dataset file reader.
//!
//! One `<x> <observed>` pair per line, whitespace separated. Blank lines and
//! lines starting with `#` are skipped. Anything else that does not parse as
//! exactly two finite numbers fails the whole read with the line number.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::domain::{DataPoint, Dataset};
use crate::error::AppError;

/// A line that could not be read as a data point.
#[derive(Debug, Clone, PartialEq)]
pub struct LineError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for LineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Read a dataset file.
///
/// Exit codes: 2 if the file cannot be opened or a line is malformed, 3 if it
/// holds no points.
pub fn read_dataset(path: &Path) -> Result<Dataset, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Error opening {} for input: {e}", path.display())))?;

    let data = parse_dataset(BufReader::new(file)).map_err(|err| match err {
        ParseFailure::Io(e) => AppError::new(2, format!("Error reading {}: {e}", path.display())),
        ParseFailure::Line(e) => AppError::new(2, format!("Error in {}, {e}.", path.display())),
    })?;

    if data.is_empty() {
        return Err(AppError::new(3, format!("Error: no data points in {}.", path.display())));
    }
    log::debug!("read {} points from {}", data.len(), path.display());
    Ok(data)
}

#[derive(Debug)]
pub enum ParseFailure {
    Io(std::io::Error),
    Line(LineError),
}

/// Parse dataset lines from any reader.
pub fn parse_dataset<R: BufRead>(reader: R) -> Result<Dataset, ParseFailure> {
    let mut points = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(ParseFailure::Io)?;
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        points.push(parse_point(trimmed).map_err(|message| {
            ParseFailure::Line(LineError {
                line: line_no,
                message,
            })
        })?);
    }
    Ok(Dataset::new(points))
}

fn parse_point(line: &str) -> Result<DataPoint, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 2 {
        return Err(format!("expected 2 columns, found {}", fields.len()));
    }
    let x = parse_number(fields[0])?;
    let observed = parse_number(fields[1])?;
    Ok(DataPoint::new(x, observed))
}

fn parse_number(field: &str) -> Result<f64, String> {
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("unrecognizable number '{field}'")),
    }
}
