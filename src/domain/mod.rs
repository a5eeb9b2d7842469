//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the dataset being fit (`DataPoint`, `Dataset`)
//! - attempt bookkeeping (`AttemptOutcome`, `AttemptRecord`, `BestFit`)
//! - run configuration (`FitConfig`, `GuessDirective`)
//! - the JSON export schema (`FitReportFile`)

pub mod types;

pub use types::*;
