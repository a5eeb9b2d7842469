//! `lineshape-fit` library crate.
//!
//! The binary (`fitter`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - models and the multi-start driver are reusable from other tools
//!
//! Layout:
//!
//! - `models`: line shapes and the name registry
//! - `fit`: least-squares adapter, Levenberg–Marquardt, multi-start driver
//! - `math`: dense least squares and adaptive quadrature
//! - `report`, `plot`, `io`: output and file formats

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
