//! Fitting orchestration.
//!
//! Responsibilities:
//!
//! - adapt a line-shape model into a least-squares problem
//! - run Levenberg–Marquardt from every starting point
//! - keep the lowest-residual result
//! - estimate parameter uncertainties at that result

pub mod adapter;
pub mod covariance;
pub mod driver;
pub mod guesses;
pub mod solver;

pub use adapter::*;
pub use covariance::*;
pub use driver::*;
pub use guesses::*;
pub use solver::*;
