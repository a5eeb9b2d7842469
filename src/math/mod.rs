//! Numerical building blocks: dense least squares and adaptive quadrature.

pub mod lsq;
pub mod quadrature;

pub use lsq::*;
pub use quadrature::*;
