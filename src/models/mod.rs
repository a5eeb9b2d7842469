//! Conductance-histogram line shapes.
//!
//! Each model implements [`LineShapeModel`]; [`ModelRegistry`] maps the
//! user-facing names to constructors.

pub mod asymmetric_resonant;
pub mod interference;
pub mod model;
pub mod registry;
pub mod symmetric_nonresonant;
pub mod symmetric_resonant;

#[cfg(test)]
pub(crate) mod testing;

pub use asymmetric_resonant::AsymmetricResonant;
pub use interference::Interference;
pub use model::*;
pub use registry::*;
pub use symmetric_nonresonant::SymmetricNonresonant;
pub use symmetric_resonant::SymmetricResonant;
