//! Input/output helpers.
//!
//! - dataset file reader (`dataset`)
//! - directive script reader (`script`)
//! - fit report JSON read/write (`export`)

pub mod dataset;
pub mod export;
pub mod script;

pub use dataset::*;
pub use export::*;
pub use script::*;
