//! Shared data model for Vignette story files.

pub mod defs;
pub mod validate;

pub use defs::*;
pub use validate::{ValidationError, name_problem, validate_story};
