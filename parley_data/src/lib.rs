//! Shared data model for Parley worlds: objects, grammar rules and handlers.

pub mod defs;
pub mod validate;

pub use defs::*;
pub use validate::{MAX_USER_ATTRIBUTES, ValidationError, validate_world};
