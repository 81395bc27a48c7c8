//! Domain layer: the user aggregate and domain errors

pub mod user;

pub use user::*;

// Re-export error types from shared for convenience
pub use crate::shared::types::errors::{DomainError, DomainResult, FieldErrors};
