use std::collections::BTreeMap;

use thiserror::Error;

/// Validation messages keyed by input field name, in the order they were raised.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation failed: {}", summarize(.0))]
    Validation(FieldErrors),

    #[error("Already exists: {field}: {message}")]
    Conflict {
        field: &'static str,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::Validation(errors)
    }

    /// Field-keyed messages for errors the user can correct.
    ///
    /// A conflict (duplicate email) is reported against the offending field
    /// like any other validation failure.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors.clone()),
            Self::Conflict { field, message } => {
                let mut errors = FieldErrors::new();
                errors.insert(field.to_string(), vec![message.clone()]);
                Some(errors)
            }
            _ => None,
        }
    }
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl From<InfraError> for DomainError {
    fn from(err: InfraError) -> Self {
        DomainError::Storage(err.to_string())
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
