use thiserror::Error;

use crate::shared::FieldErrors;

/// Failures surfaced to list and dialog consumers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// 422: field-keyed messages to show next to the inputs
    #[error("The given data was invalid.")]
    Validation(FieldErrors),

    /// Transport failure; not retried automatically
    #[error("Network error: {0}")]
    Network(String),

    #[error("The requested user no longer exists.")]
    NotFound,

    #[error("Unexpected response ({status}): {message}")]
    Unexpected { status: u16, message: String },

    /// The list synchronizer task has stopped
    #[error("List synchronizer is no longer running")]
    Disconnected,
}

impl ClientError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Unexpected {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => Self::Network(err.to_string()),
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::Unexpected {
            status: 0,
            message: format!("invalid URL: {}", err),
        }
    }
}
