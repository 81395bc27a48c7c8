//! Input validation shared by the HTTP layer and the list client

mod user_form;

pub use user_form::{FormMode, UserForm};

use phonenumber::country;
use validator::ValidationErrors;

use crate::shared::types::FieldErrors;

/// Flatten `validator` errors into field-keyed messages.
///
/// Errors without a message fall back to their code.
pub fn to_field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Region assumed for numbers written without a leading `+`.
pub const DEFAULT_PHONE_REGION: country::Id = country::Id::US;

/// Phone number check against libphonenumber metadata.
///
/// International numbers need a leading `+`; anything else is read as a
/// national number of [`DEFAULT_PHONE_REGION`].
pub fn is_valid_phone(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.is_empty() {
        return false;
    }
    match phonenumber::parse(Some(DEFAULT_PHONE_REGION), raw) {
        Ok(number) => phonenumber::is_valid(&number),
        Err(_) => false,
    }
}
