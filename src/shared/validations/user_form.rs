//! User create/edit form and its validation rules

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::domain::{UserRecord, UserRole};

use super::is_valid_phone;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Whether the form creates a record or edits an existing one.
///
/// On edit an empty password means "keep the current password".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// User fields as submitted by the create and edit dialogs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct UserForm {
    #[validate(length(max = 255, message = "Name may not be greater than 255 characters."))]
    pub name: String,
    #[validate(length(max = 255, message = "Email may not be greater than 255 characters."))]
    pub email: String,
    pub phone_number: String,
    /// One of `manager`, `cashier`, `admin`, `superadmin`
    pub role: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password_confirmation: String,
}

impl UserForm {
    /// Pre-filled edit form; passwords always start empty.
    pub fn for_edit(record: &UserRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            phone_number: record.phone_number.clone(),
            role: record.role.as_str().to_string(),
            password: String::new(),
            password_confirmation: String::new(),
        }
    }

    /// Copy with surrounding whitespace removed from every field.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            role: self.role.trim().to_ascii_lowercase(),
            password: self.password.trim().to_string(),
            password_confirmation: self.password_confirmation.trim().to_string(),
        }
    }

    /// Parsed role; only meaningful after `check` succeeded.
    pub fn parsed_role(&self) -> Option<UserRole> {
        self.role.trim().parse().ok()
    }

    /// Password to store, if the form carries one.
    pub fn new_password(&self) -> Option<&str> {
        let password = self.password.trim();
        (!password.is_empty()).then_some(password)
    }

    /// Validate the normalized form.
    ///
    /// Every failing rule is reported, so a field may carry several
    /// messages. Password rules apply on create, and on edit only when a new
    /// password was typed.
    pub fn check(&self, mode: FormMode) -> Result<(), ValidationErrors> {
        let form = self.normalized();
        let mut errors = match form.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if form.name.is_empty() {
            add(&mut errors, "name", "required", "Name is required.");
        }

        if form.email.is_empty() {
            add(&mut errors, "email", "required", "Email is required.");
        } else if !form.email.validate_email() {
            add(&mut errors, "email", "email", "Email is invalid.");
        }

        if form.phone_number.is_empty() {
            add(&mut errors, "phone_number", "required", "Phone number is required.");
        } else if !is_valid_phone(&form.phone_number) {
            add(&mut errors, "phone_number", "phone", "Phone number is invalid.");
        }

        if form.role.is_empty() {
            add(&mut errors, "role", "required", "Role is required.");
        } else if form.parsed_role().is_none() {
            add(&mut errors, "role", "role", "Role is invalid.");
        }

        if mode == FormMode::Create || !form.password.is_empty() {
            check_password(&form, &mut errors);
        }

        if errors.field_errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_password(form: &UserForm, errors: &mut ValidationErrors) {
    let password = &form.password;
    if password.is_empty() {
        add(errors, "password", "required", "Password is required.");
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        add(
            errors,
            "password",
            "min_length",
            "Password must be at least 8 characters long.",
        );
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        add(
            errors,
            "password",
            "lowercase",
            "Password must contain at least one lowercase letter.",
        );
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        add(
            errors,
            "password",
            "digit",
            "Password must contain at least one number.",
        );
    }
    if *password != form.password_confirmation {
        add(
            errors,
            "password_confirmation",
            "confirmed",
            "Passwords don't match.",
        );
    }
}

fn add(errors: &mut ValidationErrors, field: &'static str, code: &'static str, message: &'static str) {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    errors.add(field, error);
}
