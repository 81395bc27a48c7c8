//! User management service
//!
//! All user-related business rules live here; HTTP handlers are thin
//! wrappers that delegate to this service.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AdminConfig;
use crate::domain::{
    CreateUserDto, DomainError, DomainResult, GetUserDto, UpdateUserDto, User,
    UserRepositoryInterface, UserRole, UserStatus,
};
use crate::infrastructure::crypto::password::hash_password_blocking;
use crate::shared::validations::to_field_errors;
use crate::shared::{FormMode, ListQuery, Page, UserForm};

/// Generic over `R: UserRepositoryInterface` so it stays decoupled from
/// the concrete persistence layer.
pub struct UserService<R: UserRepositoryInterface> {
    repo: Arc<R>,
}

impl<R: UserRepositoryInterface> UserService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    // ── Queries ─────────────────────────────────────────────────

    /// One page of users matching the query's filter, in its sort order.
    pub async fn list_users(&self, query: &ListQuery) -> DomainResult<Page<User>> {
        let dto = GetUserDto::from_query(query)?;
        self.repo.list_users(dto).await
    }

    pub async fn get_user(&self, id: i32) -> DomainResult<User> {
        self.repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    // ── Commands ────────────────────────────────────────────────

    pub async fn create_user(&self, form: UserForm) -> DomainResult<User> {
        let form = validated(form, FormMode::Create)?;

        if self.repo.get_user_by_email(&form.email).await?.is_some() {
            return Err(email_taken());
        }

        let role = parsed_role(&form)?;
        let password_hash = hash_password_blocking(form.password.clone()).await?;

        let user = self
            .repo
            .create_user(CreateUserDto {
                name: form.name,
                email: form.email,
                phone_number: form.phone_number,
                role,
                status: UserStatus::Active,
                password_hash,
            })
            .await?;

        metrics::counter!("user_mutations_total", "action" => "create").increment(1);
        info!(user_id = user.id, email = %user.email, "User created");
        Ok(user)
    }

    /// Update profile fields; the password only changes when one was typed.
    pub async fn update_user(&self, id: i32, form: UserForm) -> DomainResult<User> {
        let form = validated(form, FormMode::Edit)?;

        if self.repo.get_user_by_id(id).await?.is_none() {
            return Err(not_found(id));
        }

        if let Some(owner) = self.repo.get_user_by_email(&form.email).await? {
            if owner.id != id {
                return Err(email_taken());
            }
        }

        let role = parsed_role(&form)?;
        let password_hash = match form.new_password() {
            Some(password) => Some(hash_password_blocking(password.to_string()).await?),
            None => None,
        };

        let user = self
            .repo
            .update_user(
                id,
                UpdateUserDto {
                    name: form.name,
                    email: form.email,
                    phone_number: form.phone_number,
                    role,
                    password_hash,
                },
            )
            .await?
            .ok_or_else(|| not_found(id))?;

        metrics::counter!("user_mutations_total", "action" => "update").increment(1);
        info!(user_id = user.id, "User updated");
        Ok(user)
    }

    pub async fn delete_user(&self, id: i32) -> DomainResult<()> {
        self.repo.delete_user(id).await?;

        metrics::counter!("user_mutations_total", "action" => "delete").increment(1);
        info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Create the configured superadmin when no users exist yet.
    ///
    /// Returns the created account, or `None` if the table was not empty.
    pub async fn seed_admin(&self, admin: &AdminConfig) -> DomainResult<Option<User>> {
        if self.repo.count_users().await? > 0 {
            return Ok(None);
        }

        info!("Creating default admin user...");
        let form = UserForm {
            name: admin.name.clone(),
            email: admin.email.clone(),
            phone_number: admin.phone_number.clone(),
            role: UserRole::Superadmin.as_str().to_string(),
            password: admin.password.clone(),
            password_confirmation: admin.password.clone(),
        };

        let user = self.create_user(form).await?;
        warn!(email = %user.email, "Default admin created, change its password");
        Ok(Some(user))
    }
}

fn validated(form: UserForm, mode: FormMode) -> DomainResult<UserForm> {
    let form = form.normalized();
    form.check(mode)
        .map_err(|errors| DomainError::Validation(to_field_errors(&errors)))?;
    Ok(form)
}

fn parsed_role(form: &UserForm) -> DomainResult<UserRole> {
    form.parsed_role()
        .ok_or_else(|| DomainError::validation("role", "Role is invalid."))
}

fn not_found(id: i32) -> DomainError {
    DomainError::NotFound {
        entity: "User",
        field: "id",
        value: id.to_string(),
    }
}

fn email_taken() -> DomainError {
    DomainError::Conflict {
        field: "email",
        message: "The email has already been taken.".to_string(),
    }
}
