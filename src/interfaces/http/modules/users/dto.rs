//! User request/response DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::domain::UserRecord;
use crate::shared::{FormMode, Page, UserForm};

/// Create user request: every field required, password rules enforced
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CreateUserRequest(pub UserForm);

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.0.check(FormMode::Create)
    }
}

/// Update user request: an empty password keeps the current one
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UpdateUserRequest(pub UserForm);

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.0.check(FormMode::Edit)
    }
}

/// Paginated user list payload
pub type UserPage = Page<UserRecord>;
