use super::UserRole;

/// Full replacement of the editable fields; the password hash only changes
/// when a new one is given.
#[derive(Debug, Clone)]
pub struct UpdateUserDto {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: UserRole,
    pub password_hash: Option<String>,
}
