use super::{UserRole, UserStatus};

#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub password_hash: String,
}
