//! User aggregate
//!
//! Contains the User entity, its read model, DTOs, and repository interface.

pub mod model;
pub mod record;
pub mod repository;

mod dto_create;
mod dto_get;
mod dto_update;

// Re-export model types
pub use model::{User, UserRole, UserStatus};
pub use record::UserRecord;

// Re-export DTOs
pub use dto_create::CreateUserDto;
pub use dto_get::{GetUserDto, UserColumn, UserFilter};
pub use dto_update::UpdateUserDto;

// Re-export repository trait
pub use repository::UserRepositoryInterface;
