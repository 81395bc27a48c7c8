//! Application layer: use-case orchestration over the domain

pub mod users;

pub use users::UserService;
