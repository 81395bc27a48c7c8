//! User management use-cases
//!
//! `UserService` orchestrates listing, creation, updates, deletion and the
//! initial admin seed.

pub mod service;

pub use service::UserService;
