//! # User Admin
//!
//! User management service: a paginated, sortable, filterable user list
//! plus create/edit/delete with field-level validation.
//!
//! ## Architecture
//!
//! - **domain**: the user aggregate, repository port and domain errors
//! - **application**: `UserService`, the use-case layer
//! - **infrastructure**: sea-orm persistence, migrations, password hashing
//! - **interfaces**: axum REST API with Swagger documentation
//! - **client**: list-state synchronization and dialog state machine
//! - **shared**: list query protocol, pagination, validation, shutdown

pub mod application;
pub mod client;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{default_config_path, resolve_config_path, AppConfig};

pub use infrastructure::{init_database, DatabaseConfig};

pub use interfaces::http::{create_api_router, AppState};
