//! HTTP REST API
//!
//! - `common`: response envelope, error mapping, validated extractors
//! - `modules`: per-resource handlers and middleware
//! - `router`: route table, OpenAPI document and Swagger UI

pub mod common;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, AppState};
