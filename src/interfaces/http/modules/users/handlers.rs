//! User management API handlers
//!
//! Thin wrappers that delegate to `UserService`.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{CreateUserRequest, UpdateUserRequest, UserPage};
use crate::application::UserService;
use crate::domain::{DomainError, UserRecord};
use crate::infrastructure::database::repositories::UserRepository;
use crate::interfaces::http::common::{ApiResponse, ApiResult, ValidatedJson};
use crate::shared::{ListLimits, ListParams, Page};

/// User handler state, concrete over `UserRepository` for Axum compatibility
#[derive(Clone)]
pub struct UserHandlerState {
    pub user_service: Arc<UserService<UserRepository>>,
    pub limits: ListLimits,
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(ListParams),
    responses(
        (status = 200, description = "One page of users", body = Page<UserRecord>),
        (status = 422, description = "Unknown sort/filter column or bad direction", body = ApiResponse<String>)
    )
)]
pub async fn list_users(
    State(state): State<UserHandlerState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<UserPage>> {
    let query = params.resolve(state.limits).map_err(DomainError::Validation)?;

    let page = state
        .user_service
        .list_users(&query)
        .await?
        .map(UserRecord::from)
        .with_links(uri.path(), uri.query());

    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = ApiResponse<UserRecord>),
        (status = 404, description = "Not found", body = ApiResponse<String>)
    )
)]
pub async fn get_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<UserRecord>>> {
    let user = state.user_service.get_user(id).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserRecord>),
        (status = 400, description = "Malformed body"),
        (status = 422, description = "Validation failed", body = ApiResponse<String>)
    )
)]
pub async fn create_user(
    State(state): State<UserHandlerState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserRecord>>)> {
    let user = state.user_service.create_user(request.0).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserRecord>),
        (status = 404, description = "Not found", body = ApiResponse<String>),
        (status = 422, description = "Validation failed", body = ApiResponse<String>)
    )
)]
pub async fn update_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<UserRecord>>> {
    let user = state.user_service.update_user(id, request.0).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<String>),
        (status = 404, description = "Not found", body = ApiResponse<String>)
    )
)]
pub async fn delete_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.user_service.delete_user(id).await?;
    Ok(Json(ApiResponse::message("User deleted.")))
}
