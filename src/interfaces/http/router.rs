//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::FromRef, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::modules::health::{self, HealthState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::request_id::request_id_middleware;
use super::modules::users::{self, UserHandlerState};
use crate::application::UserService;
use crate::domain::{UserRecord, UserRole, UserStatus};
use crate::infrastructure::database::repositories::UserRepository;
use crate::interfaces::http::common::ApiResponse;
use crate::shared::{ListLimits, PaginationLink, SortDirection, UserForm};

/// Unified router state; each handler extracts its own slice via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService<UserRepository>>,
    pub db: DatabaseConnection,
    pub limits: ListLimits,
    pub started_at: Arc<Instant>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, limits: ListLimits) -> Self {
        let repo = Arc::new(UserRepository::new(db.clone()));
        Self {
            user_service: Arc::new(UserService::new(repo)),
            db,
            limits,
            started_at: Arc::new(Instant::now()),
        }
    }
}

impl FromRef<AppState> for UserHandlerState {
    fn from_ref(s: &AppState) -> Self {
        UserHandlerState {
            user_service: Arc::clone(&s.user_service),
            limits: s.limits,
        }
    }
}

impl FromRef<AppState> for HealthState {
    fn from_ref(s: &AppState) -> Self {
        HealthState {
            db: s.db.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
    ),
    components(
        schemas(
            ApiResponse<String>,
            ApiResponse<UserRecord>,
            UserRecord,
            UserRole,
            UserStatus,
            UserForm,
            PaginationLink,
            SortDirection,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            health::HealthResponse,
            health::DatabaseHealth,
        )
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Users", description = "User listing (paginated, sortable, filterable) and CRUD"),
    ),
    info(
        title = "User Admin API",
        version = "1.0.0",
        description = "User management REST API",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the full HTTP application.
///
/// `/metrics` is only mounted when a Prometheus recorder was installed.
pub fn create_api_router(state: AppState, prometheus: Option<PrometheusHandle>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/api/v1/users",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/api/v1/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/health", get(health::health_check))
        .route_layer(middleware::from_fn(http_metrics_middleware))
        .with_state(state);

    let mut router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(api_routes);

    if let Some(handle) = prometheus {
        router = router.merge(
            Router::new()
                .route("/metrics", get(prometheus_metrics))
                .with_state(MetricsState { handle }),
        );
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{CreateUserDto, UserRepositoryInterface};
    use crate::infrastructure::database::memory_database;

    async fn app() -> (Router, AppState) {
        let db = memory_database().await.unwrap();
        let state = AppState::new(db, ListLimits::default());
        (create_api_router(state.clone(), None), state)
    }

    /// Insert users straight through the repository, skipping bcrypt.
    async fn seed(state: &AppState, count: usize) {
        let repo = UserRepository::new(state.db.clone());
        for n in 1..=count {
            repo.create_user(CreateUserDto {
                name: format!("User {:02}", n),
                email: format!("user{:02}@example.com", n),
                phone_number: format!("+62812000{:04}", n),
                role: UserRole::Cashier,
                status: UserStatus::Active,
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn new_user(email: &str) -> Value {
        json!({
            "name": "Jane Doe",
            "email": email,
            "phone_number": "+1 650 253 0000",
            "role": "manager",
            "password": "secret123",
            "password_confirmation": "secret123"
        })
    }

    #[tokio::test]
    async fn list_defaults_to_first_page_of_ten() {
        let (app, state) = app().await;
        seed(&state, 12).await;

        let (status, body) = send(&app, get("/api/v1/users")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 10);
        assert_eq!(body["total"], 12);
        assert_eq!(body["per_page"], 10);
        assert_eq!(body["current_page"], 1);
        assert_eq!(body["last_page"], 2);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty_not_clamped() {
        let (app, state) = app().await;
        seed(&state, 25).await;

        let (_, page3) = send(&app, get("/api/v1/users?page=3&per_page=10")).await;
        assert_eq!(page3["data"].as_array().unwrap().len(), 5);

        let (status, page4) = send(&app, get("/api/v1/users?page=4&per_page=10")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(page4["data"].as_array().unwrap().is_empty());
        assert_eq!(page4["current_page"], 4);
        assert_eq!(page4["last_page"], 3);
        assert_eq!(page4["total"], 25);
    }

    #[tokio::test]
    async fn links_keep_unrelated_params() {
        let (app, state) = app().await;
        seed(&state, 25).await;

        let (_, body) = send(&app, get("/api/v1/users?tab=team&sort=name&direction=asc")).await;
        let next = body["links"].as_array().unwrap().last().unwrap().clone();
        assert_eq!(next["label"], "Next »");
        assert_eq!(
            next["url"],
            "/api/v1/users?tab=team&sort=name&direction=asc&page=2"
        );
    }

    #[tokio::test]
    async fn sort_and_filter_apply() {
        let (app, state) = app().await;
        seed(&state, 12).await;

        let (_, body) = send(
            &app,
            get("/api/v1/users?sort=email&direction=desc&filter=name&filter_value=user%201"),
        )
        .await;
        let emails: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["email"].as_str().unwrap())
            .collect();
        assert_eq!(
            emails,
            vec!["user12@example.com", "user11@example.com", "user10@example.com"]
        );
    }

    #[tokio::test]
    async fn unknown_sort_column_is_422() {
        let (app, _) = app().await;
        let (status, body) = send(&app, get("/api/v1/users?sort=password_hash")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert!(body["errors"]["sort"].is_array());
    }

    #[tokio::test]
    async fn bad_direction_is_422() {
        let (app, _) = app().await;
        let (status, body) = send(&app, get("/api/v1/users?sort=name&direction=up")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["direction"][0], "The direction must be asc or desc.");
    }

    #[tokio::test]
    async fn create_then_fetch() {
        let (app, _) = app().await;

        let (status, body) =
            send(&app, json_request("POST", "/api/v1/users", new_user("jane@example.com"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert!(body["data"].get("password_hash").is_none());

        let id = body["data"]["id"].as_i64().unwrap();
        let (status, body) = send(&app, get(&format!("/api/v1/users/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "jane@example.com");
        assert_eq!(body["data"]["status"], "active");
    }

    #[tokio::test]
    async fn create_with_invalid_fields_is_422() {
        let (app, _) = app().await;
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/users",
                json!({"email": "nope", "password": "short", "password_confirmation": "other"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let errors = &body["errors"];
        assert_eq!(errors["name"][0], "Name is required.");
        assert_eq!(errors["email"][0], "Email is invalid.");
        assert_eq!(errors["role"][0], "Role is required.");
        assert_eq!(errors["password_confirmation"][0], "Passwords don't match.");
    }

    #[tokio::test]
    async fn duplicate_email_is_422_on_email() {
        let (app, _) = app().await;
        send(&app, json_request("POST", "/api/v1/users", new_user("jane@example.com"))).await;

        let (status, body) =
            send(&app, json_request("POST", "/api/v1/users", new_user("jane@example.com"))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["email"][0], "The email has already been taken.");
    }

    #[tokio::test]
    async fn update_and_delete() {
        let (app, state) = app().await;
        seed(&state, 1).await;

        let (status, body) = send(
            &app,
            json_request(
                "PUT",
                "/api/v1/users/1",
                json!({
                    "name": "Renamed",
                    "email": "user01@example.com",
                    "phone_number": "+1 650 253 0001",
                    "role": "admin"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Renamed");
        assert_eq!(body["data"]["role"], "admin");

        let delete = Request::builder()
            .method("DELETE")
            .uri("/api/v1/users/1")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, delete).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, get("/api/v1/users/1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (app, _) = app().await;
        let req = Request::builder()
            .uri("/health")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn metrics_endpoint_reports_requests_by_route() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        // Current-thread runtime: every handler below runs on this thread.
        let _guard = metrics::set_default_local_recorder(&recorder);

        let db = memory_database().await.unwrap();
        let app = create_api_router(AppState::new(db, ListLimits::default()), Some(handle));

        let (status, _) = send(&app, get("/api/v1/users")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, json_request("POST", "/api/v1/users", new_user("m@example.com"))).await;
        assert_eq!(status, StatusCode::CREATED);

        let resp = app.clone().oneshot(get("/metrics")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();

        let requests = text
            .lines()
            .filter(|line| line.starts_with("http_requests_total{"))
            .collect::<Vec<_>>();
        assert!(requests.iter().any(|line| {
            line.contains(r#"method="GET""#)
                && line.contains(r#"route="/api/v1/users""#)
                && line.contains(r#"status="200""#)
        }));
        assert!(requests
            .iter()
            .any(|line| line.contains(r#"method="POST""#) && line.contains(r#"status="201""#)));
        assert!(text.contains("http_request_duration_seconds"));
        assert!(text
            .lines()
            .any(|line| line.starts_with("user_mutations_total{") && line.contains(r#"action="create""#)));
    }

    #[tokio::test]
    async fn metrics_route_absent_without_recorder() {
        let (app, _) = app().await;
        let (status, _) = send(&app, get("/metrics")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn openapi_lists_user_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/users"));
        assert!(doc.paths.paths.contains_key("/api/v1/users/{id}"));
    }
}
