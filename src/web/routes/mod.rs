use std::path::Path;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::{Deserialize, Serialize};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    APPLICATION_NAME,
    web::{AppState, doc::ApiDoc},
};

pub mod admin;
pub mod auth;
pub mod courses;
pub mod lessons;
pub mod users;

const DEFAULT_PAGE_LIMIT: i64 = 50;
const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Page size, 50 by default, at most 100
    limit: Option<i64>,
    /// Number of items to skip
    offset: Option<i64>,
}

impl PaginationQuery {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self { limit, offset }
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
}

#[utoipa::path(
    get,
    path = "/health",
    description = "Liveness probe, also pings the database",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database is unreachable", body = HealthResponse),
    ),
    tag = "health"
)]
pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let database_up = state.pool().connection().ping().await;
    let (status_code, status, database) = if database_up {
        (StatusCode::OK, "ok", "up")
    } else {
        tracing::warn!("health check: database is not answering");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "down")
    };

    let body = HealthResponse {
        status: status.to_string(),
        service: APPLICATION_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    };
    (status_code, Json(body))
}

pub fn build_app(state: AppState) -> Router {
    let config = state.config();
    let docs = config.app().docs();
    let spa_dir = config
        .app()
        .is_production()
        .then(|| config.app().static_dir().to_string());

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api/auth", auth::routes(state.clone()))
        .nest("/api/courses", courses::routes(state.clone()))
        .nest("/api/lessons", lessons::routes(state.clone()))
        .nest("/api/users", users::routes(state.clone()))
        .nest("/api/admin", admin::routes(state.clone()));

    if docs {
        router = router.merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));
    }

    if let Some(dir) = spa_dir {
        tracing::info!("serving front-end bundle from {}", dir);
        let index = Path::new(&dir).join("index.html");
        router = router.fallback_service(ServeDir::new(&dir).fallback(ServeFile::new(index)));
    }

    router
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
