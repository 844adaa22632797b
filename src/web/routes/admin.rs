use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, Page, PaginatableRepository, ResourceType, ResourceTyped,
        entity::{PlatformStats, UserEntity, UserEntityUpdate},
    },
    web::{
        AppState, Payload, RequestContext, UserRole, WebError, WebResult,
        dto::admin::RoleUpdateBody,
        error::ErrorResponse,
        middlewares,
        routes::{
            PaginationQuery,
            users::{delete_user, find_user},
        },
    },
};

/// Every route here sits behind [`middlewares::require_admin_fn`].
pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/users", get(admin_users_list_handler))
        .route("/users/{id}", delete(admin_users_delete_handler))
        .route("/users/{id}/role", put(admin_users_role_handler))
        .route("/stats", get(admin_stats_handler))
        .route_layer(middleware::from_fn(middlewares::require_admin_fn))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    description = "Lists users page by page",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of users", body = Page<UserEntity>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "admin"
)]
pub(crate) async fn admin_users_list_handler(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let page = UserEntity::page(state.pool(), user, query.limit(), query.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(page)))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{user_id}/role",
    request_body = RoleUpdateBody,
    description = "Changes the role of a user",
    params(
        ("user_id" = Uuid, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "Role changed", body = UserEntity),
        (status = 400, description = "Unknown role, or an admin demoting themselves", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "admin"
)]
pub(crate) async fn admin_users_role_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Payload(payload): Payload<RoleUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let role = payload.validate()?;

    // keeps at least the acting admin around
    if id == user.user_id() && role != UserRole::Admin {
        return Err(WebError::validation_invalid("role", "can not be lowered on your own account"));
    }

    let found = find_user(&state, user, id).await?;
    let previous = found.role();
    let updated = found
        .update(
            state.pool(),
            user,
            UserEntityUpdate {
                role: Some(role),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    tracing::info!("user {} role changed: {} -> {}", id, previous, role);
    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{user_id}",
    description = "Removes a user",
    params(
        ("user_id" = Uuid, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "User deleted"),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "User still owns courses", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "admin"
)]
pub(crate) async fn admin_users_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = find_user(&state, user, id).await?;
    delete_user(&state, user, found).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    description = "Platform-wide counters",
    responses(
        (status = 200, description = "Statistics", body = PlatformStats),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "admin"
)]
pub(crate) async fn admin_stats_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let stats = PlatformStats::collect(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Stats, e))?;

    Ok((StatusCode::OK, Json(stats)))
}
