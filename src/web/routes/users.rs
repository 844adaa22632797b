use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    auth::hash_password,
    model::{
        CrudRepository, ResourceType, ResourceTyped, check_access,
        entity::{LessonCompletion, UserEnrollmentRow, UserEntity, UserEntityUpdate},
    },
    web::{
        AppState, AuthenticatedUser, Payload, Policy, RequestContext, WebError, WebResult,
        dto::{
            courses::EnrolledCourseResponse,
            users::{ProgressResponse, UserUpdateBody},
        },
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}",
            get(users_get_handler)
                .put(users_update_handler)
                .patch(users_update_handler)
                .delete(users_delete_handler),
        )
        .route("/{id}/enrollments", get(users_enrollments_handler))
        .route("/{id}/progress", get(users_progress_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

pub(crate) async fn find_user(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<UserEntity> {
    UserEntity::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(UserEntity::get_resource_type()))
}

/// The requester themselves, or anyone for an admin.
async fn find_self_or_admin(ctx: &RequestContext, state: &AppState, id: Uuid) -> WebResult<UserEntity> {
    let user = Policy::Authenticated.authorize(ctx, ResourceType::User)?;
    let found = find_user(state, user, id).await?;
    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::resource_access_error(UserEntity::get_resource_type(), e))?;
    Ok(found)
}

/// Deletes `target`; an author of courses can not be removed until those are.
pub(crate) async fn delete_user(
    state: &AppState,
    actor: &AuthenticatedUser,
    target: UserEntity,
) -> WebResult<()> {
    let id = target.id();
    target.delete(state.pool(), actor).await.map_err(|e| {
        if e.is_foreign_key_violation() {
            WebError::resource_conflict(UserEntity::get_resource_type(), "user still owns courses")
        } else {
            WebError::resource_fetch_error(UserEntity::get_resource_type(), e)
        }
    })?;

    tracing::info!("user {} deleted by {}", id, actor.user_id());
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "User found", body = UserEntity),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not your account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "users"
)]
pub(crate) async fn users_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let found = find_self_or_admin(&ctx, &state, id).await?;
    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    request_body = UserUpdateBody,
    description = "Changes username, email or password. Also served on PATCH",
    params(
        ("user_id" = Uuid, Path, description = "ID of the user to update")
    ),
    responses(
        (status = 200, description = "User updated", body = UserEntity),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not your account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "users"
)]
pub(crate) async fn users_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Payload(payload): Payload<UserUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let update = payload.validate()?;
    let found = find_self_or_admin(&ctx, &state, id).await?;
    let system = AuthenticatedUser::admin();

    if let Some(username) = &update.username {
        let taken = UserEntity::find_by_username(state.pool(), &system, username)
            .await
            .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
        if taken.is_some_and(|other| other.id() != id) {
            return Err(WebError::registration_conflict());
        }
    }

    if let Some(email) = &update.email {
        let taken = UserEntity::find_by_email(state.pool(), &system, email)
            .await
            .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
        if taken.is_some_and(|other| other.id() != id) {
            return Err(WebError::registration_email_conflict());
        }
    }

    let password_hash = update
        .password
        .as_deref()
        .map(hash_password)
        .transpose()
        .map_err(WebError::server_crypt_error)?;

    let data = UserEntityUpdate {
        username: update.username,
        email: update.email,
        password_hash,
        role: None,
    };

    let updated = found
        .update(state.pool(), &system, data)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                WebError::registration_conflict()
            } else {
                WebError::resource_fetch_error(UserEntity::get_resource_type(), e)
            }
        })?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    description = "Deletes an account with its enrollments and completion records",
    params(
        ("user_id" = Uuid, Path, description = "ID of the user to delete")
    ),
    responses(
        (status = 200, description = "User deleted"),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not your account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "User still owns courses", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "users"
)]
pub(crate) async fn users_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let found = find_self_or_admin(&ctx, &state, id).await?;
    let user = ctx.user()?;
    delete_user(&state, user, found).await?;
    Ok(StatusCode::OK)
}

async fn enrolled_courses(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Vec<EnrolledCourseResponse>> {
    let courses = UserEnrollmentRow::fetch_for_user(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Enrollment, e))?
        .into_iter()
        .map(EnrolledCourseResponse::from)
        .collect();
    Ok(courses)
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/enrollments",
    params(
        ("user_id" = Uuid, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "Enrolled courses with progress", body = Vec<EnrolledCourseResponse>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not your account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "users"
)]
pub(crate) async fn users_enrollments_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let found = find_self_or_admin(&ctx, &state, id).await?;
    let courses = enrolled_courses(&state, ctx.user()?, found.id()).await?;
    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/progress",
    params(
        ("user_id" = Uuid, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "Learning progress", body = ProgressResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not your account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "users"
)]
pub(crate) async fn users_progress_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let found = find_self_or_admin(&ctx, &state, id).await?;
    let user = ctx.user()?;

    let courses = enrolled_courses(&state, user, found.id()).await?;
    let completions = LessonCompletion::all_by_user(state.pool(), user, found.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(LessonCompletion::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(ProgressResponse {
            user: found.id(),
            courses_enrolled: courses.len(),
            lessons_completed: completions.len(),
            courses,
        }),
    ))
}
