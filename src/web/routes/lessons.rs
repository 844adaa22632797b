use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceType, ResourceTyped, check_access,
        entity::{Course, Enrollment, Lesson, LessonCompletion, LessonWithCompletionsRow},
    },
    web::{
        AppState, AuthenticatedUser, Payload, Policy, RequestContext, WebError, WebResult,
        dto::lessons::{LessonCreateBody, LessonListQuery, LessonResponse, LessonUpdateBody},
        error::ErrorResponse,
        middlewares,
        routes::{
            PaginationQuery,
            courses::{find_course, find_visible_course},
        },
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(lessons_list_handler).post(lessons_create_handler))
        .route(
            "/{id}",
            get(lessons_get_handler)
                .put(lessons_update_handler)
                .patch(lessons_update_handler)
                .delete(lessons_delete_handler),
        )
        .route("/{id}/complete", post(lessons_complete_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn find_lesson(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<Lesson> {
    Lesson::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Lesson::get_resource_type()))
}

/// Lesson together with its completion records.
async fn lesson_response(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<LessonResponse> {
    let row = LessonWithCompletionsRow::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Lesson::get_resource_type()))?;

    LessonResponse::try_from(row)
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e.into()))
}

/// Staff member who owns the lesson's course (or an admin).
async fn find_owned_lesson(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Lesson> {
    let lesson = find_lesson(state, user, id).await?;
    check_access(state.pool(), user, &lesson, user.user_id())
        .await
        .map_err(|e| WebError::resource_access_error(Lesson::get_resource_type(), e))?;
    Ok(lesson)
}

#[utoipa::path(
    post,
    path = "/api/lessons",
    request_body = LessonCreateBody,
    description = "Adds a lesson to a course owned by the requester",
    responses(
        (status = 201, description = "Lesson created", body = LessonResponse),
        (status = 400, description = "Missing field or unknown course", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not allowed to author lessons for this course", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "lessons"
)]
pub(crate) async fn lessons_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Payload(payload): Payload<LessonCreateBody>,
) -> WebResult<impl IntoResponse> {
    let created = create_lesson(&state, &ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Staff member owning the target course adds a lesson to it. A `course` that
/// does not resolve is a validation error, not a 404.
pub(crate) async fn create_lesson(
    state: &AppState,
    ctx: &RequestContext,
    payload: LessonCreateBody,
) -> WebResult<LessonResponse> {
    let user = Policy::Staff.authorize(ctx, ResourceType::Lesson)?;
    let data = payload.validate()?;

    let course = Course::find_by_id(state.pool(), user, data.course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::validation_invalid("course", "does not name an existing course"))?;

    check_access(state.pool(), user, &course, user.user_id())
        .await
        .map_err(|e| WebError::resource_access_error(Lesson::get_resource_type(), e))?;

    let created = Lesson::create(state.pool(), user, data)
        .await
        .map_err(|e| {
            // course removed between the check and the insert
            if e.is_foreign_key_violation() {
                WebError::validation_invalid("course", "does not name an existing course")
            } else {
                WebError::resource_fetch_error(Lesson::get_resource_type(), e)
            }
        })?;

    tracing::info!("lesson {} added to course {}", created.id(), created.course_id());
    Ok(LessonResponse::from_lesson(created, Vec::new()))
}

#[utoipa::path(
    get,
    path = "/api/lessons",
    description = "Every lesson of one course, or a page of lessons across courses for staff when `course` is omitted",
    params(LessonListQuery),
    responses(
        (status = 200, description = "Lessons in display order", body = Vec<LessonResponse>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Course is not published", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "lessons"
)]
pub(crate) async fn lessons_list_handler(
    State(state): State<AppState>,
    Query(query): Query<LessonListQuery>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let system = AuthenticatedUser::admin();
    let rows = match query.course {
        Some(id) => {
            let course = find_visible_course(&state, &ctx, id).await?;
            LessonWithCompletionsRow::fetch_for_course(state.pool(), &system, course.id()).await
        }
        // a cross-course listing would include drafts
        None => {
            Policy::Staff.authorize(&ctx, ResourceType::Lesson)?;
            let page = PaginationQuery::new(query.limit, query.offset);
            LessonWithCompletionsRow::fetch_page(state.pool(), &system, page.limit(), page.offset())
                .await
        }
    }
    .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    let lessons = LessonResponse::from_rows(rows)
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e.into()))?;

    Ok((StatusCode::OK, Json(lessons)))
}

#[utoipa::path(
    get,
    path = "/api/lessons/{lesson_id}",
    description = "Fetch comprehensive info about lesson including its content",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to get")
    ),
    responses(
        (status = 200, description = "Lesson found", body = LessonResponse),
        (status = 403, description = "Lesson belongs to an unpublished course", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "lessons"
)]
pub(crate) async fn lessons_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let system = AuthenticatedUser::admin();
    let lesson = lesson_response(&state, &system, id).await?;
    find_visible_course(&state, &ctx, lesson.course).await?;

    Ok((StatusCode::OK, Json(lesson)))
}

#[utoipa::path(
    put,
    path = "/api/lessons/{lesson_id}",
    request_body = LessonUpdateBody,
    description = "Partial update, absent fields are kept. Also served on PATCH",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to update")
    ),
    responses(
        (status = 200, description = "Lesson updated", body = LessonResponse),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not the owner of this lesson", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "lessons"
)]
pub(crate) async fn lessons_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Payload(payload): Payload<LessonUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = Policy::Staff.authorize(&ctx, ResourceType::Lesson)?;
    let data = payload.validate()?;
    let lesson = find_owned_lesson(&state, user, id).await?;

    lesson
        .update(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    let updated = lesson_response(&state, user, id).await?;
    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/lessons/{lesson_id}",
    description = "Deletes a lesson and its completion records",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to delete")
    ),
    responses(
        (status = 200, description = "Lesson deleted"),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not the owner of this lesson", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "lessons"
)]
pub(crate) async fn lessons_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = Policy::Staff.authorize(&ctx, ResourceType::Lesson)?;
    let lesson = find_owned_lesson(&state, user, id).await?;

    lesson
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    tracing::info!("lesson {} deleted by {}", id, user.user_id());
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/lessons/{lesson_id}/complete",
    description = "Mark lesson as completed by the requester. Repeated calls keep the first record",
    params(
        ("lesson_id" = Uuid, Path, description = "ID of the lesson to mark")
    ),
    responses(
        (status = 200, description = "Lesson marked", body = LessonResponse),
        (status = 400, description = "Requester is not enrolled in the course", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Lesson belongs to an unpublished course", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "lessons"
)]
pub(crate) async fn lessons_complete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = Policy::Authenticated.authorize(&ctx, ResourceType::LessonCompletion)?;
    let lesson = find_lesson(&state, user, id).await?;
    let course = find_course(&state, user, lesson.course_id()).await?;
    if !course.is_visible_to(Some(user)) {
        return Err(WebError::resource_forbidden(Course::get_resource_type()));
    }

    let enrolled = Enrollment::exists(state.pool(), user, user.user_id(), course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;
    if !enrolled {
        return Err(WebError::validation_invalid("lesson", "belongs to a course you are not enrolled in"));
    }

    let record = LessonCompletion::mark(state.pool(), user, lesson.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(LessonCompletion::get_resource_type(), e))?;
    tracing::debug!("lesson {} completed by {} at {}", id, user.user_id(), record.completed_at());

    let response = lesson_response(&state, user, id).await?;
    Ok((StatusCode::OK, Json(response)))
}
