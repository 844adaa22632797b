use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceType, ResourceTyped, check_access,
        entity::{
            Course, CourseEnrollmentRow, CourseWithCreatorRow, Enrollment,
            LessonWithCompletionsRow, UserEnrollmentRow,
        },
    },
    web::{
        AppState, AuthenticatedUser, Payload, Policy, RequestContext, WebError, WebResult,
        dto::{
            courses::{
                CourseCreateBody, CourseEnrollmentResponse, CourseUpdateBody,
                EnrolledCourseResponse, MyCoursesResponse,
            },
            lessons::{LessonCreateBody, LessonResponse},
        },
        error::ErrorResponse,
        middlewares,
        routes::lessons::create_lesson,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(courses_list_handler).post(courses_create_handler))
        .route("/my", get(courses_my_handler))
        .route(
            "/{id}",
            get(courses_get_handler)
                .put(courses_update_handler)
                .patch(courses_update_handler)
                .delete(courses_delete_handler),
        )
        .route(
            "/{id}/lessons",
            get(courses_lessons_handler).post(courses_add_lesson_handler),
        )
        .route("/{id}/enroll", post(courses_enroll_handler))
        .route("/{id}/enrollments", get(courses_enrollments_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Loads a course or fails with 404.
pub(crate) async fn find_course(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Course> {
    Course::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))
}

/// Loads a course the requester may see: 404 when absent, 403 for drafts of
/// other authors.
pub(crate) async fn find_visible_course(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
) -> WebResult<Course> {
    let course = find_course(state, &AuthenticatedUser::admin(), id).await?;
    if !course.is_visible_to(ctx.maybe_user()) {
        return Err(WebError::resource_forbidden(Course::get_resource_type()));
    }
    Ok(course)
}

/// Staff member who owns `id` (or an admin).
async fn find_owned_course(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Course> {
    let course = find_course(state, user, id).await?;
    check_access(state.pool(), user, &course, user.user_id())
        .await
        .map_err(|e| WebError::resource_access_error(Course::get_resource_type(), e))?;
    Ok(course)
}

#[utoipa::path(
    get,
    path = "/api/courses",
    description = "Published courses with their creator and lesson count",
    responses(
        (status = 200, description = "Course catalogue", body = Vec<CourseWithCreatorRow>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub(crate) async fn courses_list_handler(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    let courses = CourseWithCreatorRow::fetch_published(state.pool(), &AuthenticatedUser::admin())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    get,
    path = "/api/courses/my",
    description = "Courses created by the requester (staff) or the requester's enrollments (students)",
    responses(
        (status = 200, description = "Requester's courses", body = MyCoursesResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn courses_my_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = Policy::Authenticated.authorize(&ctx, ResourceType::Course)?;

    let mut response = MyCoursesResponse::default();
    if user.user_role().is_staff() {
        response.created = Course::all_by_creator(state.pool(), user, user.user_id())
            .await
            .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    } else {
        response.enrolled = UserEnrollmentRow::fetch_for_user(state.pool(), user, user.user_id())
            .await
            .map_err(|e| WebError::resource_fetch_error(ResourceType::Enrollment, e))?
            .into_iter()
            .map(EnrolledCourseResponse::from)
            .collect();
    }

    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CourseCreateBody,
    description = "Creates a course owned by the requester",
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Only teachers and admins can create courses", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn courses_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Payload(payload): Payload<CourseCreateBody>,
) -> WebResult<impl IntoResponse> {
    let user = Policy::Staff.authorize(&ctx, ResourceType::Course)?;
    let data = payload.validate(user.user_id())?;

    let created = Course::create(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    tracing::info!("course {} created by {}", created.id(), user.user_id());
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course found", body = Course),
        (status = 403, description = "Course is not published", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub(crate) async fn courses_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let course = find_visible_course(&state, &ctx, id).await?;
    Ok((StatusCode::OK, Json(course)))
}

#[utoipa::path(
    put,
    path = "/api/courses/{course_id}",
    request_body = CourseUpdateBody,
    description = "Partial update, absent fields are kept. Also served on PATCH",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course to update")
    ),
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not the owner of this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn courses_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Payload(payload): Payload<CourseUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = Policy::Staff.authorize(&ctx, ResourceType::Course)?;
    let data = payload.validate()?;
    let course = find_owned_course(&state, user, id).await?;

    let updated = course
        .update(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{course_id}",
    description = "Deletes a course together with its lessons and enrollments",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course to delete")
    ),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not the owner of this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn courses_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = Policy::Staff.authorize(&ctx, ResourceType::Course)?;
    let course = find_owned_course(&state, user, id).await?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    tracing::info!("course {} deleted by {}", id, user.user_id());
    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/lessons",
    description = "Every lesson of a course in display order",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Lessons of the course", body = Vec<LessonResponse>),
        (status = 403, description = "Course is not published", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub(crate) async fn courses_lessons_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let course = find_visible_course(&state, &ctx, id).await?;

    let rows =
        LessonWithCompletionsRow::fetch_for_course(state.pool(), &AuthenticatedUser::admin(), course.id())
            .await
            .map_err(|e| WebError::resource_fetch_error(ResourceType::Lesson, e))?;

    let lessons = LessonResponse::from_rows(rows)
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Lesson, e.into()))?;

    Ok((StatusCode::OK, Json(lessons)))
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/lessons",
    request_body = LessonCreateBody,
    description = "Adds a lesson to this course. `order` defaults to the number of lessons it already has",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
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
    tag = "courses"
)]
pub(crate) async fn courses_add_lesson_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Payload(payload): Payload<LessonCreateBody>,
) -> WebResult<impl IntoResponse> {
    let created = create_lesson(&state, &ctx, payload.for_course(id)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/enroll",
    description = "Enrolls the requester into a published course",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 201, description = "Enrolled", body = Enrollment),
        (status = 400, description = "Course is not published", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Already enrolled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn courses_enroll_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = Policy::Authenticated.authorize(&ctx, ResourceType::Enrollment)?;
    let course = find_course(&state, user, id).await?;

    if !course.is_published() {
        return Err(WebError::validation_invalid("course", "is not published"));
    }

    let enrollment = Enrollment::enroll(state.pool(), user, course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
        .ok_or_else(|| {
            WebError::resource_conflict(Enrollment::get_resource_type(), "already enrolled")
        })?;

    tracing::info!("user {} enrolled into {}", user.user_id(), course.id());
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/enrollments",
    description = "Enrolled users with their progress, for the course owner",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Enrollments", body = Vec<CourseEnrollmentResponse>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not the owner of this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = []),
        ("bearer" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn courses_enrollments_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = Policy::Staff.authorize(&ctx, ResourceType::Enrollment)?;
    let course = find_owned_course(&state, user, id).await?;

    let enrollments: Vec<CourseEnrollmentResponse> =
        CourseEnrollmentRow::fetch_for_course(state.pool(), user, course.id())
            .await
            .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
            .into_iter()
            .map(CourseEnrollmentResponse::from)
            .collect();

    Ok((StatusCode::OK, Json(enrollments)))
}
