use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::middlewares::AUTH_TOKEN;

/// Registers both ways of presenting the session token.
pub struct SessionAuthModifier;

impl Modify for SessionAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "JWT token for current user",
                ))),
            );
            schema.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::health_handler,
        crate::web::routes::auth::auth_register_handler,
        crate::web::routes::auth::auth_login_handler,
        crate::web::routes::auth::auth_logout_handler,
        crate::web::routes::auth::auth_me_handler,
        crate::web::routes::courses::courses_list_handler,
        crate::web::routes::courses::courses_my_handler,
        crate::web::routes::courses::courses_create_handler,
        crate::web::routes::courses::courses_get_handler,
        crate::web::routes::courses::courses_update_handler,
        crate::web::routes::courses::courses_delete_handler,
        crate::web::routes::courses::courses_lessons_handler,
        crate::web::routes::courses::courses_add_lesson_handler,
        crate::web::routes::courses::courses_enroll_handler,
        crate::web::routes::courses::courses_enrollments_handler,
        crate::web::routes::lessons::lessons_create_handler,
        crate::web::routes::lessons::lessons_list_handler,
        crate::web::routes::lessons::lessons_get_handler,
        crate::web::routes::lessons::lessons_update_handler,
        crate::web::routes::lessons::lessons_delete_handler,
        crate::web::routes::lessons::lessons_complete_handler,
        crate::web::routes::users::users_get_handler,
        crate::web::routes::users::users_update_handler,
        crate::web::routes::users::users_delete_handler,
        crate::web::routes::users::users_enrollments_handler,
        crate::web::routes::users::users_progress_handler,
        crate::web::routes::admin::admin_users_list_handler,
        crate::web::routes::admin::admin_users_role_handler,
        crate::web::routes::admin::admin_users_delete_handler,
        crate::web::routes::admin::admin_stats_handler,
    ),
    modifiers(&SessionAuthModifier),
    tags(
        (name = "auth", description = "Registration and sessions"),
        (name = "courses", description = "Course catalogue and enrollments"),
        (name = "lessons", description = "Lesson content and completion"),
        (name = "users", description = "Profiles and learning progress"),
        (name = "admin", description = "Administration"),
    )
)]
pub struct ApiDoc;
