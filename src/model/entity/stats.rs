use serde::Serialize;

use crate::model::entity::{Course, Enrollment, Lesson, LessonCompletion, UserEntity};
use crate::model::{CrudRepository, ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleCount {
    pub role: String,
    pub count: i64,
}

/// Platform-wide counters for the admin dashboard.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub users: i64,
    pub users_by_role: Vec<RoleCount>,
    pub courses: i64,
    pub published_courses: i64,
    pub lessons: i64,
    pub enrollments: i64,
    pub completions: i64,
}

impl PlatformStats {
    pub async fn collect(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<Self> {
        let (users, by_role, courses, published_courses, lessons, enrollments, completions) =
            tokio::try_join!(
                UserEntity::count(mm, actor),
                UserEntity::count_by_role(mm, actor),
                Course::count(mm, actor),
                Course::count_published(mm, actor),
                Lesson::count(mm, actor),
                Enrollment::count_all(mm, actor),
                LessonCompletion::count_all(mm, actor),
            )?;

        Ok(Self {
            users,
            users_by_role: by_role
                .into_iter()
                .map(|(role, count)| RoleCount { role, count })
                .collect(),
            courses,
            published_courses,
            lessons,
            enrollments,
            completions,
        })
    }
}
