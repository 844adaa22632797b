use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    id: Uuid,
    #[serde(rename = "user")]
    user_id: Uuid,
    #[serde(rename = "course")]
    course_id: Uuid,
    enrolled_at: DateTime<Utc>,
}

impl ResourceTyped for Enrollment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Enrollment
    }
}

impl Enrollment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn enrolled_at(&self) -> DateTime<Utc> {
        self.enrolled_at
    }

    /// Enrolls `actor` into `course_id`. `None` when already enrolled.
    pub async fn enroll(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO enrollments (id, user_id, course_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, course_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(course_id)
        .fetch_optional(mm.executor())
        .await?;

        Ok(created)
    }

    pub async fn exists(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM enrollments WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(found)
    }

    pub async fn count_all(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

// Utils

/// Integer percentage of completed lessons, rounded down. A course without
/// lessons reports 0.
pub fn progress_percent(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (completed.clamp(0, total) * 100) / total
}

/// One enrolled course of a user, with lesson counters.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserEnrollmentRow {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub enrolled_at: DateTime<Utc>,
    pub total_lessons: i64,
    pub completed_lessons: i64,
}

impl UserEnrollmentRow {
    pub async fn fetch_for_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                c.id AS course_id,
                c.title,
                c.description,
                e.enrolled_at,
                (SELECT COUNT(*) FROM lessons l WHERE l.course_id = c.id) AS total_lessons,
                (
                    SELECT COUNT(*)
                    FROM lesson_completions lc
                    JOIN lessons l ON l.id = lc.lesson_id
                    WHERE l.course_id = c.id AND lc.user_id = e.user_id
                ) AS completed_lessons
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            WHERE e.user_id = $1
            ORDER BY e.enrolled_at
            "#,
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}

/// One enrolled user of a course, with lesson counters.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseEnrollmentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub enrolled_at: DateTime<Utc>,
    pub total_lessons: i64,
    pub completed_lessons: i64,
}

impl CourseEnrollmentRow {
    pub async fn fetch_for_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                e.id,
                e.user_id,
                u.username,
                e.enrolled_at,
                (SELECT COUNT(*) FROM lessons l WHERE l.course_id = e.course_id) AS total_lessons,
                (
                    SELECT COUNT(*)
                    FROM lesson_completions lc
                    JOIN lessons l ON l.id = lc.lesson_id
                    WHERE l.course_id = e.course_id AND lc.user_id = e.user_id
                ) AS completed_lessons
            FROM enrollments e
            JOIN users u ON u.id = e.user_id
            WHERE e.course_id = $1
            ORDER BY e.enrolled_at
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
