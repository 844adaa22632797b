use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// "User completed lesson" record. At most one exists per (lesson, user).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonCompletion {
    id: Uuid,
    #[serde(rename = "lesson")]
    lesson_id: Uuid,
    #[serde(rename = "user")]
    user_id: Uuid,
    completed_at: DateTime<Utc>,
}

impl ResourceTyped for LessonCompletion {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::LessonCompletion
    }
}

impl LessonCompletion {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Records that `actor` completed `lesson_id`. Repeated calls return the
    /// first record untouched.
    pub async fn mark(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Self> {
        // the no-op DO UPDATE makes RETURNING yield the existing row on conflict
        let record = sqlx::query_as(
            r#"
            INSERT INTO lesson_completions (id, lesson_id, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (lesson_id, user_id)
            DO UPDATE SET lesson_id = EXCLUDED.lesson_id
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lesson_id)
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;

        Ok(record)
    }

    pub async fn all_by_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let records = sqlx::query_as(
            "SELECT * FROM lesson_completions WHERE user_id = $1 ORDER BY completed_at",
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(records)
    }

    pub async fn count_all(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lesson_completions")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}
