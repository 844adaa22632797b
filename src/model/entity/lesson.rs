use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    id: Uuid,
    #[serde(rename = "course")]
    course_id: Uuid,
    title: String,
    description: String,
    content: String,
    video_url: String,
    #[serde(rename = "order")]
    order_index: i32,
    duration: i32,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Lesson {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Lesson
    }
}

impl Lesson {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn course_id(&self) -> uuid::Uuid {
        self.course_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }

    pub fn duration(&self) -> i32 {
        self.duration
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonCreate {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub video_url: Option<String>,
    pub order_index: Option<i32>,
    pub duration: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub order_index: Option<i32>,
    pub duration: Option<i32>,
}

#[async_trait]
impl CrudRepository<Lesson, LessonCreate, LessonUpdate, uuid::Uuid> for Lesson {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO lessons (id, course_id, title, description, content, video_url, order_index, duration)
            VALUES (
                $1, $2, $3, $4, $5, $6,
                COALESCE($7, (SELECT COUNT(*) FROM lessons WHERE course_id = $2)::int),
                $8
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.content)
        .bind(data.video_url.unwrap_or_default())
        .bind(data.order_index)
        .bind(data.duration.unwrap_or(0))
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonUpdate,
    ) -> DatabaseResult<Self> {
        let updated = sqlx::query_as(
            r#"
            UPDATE lessons SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                content = COALESCE($3, content),
                video_url = COALESCE($4, video_url),
                order_index = COALESCE($5, order_index),
                duration = COALESCE($6, duration)
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.content)
        .bind(data.video_url)
        .bind(data.order_index)
        .bind(data.duration)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(updated)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM lessons WHERE id = $1")
            .bind(id)
            .fetch_one(mm.executor())
            .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }

        Ok(Some(result?))
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM lessons ORDER BY course_id, order_index, created_at LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Lesson {
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM lessons WHERE course_id = $1 ORDER BY order_index, created_at",
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Lesson {
    type OwnerId = uuid::Uuid;

    /// A lesson belongs to whoever created its course.
    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let owner: Uuid = sqlx::query_scalar("SELECT creator_id FROM courses WHERE id = $1")
            .bind(self.course_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(owner)
    }
}

// Utils

/// Lesson row with its completion records folded into a JSON array of
/// `{"user": .., "completedAt": ..}` objects.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LessonWithCompletionsRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub video_url: String,
    pub order_index: i32,
    pub duration: i32,
    pub created_at: DateTime<Utc>,
    pub completed_by: serde_json::Value,
}

impl LessonWithCompletionsRow {
    const SELECT: &'static str = r#"
        SELECT
            l.id,
            l.course_id,
            l.title,
            l.description,
            l.content,
            l.video_url,
            l.order_index,
            l.duration,
            l.created_at,
            COALESCE(
                json_agg(
                    json_build_object('user', c.user_id, 'completedAt', c.completed_at)
                    ORDER BY c.completed_at
                ) FILTER (WHERE c.id IS NOT NULL),
                '[]'
            ) AS completed_by
        FROM lessons l
        LEFT JOIN lesson_completions c ON c.lesson_id = l.id
    "#;

    pub async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let query = format!("{} WHERE l.id = $1 GROUP BY l.id", Self::SELECT);
        let row = sqlx::query_as(&query)
            .bind(lesson_id)
            .fetch_optional(mm.executor())
            .await?;

        Ok(row)
    }

    /// Every lesson of a course in display order.
    pub async fn fetch_for_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let query = format!(
            "{} WHERE l.course_id = $1 GROUP BY l.id ORDER BY l.order_index, l.created_at",
            Self::SELECT
        );
        let rows = sqlx::query_as(&query)
            .bind(course_id)
            .fetch_all(mm.executor())
            .await?;

        Ok(rows)
    }

    /// A page of lessons across all courses, grouped by course.
    pub async fn fetch_page(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let query = format!(
            "{} GROUP BY l.id ORDER BY l.course_id, l.order_index, l.created_at LIMIT $1 OFFSET $2",
            Self::SELECT
        );
        let rows = sqlx::query_as(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;

        Ok(rows)
    }
}
