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
pub struct Course {
    id: Uuid,
    title: String,
    description: String,
    #[serde(rename = "creator")]
    creator_id: Uuid,
    is_published: bool,
    banner_image: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub title: String,
    pub description: String,
    pub creator_id: Uuid,
    pub is_published: Option<bool>,
    pub banner_image: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_published: Option<bool>,
    pub banner_image: Option<String>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn creator_id(&self) -> Uuid {
        self.creator_id
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn banner_image(&self) -> Option<&str> {
        self.banner_image.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Published courses are public; drafts only show up for staff and their creator.
    pub fn is_visible_to(&self, viewer: Option<&AuthenticatedUser>) -> bool {
        if self.is_published {
            return true;
        }

        match viewer {
            Some(user) => user.user_role().is_staff() || user.user_id() == self.creator_id,
            None => false,
        }
    }
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, CourseUpdate, uuid::Uuid> for Course {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO courses (id, title, description, creator_id, is_published, banner_image)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.creator_id)
        .bind(data.is_published.unwrap_or(true))
        .bind(&data.banner_image)
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseUpdate,
    ) -> DatabaseResult<Self> {
        let updated = sqlx::query_as(
            r#"
            UPDATE courses SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                is_published = COALESCE($3, is_published),
                banner_image = COALESCE($4, banner_image)
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.is_published)
        .bind(data.banner_image)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(updated)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses ORDER BY created_at LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Course {
    pub async fn all_by_creator(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        creator_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE creator_id = $1 ORDER BY created_at")
            .bind(creator_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn count_published(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE is_published")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Course {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.creator_id)
    }
}

// Utils

/// Catalog entry: a course joined with its creator's username and lesson count.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithCreatorRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "creator")]
    pub creator_id: Uuid,
    pub creator_name: String,
    pub is_published: bool,
    pub banner_image: Option<String>,
    pub lesson_count: i64,
    pub created_at: DateTime<Utc>,
}

impl CourseWithCreatorRow {
    pub async fn fetch_published(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                c.id,
                c.title,
                c.description,
                c.creator_id,
                COALESCE(u.username, '') AS creator_name,
                c.is_published,
                c.banner_image,
                (SELECT COUNT(*) FROM lessons l WHERE l.course_id = c.id) AS lesson_count,
                c.created_at
            FROM courses c
            LEFT JOIN users u ON u.id = c.creator_id
            WHERE c.is_published
            ORDER BY c.created_at
            "#,
        )
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
