use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{
    Course, CourseCreate, CourseEnrollmentRow, CourseUpdate, UserEnrollmentRow, progress_percent,
};
use crate::web::WebResult;
use crate::web::dto::{non_blank, required_trimmed};

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseCreateBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_published: Option<bool>,
    pub banner_image: Option<String>,
}

impl CourseCreateBody {
    /// The requester becomes the creator.
    pub fn validate(self, creator_id: Uuid) -> WebResult<CourseCreate> {
        Ok(CourseCreate {
            title: required_trimmed("title", self.title)?,
            description: self.description.unwrap_or_default(),
            creator_id,
            is_published: self.is_published,
            banner_image: self.banner_image,
        })
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseUpdateBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_published: Option<bool>,
    pub banner_image: Option<String>,
}

impl CourseUpdateBody {
    pub fn validate(self) -> WebResult<CourseUpdate> {
        Ok(CourseUpdate {
            title: non_blank("title", self.title)?.map(|t| t.trim().to_string()),
            description: self.description,
            is_published: self.is_published,
            banner_image: self.banner_image,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourseResponse {
    pub course: Uuid,
    pub title: String,
    pub description: String,
    pub enrolled_at: DateTime<Utc>,
    pub total_lessons: i64,
    pub completed_lessons: i64,
    pub progress: i64,
}

impl From<UserEnrollmentRow> for EnrolledCourseResponse {
    fn from(row: UserEnrollmentRow) -> Self {
        Self {
            course: row.course_id,
            title: row.title,
            description: row.description,
            enrolled_at: row.enrolled_at,
            progress: progress_percent(row.completed_lessons, row.total_lessons),
            total_lessons: row.total_lessons,
            completed_lessons: row.completed_lessons,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseEnrollmentResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub username: String,
    pub enrolled_at: DateTime<Utc>,
    pub completed_lessons: i64,
    pub progress: i64,
}

impl From<CourseEnrollmentRow> for CourseEnrollmentResponse {
    fn from(row: CourseEnrollmentRow) -> Self {
        Self {
            id: row.id,
            user: row.user_id,
            username: row.username,
            enrolled_at: row.enrolled_at,
            progress: progress_percent(row.completed_lessons, row.total_lessons),
            completed_lessons: row.completed_lessons,
        }
    }
}

/// `GET /api/courses/my`: staff see what they created, students what they
/// are enrolled in. The other list stays empty.
#[derive(Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyCoursesResponse {
    pub created: Vec<Course>,
    pub enrolled: Vec<EnrolledCourseResponse>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn create_body_defaults() {
        let creator = Uuid::new_v4();
        let body = CourseCreateBody {
            title: Some(String::from(" Rust 101 ")),
            ..Default::default()
        };

        let create = body.validate(creator).unwrap();
        assert_eq!(create.title, "Rust 101");
        assert_eq!(create.description, "");
        assert_eq!(create.creator_id, creator);
        assert!(create.is_published.is_none());
    }

    #[test]
    fn create_body_requires_title() {
        assert!(CourseCreateBody::default().validate(Uuid::new_v4()).is_err());
    }

    #[test]
    fn enrolled_course_computes_progress() {
        let response = EnrolledCourseResponse::from(UserEnrollmentRow {
            course_id: Uuid::new_v4(),
            title: String::from("Rust 101"),
            description: String::new(),
            enrolled_at: Utc::now(),
            total_lessons: 3,
            completed_lessons: 2,
        });
        assert_eq!(response.progress, 66);
    }
}
