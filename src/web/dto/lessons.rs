use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Lesson, LessonCreate, LessonUpdate, LessonWithCompletionsRow};
use crate::web::WebResult;
use crate::web::dto::{non_blank, non_negative, parse_id, required, required_trimmed};

/// Lesson creation payload. Everything is optional at the wire level so that a
/// missing field is reported by name.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonCreateBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub course: Option<String>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub order: Option<i32>,
    pub duration: Option<i32>,
}

impl LessonCreateBody {
    /// Targets `course_id`, whatever the body says.
    pub fn for_course(mut self, course_id: Uuid) -> Self {
        self.course = Some(course_id.to_string());
        self
    }

    pub fn validate(self) -> WebResult<LessonCreate> {
        let title = required_trimmed("title", self.title)?;
        let description = required("description", self.description)?;
        let course = required("course", self.course)?;
        let course_id = parse_id("course", &course)?;
        let content = required("content", self.content)?;

        Ok(LessonCreate {
            course_id,
            title,
            description,
            content,
            video_url: self.video_url,
            order_index: self.order,
            duration: non_negative("duration", self.duration)?,
        })
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonUpdateBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub order: Option<i32>,
    pub duration: Option<i32>,
}

impl LessonUpdateBody {
    pub fn validate(self) -> WebResult<LessonUpdate> {
        Ok(LessonUpdate {
            title: non_blank("title", self.title)?.map(|t| t.trim().to_string()),
            description: non_blank("description", self.description)?,
            content: non_blank("content", self.content)?,
            video_url: self.video_url,
            order_index: self.order,
            duration: non_negative("duration", self.duration)?,
        })
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LessonListQuery {
    /// Only lessons of this course, all of them
    pub course: Option<Uuid>,
    /// Page size of the cross-course listing
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub user: Uuid,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonResponse {
    pub id: Uuid,
    pub course: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub video_url: String,
    pub order: i32,
    pub duration: i32,
    pub completed_by: Vec<CompletionRecord>,
    pub created_at: DateTime<Utc>,
}

impl LessonResponse {
    pub fn from_lesson(lesson: Lesson, completed_by: Vec<CompletionRecord>) -> Self {
        Self {
            id: lesson.id(),
            course: lesson.course_id(),
            title: lesson.title().to_string(),
            description: lesson.description().to_string(),
            content: lesson.content().to_string(),
            video_url: lesson.video_url().to_string(),
            order: lesson.order_index(),
            duration: lesson.duration(),
            completed_by,
            created_at: lesson.created_at(),
        }
    }

    pub fn from_rows(rows: Vec<LessonWithCompletionsRow>) -> Result<Vec<Self>, serde_json::Error> {
        rows.into_iter().map(Self::try_from).collect()
    }
}

impl TryFrom<LessonWithCompletionsRow> for LessonResponse {
    type Error = serde_json::Error;

    fn try_from(row: LessonWithCompletionsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            course: row.course_id,
            title: row.title,
            description: row.description,
            content: row.content,
            video_url: row.video_url,
            order: row.order_index,
            duration: row.duration,
            completed_by: serde_json::from_value(row.completed_by)?,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;

    fn valid_body() -> LessonCreateBody {
        LessonCreateBody {
            title: Some(String::from("  Intro  ")),
            description: Some(String::from("Basics")),
            course: Some(Uuid::new_v4().to_string()),
            content: Some(String::from("...")),
            ..Default::default()
        }
    }

    #[test]
    fn create_body_trims_title_and_keeps_defaults_unset() {
        let create = valid_body().validate().unwrap();
        assert_eq!(create.title, "Intro");
        assert_eq!(create.description, "Basics");
        assert!(create.video_url.is_none());
        assert!(create.order_index.is_none());
        assert!(create.duration.is_none());
    }

    #[test]
    fn create_body_requires_every_required_field() {
        let cases: [(&str, fn(&mut LessonCreateBody)); 4] = [
            ("title", |b| b.title = None),
            ("description", |b| b.description = None),
            ("course", |b| b.course = None),
            ("content", |b| b.content = Some(String::from(" "))),
        ];

        for (field, strip) in cases {
            let mut body = valid_body();
            strip(&mut body);
            let err = body.validate().unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert!(err.client_display().contains(field), "{field}");
        }
    }

    #[test]
    fn create_body_rejects_bad_course_id() {
        let mut body = valid_body();
        body.course = Some(String::from("not-an-id"));
        assert_eq!(body.validate().unwrap_err().status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn course_from_path_wins_over_body() {
        let course = Uuid::new_v4();
        let create = valid_body().for_course(course).validate().unwrap();
        assert_eq!(create.course_id, course);

        let mut body = valid_body();
        body.course = None;
        assert_eq!(body.for_course(course).validate().unwrap().course_id, course);
    }

    #[test]
    fn update_body_rejects_blank_title() {
        let body = LessonUpdateBody {
            title: Some(String::from("")),
            ..Default::default()
        };
        assert!(body.validate().is_err());
    }

    #[test]
    fn body_accepts_camel_case_wire_names() {
        let body: LessonCreateBody = serde_json::from_value(json!({
            "title": "Intro",
            "description": "Basics",
            "course": Uuid::new_v4(),
            "content": "...",
            "videoUrl": "https://example.com/v.mp4",
            "order": 2,
            "duration": 15,
        }))
        .unwrap();

        let create = body.validate().unwrap();
        assert_eq!(create.video_url.as_deref(), Some("https://example.com/v.mp4"));
        assert_eq!(create.order_index, Some(2));
        assert_eq!(create.duration, Some(15));
    }

    #[test]
    fn completions_decode_from_aggregated_json() {
        let user = Uuid::new_v4();
        let row = LessonWithCompletionsRow {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            title: String::from("Intro"),
            description: String::from("Basics"),
            content: String::from("..."),
            video_url: String::new(),
            order_index: 0,
            duration: 0,
            created_at: Utc::now(),
            completed_by: json!([{ "user": user, "completedAt": "2026-10-19T07:00:00.123456+00:00" }]),
        };

        let response = LessonResponse::try_from(row).unwrap();
        assert_eq!(response.completed_by.len(), 1);
        assert_eq!(response.completed_by[0].user, user);
    }
}
