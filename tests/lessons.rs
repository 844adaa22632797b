mod common;
use axum::http::{Method, StatusCode};
use coursehub::web::UserRole;
use coursehub::web::dto::lessons::LessonResponse;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, TestApp, complete, create_course, create_lesson, enroll, login_admin, register,
};

#[tokio::test]
async fn route_lesson_lifecycle_test() {
    let app = TestApp::spawn().await;

    Flow::new()
        .step(login_admin())
        .step(create_course("Rust 101", "course"))
        .step(
            create_lesson("  Intro  ", "course").save_as("lesson").check_body(|body| {
                let lesson: LessonResponse = serde_json::from_str(body).expect("Invalid body format");
                assert_eq!(lesson.title, "Intro");
                assert_eq!(lesson.description, "Basics");
                assert_eq!(lesson.content, "...");
                assert_eq!(lesson.video_url, "");
                assert_eq!(lesson.order, 0);
                assert_eq!(lesson.duration, 0);
                assert!(lesson.completed_by.is_empty());
                assert!(body.contains("createdAt"));
            }),
        )
        // the stored record reads back unchanged
        .step(Action::on("get_lesson", Method::GET, "/api/lessons/{}", "lesson").save_as("fetched"))
        .step(Action::with_path("compare_lesson", Method::GET, |ctx| {
            assert_eq!(ctx.get("lesson"), ctx.get("fetched"));
            format!("/api/lessons?course={}", ctx.id("course"))
        }))
        .step(
            Action::on("update_lesson", Method::PATCH, "/api/lessons/{}", "lesson")
                .json(json!({ "order": 3, "videoUrl": "https://example.com/intro.mp4" }))
                .check_body(|body| {
                    let lesson: LessonResponse = serde_json::from_str(body).unwrap();
                    assert_eq!(lesson.order, 3);
                    assert_eq!(lesson.title, "Intro");
                    assert_eq!(lesson.video_url, "https://example.com/intro.mp4");
                }),
        )
        .step(Action::on("delete_lesson", Method::DELETE, "/api/lessons/{}", "lesson"))
        .step(
            Action::on("get_deleted_lesson", Method::GET, "/api/lessons/{}", "lesson")
                .expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::on("delete_deleted_lesson", Method::DELETE, "/api/lessons/{}", "lesson")
                .expect(StatusCode::NOT_FOUND),
        )
        .run(app)
        .await;
}

#[tokio::test]
async fn route_lesson_under_course_test() {
    let app = TestApp::spawn().await;

    Flow::new()
        .step(register("TEACHER", UserRole::Teacher))
        .step(create_course("Rust 101", "course"))
        .step(create_course("Other", "other"))
        // order defaults to the number of lessons already in the course
        .step(
            Action::on("first", Method::POST, "/api/courses/{}/lessons", "course")
                .json(json!({ "title": "One", "description": "-", "content": "..." }))
                .expect(StatusCode::CREATED)
                .check_body(|body| {
                    let lesson: LessonResponse = serde_json::from_str(body).unwrap();
                    assert_eq!(lesson.order, 0);
                }),
        )
        // the path names the course even if the body says otherwise
        .step(
            Action::on("second", Method::POST, "/api/courses/{}/lessons", "course")
                .json_with(|ctx| {
                    json!({
                        "title": "Two",
                        "description": "-",
                        "content": "...",
                        "course": ctx.id("other"),
                    })
                })
                .expect(StatusCode::CREATED)
                .save_as("second"),
        )
        .step(Action::with_path("check_second", Method::GET, |ctx| {
            let second: LessonResponse = ctx.get_json("second");
            assert_eq!(second.order, 1);
            assert_eq!(second.course.to_string(), ctx.id("course"));
            format!("/api/courses/{}/lessons", ctx.id("course"))
        }))
        .step(create_lesson("Three", "course").check_body(|body| {
            let lesson: LessonResponse = serde_json::from_str(body).unwrap();
            assert_eq!(lesson.order, 2);
        }))
        .step(
            Action::on("missing_content", Method::POST, "/api/courses/{}/lessons", "course")
                .json(json!({ "title": "Four", "description": "-" }))
                .expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::with_path("unknown_course", Method::POST, |_| {
                format!("/api/courses/{}/lessons", uuid::Uuid::new_v4())
            })
            .json(json!({ "title": "Four", "description": "-", "content": "..." }))
            .expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::on("course_lessons", Method::GET, "/api/courses/{}/lessons", "course").check_body(
                |body| {
                    let lessons: Vec<Value> = serde_json::from_str(body).unwrap();
                    let titles: Vec<&str> = lessons.iter().filter_map(|l| l["title"].as_str()).collect();
                    assert_eq!(titles, ["One", "Two", "Three"]);
                },
            ),
        )
        // somebody else's course
        .step(register("OTHER", UserRole::Teacher))
        .step(
            Action::on("foreign_course", Method::POST, "/api/courses/{}/lessons", "course")
                .json(json!({ "title": "Four", "description": "-", "content": "..." }))
                .expect(StatusCode::FORBIDDEN),
        )
        .run(app)
        .await;
}

#[tokio::test]
async fn route_lesson_validation_test() {
    let app = TestApp::spawn().await;

    Flow::new()
        .step(login_admin())
        .step(create_course("Rust 101", "course"))
        .step(
            Action::new("missing_content", Method::POST, "/api/lessons")
                .json_with(|ctx| {
                    json!({
                        "title": "Intro",
                        "description": "Basics",
                        "course": ctx.id("course"),
                    })
                })
                .expect(StatusCode::BAD_REQUEST)
                .check_body(|body| assert!(body.contains("content"))),
        )
        .step(
            Action::new("blank_title", Method::POST, "/api/lessons")
                .json_with(|ctx| {
                    json!({
                        "title": "   ",
                        "description": "Basics",
                        "course": ctx.id("course"),
                        "content": "...",
                    })
                })
                .expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("unknown_course", Method::POST, "/api/lessons")
                .json(json!({
                    "title": "Intro",
                    "description": "Basics",
                    "course": uuid::Uuid::new_v4(),
                    "content": "...",
                }))
                .expect(StatusCode::BAD_REQUEST)
                .check_body(|body| assert!(body.contains("course"))),
        )
        .step(
            Action::new("malformed_body", Method::POST, "/api/lessons")
                .json(json!(["not", "an", "object"]))
                .expect(StatusCode::BAD_REQUEST),
        )
        // nothing was persisted
        .step(
            Action::with_path("list_lessons", Method::GET, |ctx| {
                format!("/api/lessons?course={}", ctx.id("course"))
            })
            .check_body(|body| assert_eq!(body, "[]")),
        )
        .step(
            Action::with_path("missing_lesson", Method::GET, |_| {
                format!("/api/lessons/{}", uuid::Uuid::new_v4())
            })
            .expect(StatusCode::NOT_FOUND),
        )
        .run(app)
        .await;
}

#[tokio::test]
async fn route_lesson_authorization_test() {
    let app = TestApp::spawn().await;

    Flow::new()
        .step(register("TEACHER", UserRole::Teacher))
        .step(create_course("Rust 101", "course"))
        .step(create_lesson("Intro", "course").save_as("lesson"))
        // students can read but not author
        .step(register("STUDENT", UserRole::Student))
        .step(
            Action::on("student_delete", Method::DELETE, "/api/lessons/{}", "lesson")
                .expect(StatusCode::FORBIDDEN),
        )
        .step(create_lesson("Mine", "course").expect(StatusCode::FORBIDDEN))
        .step(
            Action::new("student_cross_course_list", Method::GET, "/api/lessons")
                .expect(StatusCode::FORBIDDEN),
        )
        // another teacher does not own the course
        .step(register("OTHER", UserRole::Teacher))
        .step(
            Action::on("other_teacher_update", Method::PUT, "/api/lessons/{}", "lesson")
                .json(json!({ "title": "Hijacked" }))
                .expect(StatusCode::FORBIDDEN),
        )
        // anonymous requests must sign in first
        .step(
            Action::on("anonymous_delete", Method::DELETE, "/api/lessons/{}", "lesson")
                .fresh_session()
                .expect(StatusCode::UNAUTHORIZED),
        )
        // the lesson is still there, untouched
        .step(
            Action::on("get_lesson", Method::GET, "/api/lessons/{}", "lesson")
                .check_body(|body| assert!(body.contains("Intro"))),
        )
        .run(app)
        .await;
}

#[tokio::test]
async fn route_lesson_complete_is_idempotent_test() {
    let app = TestApp::spawn().await;

    Flow::new()
        .step(login_admin())
        .step(create_course("Rust 101", "course"))
        .step(create_lesson("Intro", "course").save_as("lesson"))
        .step(register("STUDENT", UserRole::Student).save_as("student"))
        .step(enroll("course"))
        .step(complete("lesson").save_as("first"))
        .step(complete("lesson").save_as("second"))
        .step(
            Action::with_path("read_back", Method::GET, |ctx| {
                let first: LessonResponse = ctx.get_json("first");
                let second: LessonResponse = ctx.get_json("second");
                assert_eq!(first.completed_by.len(), 1);
                assert_eq!(second.completed_by.len(), 1);
                assert_eq!(first.completed_by[0].completed_at, second.completed_by[0].completed_at);
                assert_eq!(first.completed_by[0].user.to_string(), ctx.id("student"));
                format!("/api/lessons/{}", ctx.id("lesson"))
            })
            .check_body(|body| {
                let lesson: LessonResponse = serde_json::from_str(body).unwrap();
                assert_eq!(lesson.completed_by.len(), 1);
            }),
        )
        .step(
            Action::with_path("complete_missing", Method::POST, |_| {
                format!("/api/lessons/{}/complete", uuid::Uuid::new_v4())
            })
            .expect(StatusCode::NOT_FOUND),
        )
        .run(app)
        .await;
}

#[tokio::test]
async fn route_lesson_complete_requires_enrollment_test() {
    let app = TestApp::spawn().await;

    Flow::new()
        .step(register("TEACHER", UserRole::Teacher))
        .step(create_course("Rust 101", "course"))
        .step(create_lesson("Intro", "course").save_as("lesson"))
        .step(register("STUDENT", UserRole::Student))
        .step(
            complete("lesson")
                .expect(StatusCode::BAD_REQUEST)
                .check_body(|body| assert!(body.contains("not enrolled"))),
        )
        // nothing was recorded
        .step(Action::on("unchanged", Method::GET, "/api/lessons/{}", "lesson").check_body(|body| {
            let lesson: LessonResponse = serde_json::from_str(body).unwrap();
            assert!(lesson.completed_by.is_empty());
        }))
        .step(enroll("course"))
        .step(complete("lesson").check_body(|body| {
            let lesson: LessonResponse = serde_json::from_str(body).unwrap();
            assert_eq!(lesson.completed_by.len(), 1);
        }))
        .step(complete("lesson").fresh_session().expect(StatusCode::UNAUTHORIZED))
        .run(app)
        .await;
}

#[tokio::test]
async fn route_lesson_form_body_test() {
    let mut app = TestApp::spawn().await;
    app.server.save_cookies();

    app.server
        .post("/api/auth/login")
        .form(&[("username", "admin"), ("password", "admin")])
        .await
        .assert_status_ok();

    let course: Value = app
        .server
        .post("/api/courses")
        .form(&[("title", "Forms")])
        .await
        .json();

    let response = app
        .server
        .post("/api/lessons")
        .form(&[
            ("title", "Intro"),
            ("description", "Basics"),
            ("course", course["id"].as_str().unwrap()),
            ("content", "..."),
            ("duration", "15"),
        ])
        .await;
    response.assert_status(StatusCode::CREATED);

    let lesson: LessonResponse = response.json();
    assert_eq!(lesson.duration, 15);
    app.teardown().await;
}
