mod common;
use reqwest::StatusCode;
use serde_json::json;
use tower_cookies::cookie::SameSite;

use lernboard::web::dto::users::UserResponse;
use lernboard::web::middlewares::AUTH_TOKEN;

use crate::common::{
    Action, Flow, STUDENT_ID, TEACHER_ID, login_action, login_admin_action, login_student_action,
    setup_server,
};

#[tokio::test]
async fn route_login_test() {
    let mut server = setup_server().await;

    Flow::new()
        .step(
            login_student_action()
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
                    assert_eq!(cookie.path(), Some("/"));
                    assert_eq!(cookie.http_only(), Some(true));
                })
                .assert_body(|body| {
                    let user: UserResponse =
                        serde_json::from_value(body.clone()).expect("Invalid body format");
                    assert_eq!(user.id, STUDENT_ID);
                    assert!(body.get("password_hash").is_none());
                }),
        )
        .step(
            Action::new("me", "GET", "/api/v1/auth/me")
                .assert_body(|body| assert_eq!(body["email"], "student@lernboard.test")),
        )
        // wrong credentials
        .step(
            login_action("student@lernboard.test", "WRONGPASSWORD")
                .with_save_cookies(false)
                .with_clear_cookies(true)
                .with_expect(StatusCode::UNAUTHORIZED)
                .assert_body(|body| {
                    assert!(body["message"].as_str().unwrap().contains("Authentication error"));
                }),
        )
        // non-existing account
        .step(
            login_action("nobody@lernboard.test", "nvm").with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(Action::new("me anonymous", "GET", "/api/v1/auth/me").with_expect(StatusCode::UNAUTHORIZED))
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn route_users_list_test() {
    let mut server = setup_server().await;

    Flow::new()
        .step(
            Action::new("list", "GET", "/api/v1/users").assert_body(|body| {
                let users = body.as_array().unwrap();
                assert_eq!(users.len(), 3);
                assert!(users.iter().all(|u| u.get("password_hash").is_none()));
            }),
        )
        .step(
            Action::new("page", "GET", "/api/v1/users/page")
                .with_param("limit", "2")
                .with_param("offset", "0")
                .assert_body(|body| {
                    assert_eq!(body["total"], 3);
                    assert_eq!(body["items"].as_array().unwrap().len(), 2);
                }),
        )
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn route_progress_test() {
    let mut server = setup_server().await;

    Flow::new()
        .step(
            Action::new("anonymous", "GET", "/api/v1/users/user-student/progress")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(login_student_action())
        .step(
            Action::new("stored progress", "GET", "/api/v1/users/user-student/progress")
                .assert_body(|body| {
                    let entries = body.as_array().unwrap();
                    assert_eq!(entries.len(), 2);

                    let course_1 = &entries[0];
                    assert_eq!(course_1["course_id"], "course-1");
                    assert_eq!(course_1["stored_percentage"], 100);
                    // module-stale no longer exists, one of two modules done
                    assert_eq!(course_1["percentage"], 50);
                    assert_eq!(course_1["stale_modules"], json!(["module-stale"]));

                    assert_eq!(entries[1]["course_id"], "course-2");
                    assert_eq!(entries[1]["percentage"], 0);
                }),
        )
        .step(
            Action::new("complete", "PUT", "/api/v1/users/user-student/progress/course-1")
                .with_body(json!({ "completed_modules": ["module-1", "module-2", "module-x"] }))
                .assert_body(|body| {
                    assert_eq!(body["percentage"], 100);
                    assert_eq!(body["completed_modules"], json!(["module-1", "module-2"]));
                    assert_eq!(body["stale_modules"], json!(["module-x"]));
                }),
        )
        .step(
            Action::new("unknown course", "PUT", "/api/v1/users/user-student/progress/nope")
                .with_body(json!({ "completed_modules": [] }))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("someone else", "GET", "")
                .with_dyn_path(|_| format!("/api/v1/users/{TEACHER_ID}/progress"))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(login_admin_action().with_clear_cookies(true))
        .step(
            Action::new("admin reads student", "GET", "/api/v1/users/user-student/progress")
                .assert_body(|body| assert_eq!(body[0]["stored_percentage"], 100)),
        )
        .run(&mut server)
        .await;
}

#[tokio::test]
async fn route_dashboard_test() {
    let mut server = setup_server().await;

    Flow::new()
        .step(Action::new("anonymous", "GET", "/api/v1/dashboard").with_expect(StatusCode::UNAUTHORIZED))
        .step(login_student_action())
        .step(
            Action::new("student", "GET", "/api/v1/dashboard").assert_body(|body| {
                assert_eq!(body["role"], "student");
                assert_eq!(body["overview"]["role"], "student");
                assert_eq!(body["overview"]["enrolled_courses"], 2);
                assert_eq!(body["courses"][0]["progress"], 50);
            }),
        )
        .step(login_action("teacher@lernboard.test", "teacher").with_clear_cookies(true))
        .step(
            Action::new("teacher", "GET", "/api/v1/dashboard").assert_body(|body| {
                assert_eq!(body["overview"]["courses"], 2);
                assert_eq!(body["overview"]["published_courses"], 1);
                assert!(body["courses"][0].get("progress").is_none());
            }),
        )
        .step(login_admin_action().with_clear_cookies(true))
        .step(
            Action::new("admin", "GET", "/api/v1/dashboard").assert_body(|body| {
                assert_eq!(body["overview"]["users"], 3);
                let nav = body["navigation"].as_array().unwrap();
                assert!(nav.iter().any(|n| n["label"] == "Users"));
            }),
        )
        .run(&mut server)
        .await;
}
