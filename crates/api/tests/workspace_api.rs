//! HTTP-level integration tests for projects, tasks, employees, and content.

mod common;

use atrium_core::roles::{ROLE_ID_MEMBER, ROLE_ID_TENANT_ADMIN};
use axum::http::StatusCode;
use common::{body_json, delete_auth, get_auth, post_json_auth, put_json_auth};
use sqlx::PgPool;

struct Workspace {
    app: axum::Router,
    admin: String,
    member: String,
    member_id: i64,
}

async fn setup(pool: PgPool) -> Workspace {
    let acme = common::seed_tenant(&pool, "acme").await;
    common::seed_user(&pool, Some(acme.id), "ada", ROLE_ID_TENANT_ADMIN).await;
    let bob = common::seed_user(&pool, Some(acme.id), "bob", ROLE_ID_MEMBER).await;
    let app = common::build_test_app(pool);
    let admin = common::login(&app, "ada@test.com").await;
    let member = common::login(&app, "bob@test.com").await;
    Workspace {
        app,
        admin,
        member,
        member_id: bob.id,
    }
}

async fn create(app: &axum::Router, token: &str, uri: &str, body: serde_json::Value) -> serde_json::Value {
    let response = post_json_auth(app.clone(), uri, token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED, "POST {uri}");
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Projects and tasks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_task_completion_and_project_summary(pool: PgPool) {
    let w = setup(pool).await;

    // Members hold projects.write by default.
    let project = create(&w.app, &w.member, "/api/v1/projects", serde_json::json!({ "name": "Website" })).await;
    assert_eq!(project["status"], "planning");

    let task = create(
        &w.app,
        &w.member,
        "/api/v1/tasks",
        serde_json::json!({ "project_id": project["id"], "title": "Design" }),
    )
    .await;
    assert_eq!(task["status"], "todo");
    assert_eq!(task["priority"], "medium");
    assert!(task["completed_at"].is_null());
    create(
        &w.app,
        &w.member,
        "/api/v1/tasks",
        serde_json::json!({ "project_id": project["id"], "title": "Build" }),
    )
    .await;

    let task_uri = format!("/api/v1/tasks/{}", task["id"]);
    let json = body_json(put_json_auth(w.app.clone(), &task_uri, &w.member, serde_json::json!({ "status": "done" })).await).await;
    assert!(json["data"]["completed_at"].is_string());

    let summary_uri = format!("/api/v1/projects/{}/summary", project["id"]);
    let json = body_json(get_auth(w.app.clone(), &summary_uri, &w.member).await).await;
    assert_eq!(json["data"]["total_tasks"], 2);
    assert_eq!(json["data"]["tasks"]["done"], 1);
    assert_eq!(json["data"]["completion_percent"], 50);

    // Reopening clears the completion stamp.
    let json = body_json(put_json_auth(w.app, &task_uri, &w.member, serde_json::json!({ "status": "in_progress" })).await).await;
    assert!(json["data"]["completed_at"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tasks_filter_by_project_and_assignee(pool: PgPool) {
    let w = setup(pool).await;
    let web = create(&w.app, &w.admin, "/api/v1/projects", serde_json::json!({ "name": "Website" })).await;
    let ops = create(&w.app, &w.admin, "/api/v1/projects", serde_json::json!({ "name": "Ops" })).await;
    create(
        &w.app,
        &w.admin,
        "/api/v1/tasks",
        serde_json::json!({ "project_id": web["id"], "title": "Copy", "assignee_user_id": w.member_id }),
    )
    .await;
    create(&w.app, &w.admin, "/api/v1/tasks", serde_json::json!({ "project_id": ops["id"], "title": "Backups" })).await;

    let uri = format!("/api/v1/tasks?project_id={}", web["id"]);
    let json = body_json(get_auth(w.app.clone(), &uri, &w.admin).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/tasks?assignee_user_id={}", w.member_id);
    let json = body_json(get_auth(w.app, &uri, &w.admin).await).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Copy");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_project_due_before_start_is_rejected(pool: PgPool) {
    let w = setup(pool).await;

    let response = post_json_auth(
        w.app,
        "/api/v1/projects",
        &w.admin,
        serde_json::json!({ "name": "Website", "start_date": "2026-06-10", "due_date": "2026-06-01" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_project_removes_tasks(pool: PgPool) {
    let w = setup(pool).await;
    let project = create(&w.app, &w.admin, "/api/v1/projects", serde_json::json!({ "name": "Website" })).await;
    let task = create(
        &w.app,
        &w.admin,
        "/api/v1/tasks",
        serde_json::json!({ "project_id": project["id"], "title": "Design" }),
    )
    .await;

    let response = delete_auth(w.app.clone(), &format!("/api/v1/projects/{}", project["id"]), &w.admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(w.app, &format!("/api/v1/tasks/{}", task["id"]), &w.admin).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_employee_lifecycle(pool: PgPool) {
    let w = setup(pool).await;
    let body = serde_json::json!({
        "first_name": "Milton",
        "last_name": "Waddams",
        "email": "milton@acme.com",
        "department": "Storage",
    });

    // HR records are admin-only by default.
    let response = post_json_auth(w.app.clone(), "/api/v1/employees", &w.member, body.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let employee = create(&w.app, &w.admin, "/api/v1/employees", body.clone()).await;
    assert_eq!(employee["employment_status"], "active");

    let response = post_json_auth(w.app.clone(), "/api/v1/employees", &w.admin, body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let uri = format!("/api/v1/employees/{}", employee["id"]);
    let response = put_json_auth(w.app.clone(), &uri, &w.admin, serde_json::json!({ "employment_status": "terminated" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_json_auth(w.app, &uri, &w.admin, serde_json::json!({ "employment_status": "active" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_content_slug_is_derived_and_unique(pool: PgPool) {
    let w = setup(pool).await;

    let item = create(&w.app, &w.admin, "/api/v1/content", serde_json::json!({ "title": "Q3 Roadmap: What's next?" })).await;
    assert_eq!(item["slug"], "q3-roadmap-what-s-next");
    assert_eq!(item["status"], "draft");
    assert_eq!(item["content_type"], "article");

    let response = post_json_auth(
        w.app,
        "/api/v1/content",
        &w.admin,
        serde_json::json!({ "title": "Another", "slug": "q3-roadmap-what-s-next" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_content_publish_workflow(pool: PgPool) {
    let w = setup(pool).await;
    let item = create(&w.app, &w.admin, "/api/v1/content", serde_json::json!({ "title": "Launch notes" })).await;
    let uri = format!("/api/v1/content/{}", item["id"]);

    let json = body_json(put_json_auth(w.app.clone(), &uri, &w.admin, serde_json::json!({ "status": "published" })).await).await;
    let published_at = json["data"]["published_at"].clone();
    assert!(published_at.is_string());

    let json = body_json(put_json_auth(w.app.clone(), &uri, &w.admin, serde_json::json!({ "status": "archived" })).await).await;
    assert_eq!(json["data"]["published_at"], published_at);

    // Archived content may only go back to draft.
    let response = put_json_auth(w.app.clone(), &uri, &w.admin, serde_json::json!({ "status": "published" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(get_auth(w.app, "/api/v1/content?status=archived", &w.admin).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_title_without_slug_characters_is_rejected(pool: PgPool) {
    let w = setup(pool).await;

    let response = post_json_auth(w.app, "/api/v1/content", &w.admin, serde_json::json!({ "title": "!!!" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
