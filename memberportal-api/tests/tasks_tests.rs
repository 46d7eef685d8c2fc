/// Task ownership, completion and approval

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_member_creates_and_lists_own_tasks() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;
    let bob = ctx.cookie_for(&ctx.bob).await;

    let response = ctx
        .post(
            "/api/tasks",
            &ann,
            json!({ "title": "Water plants", "dueDate": "2030-06-01T12:00:00Z" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let task = response.json();
    assert_eq!(task["userId"], ctx.ann.id);
    assert_eq!(task["createdBy"], ctx.ann.id);
    assert_eq!(task["completed"], false);
    assert_eq!(task["approved"], false);

    assert_eq!(ctx.get("/api/tasks", &ann).await.json().as_array().unwrap().len(), 1);
    assert!(ctx.get("/api/tasks", &bob).await.json().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_member_cannot_assign_to_others() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;

    let task = ctx
        .post("/api/tasks", &ann, json!({ "title": "Sneaky", "userId": ctx.bob.id }))
        .await
        .json();

    assert_eq!(task["userId"], ctx.ann.id);
}

#[tokio::test]
async fn test_admin_assigns_task() {
    let ctx = TestContext::new().await;
    let admin = ctx.cookie_for(&ctx.admin).await;
    let bob = ctx.cookie_for(&ctx.bob).await;

    let task = ctx
        .post("/api/tasks", &admin, json!({ "title": "Report", "userId": ctx.bob.id }))
        .await
        .json();
    assert_eq!(task["userId"], ctx.bob.id);
    assert_eq!(task["createdBy"], ctx.admin.id);

    let tasks = ctx.get("/api/tasks", &bob).await.json();
    assert_eq!(tasks[0]["title"], "Report");
}

#[tokio::test]
async fn test_completion_persists() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;

    let id = ctx
        .post("/api/tasks", &ann, json!({ "title": "Sweep" }))
        .await
        .json()["id"]
        .as_i64()
        .unwrap();

    let response = ctx
        .patch(&format!("/api/tasks/{}", id), &ann, json!({ "completed": true }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["completed"], true);

    let tasks = ctx.get("/api/tasks", &ann).await.json();
    assert_eq!(tasks[0]["completed"], true);
}

#[tokio::test]
async fn test_member_cannot_complete_others_task() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;
    let bob = ctx.cookie_for(&ctx.bob).await;

    let id = ctx
        .post("/api/tasks", &ann, json!({ "title": "Mine" }))
        .await
        .json()["id"]
        .as_i64()
        .unwrap();

    let response = ctx
        .patch(&format!("/api/tasks/{}", id), &bob, json!({ "completed": true }))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let task = ctx.storage.get_task(id as i32).await.unwrap().unwrap();
    assert!(!task.completed);
}

#[tokio::test]
async fn test_admin_completes_any_task() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;
    let admin = ctx.cookie_for(&ctx.admin).await;

    let id = ctx
        .post("/api/tasks", &ann, json!({ "title": "Mine" }))
        .await
        .json()["id"]
        .as_i64()
        .unwrap();

    let response = ctx
        .patch(&format!("/api/tasks/{}", id), &admin, json!({ "completed": true }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_missing_task_is_404() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;

    let response = ctx
        .patch("/api/tasks/4242", &ann, json!({ "completed": true }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_title_is_422() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;

    let response = ctx.post("/api/tasks", &ann, json!({ "title": "" })).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_admin_task_listing() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;
    let bob = ctx.cookie_for(&ctx.bob).await;
    let admin = ctx.cookie_for(&ctx.admin).await;

    ctx.post("/api/tasks", &ann, json!({ "title": "A" })).await;
    ctx.post("/api/tasks", &bob, json!({ "title": "B" })).await;

    let all = ctx.get("/api/admin/tasks", &admin).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.json().as_array().unwrap().len(), 2);

    assert_eq!(
        ctx.get("/api/admin/tasks", &ann).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_moderator_approves_task() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;
    let moderator = ctx.cookie_for(&ctx.moderator).await;

    let id = ctx
        .post("/api/tasks", &ann, json!({ "title": "Essay" }))
        .await
        .json()["id"]
        .as_i64()
        .unwrap();

    let response = ctx
        .post(
            &format!("/api/tasks/{}/approve", id),
            &moderator,
            json!({ "note": "Well done" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let task = response.json();
    assert_eq!(task["approved"], true);
    assert_eq!(task["approvedBy"], ctx.moderator.id);
    assert_eq!(task["approvalNote"], "Well done");

    // Members cannot approve, not even their own task
    let response = ctx
        .post(&format!("/api/tasks/{}/approve", id), &ann, json!({ "note": "me" }))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_approve_missing_task_is_404() {
    let ctx = TestContext::new().await;
    let moderator = ctx.cookie_for(&ctx.moderator).await;

    let response = ctx
        .post("/api/tasks/77/approve", &moderator, json!({ "note": "ok" }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
