/// Support tickets and moderator triage

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_member_opens_and_lists_tickets() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;
    let bob = ctx.cookie_for(&ctx.bob).await;

    let response = ctx
        .post(
            "/api/tickets",
            &ann,
            json!({
                "subject": "Cannot upload",
                "description": "The form spins forever",
                "attachmentUrl": "https://files.example/spin.gif"
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let ticket = response.json();
    assert_eq!(ticket["status"], "open");
    assert_eq!(ticket["userId"], ctx.ann.id);
    assert!(ticket["assignedTo"].is_null());

    assert_eq!(ctx.get("/api/tickets", &ann).await.json().as_array().unwrap().len(), 1);
    assert!(ctx.get("/api/tickets", &bob).await.json().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_ticket_requires_subject_and_description() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;

    let response = ctx
        .post("/api/tickets", &ann, json!({ "subject": "", "description": "" }))
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let details = response.json()["details"].as_array().unwrap().len();
    assert_eq!(details, 2);
}

#[tokio::test]
async fn test_moderator_triages_ticket() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;
    let moderator = ctx.cookie_for(&ctx.moderator).await;

    let id = ctx
        .post("/api/tickets", &ann, json!({ "subject": "Help", "description": "Please" }))
        .await
        .json()["id"]
        .as_i64()
        .unwrap();

    let all = ctx.get("/api/admin/tickets", &moderator).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.json().as_array().unwrap().len(), 1);

    let uri = format!("/api/admin/tickets/{}", id);

    let updated = ctx
        .patch(
            &uri,
            &moderator,
            json!({ "status": "in_progress", "assignedTo": ctx.moderator.id }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json()["status"], "in_progress");
    assert_eq!(updated.json()["assignedTo"], ctx.moderator.id);

    let unassigned = ctx.patch(&uri, &moderator, json!({ "assignedTo": null })).await.json();
    assert!(unassigned["assignedTo"].is_null());
    assert_eq!(unassigned["status"], "in_progress");

    let closed = ctx.patch(&uri, &moderator, json!({ "status": "closed" })).await.json();
    assert_eq!(closed["status"], "closed");

    // The member sees the new status
    let mine = ctx.get("/api/tickets", &ann).await.json();
    assert_eq!(mine[0]["status"], "closed");
}

#[tokio::test]
async fn test_admin_can_triage() {
    let ctx = TestContext::new().await;
    let admin = ctx.cookie_for(&ctx.admin).await;

    assert_eq!(ctx.get("/api/admin/tickets", &admin).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_member_cannot_triage() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;

    let id = ctx
        .post("/api/tickets", &ann, json!({ "subject": "Help", "description": "Please" }))
        .await
        .json()["id"]
        .as_i64()
        .unwrap();

    assert_eq!(
        ctx.get("/api/admin/tickets", &ann).await.status,
        StatusCode::UNAUTHORIZED
    );

    let response = ctx
        .patch(&format!("/api/admin/tickets/{}", id), &ann, json!({ "status": "closed" }))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_missing_ticket_is_404() {
    let ctx = TestContext::new().await;
    let moderator = ctx.cookie_for(&ctx.moderator).await;

    let response = ctx
        .patch("/api/admin/tickets/404", &moderator, json!({ "status": "closed" }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assign_to_unknown_user_is_400() {
    let ctx = TestContext::new().await;
    let ann = ctx.cookie_for(&ctx.ann).await;
    let moderator = ctx.cookie_for(&ctx.moderator).await;

    let id = ctx
        .post("/api/tickets", &ann, json!({ "subject": "Help", "description": "Please" }))
        .await
        .json()["id"]
        .as_i64()
        .unwrap();

    let response = ctx
        .patch(
            &format!("/api/admin/tickets/{}", id),
            &moderator,
            json!({ "assignedTo": 999 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
