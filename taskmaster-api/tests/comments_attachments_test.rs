/// Comment and attachment tests (require DATABASE_URL)

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_comment_lifecycle() {
    let Some(ctx) = TestContext::new().await else { return };
    let author = ctx.user("commenter").await;
    let other = ctx.user("reader").await;
    let task_id = ctx.task(&author, json!({ "title": "t", "priority": "low" })).await;

    let created = ctx
        .post(
            "/api/v1/comments",
            &author,
            json!({ "task_id": task_id, "content": "First!" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["message"], "Comment created successfully");
    assert_eq!(created.body["comment"]["user_id"], author.id.to_string());
    let comment_id = created.body["comment"]["id"].as_str().unwrap().to_string();

    ctx.post(
        "/api/v1/comments",
        &other,
        json!({ "task_id": task_id, "content": "Second" }),
    )
    .await;

    let listed = ctx
        .get(&format!("/api/v1/comments/task/{}", task_id), &other)
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    let contents: Vec<&str> = listed.body["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["Second", "First!"]);

    let uri = format!("/api/v1/comments/{}", comment_id);

    let not_mine = ctx.put(&uri, &other, json!({ "content": "hijack" })).await;
    assert_eq!(not_mine.status, StatusCode::FORBIDDEN);
    assert_eq!(not_mine.body["message"], "You can only edit your own comments");

    let edited = ctx.put(&uri, &author, json!({ "content": "Edited" })).await;
    assert_eq!(edited.status, StatusCode::OK);
    assert_eq!(edited.body["message"], "Comment updated successfully");
    assert_eq!(edited.body["comment"]["content"], "Edited");

    let not_mine = ctx.delete(&uri, &other).await;
    assert_eq!(not_mine.status, StatusCode::FORBIDDEN);
    assert_eq!(
        not_mine.body["message"],
        "You can only delete your own comments"
    );

    let deleted = ctx.delete(&uri, &author).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Comment deleted successfully");

    let gone = ctx.put(&uri, &author, json!({ "content": "again" })).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.body["message"], "Comment not found");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_comment_on_missing_task() {
    let Some(ctx) = TestContext::new().await else { return };
    let user = ctx.user("orphan").await;

    let created = ctx
        .post(
            "/api/v1/comments",
            &user,
            json!({ "task_id": Uuid::new_v4(), "content": "hello" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::NOT_FOUND);
    assert_eq!(created.body["message"], "Task not found");

    let listed = ctx
        .get(&format!("/api/v1/comments/task/{}", Uuid::new_v4()), &user)
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["comments"], json!([]));

    let empty = ctx
        .post(
            "/api/v1/comments",
            &user,
            json!({ "task_id": Uuid::new_v4(), "content": "" }),
        )
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_attachment_lifecycle() {
    let Some(ctx) = TestContext::new().await else { return };
    let uploader = ctx.user("uploader").await;
    let other = ctx.user("viewer").await;
    let task_id = ctx.task(&uploader, json!({ "title": "t", "priority": "low" })).await;

    let created = ctx
        .post(
            "/api/v1/attachments",
            &uploader,
            json!({
                "task_id": task_id,
                "file_name": "design.pdf",
                "file_url": "https://files.example.com/design.pdf",
                "file_size": 52_340,
                "mime_type": "application/pdf",
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["message"], "Attachment uploaded successfully");
    assert_eq!(created.body["attachment"]["file_size"], 52_340);
    let attachment_id = created.body["attachment"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/attachments/{}", attachment_id);

    let listed = ctx
        .get(&format!("/api/v1/attachments/task/{}", task_id), &other)
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["attachments"].as_array().unwrap().len(), 1);

    let fetched = ctx.get(&uri, &other).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["attachment"]["file_name"], "design.pdf");

    let not_mine = ctx.delete(&uri, &other).await;
    assert_eq!(not_mine.status, StatusCode::FORBIDDEN);
    assert_eq!(
        not_mine.body["message"],
        "You can only delete your own attachments"
    );

    let deleted = ctx.delete(&uri, &uploader).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Attachment deleted successfully");

    let gone = ctx.get(&uri, &uploader).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.body["message"], "Attachment not found");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_attachment_validation() {
    let Some(ctx) = TestContext::new().await else { return };
    let user = ctx.user("badfile").await;
    let task_id = ctx.task(&user, json!({ "title": "t", "priority": "low" })).await;

    let response = ctx
        .post(
            "/api/v1/attachments",
            &user,
            json!({
                "task_id": task_id,
                "file_name": "x",
                "file_url": "not a url",
                "file_size": 0,
                "mime_type": "text/plain",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = response.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["file_size", "file_url"]);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_deleting_task_removes_comments_and_attachments() {
    let Some(ctx) = TestContext::new().await else { return };
    let user = ctx.user("cascade").await;
    let task_id = ctx.task(&user, json!({ "title": "t", "priority": "low" })).await;

    ctx.post(
        "/api/v1/comments",
        &user,
        json!({ "task_id": task_id, "content": "note" }),
    )
    .await;
    ctx.post(
        "/api/v1/attachments",
        &user,
        json!({
            "task_id": task_id,
            "file_name": "a.txt",
            "file_url": "https://files.example.com/a.txt",
            "file_size": 1,
            "mime_type": "text/plain",
        }),
    )
    .await;

    let deleted = ctx.delete(&format!("/api/v1/tasks/{}", task_id), &user).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let comments = ctx
        .get(&format!("/api/v1/comments/task/{}", task_id), &user)
        .await;
    assert_eq!(comments.status, StatusCode::OK);
    assert_eq!(comments.body["success"], true);
    assert_eq!(comments.body["comments"], json!([]));

    let attachments = ctx
        .get(&format!("/api/v1/attachments/task/{}", task_id), &user)
        .await;
    assert_eq!(attachments.status, StatusCode::OK);
    assert_eq!(attachments.body["attachments"], json!([]));

    let remaining: i64 = sqlx::query_scalar(
        "SELECT (SELECT COUNT(*) FROM comments WHERE task_id = $1) \
         + (SELECT COUNT(*) FROM attachments WHERE task_id = $1)",
    )
    .bind(task_id)
    .fetch_one(&ctx.db)
    .await
    .unwrap();
    assert_eq!(remaining, 0);

    ctx.cleanup().await;
}
