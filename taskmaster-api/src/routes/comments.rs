/// Comment endpoints
///
/// Any signed-in user may comment on an existing task and read its comments.
/// Only the author may edit or delete a comment. Listing the comments of a
/// deleted or unknown task yields an empty list.
///
/// # Endpoints
///
/// - `POST /api/v1/comments` - Comment on a task
/// - `GET /api/v1/comments/task/:task_id` - Comments on a task, newest first
/// - `PUT /api/v1/comments/:comment_id` - Edit own comment
/// - `DELETE /api/v1/comments/:comment_id` - Delete own comment

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use taskmaster_shared::{
    auth::{authorization::require_ownership, middleware::CurrentUser},
    db::is_foreign_key_violation,
    models::{
        comment::{Comment, CreateComment},
        task::Task,
    },
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, AuthzResultExt},
    extract::{UuidPath, ValidatedJson},
    routes::users::MessageResponse,
};

const NOT_FOUND: &str = "Comment not found";
const TASK_NOT_FOUND: &str = "Task not found";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub task_id: Uuid,

    #[validate(length(min = 1, max = 5000, message = "Comment must be 1 to 5000 characters"))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 5000, message = "Comment must be 1 to 5000 characters"))]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub success: bool,
    pub message: String,
    pub comment: Comment,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentsResponse {
    pub success: bool,
    pub comments: Vec<Comment>,
}

pub(crate) async fn ensure_task_exists(state: &AppState, task_id: Uuid) -> ApiResult<()> {
    if Task::exists(&state.db, task_id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound(TASK_NOT_FOUND.to_string()))
    }
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    ensure_task_exists(&state, req.task_id).await?;

    let comment = Comment::create(
        &state.db,
        CreateComment {
            task_id: req.task_id,
            user_id: user.id,
            content: req.content,
        },
    )
    .await
    .map_err(|err| {
        // Task deleted after the existence check
        if is_foreign_key_violation(&err) {
            ApiError::NotFound(TASK_NOT_FOUND.to_string())
        } else {
            err.into()
        }
    })?;

    info!(comment_id = %comment.id, task_id = %comment.task_id, "Comment created");

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            success: true,
            message: "Comment created successfully".to_string(),
            comment,
        }),
    ))
}

/// Comments on a task, newest first; empty when the task is gone
pub async fn list_task_comments(
    State(state): State<AppState>,
    UuidPath(task_id): UuidPath,
) -> ApiResult<Json<CommentsResponse>> {
    let comments = Comment::list_for_task(&state.db, task_id).await?;

    Ok(Json(CommentsResponse {
        success: true,
        comments,
    }))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    UuidPath(comment_id): UuidPath,
    ValidatedJson(req): ValidatedJson<UpdateCommentRequest>,
) -> ApiResult<Json<CommentResponse>> {
    require_ownership(&user, Comment::author_of(&state.db, comment_id).await?)
        .or_deny(NOT_FOUND, "You can only edit your own comments")?;

    let comment = Comment::update_content(&state.db, comment_id, &req.content)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(CommentResponse {
        success: true,
        message: "Comment updated successfully".to_string(),
        comment,
    }))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    UuidPath(comment_id): UuidPath,
) -> ApiResult<Json<MessageResponse>> {
    require_ownership(&user, Comment::author_of(&state.db, comment_id).await?)
        .or_deny(NOT_FOUND, "You can only delete your own comments")?;

    if !Comment::delete(&state.db, comment_id).await? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }

    info!(comment_id = %comment_id, user_id = %user.id, "Comment deleted");

    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}
