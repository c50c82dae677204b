/// Attachment endpoints
///
/// Attachments are metadata records pointing at a file stored elsewhere
/// (`file_url`); no file content passes through the API.
///
/// # Endpoints
///
/// - `POST /api/v1/attachments` - Record an attachment on a task
/// - `GET /api/v1/attachments/task/:task_id` - Attachments of a task
/// - `GET /api/v1/attachments/:attachment_id` - One attachment
/// - `DELETE /api/v1/attachments/:attachment_id` - Delete own attachment

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use taskmaster_shared::{
    auth::{authorization::require_ownership, middleware::CurrentUser},
    db::is_foreign_key_violation,
    models::attachment::{Attachment, CreateAttachment},
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, AuthzResultExt},
    extract::{UuidPath, ValidatedJson},
    routes::{comments::ensure_task_exists, users::MessageResponse},
};

const NOT_FOUND: &str = "Attachment not found";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAttachmentRequest {
    pub task_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "File name must be 1 to 255 characters"))]
    pub file_name: String,

    #[validate(url(message = "Invalid file URL"))]
    pub file_url: String,

    #[validate(range(min = 1, message = "File size must be positive"))]
    pub file_size: i64,

    #[validate(length(min = 1, max = 100, message = "MIME type must be 1 to 100 characters"))]
    pub mime_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttachmentResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub attachment: Attachment,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttachmentsResponse {
    pub success: bool,
    pub attachments: Vec<Attachment>,
}

pub async fn create_attachment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<CreateAttachmentRequest>,
) -> ApiResult<(StatusCode, Json<AttachmentResponse>)> {
    ensure_task_exists(&state, req.task_id).await?;

    let attachment = Attachment::create(
        &state.db,
        CreateAttachment {
            task_id: req.task_id,
            uploaded_by: user.id,
            file_name: req.file_name,
            file_url: req.file_url,
            file_size: req.file_size,
            mime_type: req.mime_type,
        },
    )
    .await
    .map_err(|err| {
        if is_foreign_key_violation(&err) {
            ApiError::NotFound("Task not found".to_string())
        } else {
            err.into()
        }
    })?;

    info!(
        attachment_id = %attachment.id,
        task_id = %attachment.task_id,
        size = attachment.file_size,
        "Attachment recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(AttachmentResponse {
            success: true,
            message: Some("Attachment uploaded successfully".to_string()),
            attachment,
        }),
    ))
}

/// Attachments of a task; empty when the task is gone
pub async fn list_task_attachments(
    State(state): State<AppState>,
    UuidPath(task_id): UuidPath,
) -> ApiResult<Json<AttachmentsResponse>> {
    let attachments = Attachment::list_for_task(&state.db, task_id).await?;

    Ok(Json(AttachmentsResponse {
        success: true,
        attachments,
    }))
}

pub async fn get_attachment(
    State(state): State<AppState>,
    UuidPath(attachment_id): UuidPath,
) -> ApiResult<Json<AttachmentResponse>> {
    let attachment = Attachment::find_by_id(&state.db, attachment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(AttachmentResponse {
        success: true,
        message: None,
        attachment,
    }))
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    UuidPath(attachment_id): UuidPath,
) -> ApiResult<Json<MessageResponse>> {
    require_ownership(&user, Attachment::uploader_of(&state.db, attachment_id).await?)
        .or_deny(NOT_FOUND, "You can only delete your own attachments")?;

    if !Attachment::delete(&state.db, attachment_id).await? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }

    info!(attachment_id = %attachment_id, user_id = %user.id, "Attachment deleted");

    Ok(Json(MessageResponse::new("Attachment deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateAttachmentRequest {
        CreateAttachmentRequest {
            task_id: Uuid::new_v4(),
            file_name: "brief.pdf".to_string(),
            file_url: "https://files.example.com/brief.pdf".to_string(),
            file_size: 1024,
            mime_type: "application/pdf".to_string(),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_each_rule_reported() {
        let req = CreateAttachmentRequest {
            file_name: String::new(),
            file_url: "not a url".to_string(),
            file_size: 0,
            mime_type: "m".repeat(101),
            ..request()
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields.len(), 4);
        assert!(fields.contains_key("file_size"));
        assert!(fields.contains_key("file_url"));
    }
}
