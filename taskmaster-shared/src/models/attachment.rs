/// Task attachments
///
/// Attachments record metadata about a file stored elsewhere (the service
/// never receives file bytes, only the URL). They are removed with their task
/// and only the uploader may delete one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE attachments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     uploaded_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     file_name VARCHAR(255) NOT NULL,
///     file_url VARCHAR(2048) NOT NULL,
///     file_size BIGINT NOT NULL CHECK (file_size > 0),
///     mime_type VARCHAR(100) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const ATTACHMENT_COLUMNS: &str = "id, task_id, uploaded_by, file_name, file_url, file_size, \
                                  mime_type, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub uploaded_by: Uuid,
    pub file_name: String,
    pub file_url: String,

    /// Size in bytes
    pub file_size: i64,

    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAttachment {
    pub task_id: Uuid,
    pub uploaded_by: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub file_size: i64,
    pub mime_type: String,
}

impl Attachment {
    pub async fn create(pool: &PgPool, data: CreateAttachment) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO attachments (task_id, uploaded_by, file_name, file_url, file_size, mime_type)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            ATTACHMENT_COLUMNS
        );

        sqlx::query_as::<_, Attachment>(&query)
            .bind(data.task_id)
            .bind(data.uploaded_by)
            .bind(data.file_name)
            .bind(data.file_url)
            .bind(data.file_size)
            .bind(data.mime_type)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM attachments WHERE id = $1", ATTACHMENT_COLUMNS);

        sqlx::query_as::<_, Attachment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Uploader of an attachment, or `None` if it does not exist
    pub async fn uploader_of(pool: &PgPool, id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT uploaded_by FROM attachments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Attachments of a task, newest first
    pub async fn list_for_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM attachments WHERE task_id = $1 ORDER BY created_at DESC",
            ATTACHMENT_COLUMNS
        );

        sqlx::query_as::<_, Attachment>(&query)
            .bind(task_id)
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
