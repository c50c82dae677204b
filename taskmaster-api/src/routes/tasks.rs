/// Task endpoints
///
/// A task is visible to its creator and its assignee. Only the creator may
/// change or delete it.
///
/// # Endpoints
///
/// - `POST /api/v1/tasks` - Create a task
/// - `GET /api/v1/tasks?assignedTo=me&status=&search=` - Filtered listing
/// - `GET /api/v1/tasks/:task_id` - One task
/// - `PUT /api/v1/tasks/:task_id` - Partial update
/// - `DELETE /api/v1/tasks/:task_id` - Delete with comments and attachments

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use taskmaster_shared::{
    auth::{authorization::require_ownership, middleware::CurrentUser},
    models::{
        task::{CreateTask, Task, TaskPriority, TaskQuery, TaskStatus, UpdateTask},
        user::User,
    },
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, AuthzResultExt},
    extract::{double_option, empty_string_as_none, UuidPath, ValidatedJson, ValidatedQuery},
    routes::users::MessageResponse,
};

const NOT_FOUND: &str = "Task not found";

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be less than 2000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    pub priority: TaskPriority,

    /// ISO date, `YYYY-MM-DD`
    pub due_date: Option<NaiveDate>,

    pub assigned_to: Option<Uuid>,
}

/// Partial task update; `description`, `due_date` and `assigned_to` accept
/// `null` to clear
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 2000, message = "Description must be less than 2000 characters"))]
    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(req: UpdateTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            assigned_to: req.assigned_to,
        }
    }
}

/// The only supported value of `assignedTo`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignedTo {
    Me,
}

/// Listing filters
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListTasksQuery {
    #[serde(
        rename = "assignedTo",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub assigned_to: Option<AssignedTo>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<TaskStatus>,

    #[validate(length(max = 255, message = "Search term must be less than 255 characters"))]
    pub search: Option<String>,
}

impl ListTasksQuery {
    pub fn for_viewer(self, viewer: Uuid) -> TaskQuery {
        TaskQuery {
            viewer,
            assigned_to_me: self.assigned_to == Some(AssignedTo::Me),
            status: self.status,
            search: self.search,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub task: Task,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TasksResponse {
    pub success: bool,
    pub tasks: Vec<Task>,
    pub total: i64,
}

async fn ensure_assignee_exists(state: &AppState, assignee: Option<Uuid>) -> ApiResult<()> {
    if let Some(user_id) = assignee {
        if !User::exists(&state.db, user_id).await? {
            return Err(ApiError::ValidationError(
                "Assigned user does not exist".to_string(),
            ));
        }
    }
    Ok(())
}

/// Create a task owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or the assignee does not exist
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    ensure_assignee_exists(&state, req.assigned_to).await?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            assigned_to: req.assigned_to,
            created_by: user.id,
        },
    )
    .await?;

    info!(task_id = %task.id, user_id = %user.id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            success: true,
            message: Some("Task created successfully".to_string()),
            task,
        }),
    ))
}

/// List the caller's tasks, newest first
///
/// Filters are ANDed; `search` matches title or description, ignoring case.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ValidatedQuery(query): ValidatedQuery<ListTasksQuery>,
) -> ApiResult<Json<TasksResponse>> {
    let filter = query.for_viewer(user.id).to_filter();

    let tasks = Task::list(&state.db, &filter).await?;
    let total = Task::count(&state.db, &filter).await?;

    Ok(Json(TasksResponse {
        success: true,
        tasks,
        total,
    }))
}

/// Get one task the caller created or is assigned to
pub async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    UuidPath(task_id): UuidPath,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    if !task.is_visible_to(user.id) {
        return Err(ApiError::Forbidden(
            "You do not have access to this task".to_string(),
        ));
    }

    Ok(Json(TaskResponse {
        success: true,
        message: None,
        task,
    }))
}

/// Update the present fields of a task the caller created
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, no fields given, or the new
///   assignee does not exist
/// - `403 Forbidden`: Caller did not create the task
/// - `404 Not Found`: Task does not exist
pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    UuidPath(task_id): UuidPath,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let changes = UpdateTask::from(req);
    if changes.is_empty() {
        return Err(ApiError::ValidationError("No fields to update".to_string()));
    }

    require_ownership(&user, Task::owner_of(&state.db, task_id).await?)
        .or_deny(NOT_FOUND, "You can only update tasks you created")?;

    ensure_assignee_exists(&state, changes.assigned_to.flatten()).await?;

    let task = Task::update(&state.db, task_id, &changes)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    info!(
        task_id = %task.id,
        columns = ?changes.to_changeset().columns(),
        "Task updated"
    );

    Ok(Json(TaskResponse {
        success: true,
        message: Some("Task updated successfully".to_string()),
        task,
    }))
}

/// Delete a task the caller created
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    UuidPath(task_id): UuidPath,
) -> ApiResult<Json<MessageResponse>> {
    require_ownership(&user, Task::owner_of(&state.db, task_id).await?)
        .or_deny(NOT_FOUND, "You can only delete tasks you created")?;

    if !Task::delete(&state.db, task_id).await? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }

    info!(task_id = %task_id, user_id = %user.id, "Task deleted");

    Ok(Json(MessageResponse::new("Task deleted successfully")))
}
