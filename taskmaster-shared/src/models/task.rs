/// Task model and database operations
///
/// A task is created by one user and may be assigned to another. Only the
/// creator may change or delete it; the creator and the assignee may read it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('open', 'in_progress', 'completed', 'closed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'urgent');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'open',
///     priority task_priority NOT NULL,
///     due_date DATE,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     completed_at TIMESTAMPTZ
/// );
/// ```
///
/// # Listing
///
/// [`TaskQuery`] turns the caller's identity and optional query parameters into
/// a [`Filter`]. Every listing is restricted to tasks the caller created or is
/// assigned to; the optional parameters narrow that further.
///
/// # Example
///
/// ```no_run
/// use taskmaster_shared::models::task::{Task, TaskQuery, TaskStatus};
/// use taskmaster_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(me: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let query = TaskQuery {
///     viewer: me,
///     assigned_to_me: true,
///     status: Some(TaskStatus::InProgress),
///     search: Some("invoice".to_string()),
/// };
///
/// let filter = query.to_filter();
/// let tasks = Task::list(&pool, &filter).await?;
/// let total = Task::count(&pool, &filter).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::query::{Changeset, Filter, Predicate};

const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, assigned_to, \
                            created_by, created_at, updated_at, completed_at";

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Completed,
    Closed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Closed => "closed",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    pub description: Option<String>,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    pub due_date: Option<NaiveDate>,

    /// Assignee; cleared automatically if that user is deleted
    pub assigned_to: Option<Uuid>,

    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Set the first time the task enters `completed`, cleared when it leaves
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Whether `user_id` may read this task
    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.created_by == user_id || self.assigned_to == Some(user_id)
    }
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
}

/// Partial update of a task
///
/// `None` leaves a column untouched. For the nullable columns, `Some(None)`
/// clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub assigned_to: Option<Option<Uuid>>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.assigned_to.is_none()
    }

    /// Column assignments for the present fields
    ///
    /// A status change also maintains `completed_at`: entering `completed`
    /// stamps it once, any other status clears it.
    pub fn to_changeset(&self) -> Changeset {
        let mut changes = Changeset::new();

        if let Some(title) = &self.title {
            changes.set("title", title.as_str());
        }
        if let Some(description) = &self.description {
            changes.set("description", description.clone());
        }
        if let Some(status) = self.status {
            changes.set("status", status);
            if status == TaskStatus::Completed {
                changes.set_expr("completed_at", "COALESCE(completed_at, NOW())");
            } else {
                changes.set_expr("completed_at", "NULL");
            }
        }
        if let Some(priority) = self.priority {
            changes.set("priority", priority);
        }
        if let Some(due_date) = self.due_date {
            changes.set("due_date", due_date);
        }
        if let Some(assigned_to) = self.assigned_to {
            changes.set("assigned_to", assigned_to);
        }

        changes
    }
}

/// Listing parameters for one caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    /// The authenticated user; only their created or assigned tasks are listed
    pub viewer: Uuid,

    /// Restrict to tasks assigned to the viewer
    pub assigned_to_me: bool,

    pub status: Option<TaskStatus>,

    /// Case-insensitive substring of title or description
    pub search: Option<String>,
}

impl TaskQuery {
    pub fn to_filter(&self) -> Filter {
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| {
                Predicate::any_of(vec![
                    Predicate::contains("title", term),
                    Predicate::contains("description", term),
                ])
            });

        Filter::new()
            .and(Predicate::any_of(vec![
                Predicate::eq("created_by", self.viewer),
                Predicate::eq("assigned_to", self.viewer),
            ]))
            .and_maybe(
                self.assigned_to_me
                    .then(|| Predicate::eq("assigned_to", self.viewer)),
            )
            .and_maybe(self.status.map(|status| Predicate::eq("status", status)))
            .and_maybe(search)
    }
}

impl Task {
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (title, description, status, priority, due_date, assigned_to, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.assigned_to)
            .bind(data.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Creator of a task, or `None` if the task does not exist
    pub async fn owner_of(pool: &PgPool, id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT created_by FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tasks WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Tasks matching `filter`, newest first
    pub async fn list(pool: &PgPool, filter: &Filter) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM tasks", TASK_COLUMNS));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY created_at DESC");

        qb.build_query_as::<Task>().fetch_all(pool).await
    }

    pub async fn count(pool: &PgPool, filter: &Filter) -> Result<i64, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM tasks");
        filter.push_where(&mut qb);

        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }

    /// Applies a partial update in a single statement
    ///
    /// Returns `None` if the task does not exist. An empty update returns the
    /// task unchanged.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: &UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        match data.to_changeset().into_update("tasks", id, TASK_COLUMNS) {
            Some(mut qb) => qb.build_query_as::<Task>().fetch_optional(pool).await,
            None => Self::find_by_id(pool, id).await,
        }
    }

    /// Deletes a task with its comments and attachments
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
