/// Team model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// A user can see a team if they created it or are a member of it. The creator
/// is inserted as an `owner` member in the same transaction as the team, so in
/// practice membership alone decides access; the creator check remains for
/// rows written before that rule.
///
/// # Example
///
/// ```no_run
/// use taskmaster_shared::models::team::{CreateTeam, Team};
/// use taskmaster_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(me: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let team = Team::create(&pool, CreateTeam {
///     name: "Platform".to_string(),
///     description: None,
///     created_by: me,
/// }).await?;
///
/// let mine = Team::list_for_user(&pool, me).await?;
/// assert!(mine.iter().any(|t| t.id == team.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::membership::{TeamMember, TeamRole};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTeam {
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
}

impl Team {
    /// Creates a team and makes its creator the owner
    ///
    /// Both rows are written in one transaction.
    pub async fn create(pool: &PgPool, data: CreateTeam) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (name, description, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_by, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.created_by)
        .fetch_one(&mut *tx)
        .await?;

        TeamMember::add(&mut *tx, team.id, team.created_by, TeamRole::Owner).await?;

        tx.commit().await?;

        debug!(team_id = %team.id, owner = %team.created_by, "Team created");
        Ok(team)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, description, created_by, created_at, updated_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// The team, if it exists and `user_id` created it or belongs to it
    ///
    /// A missing team and a team the user cannot see are indistinguishable.
    pub async fn find_accessible(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            SELECT t.id, t.name, t.description, t.created_by, t.created_at, t.updated_at
            FROM teams t
            WHERE t.id = $1
              AND (t.created_by = $2
                   OR EXISTS (SELECT 1 FROM team_members m
                              WHERE m.team_id = t.id AND m.user_id = $2))
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Teams `user_id` created or belongs to, newest first, without duplicates
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            SELECT DISTINCT t.id, t.name, t.description, t.created_by, t.created_at, t.updated_at
            FROM teams t
            LEFT JOIN team_members m ON m.team_id = t.id
            WHERE t.created_by = $1 OR m.user_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
