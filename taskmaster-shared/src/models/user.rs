/// User model and database operations
///
/// Users register with an email and password and own teams, tasks, comments and
/// attachments. Email addresses are normalized (trimmed and lowercased) before
/// they are stored or looked up, so uniqueness is case-insensitive.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('user', 'admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     firstname VARCHAR(64) NOT NULL,
///     lastname VARCHAR(64) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     bio TEXT,
///     avatar_url VARCHAR(2048),
///     timezone VARCHAR(64),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskmaster_shared::models::user::{CreateUser, User};
/// use taskmaster_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "Ada@Example.com".to_string(),
///     firstname: "Ada".to_string(),
///     lastname: "Lovelace".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// assert_eq!(user.email, "ada@example.com");
/// let found = User::find_by_email(&pool, "ADA@example.com").await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::query::Changeset;
use crate::normalize_email;

const USER_COLUMNS: &str = "id, email, firstname, lastname, password_hash, role, bio, avatar_url, \
                            timezone, created_at, updated_at";

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

/// A registered account
///
/// The password hash is read from the database but never serialized, so a
/// `User` can be returned from a handler as-is.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Normalized (trimmed, lowercase) email address
    pub email: String,

    pub firstname: String,

    pub lastname: String,

    /// Argon2id PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: UserRole,

    pub bio: Option<String>,

    pub avatar_url: Option<String>,

    /// IANA timezone name as entered by the user
    pub timezone: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Raw email; normalized on insert
    pub email: String,

    pub firstname: String,

    pub lastname: String,

    /// Argon2id hash (NOT the plaintext password)
    pub password_hash: String,
}

/// Profile fields a user may change about themselves
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateProfile {
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub timezone: Option<String>,
}

impl UpdateProfile {
    pub fn is_empty(&self) -> bool {
        self.avatar_url.is_none() && self.bio.is_none() && self.timezone.is_none()
    }

    fn into_changeset(self) -> Changeset {
        let mut changes = Changeset::new();
        if let Some(avatar_url) = self.avatar_url {
            changes.set("avatar_url", avatar_url);
        }
        if let Some(bio) = self.bio {
            changes.set("bio", bio);
        }
        if let Some(timezone) = self.timezone {
            changes.set("timezone", timezone);
        }
        changes
    }
}

impl User {
    /// "Firstname Lastname", used when addressing other people about this user
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    /// Inserts a new user with role `user`
    ///
    /// # Errors
    ///
    /// Returns a database error with SQLSTATE `23505` if the normalized email
    /// is already taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, firstname, lastname, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(&data.email))
            .bind(data.firstname)
            .bind(data.lastname)
            .bind(data.password_hash)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email; the argument is normalized before lookup
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }

    /// Whether a user with this ID exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Applies a partial profile update
    ///
    /// An empty update leaves the row untouched and returns it as stored.
    /// Returns `None` if the user does not exist.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        match data.into_changeset().into_update("users", id, USER_COLUMNS) {
            Some(mut qb) => qb.build_query_as::<User>().fetch_optional(pool).await,
            None => Self::find_by_id(pool, id).await,
        }
    }

    /// Deletes a user; owned rows cascade
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
