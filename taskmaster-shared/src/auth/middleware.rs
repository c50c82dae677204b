/// Request authentication
///
/// [`authenticate`] turns a request's headers into the [`CurrentUser`] that
/// handlers receive. It reads the `accessToken` cookie, verifies the token and
/// then loads the user again, so a deleted account stops working immediately
/// even while its token is unexpired.
///
/// The HTTP layer wraps this in an axum middleware and inserts the result
/// into the request extensions.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::cookie::access_token;
use super::jwt::{verify_token, JwtError};
use crate::models::user::{User, UserRole};

/// The authenticated caller, as stored in the database at request time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            firstname: user.firstname,
            lastname: user.lastname,
            role: user.role,
        }
    }
}

/// Reasons a request fails authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `accessToken` cookie
    #[error("access token missing")]
    MissingToken,

    /// The service has no signing secret configured
    #[error("token signing secret is not configured")]
    NotConfigured,

    /// Token failed verification
    #[error("invalid access token: {0}")]
    InvalidToken(#[from] JwtError),

    /// Token is valid but its user no longer exists
    #[error("user {0} no longer exists")]
    UnknownUser(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Authenticates a request from its headers
///
/// Checks, in order: the cookie is present, a secret is configured, the token
/// verifies, and the user still exists.
pub async fn authenticate(
    pool: &PgPool,
    secret: Option<&str>,
    headers: &HeaderMap,
) -> Result<CurrentUser, AuthError> {
    let token = access_token(headers).ok_or(AuthError::MissingToken)?;
    let secret = secret.ok_or(AuthError::NotConfigured)?;

    let claims = verify_token(&token, secret)?;

    let user = User::find_by_id(pool, claims.sub)
        .await?
        .ok_or(AuthError::UnknownUser(claims.sub))?;

    debug!(user_id = %user.id, "Request authenticated");
    Ok(user.into())
}
