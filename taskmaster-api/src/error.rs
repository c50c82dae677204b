/// Error handling for the API server
///
/// Handlers return `ApiResult<T>`; every `ApiError` renders itself as a JSON
/// response with the matching status code.
///
/// Two envelopes exist:
///
/// - request validation failures (from the extractors in [`crate::extract`]):
///   `{"success": false, "message": "Validation failed", "errors": [{field, message}]}`
/// - everything else: `{"message", "title", "stackTrace"}`, where `stackTrace`
///   carries the error's debug representation outside production and is
///   `null` in production
///
/// # Example
///
/// ```
/// use taskmaster_api::error::{ApiError, ApiResult};
///
/// fn find(found: bool) -> ApiResult<&'static str> {
///     if !found {
///         return Err(ApiError::NotFound("Task not found".to_string()));
///     }
///     Ok("task")
/// }
///
/// assert!(find(false).is_err());
/// ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use taskmaster_shared::auth::{
    authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError,
};
use taskmaster_shared::db::is_unique_violation;

use crate::notify::NotifyError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

/// Controls whether error responses carry `stackTrace`
///
/// Set once from configuration when the router is built.
pub fn expose_internal_details(expose: bool) {
    EXPOSE_DETAILS.store(expose, Ordering::Relaxed);
}

fn details_exposed() -> bool {
    EXPOSE_DETAILS.load(Ordering::Relaxed)
}

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Request failed schema validation (400, validation envelope)
    InvalidPayload(Vec<ValidationErrorDetail>),

    /// Semantically invalid request, e.g. "No fields to update" (400)
    ValidationError(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate email
    Conflict(String),

    /// Server error whose message is safe to show (500)
    ServerError(String),

    /// Unexpected failure (500); the detail is logged, not shown
    Internal(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,

    pub title: String,

    #[serde(rename = "stackTrace")]
    pub stack_trace: Option<String>,
}

/// Validation failure envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationFailedResponse {
    pub success: bool,
    pub message: String,
    pub errors: Vec<ValidationErrorDetail>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServerError(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ApiError::InvalidPayload(_) | ApiError::ValidationError(_) => "Validation Failed",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::NotFound(_) => "Not Found",
            ApiError::Conflict(_) => "Conflict",
            ApiError::ServerError(_) | ApiError::Internal(_) => "Server Error",
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::InvalidPayload(_) => "Validation failed".to_string(),
            ApiError::ValidationError(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServerError(msg) => msg.clone(),
            ApiError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidPayload(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ServerError(msg) => write!(f, "Server error: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let ApiError::InvalidPayload(errors) = self {
            let body = Json(ValidationFailedResponse {
                success: false,
                message: "Validation failed".to_string(),
                errors,
            });
            return (status, body).into_response();
        }

        match &self {
            ApiError::Internal(detail) | ApiError::ServerError(detail) => {
                tracing::error!(error = %detail, "Request failed with server error");
            }
            other => {
                tracing::debug!(error = %other, "Request rejected");
            }
        }

        let body = Json(ErrorResponse {
            message: self.public_message(),
            title: self.title().to_string(),
            stack_trace: details_exposed().then(|| format!("{:?}", self)),
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            return ApiError::Conflict("Resource already exists".to_string());
        }

        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Authentication gate failures
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => {
                ApiError::Unauthorized("User is not authorized or token is missing".to_string())
            }
            AuthError::NotConfigured => ApiError::ServerError(
                "Internal server error: access token secret is not defined".to_string(),
            ),
            AuthError::InvalidToken(_) | AuthError::UnknownUser(_) => {
                ApiError::Unauthorized("User is not authorized".to_string())
            }
            AuthError::Database(e) => e.into(),
        }
    }
}

/// Convert authorization errors to API errors
///
/// Handlers that want resource-specific messages use [`AuthzResultExt::or_deny`].
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            AuthzError::Forbidden => {
                ApiError::Forbidden("Not authorized to access this resource".to_string())
            }
            AuthzError::Database(e) => e.into(),
        }
    }
}

/// Attaches resource-specific messages to an ownership check
pub trait AuthzResultExt<T> {
    fn or_deny(self, not_found: &str, forbidden: &str) -> ApiResult<T>;
}

impl<T> AuthzResultExt<T> for Result<T, AuthzError> {
    fn or_deny(self, not_found: &str, forbidden: &str) -> ApiResult<T> {
        self.map_err(|err| match err {
            AuthzError::NotFound => ApiError::NotFound(not_found.to_string()),
            AuthzError::Forbidden => ApiError::Forbidden(forbidden.to_string()),
            AuthzError::Database(e) => e.into(),
        })
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

/// Token issuing failures; verification failures go through the gate
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::Internal(format!("Token operation failed: {}", err))
    }
}

impl From<NotifyError> for ApiError {
    fn from(err: NotifyError) -> Self {
        tracing::error!(error = %err, "Invitation email failed");
        ApiError::ServerError("Failed to send invitation email".to_string())
    }
}
