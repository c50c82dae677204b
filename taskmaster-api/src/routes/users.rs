/// User account endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/users/register` - Create an account
/// - `POST /api/v1/users/login` - Verify credentials and set the session cookie
/// - `POST /api/v1/users/logout` - Clear the session cookie
/// - `GET /api/v1/users/me` - The authenticated caller
/// - `PUT /api/v1/users/profile` - Update bio, avatar and timezone

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskmaster_shared::{
    auth::{
        cookie::{clear_session_cookie, session_cookie},
        jwt::{issue_token, Claims},
        middleware::CurrentUser,
        password::{hash_password, verify_dummy_password, verify_password},
    },
    db::is_unique_violation,
    models::user::{CreateUser, UpdateProfile, User},
};
use tracing::{debug, info};
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{trimmed, ValidatedJson},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, max = 64, message = "First name must be 1 to 64 characters"))]
    pub firstname: String,

    #[validate(length(min = 1, max = 64, message = "Last name must be 1 to 64 characters"))]
    pub lastname: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile update request; only present fields change
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(url(message = "Invalid avatar URL"))]
    pub avatar_url: Option<String>,

    #[validate(length(max = 2000, message = "Bio must be less than 2000 characters"))]
    pub bio: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Timezone must be 1 to 64 characters"))]
    pub timezone: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateProfile {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            avatar_url: req.avatar_url,
            bio: req.bio,
            timezone: req.timezone,
        }
    }
}

/// `{success, message, user}`
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub user: User,
}

/// `{success, user}` for the gate's identity
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub success: bool,
    pub user: CurrentUser,
}

/// `{success, message}`
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Register a new account
///
/// The email is stored normalized; registering the same address in a
/// different case is a conflict.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let password_hash = hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            firstname: req.firstname,
            lastname: req.lastname,
            password_hash,
        },
    )
    .await
    .map_err(|err| {
        // Lost a race with a concurrent registration of the same address
        if is_unique_violation(&err) {
            ApiError::Conflict("User with this email already exists".to_string())
        } else {
            err.into()
        }
    })?;

    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            message: Some("User registered successfully".to_string()),
            user,
        }),
    ))
}

/// Log in with email and password
///
/// On success the signed access token is set as the `accessToken` cookie.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Unknown email or wrong password (same message)
/// - `500 Internal Server Error`: No signing secret configured
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let secret = state.config.jwt_secret().ok_or_else(|| {
        ApiError::ServerError("Access token secret is not defined".to_string())
    })?;

    let user = match User::find_by_email(&state.db, &req.email).await? {
        Some(user) => user,
        None => {
            verify_dummy_password(&req.password)?;
            debug!("Login for unknown email");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    if !verify_password(&req.password, &user.password_hash)? {
        debug!(user_id = %user.id, "Login with wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = issue_token(&Claims::for_user(&user), secret)?;
    let cookie = session_cookie(&token, state.production());

    info!(user_id = %user.id, "User logged in");

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(UserResponse {
            success: true,
            message: Some("Logged in successfully".to_string()),
            user,
        }),
    ))
}

/// Clear the session cookie
///
/// Tokens are stateless; an already-copied token stays valid until it expires.
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> impl IntoResponse {
    info!(user_id = %user.id, "User logged out");

    (
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie(state.production()))]),
        Json(MessageResponse::new("Logged out successfully")),
    )
}

/// The identity resolved by the authentication gate
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        success: true,
        user,
    })
}

/// Update the caller's own profile
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or no fields given
/// - `404 Not Found`: The account was removed mid-request
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    let changes = UpdateProfile::from(req);
    if changes.is_empty() {
        return Err(ApiError::ValidationError("No fields to update".to_string()));
    }

    let updated = User::update_profile(&state.db, user.id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id = %user.id, "Profile updated");

    Ok(Json(UserResponse {
        success: true,
        message: Some("Profile updated successfully".to_string()),
        user: updated,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_rules() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            firstname: String::new(),
            lastname: "x".repeat(65),
            password: "short".to_string(),
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("firstname"));
        assert!(fields.contains_key("lastname"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_register_valid() {
        let req = RegisterRequest {
            email: "ada@example.com".to_string(),
            firstname: "Ada".to_string(),
            lastname: "Lovelace".to_string(),
            password: "analytical".to_string(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_padded_email_is_trimmed_before_validation() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"  Ada@Example.COM ","firstname":"Ada","lastname":"L","password":"analytical"}"#,
        )
        .unwrap();
        assert_eq!(req.email, "Ada@Example.COM");
        assert!(req.validate().is_ok());

        let login: LoginRequest =
            serde_json::from_str(r#"{"email":" ada@example.com\t","password":"x"}"#).unwrap();
        assert!(login.validate().is_ok());
    }

    #[test]
    fn test_profile_rules() {
        let empty = UpdateProfileRequest {
            avatar_url: None,
            bio: None,
            timezone: None,
        };
        assert!(empty.validate().is_ok());
        assert!(UpdateProfile::from(empty).is_empty());

        let bad = UpdateProfileRequest {
            avatar_url: Some("nope".to_string()),
            bio: Some("b".repeat(2001)),
            timezone: Some(String::new()),
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 3);
    }

    #[test]
    fn test_user_response_hides_hash() {
        let now = chrono::Utc::now();
        let response = UserResponse {
            success: true,
            message: None,
            user: User {
                id: uuid::Uuid::new_v4(),
                email: "ada@example.com".to_string(),
                firstname: "Ada".to_string(),
                lastname: "Lovelace".to_string(),
                password_hash: "$argon2id$secret".to_string(),
                role: taskmaster_shared::models::user::UserRole::User,
                bio: None,
                avatar_url: None,
                timezone: None,
                created_at: now,
                updated_at: now,
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["user"].get("password_hash").is_none());
        assert!(json.get("message").is_none());
    }
}
