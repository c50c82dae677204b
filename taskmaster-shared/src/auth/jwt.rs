/// Signed access tokens
///
/// Access tokens are HS256 JWTs carrying the user's identity. They live for a
/// fixed 15 minutes and are delivered in the `accessToken` cookie. There is no
/// refresh token and no server-side session: a token is valid until it
/// expires, and revocation happens by deleting the user (the authentication
/// gate re-reads the user on every request).
///
/// # Claims
///
/// - `sub`: user ID
/// - `email`, `firstname`, `lastname`, `role`: identity snapshot at issue time
/// - `iss`: always `"taskmaster"`
/// - `iat`, `exp`: Unix timestamps
///
/// # Example
///
/// ```
/// use taskmaster_shared::auth::jwt::{issue_token, verify_token, Claims};
/// use taskmaster_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-secret-of-at-least-thirty-two-bytes!";
/// let claims = Claims::new(Uuid::new_v4(), "a@b.com", "A", "B", UserRole::User);
///
/// let token = issue_token(&claims, secret)?;
/// let verified = verify_token(&token, secret)?;
/// assert_eq!(verified.sub, claims.sub);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{User, UserRole};

/// Issuer embedded in and required of every token
pub const ISSUER: &str = "taskmaster";

/// Access token lifetime in seconds
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, issuer or format check failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    pub email: String,

    pub firstname: String,

    pub lastname: String,

    pub role: UserRole,

    /// Issuer - Always "taskmaster"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims expiring after [`ACCESS_TOKEN_TTL_SECONDS`]
    pub fn new(
        user_id: Uuid,
        email: impl Into<String>,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self::with_expiration(
            user_id,
            email,
            firstname,
            lastname,
            role,
            Duration::seconds(ACCESS_TOKEN_TTL_SECONDS),
        )
    }

    /// Creates claims with a custom lifetime
    ///
    /// A negative duration produces an already-expired token, which tests use
    /// to exercise the expiry path.
    pub fn with_expiration(
        user_id: Uuid,
        email: impl Into<String>,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        role: UserRole,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            email: email.into(),
            firstname: firstname.into(),
            lastname: lastname.into(),
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Claims for a stored user
    pub fn for_user(user: &User) -> Self {
        Self::new(
            user.id,
            user.email.clone(),
            user.firstname.clone(),
            user.lastname.clone(),
            user.role,
        )
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a compact JWT
pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, issuer and expiry, returning the embedded claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(e.to_string()),
    })?;

    Ok(token_data.claims)
}
