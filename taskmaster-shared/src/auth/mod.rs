/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: access token issuing and verification
/// - [`cookie`]: the `accessToken` session cookie
/// - [`middleware`]: request authentication and the [`middleware::CurrentUser`] identity
/// - [`authorization`]: row-ownership and team access checks
///
/// # Example
///
/// ```
/// use taskmaster_shared::auth::password::{hash_password, verify_password};
/// use taskmaster_shared::auth::jwt::{issue_token, verify_token, Claims};
/// use taskmaster_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "a@b.com", "A", "B", UserRole::User);
/// let token = issue_token(&claims, "secret-key-of-reasonable-length!!")?;
/// assert_eq!(verify_token(&token, "secret-key-of-reasonable-length!!")?.sub, claims.sub);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod cookie;
pub mod jwt;
pub mod middleware;
pub mod password;
