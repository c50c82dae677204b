/// Middleware for the API server
///
/// - `auth`: the authentication gate for protected routes
/// - `security`: security response headers

pub mod auth;
pub mod security;
