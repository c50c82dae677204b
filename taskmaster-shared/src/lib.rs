//! # TaskMaster Shared Library
//!
//! This crate contains the persistence layer, models, and authentication
//! primitives used by the TaskMaster API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, signed tokens, session cookies, ownership checks
//! - `db`: Connection pool, migrations, and the dynamic query builder
//! - `models`: Database models and their CRUD operations

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the TaskMaster shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Normalizes an email address for storage and uniqueness checks
///
/// Surrounding whitespace is trimmed and the address is lowercased, so
/// `" Alice@Example.COM "` and `"alice@example.com"` refer to the same account.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@B.com "), "a@b.com");
        assert_eq!(normalize_email("a@b.com"), "a@b.com");
    }
}
