/// Database models for TaskMaster
///
/// Each model owns its SQL. Operations take a `&PgPool` (or any executor where
/// they must join a transaction) and return `sqlx::Error` unchanged; mapping to
/// HTTP errors happens in the API crate.
///
/// # Models
///
/// - `user`: accounts and profiles
/// - `team`: teams
/// - `membership`: user-team relationships with roles
/// - `invitation`: email invitations into a team
/// - `task`: tasks, their filters and partial updates
/// - `comment`: comments on tasks
/// - `attachment`: file metadata on tasks

pub mod attachment;
pub mod comment;
pub mod invitation;
pub mod membership;
pub mod task;
pub mod team;
pub mod user;
