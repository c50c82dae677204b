/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Liveness and database connectivity
/// - `users`: Registration, login, logout, profile
/// - `teams`: Teams, members and invitations
/// - `tasks`: Tasks with filtered listing and partial update
/// - `comments`: Comments on tasks
/// - `attachments`: Attachment records on tasks

pub mod attachments;
pub mod comments;
pub mod health;
pub mod tasks;
pub mod teams;
pub mod users;
