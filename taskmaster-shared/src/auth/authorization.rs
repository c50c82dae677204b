/// Row-ownership checks
///
/// Every mutating operation follows the same two steps: load the owning
/// foreign key of the row, then compare it with the caller. A missing row is
/// reported before a foreign one, so a caller can learn that an ID exists but
/// never what it contains.
///
/// # Example
///
/// ```no_run
/// use taskmaster_shared::auth::authorization::require_ownership;
/// use taskmaster_shared::auth::middleware::CurrentUser;
/// use taskmaster_shared::models::task::Task;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, me: CurrentUser, task_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let owner = Task::owner_of(&pool, task_id).await?;
/// require_ownership(&me, owner)?;
/// Task::delete(&pool, task_id).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use super::middleware::CurrentUser;
use crate::models::membership::TeamMember;
use crate::models::team::Team;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The row does not exist
    #[error("Resource not found")]
    NotFound,

    /// The row exists but belongs to someone else
    #[error("Not authorized to access this resource")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Checks that `owner` (the looked-up owning key) is the caller
///
/// `None` means the row was not found.
pub fn require_ownership(user: &CurrentUser, owner: Option<Uuid>) -> Result<(), AuthzError> {
    match owner {
        None => Err(AuthzError::NotFound),
        Some(owner_id) if owner_id != user.id => Err(AuthzError::Forbidden),
        Some(_) => Ok(()),
    }
}

/// Loads a team the caller created
///
/// Missing team is NotFound; a team created by someone else is Forbidden.
pub async fn require_team_creator(
    pool: &PgPool,
    user: &CurrentUser,
    team_id: Uuid,
) -> Result<Team, AuthzError> {
    let team = Team::find_by_id(pool, team_id)
        .await?
        .ok_or(AuthzError::NotFound)?;

    require_ownership(user, Some(team.created_by))?;
    Ok(team)
}

/// Checks that the caller belongs to an existing team
pub async fn require_team_member(
    pool: &PgPool,
    user: &CurrentUser,
    team_id: Uuid,
) -> Result<Team, AuthzError> {
    let team = Team::find_by_id(pool, team_id)
        .await?
        .ok_or(AuthzError::NotFound)?;

    if team.created_by == user.id || TeamMember::is_member(pool, team_id, user.id).await? {
        Ok(team)
    } else {
        Err(AuthzError::Forbidden)
    }
}
