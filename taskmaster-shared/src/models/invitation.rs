/// Team invitation model and database operations
///
/// An invitation lets a team owner bring in someone by email. The invitee
/// receives a random token out of band and accepts it while signed in with
/// the same email address.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invitation_status AS ENUM ('pending', 'accepted', 'expired');
///
/// CREATE TABLE team_invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     email VARCHAR(255) NOT NULL,
///     role team_role NOT NULL DEFAULT 'member',
///     invited_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token VARCHAR(128) NOT NULL UNIQUE,
///     status invitation_status NOT NULL DEFAULT 'pending',
///     expires_at TIMESTAMPTZ NOT NULL,
///     accepted_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     accepted_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Lifecycle
///
/// ```text
/// pending --accept--> accepted
/// pending --expires_at passes--> expired
/// ```
///
/// Expiry is evaluated lazily: a pending row past `expires_at` reports
/// [`InvitationStatus::Expired`] from [`TeamInvitation::effective_status`] and
/// is only rewritten when someone tries to accept it. Every expiry check,
/// in Rust or in SQL, compares against the application clock (`Utc::now()`).

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::membership::{TeamMember, TeamRole};
use crate::normalize_email;

/// Random bytes in an invitation token (hex-encoded to twice this length)
pub const TOKEN_BYTES: usize = 32;

/// How long an invitation stays acceptable
pub const INVITATION_TTL_DAYS: i64 = 7;

const INVITATION_COLUMNS: &str = "id, team_id, email, role, invited_by, token, status, \
                                  expires_at, accepted_by, accepted_at, created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamInvitation {
    pub id: Uuid,

    pub team_id: Uuid,

    /// Normalized email of the invitee
    pub email: String,

    /// Role granted on acceptance
    pub role: TeamRole,

    pub invited_by: Uuid,

    /// Bearer secret delivered to the invitee; never echoed back over the API
    #[serde(skip_serializing, default)]
    pub token: String,

    pub status: InvitationStatus,

    pub expires_at: DateTime<Utc>,

    pub accepted_by: Option<Uuid>,

    pub accepted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateInvitation {
    pub team_id: Uuid,
    pub email: String,
    pub role: TeamRole,
    pub invited_by: Uuid,
}

/// Generates a fresh invitation token: 32 random bytes, lowercase hex
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl TeamInvitation {
    /// Status as of `now`, treating a lapsed pending invitation as expired
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        match self.status {
            InvitationStatus::Pending if self.expires_at <= now => InvitationStatus::Expired,
            status => status,
        }
    }

    /// Replaces the stored status with the effective one
    pub fn with_effective_status(mut self, now: DateTime<Utc>) -> Self {
        self.status = self.effective_status(now);
        self
    }

    /// Whether `email` is the address this invitation was sent to
    pub fn is_addressed_to(&self, email: &str) -> bool {
        self.email == normalize_email(email)
    }

    /// Inserts a pending invitation with a new token, expiring in 7 days
    pub async fn create(pool: &PgPool, data: CreateInvitation) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO team_invitations (team_id, email, role, invited_by, token, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            INVITATION_COLUMNS
        );

        let invitation = sqlx::query_as::<_, TeamInvitation>(&query)
            .bind(data.team_id)
            .bind(normalize_email(&data.email))
            .bind(data.role)
            .bind(data.invited_by)
            .bind(generate_token())
            .bind(Utc::now() + Duration::days(INVITATION_TTL_DAYS))
            .fetch_one(pool)
            .await?;

        info!(
            invitation_id = %invitation.id,
            team_id = %invitation.team_id,
            "Team invitation created"
        );
        Ok(invitation)
    }

    /// A pending, unexpired invitation for this team and email, if any
    pub async fn find_open(
        pool: &PgPool,
        team_id: Uuid,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM team_invitations
             WHERE team_id = $1 AND email = $2 AND status = 'pending' AND expires_at > $3
             LIMIT 1",
            INVITATION_COLUMNS
        );

        sqlx::query_as::<_, TeamInvitation>(&query)
            .bind(team_id)
            .bind(normalize_email(email))
            .bind(Utc::now())
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM team_invitations WHERE token = $1", INVITATION_COLUMNS);

        sqlx::query_as::<_, TeamInvitation>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Invitations of a team, newest first, with lazily computed status
    pub async fn list_for_team(pool: &PgPool, team_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM team_invitations WHERE team_id = $1 ORDER BY created_at DESC",
            INVITATION_COLUMNS
        );

        let now = Utc::now();
        let invitations = sqlx::query_as::<_, TeamInvitation>(&query)
            .bind(team_id)
            .fetch_all(pool)
            .await?;

        Ok(invitations
            .into_iter()
            .map(|invitation| invitation.with_effective_status(now))
            .collect())
    }

    /// Persists the expiry of a lapsed pending invitation
    pub async fn mark_expired(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE team_invitations SET status = 'expired' WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(pool)
        .await?;

        debug!(invitation_id = %id, "Invitation marked expired");
        Ok(())
    }

    /// Accepts the invitation for `user_id` and adds them to the team
    ///
    /// Runs in one transaction. Returns `None` without changing anything if the
    /// invitation is no longer pending or has lapsed, which covers two accepts
    /// racing each other. An existing membership is left as it is.
    pub async fn accept(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE team_invitations
             SET status = 'accepted', accepted_by = $2, accepted_at = $3
             WHERE id = $1 AND status = 'pending' AND expires_at > $3
             RETURNING {}",
            INVITATION_COLUMNS
        );

        let accepted = sqlx::query_as::<_, TeamInvitation>(&query)
            .bind(id)
            .bind(user_id)
            .bind(Utc::now())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(invitation) = accepted else {
            tx.rollback().await?;
            return Ok(None);
        };

        TeamMember::add(&mut *tx, invitation.team_id, user_id, invitation.role).await?;
        tx.commit().await?;

        info!(
            invitation_id = %invitation.id,
            team_id = %invitation.team_id,
            user_id = %user_id,
            "Team invitation accepted"
        );
        Ok(Some(invitation))
    }
}
