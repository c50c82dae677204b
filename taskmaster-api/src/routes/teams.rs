/// Team and invitation endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/teams` - Create a team; the caller becomes its owner
/// - `GET /api/v1/teams` - Teams the caller created or belongs to
/// - `GET /api/v1/teams/:team_id` - One team, if the caller can see it
/// - `GET /api/v1/teams/:team_id/members` - Members with their profiles
/// - `POST /api/v1/teams/:team_id/invitations` - Invite someone by email
/// - `GET /api/v1/teams/:team_id/invitations` - Invitations of a team
/// - `POST /api/v1/teams/invitations/:token/accept` - Join a team

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskmaster_shared::{
    auth::{
        authorization::{require_team_creator, require_team_member},
        middleware::CurrentUser,
    },
    models::{
        invitation::{CreateInvitation, InvitationStatus, TeamInvitation},
        membership::{TeamMember, TeamMemberProfile, TeamRole},
        team::{CreateTeam, Team},
    },
};
use tracing::{info, warn};
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, AuthzResultExt},
    extract::{trimmed, UuidPath, ValidatedJson},
    notify::TeamInvitationEmail,
};

/// Create team request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 255, message = "Team name must be 1 to 255 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be less than 2000 characters"))]
    pub description: Option<String>,
}

/// Roles an invitation may grant; ownership is never handed out by invite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteRole {
    #[default]
    Member,
    Admin,
}

impl From<InviteRole> for TeamRole {
    fn from(role: InviteRole) -> Self {
        match role {
            InviteRole::Member => TeamRole::Member,
            InviteRole::Admin => TeamRole::Admin,
        }
    }
}

/// Invite member request
#[derive(Debug, Deserialize, Validate)]
pub struct InviteMemberRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[serde(default)]
    pub role: InviteRole,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub team: Team,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamsResponse {
    pub success: bool,
    pub teams: Vec<Team>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MembersResponse {
    pub success: bool,
    pub members: Vec<TeamMemberProfile>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvitationResponse {
    pub success: bool,
    pub message: String,
    pub invitation: TeamInvitation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvitationsResponse {
    pub success: bool,
    pub invitations: Vec<TeamInvitation>,
}

/// Create a team
///
/// The team and the creator's owner membership are written together.
pub async fn create_team(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<TeamResponse>)> {
    let team = Team::create(
        &state.db,
        CreateTeam {
            name: req.name,
            description: req.description,
            created_by: user.id,
        },
    )
    .await?;

    info!(team_id = %team.id, user_id = %user.id, "Team created");

    Ok((
        StatusCode::CREATED,
        Json(TeamResponse {
            success: true,
            message: Some("Team created successfully".to_string()),
            team,
        }),
    ))
}

/// List the caller's teams, newest first
pub async fn list_teams(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<TeamsResponse>> {
    let teams = Team::list_for_user(&state.db, user.id).await?;

    Ok(Json(TeamsResponse {
        success: true,
        teams,
    }))
}

/// Get one team
///
/// A missing team and a team the caller cannot see answer the same 403.
pub async fn get_team(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    UuidPath(team_id): UuidPath,
) -> ApiResult<Json<TeamResponse>> {
    let team = Team::find_accessible(&state.db, team_id, user.id)
        .await?
        .ok_or_else(|| {
            ApiError::Forbidden(
                "You do not have access to this team or this team does not exist".to_string(),
            )
        })?;

    Ok(Json(TeamResponse {
        success: true,
        message: None,
        team,
    }))
}

/// List members of a team the caller belongs to
pub async fn list_members(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    UuidPath(team_id): UuidPath,
) -> ApiResult<Json<MembersResponse>> {
    require_team_member(&state.db, &user, team_id)
        .await
        .or_deny("Team not found", "You are not a member of this team")?;

    let members = TeamMember::list_for_team(&state.db, team_id).await?;

    Ok(Json(MembersResponse {
        success: true,
        members,
    }))
}

/// Invite someone to a team by email
///
/// Only the team's creator may invite. The token goes to the invitee through
/// the notifier and is not part of the response. If delivery fails the
/// invitation row stays in place.
///
/// # Errors
///
/// - `404 Not Found`: Team does not exist
/// - `403 Forbidden`: Caller did not create the team
/// - `409 Conflict`: A pending invitation for this email already exists
/// - `500 Internal Server Error`: Invitation email could not be sent
pub async fn invite_member(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    UuidPath(team_id): UuidPath,
    ValidatedJson(req): ValidatedJson<InviteMemberRequest>,
) -> ApiResult<(StatusCode, Json<InvitationResponse>)> {
    let team = require_team_creator(&state.db, &user, team_id)
        .await
        .or_deny("Team not found", "Only team creator can invite members")?;

    if TeamInvitation::find_open(&state.db, team.id, &req.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "An active invitation already exists for this email".to_string(),
        ));
    }

    let invitation = TeamInvitation::create(
        &state.db,
        CreateInvitation {
            team_id: team.id,
            email: req.email,
            role: req.role.into(),
            invited_by: user.id,
        },
    )
    .await?;

    state
        .notifier
        .send_team_invitation(TeamInvitationEmail {
            email: invitation.email.clone(),
            invited_by: user.display_name(),
            team_name: team.name.clone(),
            token: invitation.token.clone(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(InvitationResponse {
            success: true,
            message: "Invitation sent successfully".to_string(),
            invitation,
        }),
    ))
}

/// List a team's invitations with their current status
pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    UuidPath(team_id): UuidPath,
) -> ApiResult<Json<InvitationsResponse>> {
    require_team_creator(&state.db, &user, team_id)
        .await
        .or_deny("Team not found", "Only team creator can view invitations")?;

    let invitations = TeamInvitation::list_for_team(&state.db, team_id).await?;

    Ok(Json(InvitationsResponse {
        success: true,
        invitations,
    }))
}

/// Accept an invitation addressed to the caller's email
///
/// # Errors
///
/// - `404 Not Found`: Unknown token
/// - `403 Forbidden`: Invitation was sent to another address
/// - `409 Conflict`: Invitation was already used
/// - `400 Bad Request`: Invitation has expired
pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(token): Path<String>,
) -> ApiResult<Json<InvitationResponse>> {
    let invitation = TeamInvitation::find_by_token(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invitation not found".to_string()))?;

    if !invitation.is_addressed_to(&user.email) {
        warn!(
            invitation_id = %invitation.id,
            user_id = %user.id,
            "Invitation accept by another address"
        );
        return Err(ApiError::Forbidden(
            "This invitation was sent to a different email address".to_string(),
        ));
    }

    match invitation.effective_status(Utc::now()) {
        InvitationStatus::Pending => {}
        InvitationStatus::Expired => {
            if invitation.status == InvitationStatus::Pending {
                TeamInvitation::mark_expired(&state.db, invitation.id).await?;
            }
            return Err(ApiError::ValidationError("Invitation has expired".to_string()));
        }
        InvitationStatus::Accepted => {
            return Err(ApiError::Conflict(
                "Invitation has already been accepted".to_string(),
            ));
        }
    }

    // A concurrent accept, or expiry between the check and the update, leaves
    // nothing to apply
    let accepted = TeamInvitation::accept(&state.db, invitation.id, user.id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Invitation is no longer pending".to_string()))?;

    Ok(Json(InvitationResponse {
        success: true,
        message: "Invitation accepted successfully".to_string(),
        invitation: accepted,
    }))
}
