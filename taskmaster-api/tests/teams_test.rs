/// Team and invitation tests (require DATABASE_URL)

mod common;

use axum::http::StatusCode;
use common::{RecordingNotifier, TestContext};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_list_teams() {
    let Some(ctx) = TestContext::new().await else { return };
    let owner = ctx.user("team-owner").await;

    let created = ctx
        .post(
            "/api/v1/teams",
            &owner,
            json!({ "name": "Platform", "description": "Infra and tooling" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["message"], "Team created successfully");
    assert_eq!(created.body["team"]["created_by"], owner.id.to_string());

    let team_id = created.body["team"]["id"].as_str().unwrap();

    let listed = ctx.get("/api/v1/teams", &owner).await;
    assert_eq!(listed.status, StatusCode::OK);
    let teams = listed.body["teams"].as_array().unwrap();
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0]["id"], team_id);

    let members = ctx
        .get(&format!("/api/v1/teams/{}/members", team_id), &owner)
        .await;
    assert_eq!(members.status, StatusCode::OK);
    assert_eq!(members.body["members"][0]["user_id"], owner.id.to_string());
    assert_eq!(members.body["members"][0]["role"], "owner");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_team_hidden_from_outsiders() {
    let Some(ctx) = TestContext::new().await else { return };
    let owner = ctx.user("hidden-owner").await;
    let outsider = ctx.user("outsider").await;
    let team_id = ctx.team(&owner, "Secret").await;

    let response = ctx
        .get(&format!("/api/v1/teams/{}", team_id), &outsider)
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(
        response.body["message"],
        "You do not have access to this team or this team does not exist"
    );

    let missing = ctx
        .get(&format!("/api/v1/teams/{}", Uuid::new_v4()), &owner)
        .await;
    assert_eq!(missing.status, StatusCode::FORBIDDEN);

    let members = ctx
        .get(&format!("/api/v1/teams/{}/members", team_id), &outsider)
        .await;
    assert_eq!(members.status, StatusCode::FORBIDDEN);

    assert!(ctx.get("/api/v1/teams", &outsider).await.body["teams"]
        .as_array()
        .unwrap()
        .is_empty());

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_invite_sends_token_out_of_band() {
    let Some(ctx) = TestContext::new().await else { return };
    let owner = ctx.user("inviter").await;
    let team_id = ctx.team(&owner, "Docs Crew").await;
    let invitee = TestContext::unique_email("invitee");

    let response = ctx
        .post(
            &format!("/api/v1/teams/{}/invitations", team_id),
            &owner,
            json!({ "email": invitee.to_uppercase() }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["message"], "Invitation sent successfully");
    let invitation = &response.body["invitation"];
    assert_eq!(invitation["email"], invitee.as_str());
    assert_eq!(invitation["role"], "member");
    assert_eq!(invitation["status"], "pending");
    assert!(invitation.get("token").is_none());

    let sent = ctx.notifier.sent();
    let email = sent.iter().find(|e| e.email == invitee).unwrap();
    assert_eq!(email.invited_by, "Test User");
    assert_eq!(email.team_name, "Docs Crew");
    assert_eq!(email.token.len(), 64);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_invite_rules() {
    let Some(ctx) = TestContext::new().await else { return };
    let owner = ctx.user("rules-owner").await;
    let other = ctx.user("rules-other").await;
    let team_id = ctx.team(&owner, "Rules").await;
    let uri = format!("/api/v1/teams/{}/invitations", team_id);
    let invitee = TestContext::unique_email("target");

    let missing_team = ctx
        .post(
            &format!("/api/v1/teams/{}/invitations", Uuid::new_v4()),
            &owner,
            json!({ "email": invitee }),
        )
        .await;
    assert_eq!(missing_team.status, StatusCode::NOT_FOUND);
    assert_eq!(missing_team.body["message"], "Team not found");

    let not_creator = ctx.post(&uri, &other, json!({ "email": invitee })).await;
    assert_eq!(not_creator.status, StatusCode::FORBIDDEN);
    assert_eq!(
        not_creator.body["message"],
        "Only team creator can invite members"
    );

    let owner_role = ctx
        .post(&uri, &owner, json!({ "email": invitee, "role": "owner" }))
        .await;
    assert_eq!(owner_role.status, StatusCode::BAD_REQUEST);

    let first = ctx
        .post(&uri, &owner, json!({ "email": invitee, "role": "admin" }))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["invitation"]["role"], "admin");

    let duplicate = ctx.post(&uri, &owner, json!({ "email": invitee })).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(
        duplicate.body["message"],
        "An active invitation already exists for this email"
    );

    let listed = ctx.get(&uri, &owner).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["invitations"].as_array().unwrap().len(), 1);
    assert_eq!(ctx.get(&uri, &other).await.status, StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_accept_invitation_once() {
    let Some(ctx) = TestContext::new().await else { return };
    let owner = ctx.user("accept-owner").await;
    let invitee = ctx.user("accept-invitee").await;
    let bystander = ctx.user("accept-bystander").await;
    let team_id = ctx.team(&owner, "Joiners").await;

    ctx.post(
        &format!("/api/v1/teams/{}/invitations", team_id),
        &owner,
        json!({ "email": invitee.email }),
    )
    .await;
    let token = ctx.notifier.token_for(&invitee.email).unwrap();
    let accept_uri = format!("/api/v1/teams/invitations/{}/accept", token);

    let wrong_user = ctx.post(&accept_uri, &bystander, json!({})).await;
    assert_eq!(wrong_user.status, StatusCode::FORBIDDEN);

    let accepted = ctx.post(&accept_uri, &invitee, json!({})).await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.body["invitation"]["status"], "accepted");
    assert_eq!(
        accepted.body["invitation"]["accepted_by"],
        invitee.id.to_string()
    );

    let members = ctx
        .get(&format!("/api/v1/teams/{}/members", team_id), &invitee)
        .await;
    assert_eq!(members.status, StatusCode::OK);
    let roles: Vec<(&str, &str)> = members.body["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| (m["email"].as_str().unwrap(), m["role"].as_str().unwrap()))
        .collect();
    assert!(roles.contains(&(invitee.email.as_str(), "member")));

    let team = ctx.get(&format!("/api/v1/teams/{}", team_id), &invitee).await;
    assert_eq!(team.status, StatusCode::OK);

    let again = ctx.post(&accept_uri, &invitee, json!({})).await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let unknown = ctx
        .post("/api/v1/teams/invitations/nope/accept", &invitee, json!({}))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_accept_after_expiry_marks_expired() {
    let Some(ctx) = TestContext::new().await else { return };
    let owner = ctx.user("expiry-owner").await;
    let invitee = ctx.user("expiry-invitee").await;
    let team_id = ctx.team(&owner, "Late").await;

    ctx.post(
        &format!("/api/v1/teams/{}/invitations", team_id),
        &owner,
        json!({ "email": invitee.email }),
    )
    .await;
    let token = ctx.notifier.token_for(&invitee.email).unwrap();

    sqlx::query("UPDATE team_invitations SET expires_at = NOW() - INTERVAL '1 hour' WHERE token = $1")
        .bind(&token)
        .execute(&ctx.db)
        .await
        .unwrap();

    let listed = ctx
        .get(&format!("/api/v1/teams/{}/invitations", team_id), &owner)
        .await;
    assert_eq!(listed.body["invitations"][0]["status"], "expired");

    let response = ctx
        .post(
            &format!("/api/v1/teams/invitations/{}/accept", token),
            &invitee,
            json!({}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Invitation has expired");

    let stored: String =
        sqlx::query_scalar("SELECT status::text FROM team_invitations WHERE token = $1")
            .bind(&token)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(stored, "expired");

    // A lapsed invitation no longer blocks a fresh one
    let reinvite = ctx
        .post(
            &format!("/api/v1/teams/{}/invitations", team_id),
            &owner,
            json!({ "email": invitee.email }),
        )
        .await;
    assert_eq!(reinvite.status, StatusCode::CREATED);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_notifier_failure_keeps_invitation() {
    let Some(ctx) = TestContext::with_notifier(RecordingNotifier::failing()).await else {
        return;
    };
    let owner = ctx.user("mailfail").await;
    let team_id = ctx.team(&owner, "Offline Mail").await;
    let invitee = TestContext::unique_email("unlucky");

    let response = ctx
        .post(
            &format!("/api/v1/teams/{}/invitations", team_id),
            &owner,
            json!({ "email": invitee }),
        )
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["message"], "Failed to send invitation email");

    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM team_invitations WHERE team_id = $1")
            .bind(team_id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(rows, 1);

    ctx.cleanup().await;
}
