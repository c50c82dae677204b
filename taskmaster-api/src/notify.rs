/// Invitation delivery
///
/// Sending email is an external collaborator behind the [`InvitationNotifier`]
/// trait. Two implementations ship:
///
/// - [`HttpMailer`]: posts the rendered message to an HTTP mail relay
/// - [`LogMailer`]: logs the invitation link; used when no relay is configured
///
/// Tests substitute their own notifier through [`crate::app::AppState`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ApiConfig, MailConfig};

/// Everything needed to tell someone they were invited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamInvitationEmail {
    pub email: String,

    /// Display name of the inviter
    pub invited_by: String,

    pub team_name: String,

    pub token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("mail relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail relay rejected the message with status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait InvitationNotifier: Send + Sync {
    async fn send_team_invitation(&self, invitation: TeamInvitationEmail) -> Result<(), NotifyError>;
}

/// A rendered invitation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvitationMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl InvitationMessage {
    /// Renders the invitation with an acceptance link under `app_url`
    pub fn render(app_url: &str, invitation: &TeamInvitationEmail) -> Self {
        let link = format!("{}/accept-invitation?token={}", app_url, invitation.token);
        let inviter = &invitation.invited_by;
        let team = &invitation.team_name;

        let text = format!(
            "You've been invited to join a team!\n\
             {inviter} has invited you to join {team} on TaskMaster.\n\n\
             Accept the invitation here: {link}\n\n\
             This invitation expires in 7 days.\n"
        );

        let html = format!(
            "<h2>You've been invited to join a team!</h2>\
             <p>{inviter} has invited you to join <strong>{team}</strong> on TaskMaster.</p>\
             <p><a href=\"{link}\">Accept Invitation</a></p>\
             <p>Or copy this link: <a href=\"{link}\">{link}</a></p>\
             <p>This invitation expires in 7 days.</p>\
             <p>If you didn't expect this invitation, you can safely ignore this email.</p>",
            inviter = escape_html(inviter),
            team = escape_html(team),
        );

        Self {
            to: invitation.email.clone(),
            subject: format!("You've been invited to join {} on TaskMaster", team),
            text,
            html,
        }
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    #[serde(flatten)]
    message: &'a InvitationMessage,
}

/// Sends invitations through an HTTP mail relay
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
    app_url: String,
}

impl HttpMailer {
    pub fn new(endpoint: String, api_key: Option<String>, from: String, app_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            from,
            app_url,
        }
    }
}

#[async_trait]
impl InvitationNotifier for HttpMailer {
    async fn send_team_invitation(&self, invitation: TeamInvitationEmail) -> Result<(), NotifyError> {
        let message = InvitationMessage::render(&self.app_url, &invitation);

        let mut request = self.client.post(&self.endpoint).json(&RelayPayload {
            from: &self.from,
            message: &message,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "Mail relay rejected invitation");
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }

        info!(to = %message.to, "Invitation email sent");
        Ok(())
    }
}

/// Logs invitations instead of sending them
pub struct LogMailer {
    app_url: String,
}

impl LogMailer {
    pub fn new(app_url: String) -> Self {
        Self { app_url }
    }
}

#[async_trait]
impl InvitationNotifier for LogMailer {
    async fn send_team_invitation(&self, invitation: TeamInvitationEmail) -> Result<(), NotifyError> {
        let message = InvitationMessage::render(&self.app_url, &invitation);
        info!(
            to = %message.to,
            subject = %message.subject,
            "Mail relay not configured; invitation not delivered"
        );
        Ok(())
    }
}

/// Picks the notifier for the configured environment
pub fn from_config(api: &ApiConfig, mail: &MailConfig) -> Arc<dyn InvitationNotifier> {
    match &mail.api_url {
        Some(url) => Arc::new(HttpMailer::new(
            url.clone(),
            mail.api_key.clone(),
            mail.from.clone(),
            api.app_url.clone(),
        )),
        None => Arc::new(LogMailer::new(api.app_url.clone())),
    }
}
