//! Invitation notices.
//!
//! The invitation manager hands each issued invitation to an
//! [`InvitationNotifier`]. Delivery is best-effort: callers log failures and
//! carry on.

use crate::app_config::{EmailConfig, SiteConfig};
use crate::email::{templates, EmailError};
use crate::orm::{survey_invitations, surveys};
use async_trait::async_trait;

#[async_trait]
pub trait InvitationNotifier: Send + Sync {
    async fn invitation_issued(
        &self,
        survey: &surveys::Model,
        invitation: &survey_invitations::Model,
    ) -> Result<(), EmailError>;
}

/// Sends invitation emails over the configured mail transport.
#[derive(Clone, Debug)]
pub struct MailNotifier {
    email: EmailConfig,
    site: SiteConfig,
}

impl MailNotifier {
    pub fn new(email: EmailConfig, site: SiteConfig) -> Self {
        Self { email, site }
    }

    /// Built from the global configuration.
    pub fn from_config() -> Self {
        let config = crate::app_config::get_config();
        Self::new(config.email, config.site)
    }
}

#[async_trait]
impl InvitationNotifier for MailNotifier {
    async fn invitation_issued(
        &self,
        survey: &surveys::Model,
        invitation: &survey_invitations::Model,
    ) -> Result<(), EmailError> {
        templates::send_survey_invitation_email(
            &self.email,
            &self.site,
            &invitation.email,
            &survey.title,
            &invitation.invitation_token,
            invitation.expires_at,
        )
        .await
    }
}
