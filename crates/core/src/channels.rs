//! Notification channel records.
//!
//! An organization may register any number of Slack channels (incoming
//! webhook plus channel name) and email addresses. The channel kind names
//! below are the values used in API paths and log fields.

use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, OrganizationId};

/// Slack incoming-webhook channel.
pub const CHANNEL_SLACK: &str = "slack";

/// Email address channel delivered via SMTP.
pub const CHANNEL_EMAIL: &str = "email";

/// The two kinds of channel an organization can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Slack,
    Email,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Slack => CHANNEL_SLACK,
            ChannelKind::Email => CHANNEL_EMAIL,
        }
    }

    /// Entity name used in `NotFound` errors.
    pub fn entity(self) -> &'static str {
        match self {
            ChannelKind::Slack => "SlackChannel",
            ChannelKind::Email => "EmailChannel",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Slack
// ---------------------------------------------------------------------------

/// A stored Slack channel registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackChannel {
    pub id: ChannelId,
    pub organization_id: OrganizationId,
    pub webhook_url: String,
    pub channel_name: String,
}

/// DTO for registering a Slack channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSlackChannel {
    pub organization_id: OrganizationId,
    pub webhook_url: String,
    pub channel_name: String,
}

/// Mutable fields of a Slack channel, replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlackChannelInput {
    pub webhook_url: String,
    pub channel_name: String,
}

impl SlackChannelInput {
    /// Trim surrounding whitespace the way form input is normally received.
    pub fn normalized(self) -> Self {
        Self {
            webhook_url: self.webhook_url.trim().to_string(),
            channel_name: self.channel_name.trim().to_string(),
        }
    }

    pub fn into_new(self, organization_id: impl Into<OrganizationId>) -> NewSlackChannel {
        NewSlackChannel {
            organization_id: organization_id.into(),
            webhook_url: self.webhook_url,
            channel_name: self.channel_name,
        }
    }
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// A stored email channel registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailChannel {
    pub id: ChannelId,
    pub organization_id: OrganizationId,
    pub email: String,
}

/// DTO for registering an email channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewEmailChannel {
    pub organization_id: OrganizationId,
    pub email: String,
}

/// Mutable fields of an email channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmailChannelInput {
    pub email: String,
}

impl EmailChannelInput {
    pub fn normalized(self) -> Self {
        Self {
            email: self.email.trim().to_string(),
        }
    }

    pub fn into_new(self, organization_id: impl Into<OrganizationId>) -> NewEmailChannel {
        NewEmailChannel {
            organization_id: organization_id.into(),
            email: self.email,
        }
    }
}

/// Both channel lists of one organization.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrganizationChannels {
    pub slack: Vec<SlackChannel>,
    pub email: Vec<EmailChannel>,
}
