use orgnotify_core::channels::{EmailChannel, SlackChannel};
use orgnotify_core::types::{ChannelId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Slack
// ---------------------------------------------------------------------------

/// A row from the `slack_channels` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SlackChannelRow {
    pub id: ChannelId,
    pub organization_id: String,
    pub webhook_url: String,
    /// Stored as `slack_channel`; exposed as `channel_name` in the domain.
    pub slack_channel: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<SlackChannelRow> for SlackChannel {
    fn from(row: SlackChannelRow) -> Self {
        Self {
            id: row.id,
            organization_id: row.organization_id,
            webhook_url: row.webhook_url,
            channel_name: row.slack_channel,
        }
    }
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// A row from the `email_channels` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmailChannelRow {
    pub id: ChannelId,
    pub organization_id: String,
    pub email: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<EmailChannelRow> for EmailChannel {
    fn from(row: EmailChannelRow) -> Self {
        Self {
            id: row.id,
            organization_id: row.organization_id,
            email: row.email,
        }
    }
}
