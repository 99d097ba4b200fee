//! [`ChannelStore`] implementation over PostgreSQL.

use async_trait::async_trait;
use orgnotify_core::channels::{
    ChannelKind, EmailChannel, NewEmailChannel, NewSlackChannel, SlackChannel,
};
use orgnotify_core::error::CoreError;
use orgnotify_core::store::ChannelStore;
use orgnotify_core::types::ChannelId;
use orgnotify_core::validation::{duplicate_email, duplicate_slack};

use crate::repositories::{EmailChannelRepo, SlackChannelRepo};
use crate::DbPool;

/// Unique index guarding `(webhook_url, slack_channel)`.
pub const UQ_SLACK_WEBHOOK_CHANNEL: &str = "uq_slack_channels_webhook_channel";

/// Unique index guarding `email`.
pub const UQ_EMAIL: &str = "uq_email_channels_email";

/// Channel store backed by the `slack_channels` and `email_channels` tables.
///
/// The tables must exist before use; call [`crate::run_migrations`] at
/// startup.
#[derive(Clone)]
pub struct PgChannelStore {
    pool: DbPool,
}

impl PgChannelStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn not_found(kind: ChannelKind, id: ChannelId) -> CoreError {
    CoreError::NotFound {
        entity: kind.entity(),
        id,
    }
}

/// Map a sqlx error into the store's error taxonomy.
///
/// Violations of the channel unique indexes surface as the same validation
/// message the pre-check produces.
fn classify(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        // PostgreSQL unique constraint violation: error code 23505
        if db_err.code().as_deref() == Some("23505") {
            match db_err.constraint() {
                Some(UQ_SLACK_WEBHOOK_CHANNEL) => return duplicate_slack().into(),
                Some(UQ_EMAIL) => return duplicate_email().into(),
                _ => {}
            }
        }
    }
    tracing::error!(error = %err, "Channel store database error");
    CoreError::Storage(err.to_string())
}

#[async_trait]
impl ChannelStore for PgChannelStore {
    async fn create_slack(&self, channel: NewSlackChannel) -> Result<SlackChannel, CoreError> {
        SlackChannelRepo::create(&self.pool, &channel)
            .await
            .map(Into::into)
            .map_err(classify)
    }

    async fn get_slack(&self, id: ChannelId) -> Result<SlackChannel, CoreError> {
        SlackChannelRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify)?
            .map(Into::into)
            .ok_or_else(|| not_found(ChannelKind::Slack, id))
    }

    async fn list_slack(&self, organization_id: &str) -> Result<Vec<SlackChannel>, CoreError> {
        let rows = SlackChannelRepo::list_by_organization(&self.pool, organization_id)
            .await
            .map_err(classify)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_slack(&self, channel: SlackChannel) -> Result<SlackChannel, CoreError> {
        SlackChannelRepo::update(
            &self.pool,
            channel.id,
            &channel.webhook_url,
            &channel.channel_name,
        )
        .await
        .map_err(classify)?
        .map(Into::into)
        .ok_or_else(|| not_found(ChannelKind::Slack, channel.id))
    }

    async fn exists_slack(
        &self,
        webhook_url: &str,
        channel_name: &str,
    ) -> Result<bool, CoreError> {
        SlackChannelRepo::exists(&self.pool, webhook_url, channel_name)
            .await
            .map_err(classify)
    }

    async fn create_email(&self, channel: NewEmailChannel) -> Result<EmailChannel, CoreError> {
        EmailChannelRepo::create(&self.pool, &channel)
            .await
            .map(Into::into)
            .map_err(classify)
    }

    async fn get_email(&self, id: ChannelId) -> Result<EmailChannel, CoreError> {
        EmailChannelRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify)?
            .map(Into::into)
            .ok_or_else(|| not_found(ChannelKind::Email, id))
    }

    async fn list_email(&self, organization_id: &str) -> Result<Vec<EmailChannel>, CoreError> {
        let rows = EmailChannelRepo::list_by_organization(&self.pool, organization_id)
            .await
            .map_err(classify)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_email(&self, channel: EmailChannel) -> Result<EmailChannel, CoreError> {
        EmailChannelRepo::update(&self.pool, channel.id, &channel.email)
            .await
            .map_err(classify)?
            .map(Into::into)
            .ok_or_else(|| not_found(ChannelKind::Email, channel.id))
    }

    async fn exists_email(&self, email: &str) -> Result<bool, CoreError> {
        EmailChannelRepo::exists(&self.pool, email)
            .await
            .map_err(classify)
    }

    async fn delete(&self, kind: ChannelKind, id: ChannelId) -> Result<(), CoreError> {
        let deleted = match kind {
            ChannelKind::Slack => SlackChannelRepo::delete(&self.pool, id).await,
            ChannelKind::Email => EmailChannelRepo::delete(&self.pool, id).await,
        }
        .map_err(classify)?;

        if deleted {
            Ok(())
        } else {
            Err(not_found(kind, id))
        }
    }

    async fn ping(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool).await.map_err(classify)
    }
}
