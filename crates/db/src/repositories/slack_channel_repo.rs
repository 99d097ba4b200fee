//! Repository for the `slack_channels` table.

use orgnotify_core::channels::NewSlackChannel;
use orgnotify_core::types::ChannelId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::channel::SlackChannelRow;

const COLUMNS: &str = "id, organization_id, webhook_url, slack_channel, created_at, updated_at";

/// Provides CRUD operations for Slack channels.
pub struct SlackChannelRepo;

impl SlackChannelRepo {
    /// Insert a new Slack channel with a freshly generated id.
    pub async fn create(
        pool: &PgPool,
        input: &NewSlackChannel,
    ) -> Result<SlackChannelRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO slack_channels (id, organization_id, webhook_url, slack_channel) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SlackChannelRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.organization_id)
            .bind(&input.webhook_url)
            .bind(&input.channel_name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: ChannelId,
    ) -> Result<Option<SlackChannelRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM slack_channels WHERE id = $1");
        sqlx::query_as::<_, SlackChannelRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an organization's Slack channels, oldest first.
    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: &str,
    ) -> Result<Vec<SlackChannelRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM slack_channels \
             WHERE organization_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, SlackChannelRow>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    /// Replace the webhook URL and channel name. Returns `None` if absent.
    pub async fn update(
        pool: &PgPool,
        id: ChannelId,
        webhook_url: &str,
        channel_name: &str,
    ) -> Result<Option<SlackChannelRow>, sqlx::Error> {
        let query = format!(
            "UPDATE slack_channels SET \
                 webhook_url = $2, \
                 slack_channel = $3, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SlackChannelRow>(&query)
            .bind(id)
            .bind(webhook_url)
            .bind(channel_name)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(
        pool: &PgPool,
        webhook_url: &str,
        channel_name: &str,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM slack_channels \
             WHERE webhook_url = $1 AND slack_channel = $2)",
        )
        .bind(webhook_url)
        .bind(channel_name)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Delete a Slack channel. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: ChannelId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM slack_channels WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
