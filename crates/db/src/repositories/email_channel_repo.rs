//! Repository for the `email_channels` table.

use orgnotify_core::channels::NewEmailChannel;
use orgnotify_core::types::ChannelId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::channel::EmailChannelRow;

const COLUMNS: &str = "id, organization_id, email, created_at, updated_at";

/// Provides CRUD operations for email channels.
pub struct EmailChannelRepo;

impl EmailChannelRepo {
    pub async fn create(
        pool: &PgPool,
        input: &NewEmailChannel,
    ) -> Result<EmailChannelRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO email_channels (id, organization_id, email) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailChannelRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.organization_id)
            .bind(&input.email)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: ChannelId,
    ) -> Result<Option<EmailChannelRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM email_channels WHERE id = $1");
        sqlx::query_as::<_, EmailChannelRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: &str,
    ) -> Result<Vec<EmailChannelRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM email_channels \
             WHERE organization_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, EmailChannelRow>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: ChannelId,
        email: &str,
    ) -> Result<Option<EmailChannelRow>, sqlx::Error> {
        let query = format!(
            "UPDATE email_channels SET email = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailChannelRow>(&query)
            .bind(id)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM email_channels WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    pub async fn delete(pool: &PgPool, id: ChannelId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM email_channels WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
