//! Channel persistence seam.
//!
//! [`ChannelStore`] is implemented by the PostgreSQL store in `orgnotify-db`
//! and by [`MemoryChannelStore`] here. Both enforce the uniqueness
//! invariants themselves: a pair that passed the validator's pre-check can
//! still be rejected on insert when a concurrent registration won the race.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::channels::{
    ChannelKind, EmailChannel, NewEmailChannel, NewSlackChannel, SlackChannel,
};
use crate::error::CoreError;
use crate::types::ChannelId;
use crate::validation::{duplicate_email, duplicate_slack};

/// Durable storage of Slack and email channel records.
///
/// Every method is atomic from the caller's point of view. Missing records
/// are reported as [`CoreError::NotFound`], uniqueness violations as
/// [`CoreError::Validation`] and backend failures as [`CoreError::Storage`].
#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn create_slack(&self, channel: NewSlackChannel) -> Result<SlackChannel, CoreError>;

    async fn get_slack(&self, id: ChannelId) -> Result<SlackChannel, CoreError>;

    /// All Slack channels of an organization; empty when it has none.
    async fn list_slack(&self, organization_id: &str) -> Result<Vec<SlackChannel>, CoreError>;

    /// Replace `webhook_url` and `channel_name` of the record with `channel.id`.
    async fn update_slack(&self, channel: SlackChannel) -> Result<SlackChannel, CoreError>;

    async fn exists_slack(&self, webhook_url: &str, channel_name: &str)
        -> Result<bool, CoreError>;

    async fn create_email(&self, channel: NewEmailChannel) -> Result<EmailChannel, CoreError>;

    async fn get_email(&self, id: ChannelId) -> Result<EmailChannel, CoreError>;

    async fn list_email(&self, organization_id: &str) -> Result<Vec<EmailChannel>, CoreError>;

    async fn update_email(&self, channel: EmailChannel) -> Result<EmailChannel, CoreError>;

    async fn exists_email(&self, email: &str) -> Result<bool, CoreError>;

    async fn delete(&self, kind: ChannelKind, id: ChannelId) -> Result<(), CoreError>;

    /// Check that the backing storage is reachable.
    async fn ping(&self) -> Result<(), CoreError>;
}

fn not_found(kind: ChannelKind, id: ChannelId) -> CoreError {
    CoreError::NotFound {
        entity: kind.entity(),
        id,
    }
}

// ---------------------------------------------------------------------------
// MemoryChannelStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    slack: HashMap<ChannelId, SlackChannel>,
    email: HashMap<ChannelId, EmailChannel>,
}

/// Process-local [`ChannelStore`] backed by hash maps.
///
/// Uniqueness is checked and the record written under the same write lock,
/// so concurrent registrations of one pair cannot both succeed. Listings
/// are sorted by id.
#[derive(Default)]
pub struct MemoryChannelStore {
    tables: RwLock<Tables>,
}

impl MemoryChannelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChannelStore for MemoryChannelStore {
    async fn create_slack(&self, channel: NewSlackChannel) -> Result<SlackChannel, CoreError> {
        let mut tables = self.tables.write().await;
        if tables.slack.values().any(|c| {
            c.webhook_url == channel.webhook_url && c.channel_name == channel.channel_name
        }) {
            return Err(duplicate_slack().into());
        }

        let record = SlackChannel {
            id: Uuid::new_v4(),
            organization_id: channel.organization_id,
            webhook_url: channel.webhook_url,
            channel_name: channel.channel_name,
        };
        tables.slack.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_slack(&self, id: ChannelId) -> Result<SlackChannel, CoreError> {
        self.tables
            .read()
            .await
            .slack
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(ChannelKind::Slack, id))
    }

    async fn list_slack(&self, organization_id: &str) -> Result<Vec<SlackChannel>, CoreError> {
        let tables = self.tables.read().await;
        let mut channels: Vec<SlackChannel> = tables
            .slack
            .values()
            .filter(|c| c.organization_id == organization_id)
            .cloned()
            .collect();
        channels.sort_by_key(|c| c.id);
        Ok(channels)
    }

    async fn update_slack(&self, channel: SlackChannel) -> Result<SlackChannel, CoreError> {
        let mut tables = self.tables.write().await;
        if !tables.slack.contains_key(&channel.id) {
            return Err(not_found(ChannelKind::Slack, channel.id));
        }
        if tables.slack.values().any(|c| {
            c.id != channel.id
                && c.webhook_url == channel.webhook_url
                && c.channel_name == channel.channel_name
        }) {
            return Err(duplicate_slack().into());
        }

        let stored = tables
            .slack
            .get_mut(&channel.id)
            .ok_or_else(|| not_found(ChannelKind::Slack, channel.id))?;
        stored.webhook_url = channel.webhook_url;
        stored.channel_name = channel.channel_name;
        Ok(stored.clone())
    }

    async fn exists_slack(
        &self,
        webhook_url: &str,
        channel_name: &str,
    ) -> Result<bool, CoreError> {
        Ok(self
            .tables
            .read()
            .await
            .slack
            .values()
            .any(|c| c.webhook_url == webhook_url && c.channel_name == channel_name))
    }

    async fn create_email(&self, channel: NewEmailChannel) -> Result<EmailChannel, CoreError> {
        let mut tables = self.tables.write().await;
        if tables.email.values().any(|c| c.email == channel.email) {
            return Err(duplicate_email().into());
        }

        let record = EmailChannel {
            id: Uuid::new_v4(),
            organization_id: channel.organization_id,
            email: channel.email,
        };
        tables.email.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_email(&self, id: ChannelId) -> Result<EmailChannel, CoreError> {
        self.tables
            .read()
            .await
            .email
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(ChannelKind::Email, id))
    }

    async fn list_email(&self, organization_id: &str) -> Result<Vec<EmailChannel>, CoreError> {
        let tables = self.tables.read().await;
        let mut channels: Vec<EmailChannel> = tables
            .email
            .values()
            .filter(|c| c.organization_id == organization_id)
            .cloned()
            .collect();
        channels.sort_by_key(|c| c.id);
        Ok(channels)
    }

    async fn update_email(&self, channel: EmailChannel) -> Result<EmailChannel, CoreError> {
        let mut tables = self.tables.write().await;
        if !tables.email.contains_key(&channel.id) {
            return Err(not_found(ChannelKind::Email, channel.id));
        }
        if tables
            .email
            .values()
            .any(|c| c.id != channel.id && c.email == channel.email)
        {
            return Err(duplicate_email().into());
        }

        let stored = tables
            .email
            .get_mut(&channel.id)
            .ok_or_else(|| not_found(ChannelKind::Email, channel.id))?;
        stored.email = channel.email;
        Ok(stored.clone())
    }

    async fn exists_email(&self, email: &str) -> Result<bool, CoreError> {
        Ok(self
            .tables
            .read()
            .await
            .email
            .values()
            .any(|c| c.email == email))
    }

    async fn delete(&self, kind: ChannelKind, id: ChannelId) -> Result<(), CoreError> {
        let mut tables = self.tables.write().await;
        let removed = match kind {
            ChannelKind::Slack => tables.slack.remove(&id).is_some(),
            ChannelKind::Email => tables.email.remove(&id).is_some(),
        };
        if removed {
            Ok(())
        } else {
            Err(not_found(kind, id))
        }
    }

    async fn ping(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;

    const WEBHOOK: &str = "https://hooks.slack.com/services/T000/B000/XXXX";

    fn new_slack(org: &str, channel: &str) -> NewSlackChannel {
        NewSlackChannel {
            organization_id: org.into(),
            webhook_url: WEBHOOK.into(),
            channel_name: channel.into(),
        }
    }

    fn new_email(org: &str, email: &str) -> NewEmailChannel {
        NewEmailChannel {
            organization_id: org.into(),
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = MemoryChannelStore::new();
        let created = store.create_slack(new_slack("acme", "alerts")).await.unwrap();

        let fetched = store.get_slack(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.organization_id, "acme");
        assert_eq!(fetched.channel_name, "alerts");
    }

    #[tokio::test]
    async fn list_for_unknown_organization_is_empty() {
        let store = MemoryChannelStore::new();
        store.create_slack(new_slack("acme", "alerts")).await.unwrap();

        assert!(store.list_slack("globex").await.unwrap().is_empty());
        assert!(store.list_email("globex").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_filters_by_organization() {
        let store = MemoryChannelStore::new();
        store.create_slack(new_slack("acme", "alerts")).await.unwrap();
        store.create_slack(new_slack("acme", "ops")).await.unwrap();
        store.create_slack(new_slack("globex", "general")).await.unwrap();

        let acme = store.list_slack("acme").await.unwrap();
        assert_eq!(acme.len(), 2);
        assert!(acme.iter().all(|c| c.organization_id == "acme"));
    }

    #[tokio::test]
    async fn duplicate_slack_pair_rejected_on_insert() {
        let store = MemoryChannelStore::new();
        store.create_slack(new_slack("acme", "alerts")).await.unwrap();

        let err = store
            .create_slack(new_slack("globex", "alerts"))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(e) if !e.messages("channel_name").is_empty());
    }

    #[tokio::test]
    async fn same_webhook_different_channel_allowed() {
        let store = MemoryChannelStore::new();
        store.create_slack(new_slack("acme", "alerts")).await.unwrap();
        store.create_slack(new_slack("acme", "ops")).await.unwrap();

        assert!(store.exists_slack(WEBHOOK, "ops").await.unwrap());
        assert!(!store.exists_slack(WEBHOOK, "random").await.unwrap());
    }

    #[tokio::test]
    async fn update_replaces_fields_only() {
        let store = MemoryChannelStore::new();
        let created = store.create_slack(new_slack("acme", "alerts")).await.unwrap();

        let updated = store
            .update_slack(SlackChannel {
                channel_name: "ops".into(),
                organization_id: "ignored".into(),
                ..created.clone()
            })
            .await
            .unwrap();

        assert_eq!(updated.channel_name, "ops");
        assert_eq!(updated.organization_id, "acme");
        assert_eq!(store.get_slack(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let store = MemoryChannelStore::new();
        let err = store
            .update_email(EmailChannel {
                id: Uuid::new_v4(),
                organization_id: "acme".into(),
                email: "a@b.org".into(),
            })
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "EmailChannel", .. });
    }

    #[tokio::test]
    async fn update_to_other_records_email_rejected() {
        let store = MemoryChannelStore::new();
        store.create_email(new_email("acme", "a@acme.org")).await.unwrap();
        let second = store.create_email(new_email("acme", "b@acme.org")).await.unwrap();

        let err = store
            .update_email(EmailChannel {
                email: "a@acme.org".into(),
                ..second
            })
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[tokio::test]
    async fn delete_never_created_is_not_found() {
        let store = MemoryChannelStore::new();
        let id = Uuid::new_v4();
        let err = store.delete(ChannelKind::Slack, id).await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { id: missing, .. } if missing == id);
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = MemoryChannelStore::new();
        let created = store.create_email(new_email("acme", "a@acme.org")).await.unwrap();

        store.delete(ChannelKind::Email, created.id).await.unwrap();

        assert!(!store.exists_email("a@acme.org").await.unwrap());
        assert_matches!(
            store.get_email(created.id).await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn concurrent_duplicate_registrations_only_one_wins() {
        let store = Arc::new(MemoryChannelStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create_slack(new_slack("acme", "alerts")).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.list_slack("acme").await.unwrap().len(), 1);
    }
}
