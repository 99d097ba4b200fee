//! Channel management service.
//!
//! [`ChannelRegistry`] is the single entry point for registering, editing,
//! removing and listing an organization's channels. Every call checks the
//! acting [`Principal`] first, then validates, then writes to the store.

use std::sync::Arc;

use crate::access::{ensure_can_manage, Principal};
use crate::channels::{
    ChannelKind, EmailChannel, EmailChannelInput, OrganizationChannels, SlackChannel,
    SlackChannelInput,
};
use crate::error::CoreError;
use crate::store::ChannelStore;
use crate::types::ChannelId;
use crate::validation::{validate_email, validate_slack, Existing, ValidationLimits};

/// Access-checked, validated channel management over a [`ChannelStore`].
#[derive(Clone)]
pub struct ChannelRegistry {
    store: Arc<dyn ChannelStore>,
    limits: ValidationLimits,
}

impl ChannelRegistry {
    pub fn new(store: Arc<dyn ChannelStore>, limits: ValidationLimits) -> Self {
        Self { store, limits }
    }

    pub fn store(&self) -> &Arc<dyn ChannelStore> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Slack
    // -----------------------------------------------------------------------

    pub async fn register_slack(
        &self,
        principal: &Principal,
        organization_id: &str,
        input: SlackChannelInput,
    ) -> Result<SlackChannel, CoreError> {
        ensure_can_manage(principal, organization_id)?;
        let input = input.normalized();
        validate_slack(self.store.as_ref(), &self.limits, &input, Existing::None).await?;

        let channel = self.store.create_slack(input.into_new(organization_id)).await?;
        tracing::info!(
            organization_id,
            channel_id = %channel.id,
            channel_name = %channel.channel_name,
            user_id = %principal.user_id,
            "Slack channel registered",
        );
        Ok(channel)
    }

    pub async fn get_slack(
        &self,
        principal: &Principal,
        organization_id: &str,
        id: ChannelId,
    ) -> Result<SlackChannel, CoreError> {
        ensure_can_manage(principal, organization_id)?;
        self.owned_slack(organization_id, id).await
    }

    pub async fn list_slack(
        &self,
        principal: &Principal,
        organization_id: &str,
    ) -> Result<Vec<SlackChannel>, CoreError> {
        ensure_can_manage(principal, organization_id)?;
        self.store.list_slack(organization_id).await
    }

    /// Replace the webhook URL and channel name of an existing channel.
    pub async fn update_slack(
        &self,
        principal: &Principal,
        organization_id: &str,
        id: ChannelId,
        input: SlackChannelInput,
    ) -> Result<SlackChannel, CoreError> {
        ensure_can_manage(principal, organization_id)?;
        let current = self.owned_slack(organization_id, id).await?;
        let input = input.normalized();
        let current_input = SlackChannelInput {
            webhook_url: current.webhook_url.clone(),
            channel_name: current.channel_name.clone(),
        };
        validate_slack(
            self.store.as_ref(),
            &self.limits,
            &input,
            Existing::Current(&current_input),
        )
        .await?;

        let channel = self
            .store
            .update_slack(SlackChannel {
                webhook_url: input.webhook_url,
                channel_name: input.channel_name,
                ..current
            })
            .await?;
        tracing::info!(
            organization_id,
            channel_id = %channel.id,
            channel_name = %channel.channel_name,
            user_id = %principal.user_id,
            "Slack channel updated",
        );
        Ok(channel)
    }

    pub async fn delete_slack(
        &self,
        principal: &Principal,
        organization_id: &str,
        id: ChannelId,
    ) -> Result<(), CoreError> {
        ensure_can_manage(principal, organization_id)?;
        self.owned_slack(organization_id, id).await?;
        self.store.delete(ChannelKind::Slack, id).await?;
        tracing::info!(
            organization_id,
            channel_id = %id,
            user_id = %principal.user_id,
            "Slack channel deleted",
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Email
    // -----------------------------------------------------------------------

    pub async fn register_email(
        &self,
        principal: &Principal,
        organization_id: &str,
        input: EmailChannelInput,
    ) -> Result<EmailChannel, CoreError> {
        ensure_can_manage(principal, organization_id)?;
        let input = input.normalized();
        validate_email(self.store.as_ref(), &self.limits, &input, Existing::None).await?;

        let channel = self.store.create_email(input.into_new(organization_id)).await?;
        tracing::info!(
            organization_id,
            channel_id = %channel.id,
            user_id = %principal.user_id,
            "Email channel registered",
        );
        Ok(channel)
    }

    pub async fn get_email(
        &self,
        principal: &Principal,
        organization_id: &str,
        id: ChannelId,
    ) -> Result<EmailChannel, CoreError> {
        ensure_can_manage(principal, organization_id)?;
        self.owned_email(organization_id, id).await
    }

    pub async fn list_email(
        &self,
        principal: &Principal,
        organization_id: &str,
    ) -> Result<Vec<EmailChannel>, CoreError> {
        ensure_can_manage(principal, organization_id)?;
        self.store.list_email(organization_id).await
    }

    pub async fn update_email(
        &self,
        principal: &Principal,
        organization_id: &str,
        id: ChannelId,
        input: EmailChannelInput,
    ) -> Result<EmailChannel, CoreError> {
        ensure_can_manage(principal, organization_id)?;
        let current = self.owned_email(organization_id, id).await?;
        let input = input.normalized();
        let current_input = EmailChannelInput {
            email: current.email.clone(),
        };
        validate_email(
            self.store.as_ref(),
            &self.limits,
            &input,
            Existing::Current(&current_input),
        )
        .await?;

        let channel = self
            .store
            .update_email(EmailChannel {
                email: input.email,
                ..current
            })
            .await?;
        tracing::info!(
            organization_id,
            channel_id = %channel.id,
            user_id = %principal.user_id,
            "Email channel updated",
        );
        Ok(channel)
    }

    pub async fn delete_email(
        &self,
        principal: &Principal,
        organization_id: &str,
        id: ChannelId,
    ) -> Result<(), CoreError> {
        ensure_can_manage(principal, organization_id)?;
        self.owned_email(organization_id, id).await?;
        self.store.delete(ChannelKind::Email, id).await?;
        tracing::info!(
            organization_id,
            channel_id = %id,
            user_id = %principal.user_id,
            "Email channel deleted",
        );
        Ok(())
    }

    /// Both channel lists of an organization.
    pub async fn list_channels(
        &self,
        principal: &Principal,
        organization_id: &str,
    ) -> Result<OrganizationChannels, CoreError> {
        ensure_can_manage(principal, organization_id)?;
        let (slack, email) = tokio::try_join!(
            self.store.list_slack(organization_id),
            self.store.list_email(organization_id),
        )?;
        Ok(OrganizationChannels { slack, email })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Fetch a Slack channel, hiding records of other organizations.
    async fn owned_slack(
        &self,
        organization_id: &str,
        id: ChannelId,
    ) -> Result<SlackChannel, CoreError> {
        let channel = self.store.get_slack(id).await?;
        if channel.organization_id != organization_id {
            return Err(CoreError::NotFound {
                entity: ChannelKind::Slack.entity(),
                id,
            });
        }
        Ok(channel)
    }

    async fn owned_email(
        &self,
        organization_id: &str,
        id: ChannelId,
    ) -> Result<EmailChannel, CoreError> {
        let channel = self.store.get_email(id).await?;
        if channel.organization_id != organization_id {
            return Err(CoreError::NotFound {
                entity: ChannelKind::Email.entity(),
                id,
            });
        }
        Ok(channel)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use uuid::Uuid;

    use super::*;
    use crate::store::MemoryChannelStore;
    use crate::validation::{FIELD_CHANNEL_NAME, FIELD_EMAIL};

    const WEBHOOK: &str = "https://hooks.slack.com/services/T000/B000/XXXX";

    fn registry() -> ChannelRegistry {
        ChannelRegistry::new(Arc::new(MemoryChannelStore::new()), ValidationLimits::default())
    }

    fn admin_of(org: &str) -> Principal {
        Principal {
            user_id: "u-1".into(),
            managed_organizations: vec![org.into()],
            is_sysadmin: false,
        }
    }

    fn slack(url: &str, name: &str) -> SlackChannelInput {
        SlackChannelInput {
            webhook_url: url.into(),
            channel_name: name.into(),
        }
    }

    fn email(value: &str) -> EmailChannelInput {
        EmailChannelInput {
            email: value.into(),
        }
    }

    #[tokio::test]
    async fn register_then_list() {
        let registry = registry();
        let admin = admin_of("acme");

        let created = registry
            .register_slack(&admin, "acme", slack(WEBHOOK, "alerts"))
            .await
            .unwrap();

        let listed = registry.list_slack(&admin, "acme").await.unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn second_identical_registration_fails() {
        let registry = registry();
        let admin = admin_of("acme");
        registry
            .register_slack(&admin, "acme", slack(WEBHOOK, "alerts"))
            .await
            .unwrap();

        let err = registry
            .register_slack(&admin, "acme", slack(WEBHOOK, "alerts"))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(e)
            if e.messages(FIELD_CHANNEL_NAME) == ["Slack channel already exists"]);
    }

    #[tokio::test]
    async fn input_is_trimmed_before_validation() {
        let registry = registry();
        let created = registry
            .register_slack(&admin_of("acme"), "acme", slack(&format!(" {WEBHOOK} "), " alerts "))
            .await
            .unwrap();
        assert_eq!(created.channel_name, "alerts");
        assert_eq!(created.webhook_url, WEBHOOK);
    }

    #[tokio::test]
    async fn non_admin_cannot_register() {
        let registry = registry();
        let err = registry
            .register_email(&admin_of("globex"), "acme", email("ops@acme.org"))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotAuthorized(_));
        assert!(registry.store().list_email("acme").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn denial_precedes_validation() {
        let err = registry()
            .register_slack(&admin_of("globex"), "acme", slack("", ""))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotAuthorized(_));
    }

    #[tokio::test]
    async fn invalid_email_rejected() {
        let err = registry()
            .register_email(&admin_of("acme"), "acme", email("not-an-email"))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(e) if !e.messages(FIELD_EMAIL).is_empty());
    }

    #[tokio::test]
    async fn update_reflected_by_get() {
        let registry = registry();
        let admin = admin_of("acme");
        let created = registry
            .register_email(&admin, "acme", email("ops@acme.org"))
            .await
            .unwrap();

        registry
            .update_email(&admin, "acme", created.id, email("team@acme.org"))
            .await
            .unwrap();

        let fetched = registry.get_email(&admin, "acme", created.id).await.unwrap();
        assert_eq!(fetched.email, "team@acme.org");
    }

    #[tokio::test]
    async fn update_with_unchanged_values_succeeds() {
        let registry = registry();
        let admin = admin_of("acme");
        let created = registry
            .register_slack(&admin, "acme", slack(WEBHOOK, "alerts"))
            .await
            .unwrap();

        let updated = registry
            .update_slack(&admin, "acme", created.id, slack(WEBHOOK, "alerts"))
            .await
            .unwrap();
        assert_eq!(updated, created);
    }

    #[tokio::test]
    async fn update_to_pair_of_another_channel_rejected() {
        let registry = registry();
        let admin = admin_of("acme");
        registry
            .register_slack(&admin, "acme", slack(WEBHOOK, "alerts"))
            .await
            .unwrap();
        let ops = registry
            .register_slack(&admin, "acme", slack(WEBHOOK, "ops"))
            .await
            .unwrap();

        let err = registry
            .update_slack(&admin, "acme", ops.id, slack(WEBHOOK, "alerts"))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[tokio::test]
    async fn other_organizations_records_are_not_found() {
        let registry = registry();
        let created = registry
            .register_slack(&admin_of("acme"), "acme", slack(WEBHOOK, "alerts"))
            .await
            .unwrap();

        let globex = admin_of("globex");
        assert_matches!(
            registry.get_slack(&globex, "globex", created.id).await,
            Err(CoreError::NotFound { .. })
        );
        assert_matches!(
            registry.delete_slack(&globex, "globex", created.id).await,
            Err(CoreError::NotFound { .. })
        );
        assert!(registry
            .get_slack(&admin_of("acme"), "acme", created.id)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn delete_never_created_is_not_found() {
        let err = registry()
            .delete_email(&admin_of("acme"), "acme", Uuid::new_v4())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "EmailChannel", .. });
    }

    #[tokio::test]
    async fn list_channels_returns_both_kinds() {
        let registry = registry();
        let admin = admin_of("acme");
        registry
            .register_slack(&admin, "acme", slack(WEBHOOK, "alerts"))
            .await
            .unwrap();
        registry
            .register_email(&admin, "acme", email("ops@acme.org"))
            .await
            .unwrap();

        let channels = registry.list_channels(&admin, "acme").await.unwrap();
        assert_eq!(channels.slack.len(), 1);
        assert_eq!(channels.email.len(), 1);

        let empty = registry
            .list_channels(&admin_of("initech"), "initech")
            .await
            .unwrap();
        assert!(empty.slack.is_empty() && empty.email.is_empty());
    }
}
