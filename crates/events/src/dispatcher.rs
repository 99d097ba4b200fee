//! Fan-out of one data-request event to an organization's channels.
//!
//! [`Dispatcher::dispatch`] looks up the organization's Slack and email
//! channels, renders one message per channel and attempts every delivery
//! concurrently. A failed delivery never stops the others; failures are
//! logged and collected in the returned [`DispatchReport`].

use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};
use orgnotify_core::channels::{EmailChannel, SlackChannel};
use orgnotify_core::error::CoreError;
use orgnotify_core::event::{EventKind, NotificationEvent, OrganizationMember};
use orgnotify_core::store::ChannelStore;
use orgnotify_core::templates::{
    TemplateKey, TemplateVars, Templates, VAR_DATAREQUEST_DESCRIPTION, VAR_DATAREQUEST_ID,
    VAR_DATAREQUEST_TITLE, VAR_DATAREQUEST_URL, VAR_ORGANIZATION_ID, VAR_SITE_TITLE, VAR_SITE_URL,
    VAR_USER_FULLNAME,
};
use orgnotify_core::types::ChannelId;
use serde::Serialize;

use crate::delivery::email::Mailer;
use crate::delivery::webhook::WebhookClient;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Site-wide Slack webhook that receives every event in addition to the
/// organization's own channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSlackTarget {
    pub webhook_url: String,
    pub username: Option<String>,
    pub channel: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub site_title: String,
    pub site_url: String,
    pub site_slack: Option<SiteSlackTarget>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            site_title: "Open Data".to_string(),
            site_url: "http://localhost:5000".to_string(),
            site_slack: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Where a delivery was headed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeliveryTarget {
    Slack {
        channel_id: ChannelId,
        channel_name: String,
    },
    SiteSlack,
    Email {
        channel_id: ChannelId,
        email: String,
    },
    Member {
        email: String,
    },
}

impl std::fmt::Display for DeliveryTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryTarget::Slack { channel_name, .. } => write!(f, "slack:{channel_name}"),
            DeliveryTarget::SiteSlack => f.write_str("slack:site"),
            DeliveryTarget::Email { email, .. } => write!(f, "email:{email}"),
            DeliveryTarget::Member { email } => write!(f, "member:{email}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryFailure {
    pub target: DeliveryTarget,
    pub error: String,
}

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Deliveries attempted.
    pub attempted: usize,
    /// Deliveries that succeeded.
    pub delivered: usize,
    /// Email deliveries skipped because no mailer is configured.
    pub skipped: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl DispatchReport {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

type Delivery<'a> = BoxFuture<'a, Result<(), DeliveryFailure>>;

pub struct Dispatcher {
    store: Arc<dyn ChannelStore>,
    webhook: Arc<dyn WebhookClient>,
    mailer: Option<Arc<dyn Mailer>>,
    templates: Arc<Templates>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ChannelStore>,
        webhook: Arc<dyn WebhookClient>,
        mailer: Option<Arc<dyn Mailer>>,
        templates: Arc<Templates>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            webhook,
            mailer,
            templates,
            config,
        }
    }

    /// Deliver `event` to every channel of its organization.
    ///
    /// Only a failure to read the channel lists is an error; delivery
    /// failures are reported in the returned [`DispatchReport`].
    pub async fn dispatch(&self, event: &NotificationEvent) -> Result<DispatchReport, CoreError> {
        let organization_id = event.organization_id.as_str();
        let (slack_channels, email_channels) = tokio::try_join!(
            self.store.list_slack(organization_id),
            self.store.list_email(organization_id),
        )?;

        let vars = self.template_vars(event);
        let mut deliveries: Vec<Delivery<'_>> = Vec::new();
        let mut report = DispatchReport::default();

        if !slack_channels.is_empty() || self.config.site_slack.is_some() {
            let text = self.templates.render(TemplateKey::Slack(event.kind), &vars);
            for channel in slack_channels {
                deliveries.push(self.slack_delivery(channel, text.clone()).boxed());
            }
            if let Some(site) = &self.config.site_slack {
                deliveries.push(self.site_slack_delivery(site, text).boxed());
            }
        }

        match &self.mailer {
            Some(mailer) => {
                if !email_channels.is_empty() {
                    let subject = self.templates.render(TemplateKey::EmailSubject(event.kind), &vars);
                    let body = self.templates.render(TemplateKey::EmailBody(event.kind), &vars);
                    for channel in email_channels {
                        deliveries.push(
                            email_delivery(mailer.as_ref(), channel, subject.clone(), body.clone())
                                .boxed(),
                        );
                    }
                }
                if event.kind == EventKind::Created {
                    for member in &event.members {
                        deliveries.push(self.member_delivery(mailer.as_ref(), member, &vars).boxed());
                    }
                }
            }
            None => {
                report.skipped = email_channels.len()
                    + if event.kind == EventKind::Created {
                        event.members.len()
                    } else {
                        0
                    };
                if report.skipped > 0 {
                    tracing::warn!(
                        organization_id,
                        skipped = report.skipped,
                        "SMTP not configured, skipping email notifications",
                    );
                }
            }
        }

        report.attempted = deliveries.len();
        for outcome in join_all(deliveries).await {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(failure) => {
                    tracing::warn!(
                        organization_id,
                        datarequest_id = %event.datarequest_id,
                        target = %failure.target,
                        error = %failure.error,
                        "Notification delivery failed",
                    );
                    report.failures.push(failure);
                }
            }
        }

        tracing::info!(
            organization_id,
            datarequest_id = %event.datarequest_id,
            kind = %event.kind,
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failures.len(),
            "Notifications dispatched",
        );
        Ok(report)
    }

    fn template_vars(&self, event: &NotificationEvent) -> TemplateVars {
        let mut vars = TemplateVars::new();
        vars.insert(VAR_SITE_TITLE, self.config.site_title.clone());
        vars.insert(VAR_SITE_URL, self.config.site_url.clone());
        vars.insert(VAR_DATAREQUEST_ID, event.datarequest_id.clone());
        vars.insert(VAR_DATAREQUEST_TITLE, event.title.clone());
        vars.insert(VAR_DATAREQUEST_DESCRIPTION, event.description.clone());
        vars.insert(VAR_DATAREQUEST_URL, event.resolved_url(&self.config.site_url));
        vars.insert(VAR_ORGANIZATION_ID, event.organization_id.clone());
        vars
    }

    async fn slack_delivery(&self, channel: SlackChannel, text: String) -> Result<(), DeliveryFailure> {
        let payload = serde_json::json!({ "text": text });
        self.webhook
            .post_json(&channel.webhook_url, &payload)
            .await
            .map_err(|e| DeliveryFailure {
                target: DeliveryTarget::Slack {
                    channel_id: channel.id,
                    channel_name: channel.channel_name,
                },
                error: e.to_string(),
            })
    }

    async fn site_slack_delivery(
        &self,
        site: &SiteSlackTarget,
        text: String,
    ) -> Result<(), DeliveryFailure> {
        let mut payload = serde_json::json!({ "text": text });
        if let Some(username) = &site.username {
            payload["username"] = serde_json::Value::String(username.clone());
        }
        if let Some(channel) = &site.channel {
            payload["channel"] = serde_json::Value::String(channel.clone());
        }
        self.webhook
            .post_json(&site.webhook_url, &payload)
            .await
            .map_err(|e| DeliveryFailure {
                target: DeliveryTarget::SiteSlack,
                error: e.to_string(),
            })
    }

    async fn member_delivery(
        &self,
        mailer: &dyn Mailer,
        member: &OrganizationMember,
        vars: &TemplateVars,
    ) -> Result<(), DeliveryFailure> {
        let mut vars = vars.clone();
        vars.insert(VAR_USER_FULLNAME, member.fullname.clone());
        let subject = self.templates.render(TemplateKey::MemberSubject, &vars);
        let body = self.templates.render(TemplateKey::MemberBody, &vars);

        mailer
            .send(&member.email, &subject, &body)
            .await
            .map_err(|e| DeliveryFailure {
                target: DeliveryTarget::Member {
                    email: member.email.clone(),
                },
                error: e.to_string(),
            })
    }
}

async fn email_delivery(
    mailer: &dyn Mailer,
    channel: EmailChannel,
    subject: String,
    body: String,
) -> Result<(), DeliveryFailure> {
    mailer
        .send(&channel.email, &subject, &body)
        .await
        .map_err(|e| DeliveryFailure {
            target: DeliveryTarget::Email {
                channel_id: channel.id,
                email: channel.email,
            },
            error: e.to_string(),
        })
}
