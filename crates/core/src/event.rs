//! Data-request events that trigger notification dispatch.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::{OrganizationId, Timestamp};

/// What happened to the data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Commented,
    Closed,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Commented => "commented",
            EventKind::Closed => "closed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An organization member who receives the "new data request" email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMember {
    pub fullname: String,
    pub email: String,
}

/// A data-request event addressed to one organization.
///
/// Constructed via [`NotificationEvent::new`] and enriched with
/// [`with_url`](NotificationEvent::with_url) and
/// [`with_members`](NotificationEvent::with_members).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: EventKind,
    pub organization_id: OrganizationId,
    pub datarequest_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Link to the data request. Derived from the site URL when absent.
    #[serde(default)]
    pub url: Option<String>,
    /// Members to notify by email for [`EventKind::Created`].
    #[serde(default)]
    pub members: Vec<OrganizationMember>,
    #[serde(default = "Utc::now")]
    pub timestamp: Timestamp,
}

impl NotificationEvent {
    pub fn new(
        kind: EventKind,
        organization_id: impl Into<OrganizationId>,
        datarequest_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            organization_id: organization_id.into(),
            datarequest_id: datarequest_id.into(),
            title: title.into(),
            description: description.into(),
            url: None,
            members: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_members(mut self, members: Vec<OrganizationMember>) -> Self {
        self.members = members;
        self
    }

    /// The link placed in messages: the explicit URL, or
    /// `{site_url}/datarequest/{datarequest_id}`.
    pub fn resolved_url(&self, site_url: &str) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "{}/datarequest/{}",
                site_url.trim_end_matches('/'),
                self.datarequest_id
            ),
        }
    }
}
