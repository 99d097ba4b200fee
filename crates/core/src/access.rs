//! Authorization of channel management and event publishing.
//!
//! The identity system is external: it hands us a [`Principal`] describing
//! the acting user and the organizations they administer. The guard is
//! evaluated against that snapshot on every call and never cached, since
//! membership can change between requests.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The acting user as reported by the host identity system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    /// Organizations the user holds management rights over.
    #[serde(default)]
    pub managed_organizations: Vec<String>,
    /// Site administrators may manage every organization.
    #[serde(default)]
    pub is_sysadmin: bool,
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied(String),
}

/// Is `principal` permitted to manage notification channels of `organization_id`?
pub fn can_manage(principal: &Principal, organization_id: &str) -> AccessDecision {
    if principal.is_sysadmin
        || principal
            .managed_organizations
            .iter()
            .any(|org| org == organization_id)
    {
        return AccessDecision::Allowed;
    }

    AccessDecision::Denied(format!(
        "You do not have permission to manage notification channels for {organization_id}"
    ))
}

/// [`can_manage`] as a `Result`, mapping a denial to [`CoreError::NotAuthorized`].
pub fn ensure_can_manage(principal: &Principal, organization_id: &str) -> Result<(), CoreError> {
    match can_manage(principal, organization_id) {
        AccessDecision::Allowed => Ok(()),
        AccessDecision::Denied(reason) => {
            tracing::warn!(
                user_id = %principal.user_id,
                organization_id,
                "Channel management denied",
            );
            Err(CoreError::NotAuthorized(reason))
        }
    }
}

/// Only site administrators, i.e. the host application's service token, may
/// publish data-request events.
pub fn ensure_can_publish(principal: &Principal, organization_id: &str) -> Result<(), CoreError> {
    if principal.is_sysadmin {
        return Ok(());
    }

    tracing::warn!(
        user_id = %principal.user_id,
        organization_id,
        "Event publishing denied",
    );
    Err(CoreError::NotAuthorized(
        "Only site administrators may publish data request events".to_string(),
    ))
}
