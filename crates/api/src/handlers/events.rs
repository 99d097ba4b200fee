//! Handler for publishing data-request events.
//!
//! The host application calls this when a data request is created,
//! commented on or closed. Delivery happens in the background worker; the
//! request returns as soon as the event is on the bus.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use orgnotify_core::access::ensure_can_publish;
use orgnotify_core::event::{EventKind, NotificationEvent, OrganizationMember};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /organizations/{org_id}/events`.
#[derive(Debug, Deserialize)]
pub struct PublishEventRequest {
    pub kind: EventKind,
    pub datarequest_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: Option<String>,
    #[serde(default)]
    pub members: Vec<OrganizationMember>,
}

#[derive(Debug, Serialize)]
pub struct PublishEventResponse {
    pub kind: EventKind,
    pub organization_id: String,
    pub datarequest_id: String,
    /// Whether a notification worker received the event.
    pub queued: bool,
}

/// POST /api/v1/organizations/{org_id}/events
///
/// Queue notifications for a data-request event. Returns 202.
///
/// Restricted to site administrators; the member list is mailed as given.
pub async fn publish_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(input): Json<PublishEventRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_can_publish(&auth.principal, &org_id)?;

    if input.datarequest_id.trim().is_empty() {
        return Err(AppError::BadRequest("datarequest_id must not be empty".into()));
    }
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }

    let mut event = NotificationEvent::new(
        input.kind,
        org_id.clone(),
        input.datarequest_id.trim(),
        input.title.trim(),
        input.description,
    )
    .with_members(input.members);
    if let Some(url) = input.url.filter(|u| !u.trim().is_empty()) {
        event = event.with_url(url);
    }

    let response = PublishEventResponse {
        kind: event.kind,
        organization_id: org_id,
        datarequest_id: event.datarequest_id.clone(),
        queued: false,
    };
    let receivers = state.event_bus.publish(event);

    tracing::info!(
        organization_id = %response.organization_id,
        datarequest_id = %response.datarequest_id,
        kind = %response.kind,
        user_id = %auth.principal.user_id,
        receivers,
        "Data request event published",
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: PublishEventResponse {
                queued: receivers > 0,
                ..response
            },
        }),
    ))
}
