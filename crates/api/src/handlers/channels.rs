//! Handlers for an organization's notification channels.
//!
//! Every endpoint requires authentication; the registry additionally checks
//! that the caller manages the organization in the path.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use orgnotify_core::channels::{EmailChannelInput, SlackChannelInput};
use orgnotify_core::types::ChannelId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/organizations/{org_id}/channels
///
/// Both Slack and email channels of the organization.
pub async fn list_channels(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let channels = state.registry.list_channels(&auth.principal, &org_id).await?;
    Ok(Json(DataResponse { data: channels }))
}

// ---------------------------------------------------------------------------
// Slack
// ---------------------------------------------------------------------------

/// GET /api/v1/organizations/{org_id}/channels/slack
pub async fn list_slack(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let channels = state.registry.list_slack(&auth.principal, &org_id).await?;
    Ok(Json(DataResponse { data: channels }))
}

/// POST /api/v1/organizations/{org_id}/channels/slack
pub async fn create_slack(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(input): Json<SlackChannelInput>,
) -> AppResult<impl IntoResponse> {
    let channel = state
        .registry
        .register_slack(&auth.principal, &org_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: channel })))
}

/// GET /api/v1/organizations/{org_id}/channels/slack/{id}
pub async fn get_slack(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, ChannelId)>,
) -> AppResult<impl IntoResponse> {
    let channel = state.registry.get_slack(&auth.principal, &org_id, id).await?;
    Ok(Json(DataResponse { data: channel }))
}

/// PUT /api/v1/organizations/{org_id}/channels/slack/{id}
///
/// Replaces both the webhook URL and the channel name.
pub async fn update_slack(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, ChannelId)>,
    Json(input): Json<SlackChannelInput>,
) -> AppResult<impl IntoResponse> {
    let channel = state
        .registry
        .update_slack(&auth.principal, &org_id, id, input)
        .await?;
    Ok(Json(DataResponse { data: channel }))
}

/// DELETE /api/v1/organizations/{org_id}/channels/slack/{id}
pub async fn delete_slack(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, ChannelId)>,
) -> AppResult<StatusCode> {
    state
        .registry
        .delete_slack(&auth.principal, &org_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// GET /api/v1/organizations/{org_id}/channels/email
pub async fn list_email(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(org_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let channels = state.registry.list_email(&auth.principal, &org_id).await?;
    Ok(Json(DataResponse { data: channels }))
}

/// POST /api/v1/organizations/{org_id}/channels/email
pub async fn create_email(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    Json(input): Json<EmailChannelInput>,
) -> AppResult<impl IntoResponse> {
    let channel = state
        .registry
        .register_email(&auth.principal, &org_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: channel })))
}

/// GET /api/v1/organizations/{org_id}/channels/email/{id}
pub async fn get_email(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, ChannelId)>,
) -> AppResult<impl IntoResponse> {
    let channel = state.registry.get_email(&auth.principal, &org_id, id).await?;
    Ok(Json(DataResponse { data: channel }))
}

/// PUT /api/v1/organizations/{org_id}/channels/email/{id}
pub async fn update_email(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, ChannelId)>,
    Json(input): Json<EmailChannelInput>,
) -> AppResult<impl IntoResponse> {
    let channel = state
        .registry
        .update_email(&auth.principal, &org_id, id, input)
        .await?;
    Ok(Json(DataResponse { data: channel }))
}

/// DELETE /api/v1/organizations/{org_id}/channels/email/{id}
pub async fn delete_email(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((org_id, id)): Path<(String, ChannelId)>,
) -> AppResult<StatusCode> {
    state
        .registry
        .delete_email(&auth.principal, &org_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
