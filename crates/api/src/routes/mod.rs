pub mod channels;
pub mod events;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /organizations/{org_id}/channels                 list both kinds
/// /organizations/{org_id}/channels/slack           list, register
/// /organizations/{org_id}/channels/slack/{id}      get, update, delete
/// /organizations/{org_id}/channels/email           list, register
/// /organizations/{org_id}/channels/email/{id}      get, update, delete
/// /organizations/{org_id}/events                   publish event (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest(
        "/organizations/{org_id}",
        Router::new()
            .nest("/channels", channels::router())
            .nest("/events", events::router()),
    )
}
