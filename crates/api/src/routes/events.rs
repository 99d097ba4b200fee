//! Route definitions for `/organizations/{org_id}/events`.

use axum::routing::post;
use axum::Router;

use crate::handlers::events;
use crate::state::AppState;

/// Routes mounted at `/organizations/{org_id}/events`.
///
/// ```text
/// POST   /                 -> publish_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(events::publish_event))
}
