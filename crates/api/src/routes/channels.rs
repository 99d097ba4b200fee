//! Route definitions for `/organizations/{org_id}/channels`.

use axum::routing::get;
use axum::Router;

use crate::handlers::channels;
use crate::state::AppState;

/// Routes mounted at `/organizations/{org_id}/channels`.
///
/// ```text
/// GET    /                 -> list_channels
/// GET    /slack            -> list_slack
/// POST   /slack            -> create_slack
/// GET    /slack/{id}       -> get_slack
/// PUT    /slack/{id}       -> update_slack
/// DELETE /slack/{id}       -> delete_slack
/// GET    /email            -> list_email
/// POST   /email            -> create_email
/// GET    /email/{id}       -> get_email
/// PUT    /email/{id}       -> update_email
/// DELETE /email/{id}       -> delete_email
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(channels::list_channels))
        // Slack
        .route(
            "/slack",
            get(channels::list_slack).post(channels::create_slack),
        )
        .route(
            "/slack/{id}",
            get(channels::get_slack)
                .put(channels::update_slack)
                .delete(channels::delete_slack),
        )
        // Email
        .route(
            "/email",
            get(channels::list_email).post(channels::create_email),
        )
        .route(
            "/email/{id}",
            get(channels::get_email)
                .put(channels::update_email)
                .delete(channels::delete_email),
        )
}
