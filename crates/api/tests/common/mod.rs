#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use orgnotify_api::auth::jwt::{generate_access_token, JwtConfig};
use orgnotify_api::config::ServerConfig;
use orgnotify_api::router::build_app_router;
use orgnotify_api::state::AppState;
use orgnotify_core::access::Principal;
use orgnotify_core::registry::ChannelRegistry;
use orgnotify_core::store::{ChannelStore, MemoryChannelStore};
use orgnotify_core::validation::ValidationLimits;
use orgnotify_events::EventBus;
use tower::ServiceExt;

pub const WEBHOOK: &str = "https://hooks.slack.com/services/T000/B000/XXXX";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        site_title: "Open Data".to_string(),
        site_url: "https://data.example.org".to_string(),
        delivery_timeout_secs: 5,
        webhook_retry_delays: Vec::new(),
        site_slack: None,
        template_dir: None,
        limits: ValidationLimits::default(),
    }
}

/// The router plus the bus its handlers publish to.
pub struct TestApp {
    pub router: Router,
    pub event_bus: Arc<EventBus>,
    pub config: ServerConfig,
}

impl TestApp {
    /// Bearer token for a user managing `orgs`.
    pub fn token_for(&self, orgs: &[&str]) -> String {
        let principal = Principal {
            user_id: "u-1".to_string(),
            managed_organizations: orgs.iter().map(|o| o.to_string()).collect(),
            is_sysadmin: false,
        };
        generate_access_token(&principal, &self.config.jwt).unwrap()
    }

    pub fn sysadmin_token(&self) -> String {
        let principal = Principal {
            user_id: "root".to_string(),
            managed_organizations: vec![],
            is_sysadmin: true,
        };
        generate_access_token(&principal, &self.config.jwt).unwrap()
    }
}

/// Build the full application router over the given store, using the same
/// middleware stack as production.
pub fn build_test_app_with(store: Arc<dyn ChannelStore>) -> TestApp {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());

    let state = AppState {
        registry: ChannelRegistry::new(Arc::clone(&store), config.limits),
        store,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
    };

    TestApp {
        router: build_app_router(state, &config),
        event_bus,
        config,
    }
}

/// Build the application over an in-memory store.
pub fn build_test_app() -> TestApp {
    build_test_app_with(Arc::new(MemoryChannelStore::new()))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post_json(
    app: &TestApp,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json(
    app: &TestApp,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: &TestApp, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
