use std::sync::Arc;

use orgnotify_core::registry::ChannelRegistry;
use orgnotify_core::store::ChannelStore;
use orgnotify_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Channel management service.
    pub registry: ChannelRegistry,
    /// The store behind the registry, used directly by the health check.
    pub store: Arc<dyn ChannelStore>,
    /// Server configuration (JWT settings are read by the auth extractor).
    pub config: Arc<ServerConfig>,
    /// Bus the notification worker consumes.
    pub event_bus: Arc<EventBus>,
}
