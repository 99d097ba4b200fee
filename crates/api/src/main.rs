use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use orgnotify_api::config::ServerConfig;
use orgnotify_api::router::build_app_router;
use orgnotify_api::state::AppState;
use orgnotify_core::registry::ChannelRegistry;
use orgnotify_core::store::ChannelStore;
use orgnotify_core::templates::Templates;
use orgnotify_events::{
    Dispatcher, EmailConfig, EventBus, Mailer, NotificationWorker, ReqwestWebhookClient,
    SmtpMailer, WebhookClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "orgnotify_api=debug,orgnotify_core=debug,orgnotify_events=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = orgnotify_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    orgnotify_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    orgnotify_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let store: Arc<dyn ChannelStore> = Arc::new(orgnotify_db::PgChannelStore::new(pool));

    // --- Delivery ---
    let templates = match &config.template_dir {
        Some(dir) => {
            let templates = Templates::load_dir(dir).expect("Failed to load message templates");
            tracing::info!(dir = %dir.display(), "Message template overrides loaded");
            templates
        }
        None => Templates::new(),
    };

    let webhook: Arc<dyn WebhookClient> = Arc::new(
        ReqwestWebhookClient::new(config.delivery_timeout())
            .expect("Failed to build HTTP client")
            .with_retry_delays(config.webhook_retry_delays.clone()),
    );

    let mailer: Option<Arc<dyn Mailer>> = match EmailConfig::from_env() {
        Some(email_config) => {
            let email_config = email_config.with_timeout(config.delivery_timeout());
            tracing::info!(smtp_host = %email_config.smtp_host, "SMTP delivery enabled");
            let mailer: Arc<dyn Mailer> =
                Arc::new(SmtpMailer::new(email_config).expect("Invalid SMTP configuration"));
            Some(mailer)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, email notifications disabled");
            None
        }
    };

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&store),
        webhook,
        mailer,
        Arc::new(templates),
        config.dispatch_config(),
    ));

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let worker_handle =
        tokio::spawn(NotificationWorker::new(dispatcher).run(event_bus.subscribe()));
    tracing::info!("Notification worker started");

    // --- App state ---
    let state = AppState {
        registry: ChannelRegistry::new(Arc::clone(&store), config.limits),
        store,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining notifications");

    // Dropping the last sender closes the channel; the worker finishes the
    // queued events and exits.
    drop(event_bus);
    if tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), worker_handle)
        .await
        .is_err()
    {
        tracing::warn!("Notification worker did not finish before shutdown timeout");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
