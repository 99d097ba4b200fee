use std::path::PathBuf;
use std::time::Duration;

use orgnotify_core::validation::ValidationLimits;
use orgnotify_events::delivery::webhook::parse_retry_delays;
use orgnotify_events::{DispatchConfig, SiteSlackTarget};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for the notification worker on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    /// Site name used in notification messages.
    pub site_title: String,
    /// Public base URL used to build data-request links.
    pub site_url: String,
    /// Timeout for one webhook POST or SMTP exchange (default: `5`).
    pub delivery_timeout_secs: u64,
    /// Backoff before each webhook retry; empty disables retries.
    pub webhook_retry_delays: Vec<Duration>,
    /// Optional site-wide Slack webhook.
    pub site_slack: Option<SiteSlackTarget>,
    /// Directory holding message template overrides.
    pub template_dir: Option<PathBuf>,
    /// Length limits applied to channel input.
    pub limits: ValidationLimits,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3000`                  |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`     | `30`                    |
    /// | `SITE_TITLE`                | `Open Data`             |
    /// | `SITE_URL`                  | `http://localhost:5000` |
    /// | `DELIVERY_TIMEOUT_SECS`     | `5`                     |
    /// | `WEBHOOK_RETRY_DELAYS_SECS` | empty (no retry)        |
    /// | `SLACK_WEBHOOK_URL`         | unset                   |
    /// | `SLACK_USERNAME`            | unset                   |
    /// | `SLACK_CHANNEL`             | unset                   |
    /// | `TEMPLATE_DIR`              | unset                   |
    ///
    /// JWT settings come from [`JwtConfig::from_env`] and length limits from
    /// [`ValidationLimits::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let delivery_timeout_secs: u64 = std::env::var("DELIVERY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("DELIVERY_TIMEOUT_SECS must be a valid u64");

        let webhook_retry_delays = std::env::var("WEBHOOK_RETRY_DELAYS_SECS")
            .map(|v| parse_retry_delays(&v))
            .unwrap_or_default();

        let site_slack = non_empty_var("SLACK_WEBHOOK_URL").map(|webhook_url| SiteSlackTarget {
            webhook_url,
            username: non_empty_var("SLACK_USERNAME"),
            channel: non_empty_var("SLACK_CHANNEL"),
        });

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            site_title: std::env::var("SITE_TITLE").unwrap_or_else(|_| "Open Data".into()),
            site_url: std::env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:5000".into()),
            delivery_timeout_secs,
            webhook_retry_delays,
            site_slack,
            template_dir: non_empty_var("TEMPLATE_DIR").map(PathBuf::from),
            limits: ValidationLimits::from_env(),
        }
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }

    /// The subset of settings the dispatcher needs.
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            site_title: self.site_title.clone(),
            site_url: self.site_url.clone(),
            site_slack: self.site_slack.clone(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
