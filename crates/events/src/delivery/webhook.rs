//! Slack incoming-webhook delivery.
//!
//! [`ReqwestWebhookClient`] POSTs a JSON body to a webhook URL. A non-2xx
//! response counts as a failure. By default a single attempt is made; a
//! list of retry delays enables bounded retry with backoff.

use std::time::Duration;

use async_trait::async_trait;

/// Default HTTP timeout for a single delivery attempt.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// WebhookClient
// ---------------------------------------------------------------------------

/// Sends a JSON payload to a webhook URL.
#[async_trait]
pub trait WebhookClient: Send + Sync {
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<(), WebhookError>;
}

/// [`WebhookClient`] over a shared `reqwest::Client`.
pub struct ReqwestWebhookClient {
    client: reqwest::Client,
    retry_delays: Vec<Duration>,
}

impl ReqwestWebhookClient {
    /// Build a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            retry_delays: Vec::new(),
        })
    }

    /// Retry a failed delivery once per entry, sleeping that long first.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, url: &str, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self.client.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl WebhookClient for ReqwestWebhookClient {
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let mut result = self.try_send(url, payload).await;

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            let Err(e) = &result else { break };
            tracing::warn!(
                attempt = attempt + 1,
                url,
                error = %e,
                retry_in_secs = delay.as_secs_f64(),
                "Webhook delivery attempt failed, retrying",
            );
            tokio::time::sleep(*delay).await;
            result = self.try_send(url, payload).await;
        }

        result
    }
}

/// Parse a comma-separated list of delays in seconds, e.g. `"1,2,4"`.
///
/// Blank input yields no retries; unparsable entries are skipped.
pub fn parse_retry_delays(value: &str) -> Vec<Duration> {
    value
        .split(',')
        .filter_map(|part| part.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::{header, HeaderMap, Method, StatusCode};
    use axum::routing::any;
    use axum::Router;

    use super::*;

    /// One request as seen by the local hook endpoint.
    #[derive(Debug, Clone)]
    struct Received {
        method: Method,
        content_type: Option<String>,
        body: serde_json::Value,
    }

    #[derive(Clone, Default)]
    struct Hook {
        received: Arc<Mutex<Vec<Received>>>,
        /// Statuses to answer with, in order; `200` once exhausted.
        replies: Arc<Mutex<VecDeque<u16>>>,
    }

    async fn record(
        State(hook): State<Hook>,
        method: Method,
        headers: HeaderMap,
        body: Bytes,
    ) -> StatusCode {
        hook.received.lock().unwrap().push(Received {
            method,
            content_type: headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
        });
        let status = hook.replies.lock().unwrap().pop_front().unwrap_or(200);
        StatusCode::from_u16(status).unwrap()
    }

    /// Serve a hook endpoint on an ephemeral port, returning its URL.
    async fn serve_hook(replies: &[u16]) -> (String, Hook) {
        let hook = Hook {
            received: Arc::default(),
            replies: Arc::new(Mutex::new(replies.iter().copied().collect())),
        };
        let app = Router::new()
            .route("/services/T000/B000/XXXX", any(record))
            .with_state(hook.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/services/T000/B000/XXXX"), hook)
    }

    #[tokio::test]
    async fn posts_json_text_payload() {
        let (url, hook) = serve_hook(&[]).await;
        let client = ReqwestWebhookClient::new(DEFAULT_REQUEST_TIMEOUT).unwrap();

        client
            .post_json(&url, &serde_json::json!({ "text": "New data request" }))
            .await
            .unwrap();

        let received = hook.received.lock().unwrap().clone();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].method, Method::POST);
        assert_eq!(received[0].content_type.as_deref(), Some("application/json"));
        assert_eq!(received[0].body, serde_json::json!({ "text": "New data request" }));
    }

    #[tokio::test]
    async fn server_error_is_http_status() {
        let (url, hook) = serve_hook(&[500]).await;
        let client = ReqwestWebhookClient::new(DEFAULT_REQUEST_TIMEOUT).unwrap();

        let err = client
            .post_json(&url, &serde_json::json!({ "text": "hi" }))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::HttpStatus(500)));
        assert_eq!(hook.received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let (url, hook) = serve_hook(&[500, 503]).await;
        let client = ReqwestWebhookClient::new(DEFAULT_REQUEST_TIMEOUT)
            .unwrap()
            .with_retry_delays(vec![Duration::from_millis(10), Duration::from_millis(10)]);

        client
            .post_json(&url, &serde_json::json!({ "text": "hi" }))
            .await
            .unwrap();

        assert_eq!(hook.received.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_last_retry() {
        let (url, hook) = serve_hook(&[500, 500, 500]).await;
        let client = ReqwestWebhookClient::new(DEFAULT_REQUEST_TIMEOUT)
            .unwrap()
            .with_retry_delays(vec![Duration::from_millis(10)]);

        let err = client
            .post_json(&url, &serde_json::json!({ "text": "hi" }))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::HttpStatus(500)));
        assert_eq!(hook.received.lock().unwrap().len(), 2);
    }

    #[test]
    fn new_builds_client() {
        let client = ReqwestWebhookClient::new(DEFAULT_REQUEST_TIMEOUT).unwrap();
        assert!(client.retry_delays.is_empty());
    }

    #[test]
    fn webhook_error_display_http_status() {
        let err = WebhookError::HttpStatus(502);
        assert_eq!(err.to_string(), "Webhook returned HTTP 502");
    }

    #[test]
    fn webhook_error_display_request() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = WebhookError::Request(req_err);
        assert!(err.to_string().contains("HTTP request failed"));
    }

    #[test]
    fn retry_delays_parse() {
        assert_eq!(
            parse_retry_delays("1, 2,4"),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
        assert!(parse_retry_delays("").is_empty());
        assert_eq!(parse_retry_delays("x,3"), vec![Duration::from_secs(3)]);
    }

    #[tokio::test]
    async fn unreachable_host_is_request_error() {
        let client = ReqwestWebhookClient::new(Duration::from_millis(500)).unwrap();
        let err = client
            .post_json("http://127.0.0.1:9/hook", &serde_json::json!({"text": "hi"}))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::Request(_)));
    }
}
