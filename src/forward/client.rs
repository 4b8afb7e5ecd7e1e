//! One-shot bounded forwarding of the inbound document.
//!
//! The forwarder reports transport outcomes, not application outcomes: an
//! upstream 500 is still `Ok`. Exactly one POST attempt per request, no
//! retries, no redirect following.

use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Terminal classification of one forwarded call.
#[derive(Debug, Clone)]
pub enum ForwardOutcome {
    /// Upstream answered; status and body are surfaced verbatim. `content`
    /// holds parsed JSON when the body parses, otherwise the raw string.
    Ok { status_code: u16, content: Value },

    /// No connection established, or response not completed, within the
    /// configured timeout.
    Timeout { elapsed: Duration },

    /// DNS failure, refusal, reset, or TLS failure.
    ConnectionError { reason: String },

    /// Upstream declared a JSON body that did not parse.
    BadResponse { reason: String },
}

/// Thread-safe HTTP forwarder sharing one connection pool across requests.
pub struct Forwarder {
    http_client: Client,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .redirect(redirect::Policy::none())
            .pool_max_idle_per_host(20)
            .build()?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    /// POST the payload to `url`, bounding connection + send + receive by
    /// the configured timeout. The request ID travels as `X-Request-ID`.
    pub async fn forward(&self, url: &str, payload: &Value, request_id: Uuid) -> ForwardOutcome {
        let start = Instant::now();

        debug!(
            destination_url = %url,
            timeout_secs = self.timeout.as_secs(),
            "Forwarding request to destination"
        );

        let result = self
            .http_client
            .post(url)
            .timeout(self.timeout)
            .header("X-Request-ID", request_id.to_string())
            .json(payload)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return ForwardOutcome::Timeout {
                    elapsed: start.elapsed(),
                }
            }
            Err(err) => {
                return ForwardOutcome::ConnectionError {
                    reason: err.to_string(),
                }
            }
        };

        let status_code = response.status().as_u16();
        let declared_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("json"));

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) if err.is_timeout() => {
                return ForwardOutcome::Timeout {
                    elapsed: start.elapsed(),
                }
            }
            Err(err) => {
                return ForwardOutcome::ConnectionError {
                    reason: format!("failed to read upstream response: {err}"),
                }
            }
        };

        match serde_json::from_slice::<Value>(&body) {
            Ok(content) => ForwardOutcome::Ok {
                status_code,
                content,
            },
            Err(err) if declared_json => ForwardOutcome::BadResponse {
                reason: format!("upstream declared JSON but body did not parse: {err}"),
            },
            Err(_) => ForwardOutcome::Ok {
                status_code,
                content: Value::String(String::from_utf8_lossy(&body).into_owned()),
            },
        }
    }
}
