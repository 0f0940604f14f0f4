//! Outbound HTTP calls to the downstream Jenkins.

use std::{collections::BTreeMap, time::Duration};

use reqwest::{Client, Method};
use tracing::{debug, info, warn};

use crate::config::mask_credentials;
use crate::error::RequestError;

use super::types::{
    HttpMethod, OutboundRelayRequest, RelayResponse, ResponseBody, HEALTH_TIMEOUT_MS,
};

/// Path segment that marks a Jenkins GitHub plugin hook URL.
const GITHUB_WEBHOOK_SEGMENT: &str = "/github-webhook/";

/// Replacement used to derive the health probe URL.
const PING_SEGMENT: &str = "/ping";

/// HTTP client for relaying deliveries and probing the target.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpRelayClient {
    client: Client,
    target_url: String,
    health_timeout: Duration,
}

impl HttpRelayClient {
    /// Create a client for the given target.
    pub fn new(target_url: impl Into<String>) -> Result<Self, RequestError> {
        let client = Client::builder()
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| RequestError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, target_url))
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(client: Client, target_url: impl Into<String>) -> Self {
        Self {
            client,
            target_url: target_url.into(),
            health_timeout: Duration::from_millis(HEALTH_TIMEOUT_MS),
        }
    }

    /// Override the health probe timeout.
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// Send a request and read the response.
    ///
    /// The whole exchange, including reading the body, is bounded by the
    /// request timeout. The body is returned as JSON when it parses, and as
    /// raw text otherwise.
    pub async fn send(&self, request: &OutboundRelayRequest) -> Result<RelayResponse, RequestError> {
        let timeout = request.timeout();
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self.client.request(method, &request.url).timeout(timeout);

        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            let encoded = serde_json::to_vec(body).map_err(|e| RequestError::Encode(e.to_string()))?;
            builder = builder.body(encoded);
        }

        debug!(
            method = %request.method,
            url = %mask_credentials(&request.url),
            timeout_ms = timeout.as_millis() as u64,
            "relay_request_starting"
        );

        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(e, timeout))?;

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();

        let body = match response.text().await {
            Ok(text) => ResponseBody::from_text(text),
            Err(e) if e.is_timeout() => return Err(classify_error(e, timeout)),
            Err(e) => {
                warn!(status_code = status, error = %e, "relay_response_body_unreadable");
                ResponseBody::Empty
            }
        };

        debug!(
            method = %request.method,
            status_code = status,
            json_body = matches!(body, ResponseBody::Json(_)),
            "relay_request_complete"
        );

        Ok(RelayResponse {
            status,
            body,
            headers,
        })
    }

    /// URL probed by [`health_check`](Self::health_check).
    pub fn probe_url(&self) -> String {
        probe_url(&self.target_url)
    }

    /// Probe the target, returning the status when it is in [200, 400).
    pub async fn probe(&self) -> Result<u16, RequestError> {
        let request = OutboundRelayRequest::probe(
            self.probe_url(),
            self.health_timeout.as_millis() as u64,
        );

        let response = self.send(&request).await?;

        if (200..400).contains(&response.status) {
            Ok(response.status)
        } else {
            Err(RequestError::NonSuccessStatus {
                status: response.status,
            })
        }
    }

    /// Whether the target is reachable. Never fails.
    pub async fn health_check(&self) -> bool {
        match self.probe().await {
            Ok(status) => {
                info!(status_code = status, "jenkins_health_ok");
                true
            }
            Err(e) => {
                warn!(
                    url = %mask_credentials(&self.probe_url()),
                    error = %e,
                    timeout = e.is_timeout(),
                    "jenkins_health_failed"
                );
                false
            }
        }
    }
}

/// Derive the health probe URL from the relay target.
///
/// Jenkins hook URLs end in `/github-webhook/`; the probe hits `/ping` on
/// the same host instead. Other URLs are probed unchanged.
pub fn probe_url(target_url: &str) -> String {
    target_url.replacen(GITHUB_WEBHOOK_SEGMENT, PING_SEGMENT, 1)
}

fn classify_error(e: reqwest::Error, timeout: Duration) -> RequestError {
    if e.is_timeout() {
        RequestError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        RequestError::Network(e.to_string())
    }
}
