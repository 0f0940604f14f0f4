//! Records passed between the relay components.

use std::{collections::BTreeMap, fmt, time::Duration};

use axum::{body::Bytes, http::HeaderMap};
use serde::Serialize;
use serde_json::Value;

/// `User-Agent` sent on every relayed delivery.
pub const RELAY_USER_AGENT: &str = "GitHub-Webhook-Relay/1.0";

/// Timeout for the relay POST.
pub const RELAY_TIMEOUT_MS: u64 = 30_000;

/// Timeout for the downstream health probe.
pub const HEALTH_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// Inbound
// =============================================================================

/// A webhook delivery as received by the endpoint.
#[derive(Debug, Clone)]
pub struct InboundWebhook {
    /// Request body exactly as received; the signature covers these bytes
    pub raw_body: Bytes,
    /// The body parsed as JSON
    pub payload: Value,
    /// Request headers, names lower-cased
    pub headers: HeaderMap,
}

impl InboundWebhook {
    pub fn new(raw_body: Bytes, payload: Value, headers: HeaderMap) -> Self {
        Self {
            raw_body,
            payload,
            headers,
        }
    }
}

// =============================================================================
// Outbound
// =============================================================================

/// Methods the relay client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP call the relay client should make.
#[derive(Debug, Clone)]
pub struct OutboundRelayRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Header name/value pairs, sent in order
    pub headers: Vec<(String, String)>,
    /// Serialized as JSON text when present
    pub body: Option<Value>,
    /// Hard timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

impl OutboundRelayRequest {
    /// The relay POST for a delivery.
    pub fn relay(url: impl Into<String>, event: &str, delivery_id: &str, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("X-GitHub-Event".to_string(), event.to_string()),
                ("X-GitHub-Delivery".to_string(), delivery_id.to_string()),
                ("User-Agent".to_string(), RELAY_USER_AGENT.to_string()),
            ],
            body: Some(body),
            timeout_ms: Some(RELAY_TIMEOUT_MS),
        }
    }

    /// A bodiless GET probe.
    pub fn probe(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout_ms: Some(timeout_ms),
        }
    }

    /// Effective timeout; requests without one get the relay default.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(RELAY_TIMEOUT_MS))
    }

    /// Value of the first header with this name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response body as returned by the downstream system.
///
/// JSON bodies are kept parsed; anything else is kept verbatim as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    /// The body could not be read
    Empty,
}

impl ResponseBody {
    /// Parse as JSON, falling back to the raw text.
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        }
    }

    /// JSON rendering used in endpoint responses.
    pub fn to_json(&self) -> Value {
        match self {
            ResponseBody::Json(value) => value.clone(),
            ResponseBody::Text(text) => Value::String(text.clone()),
            ResponseBody::Empty => Value::Null,
        }
    }
}

/// A completed outbound call.
#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub status: u16,
    pub body: ResponseBody,
    pub headers: BTreeMap<String, String>,
}

// =============================================================================
// Outcome
// =============================================================================

/// Progress of a single relay attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStage {
    Received,
    HeadersValidated,
    SignatureChecked,
    Relayed,
}

impl fmt::Display for RelayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelayStage::Received => "received",
            RelayStage::HeadersValidated => "headers_validated",
            RelayStage::SignatureChecked => "signature_checked",
            RelayStage::Relayed => "relayed",
        };
        f.write_str(s)
    }
}

/// Result of one relay attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// Jenkins answered; any status counts as a completed relay.
    Succeeded {
        status_code: u16,
        response_body: ResponseBody,
    },
    /// The delivery was rejected or could not be forwarded.
    Failed {
        status_code: Option<u16>,
        error: String,
    },
}

impl RelayOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RelayOutcome::Succeeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_body_json() {
        let body = ResponseBody::from_text(r#"{"queued":true}"#.to_string());
        assert_eq!(body, ResponseBody::Json(json!({"queued": true})));
        assert_eq!(body.to_json(), json!({"queued": true}));
    }

    #[test]
    fn test_response_body_text_kept_verbatim() {
        let body = ResponseBody::from_text("Scheduled polling of my-job\n".to_string());
        assert_eq!(body, ResponseBody::Text("Scheduled polling of my-job\n".to_string()));
        assert_eq!(body.to_json(), json!("Scheduled polling of my-job\n"));

        assert_eq!(ResponseBody::from_text(String::new()), ResponseBody::Text(String::new()));
        assert_eq!(ResponseBody::Empty.to_json(), Value::Null);
    }

    #[test]
    fn test_relay_request_headers() {
        let request = OutboundRelayRequest::relay("http://j/", "push", "d-1", json!({}));

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("X-GitHub-Event"), Some("push"));
        assert_eq!(request.header("x-github-delivery"), Some("d-1"));
        assert_eq!(request.header("user-agent"), Some(RELAY_USER_AGENT));
        assert_eq!(request.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_probe_request() {
        let request = OutboundRelayRequest::probe("http://j/ping", HEALTH_TIMEOUT_MS);
        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.body.is_none());
        assert!(request.headers.is_empty());
        assert_eq!(request.timeout(), Duration::from_secs(5));
    }
}
