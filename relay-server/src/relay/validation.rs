//! Boundary validation for inbound headers and outbound relay requests.
//!
//! Validation fails fast with a message naming the offending field. It does
//! not try to enforce GitHub's API: unknown headers are ignored.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::ValidationError;

use super::types::OutboundRelayRequest;

pub const HEADER_EVENT: &str = "x-github-event";
pub const HEADER_DELIVERY: &str = "x-github-delivery";
pub const HEADER_SIGNATURE: &str = "x-hub-signature-256";
pub const HEADER_USER_AGENT: &str = "user-agent";
pub const HEADER_CONTENT_TYPE: &str = "content-type";

/// The inbound headers the relay cares about. All optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub event: Option<String>,
    pub delivery_id: Option<String>,
    pub signature: Option<String>,
    pub user_agent: Option<String>,
    pub content_type: Option<String>,
}

impl WebhookHeaders {
    /// Extract and validate the known headers.
    ///
    /// Missing headers are fine. A present header whose value is not a
    /// plain string (e.g. contains non-ASCII bytes) is rejected.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ValidationError> {
        Ok(Self {
            event: string_header(headers, HEADER_EVENT)?,
            delivery_id: string_header(headers, HEADER_DELIVERY)?,
            signature: string_header(headers, HEADER_SIGNATURE)?,
            user_agent: string_header(headers, HEADER_USER_AGENT)?,
            content_type: string_header(headers, HEADER_CONTENT_TYPE)?,
        })
    }

    /// Event name for the relayed `X-GitHub-Event` header.
    pub fn event_or_unknown(&self) -> &str {
        self.event.as_deref().unwrap_or("unknown")
    }

    /// Delivery id for the relayed `X-GitHub-Delivery` header.
    pub fn delivery_id_or_empty(&self) -> &str {
        self.delivery_id.as_deref().unwrap_or("")
    }
}

fn string_header(headers: &HeaderMap, name: &str) -> Result<Option<String>, ValidationError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|s| Some(s.to_string()))
            .map_err(|_| ValidationError::new(name, "expected a string value")),
    }
}

/// Check an outbound request before it is sent.
pub fn validate_relay_request(request: &OutboundRelayRequest) -> Result<(), ValidationError> {
    if request.url.trim().is_empty() {
        return Err(ValidationError::new("url", "required"));
    }

    let url = Url::parse(&request.url)
        .map_err(|e| ValidationError::new("url", format!("not a valid URL ({})", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::new(
            "url",
            format!("unsupported scheme {:?}", url.scheme()),
        ));
    }

    for (name, value) in &request.headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(ValidationError::new(
                "headers",
                format!("invalid header name {:?}", name),
            ));
        }
        if HeaderValue::from_str(value).is_err() {
            return Err(ValidationError::new(
                "headers",
                format!("invalid value for {}", name),
            ));
        }
    }

    if request.timeout_ms == Some(0) {
        return Err(ValidationError::new("timeout", "must be positive"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::relay::types::HEALTH_TIMEOUT_MS;

    #[test]
    fn test_headers_all_optional() {
        let parsed = WebhookHeaders::from_headers(&HeaderMap::new()).unwrap();
        assert_eq!(parsed, WebhookHeaders::default());
        assert_eq!(parsed.event_or_unknown(), "unknown");
        assert_eq!(parsed.delivery_id_or_empty(), "");
    }

    #[test]
    fn test_headers_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("X-GitHub-Event", HeaderValue::from_static("push"));
        headers.insert("x-github-delivery", HeaderValue::from_static("72d3162e-cc78"));
        headers.insert("x-hub-signature-256", HeaderValue::from_static("sha256=abc"));
        headers.insert("user-agent", HeaderValue::from_static("GitHub-Hookshot/044aadd"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("x-unrelated", HeaderValue::from_static("ignored"));

        let parsed = WebhookHeaders::from_headers(&headers).unwrap();
        assert_eq!(parsed.event.as_deref(), Some("push"));
        assert_eq!(parsed.delivery_id.as_deref(), Some("72d3162e-cc78"));
        assert_eq!(parsed.signature.as_deref(), Some("sha256=abc"));
        assert_eq!(parsed.user_agent.as_deref(), Some("GitHub-Hookshot/044aadd"));
        assert_eq!(parsed.content_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_headers_non_string_value_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-github-event",
            HeaderValue::from_bytes(b"push\xff").unwrap(),
        );

        let err = WebhookHeaders::from_headers(&headers).unwrap_err();
        assert_eq!(err.field, "x-github-event");
    }

    #[test]
    fn test_headers_non_string_unknown_header_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-custom", HeaderValue::from_bytes(b"\xfe\xff").unwrap());

        assert!(WebhookHeaders::from_headers(&headers).is_ok());
    }

    #[test]
    fn test_relay_request_valid() {
        let request = OutboundRelayRequest::relay(
            "https://jenkins.example.com/github-webhook/",
            "push",
            "",
            json!({"ref": "refs/heads/main"}),
        );
        assert!(validate_relay_request(&request).is_ok());

        let probe = OutboundRelayRequest::probe("http://jenkins:8080/ping", HEALTH_TIMEOUT_MS);
        assert!(validate_relay_request(&probe).is_ok());
    }

    #[test]
    fn test_relay_request_bad_url() {
        let request = OutboundRelayRequest::probe("", HEALTH_TIMEOUT_MS);
        assert_eq!(validate_relay_request(&request).unwrap_err().field, "url");

        let request = OutboundRelayRequest::probe("not a url", HEALTH_TIMEOUT_MS);
        assert_eq!(validate_relay_request(&request).unwrap_err().field, "url");

        let request = OutboundRelayRequest::probe("ftp://jenkins/", HEALTH_TIMEOUT_MS);
        assert_eq!(validate_relay_request(&request).unwrap_err().field, "url");
    }

    #[test]
    fn test_relay_request_bad_header() {
        let mut request = OutboundRelayRequest::relay("http://j/", "push\nInjected: 1", "", json!({}));
        assert_eq!(validate_relay_request(&request).unwrap_err().field, "headers");

        request = OutboundRelayRequest::probe("http://j/", HEALTH_TIMEOUT_MS);
        request.headers.push(("bad header".to_string(), "v".to_string()));
        assert_eq!(validate_relay_request(&request).unwrap_err().field, "headers");
    }

    #[test]
    fn test_relay_request_zero_timeout() {
        let request = OutboundRelayRequest::probe("http://j/", 0);
        assert_eq!(validate_relay_request(&request).unwrap_err().field, "timeout");

        let mut request = OutboundRelayRequest::probe("http://j/", 1);
        request.timeout_ms = None;
        assert!(validate_relay_request(&request).is_ok());
    }
}
