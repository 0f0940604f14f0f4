//! Relay core: signature check, validation, and the outbound call.
//!
//! ## Flow
//!
//! ```text
//! InboundWebhook → Relay::relay() → HttpRelayClient::send() → RelayOutcome
//! ```

pub mod client;
pub mod events;
pub mod orchestrator;
pub mod signature;
pub mod types;
pub mod validation;

pub use client::{probe_url, HttpRelayClient};
pub use events::EventSummary;
pub use orchestrator::Relay;
pub use signature::{is_signature_verification_enabled, sign, verify_github_signature};
pub use types::{
    HttpMethod, InboundWebhook, OutboundRelayRequest, RelayOutcome, RelayResponse, RelayStage,
    ResponseBody, HEALTH_TIMEOUT_MS, RELAY_TIMEOUT_MS, RELAY_USER_AGENT,
};
pub use validation::{validate_relay_request, WebhookHeaders};
