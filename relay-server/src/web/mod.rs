//! Web server module for the relay endpoints.
//!
//! This module provides a thin axum layer that:
//! - Receives GitHub webhooks on the configured path
//! - Hands the raw body and headers to the relay
//! - Reports downstream health and the non-secret configuration
//!
//! Signature checks and forwarding happen in [`crate::relay`].

pub mod handlers;
pub mod router;

pub use handlers::{
    api_config, github_webhook, handle_panic, health, AppState, ConfigResponse, ErrorResponse,
    HealthResponse, RelayStatus, WebhookResponse,
};
pub use router::{build_router, MAX_BODY_BYTES};
