//! GitHub → Jenkins webhook relay.
//!
//! This library provides the modules behind the `github-jenkins-relay`
//! binary:
//! - `relay`: signature verification, validation, and the outbound call
//! - `web`: axum handlers and router
//! - `config`: settings file and environment loading
//!
//! ## Architecture
//!
//! ```text
//! GitHub → POST /webhook → Relay → POST <targetJenkinsUrl> → Jenkins
//! ```

pub mod config;
pub mod error;
pub mod relay;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConfigError, RelayError, RequestError, ValidationError};
pub use relay::{HttpRelayClient, InboundWebhook, Relay, RelayOutcome};
pub use web::{build_router, AppState};
