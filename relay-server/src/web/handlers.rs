//! HTTP endpoint handlers.
//!
//! The webhook handler only parses the body as JSON; everything else is the
//! relay's job. Every failure is answered with a JSON `{error, details}` body.

use std::{any::Any, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::relay::{InboundWebhook, Relay, RelayOutcome};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: Relay,
}

impl AppState {
    pub fn new(config: Arc<Config>, relay: Relay) -> Self {
        Self { config, relay }
    }
}

/// Error body returned on every failure.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    fn new(error: &'static str, details: Option<String>) -> Self {
        Self { error, details }
    }
}

// =============================================================================
// Health Check
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStatus {
    pub target_url: String,
    pub webhook_path: String,
    pub jenkins: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub relay: RelayStatus,
}

/// Health check endpoint. Reports whether Jenkins answers its probe.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let reachable = state.relay.health_check().await;

    let (code, status, jenkins) = if reachable {
        (StatusCode::OK, "healthy", "reachable")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "unreachable")
    };

    (
        code,
        Json(HealthResponse {
            status,
            relay: RelayStatus {
                target_url: state.config.masked_target_url(),
                webhook_path: state.config.webhook_path.clone(),
                jenkins,
            },
        }),
    )
}

// =============================================================================
// Config
// =============================================================================

/// Non-secret view of the configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub target_jenkins_url: String,
    pub webhook_path: String,
    pub has_webhook_secret: bool,
    pub incoming_port: u16,
}

/// Configuration endpoint. Credentials in the target URL are masked.
pub async fn api_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        target_jenkins_url: state.config.masked_target_url(),
        webhook_path: state.config.webhook_path.clone(),
        has_webhook_secret: state.config.has_secret(),
        incoming_port: state.config.incoming_port,
    })
}

// =============================================================================
// GitHub Webhook
// =============================================================================

/// Successful relay response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub message: &'static str,
    pub jenkins_status: u16,
    pub jenkins_response: Value,
}

/// GitHub webhook endpoint.
///
/// This endpoint:
/// 1. Parses the body as JSON, keeping the raw bytes for the signature
/// 2. Relays the delivery to Jenkins
/// 3. Maps the relay outcome to a status code and JSON body
pub async fn github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, body_length = body.len(), "webhook_invalid_json");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Invalid JSON payload", None)),
            )
                .into_response();
        }
    };

    let webhook = InboundWebhook::new(body, payload, headers);
    let relay = state.relay.clone();

    // Spawned so that a client disconnect does not cancel an in-flight relay.
    let outcome = match tokio::spawn(async move { relay.relay(&webhook).await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "webhook_relay_task_failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error", Some(e.to_string()))),
            )
                .into_response();
        }
    };

    match outcome {
        RelayOutcome::Succeeded {
            status_code,
            response_body,
        } => {
            info!(jenkins_status = status_code, "webhook_response_ok");
            (
                StatusCode::OK,
                Json(WebhookResponse {
                    message: "Webhook relayed successfully",
                    jenkins_status: status_code,
                    jenkins_response: response_body.to_json(),
                }),
            )
                .into_response()
        }
        RelayOutcome::Failed { status_code, error } => {
            let code = status_code
                .and_then(|c| StatusCode::from_u16(c).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                code,
                Json(ErrorResponse::new(
                    "Failed to relay webhook to Jenkins",
                    Some(error),
                )),
            )
                .into_response()
        }
    }
}

/// Turn a handler panic into a JSON 500 instead of a dropped connection.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    error!(details = %details, "handler_panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", Some(details))),
    )
        .into_response()
}
