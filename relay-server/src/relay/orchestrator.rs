//! One pass of the relay: validate, verify, forward, report.
//!
//! ```text
//! Received → HeadersValidated → SignatureChecked → Relayed → Succeeded | Failed
//! ```
//!
//! Every path ends in a [`RelayOutcome`]; errors never escape.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::RelayError;

use super::client::HttpRelayClient;
use super::events::EventSummary;
use super::signature::verify_github_signature;
use super::types::{InboundWebhook, OutboundRelayRequest, RelayOutcome, RelayResponse, RelayStage};
use super::validation::{validate_relay_request, WebhookHeaders};

/// Forwards validated GitHub deliveries to the configured Jenkins.
#[derive(Debug, Clone)]
pub struct Relay {
    config: Arc<Config>,
    client: HttpRelayClient,
}

impl Relay {
    /// Create a relay with its own HTTP client.
    pub fn new(config: Arc<Config>) -> Result<Self, RelayError> {
        let client = HttpRelayClient::new(config.target_jenkins_url.clone())?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: Arc<Config>, client: HttpRelayClient) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &HttpRelayClient {
        &self.client
    }

    /// Relay one delivery.
    pub async fn relay(&self, webhook: &InboundWebhook) -> RelayOutcome {
        let mut stage = RelayStage::Received;

        match self.run(webhook, &mut stage).await {
            Ok(response) => {
                info!(
                    status_code = response.status,
                    stage = %stage,
                    "webhook_relayed"
                );
                RelayOutcome::Succeeded {
                    status_code: response.status,
                    response_body: response.body,
                }
            }
            Err(e) => {
                match &e {
                    RelayError::Signature => warn!(stage = %stage, "webhook_signature_rejected"),
                    RelayError::InvalidHeaders(_) | RelayError::InvalidRequest(_) => {
                        warn!(stage = %stage, error = %e, "webhook_validation_failed")
                    }
                    _ => error!(stage = %stage, error = %e, "webhook_relay_failed"),
                }
                RelayOutcome::Failed {
                    status_code: e.status_code(),
                    error: e.to_string(),
                }
            }
        }
    }

    async fn run(
        &self,
        webhook: &InboundWebhook,
        stage: &mut RelayStage,
    ) -> Result<RelayResponse, RelayError> {
        let headers =
            WebhookHeaders::from_headers(&webhook.headers).map_err(RelayError::InvalidHeaders)?;
        *stage = RelayStage::HeadersValidated;

        let summary = EventSummary::from_payload(headers.event.as_deref(), &webhook.payload);
        info!(
            event = headers.event_or_unknown(),
            delivery_id = headers.delivery_id_or_empty(),
            repository = ?summary.repository,
            sender = ?summary.sender,
            action = ?summary.action,
            git_ref = ?summary.git_ref,
            head_sha = ?summary.head_sha,
            pull_request = ?summary.pull_request,
            commit_count = ?summary.commit_count,
            payload_length = webhook.raw_body.len(),
            "webhook_received"
        );

        if !verify_github_signature(
            &webhook.raw_body,
            headers.signature.as_deref(),
            self.config.github_webhook_secret.as_deref(),
        ) {
            return Err(RelayError::Signature);
        }
        *stage = RelayStage::SignatureChecked;
        debug!(
            verified = self.config.has_secret(),
            "webhook_signature_checked"
        );

        let request = OutboundRelayRequest::relay(
            self.config.target_jenkins_url.clone(),
            headers.event_or_unknown(),
            headers.delivery_id_or_empty(),
            webhook.payload.clone(),
        );
        validate_relay_request(&request).map_err(RelayError::InvalidRequest)?;

        let response = self.client.send(&request).await?;
        *stage = RelayStage::Relayed;

        Ok(response)
    }

    /// Whether the downstream Jenkins answers its probe.
    pub async fn health_check(&self) -> bool {
        self.client.health_check().await
    }
}
