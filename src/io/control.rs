//! Control channel - forwards gateway-status items over HTTP
//!
//! Drains the gateway-status queue and POSTs each item as JSON to the
//! configured endpoint. Delivery failures are logged and the item is
//! dropped; recovery is the endpoint's responsibility.

use crate::domain::types::GatewayStatusItem;
use crate::infra::config::Config;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// HTTP forwarder consuming the gateway-status queue
pub struct ControlChannel {
    endpoint: String,
    client: Option<reqwest::Client>,
}

impl ControlChannel {
    pub fn new(config: &Config) -> Self {
        // Build the client once for connection reuse
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.control_timeout_ms()))
            .build()
            .ok();

        if client.is_none() {
            error!("control_client_build_failed");
        }

        Self { endpoint: config.control_endpoint().to_string(), client }
    }

    /// Drain the gateway-status queue until shutdown
    pub async fn run(
        self,
        mut rx: mpsc::Receiver<GatewayStatusItem>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(endpoint = %self.endpoint, "control_channel_started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("control_channel_shutdown");
                        return;
                    }
                }
                item = rx.recv() => {
                    match item {
                        Some(item) => self.forward(item).await,
                        None => return,
                    }
                }
            }
        }
    }

    async fn forward(&self, item: GatewayStatusItem) {
        let Some(client) = &self.client else {
            warn!(gateway = %item.gateway_id, "control_client_unavailable");
            return;
        };

        let body = match serde_json::to_string(&item) {
            Ok(body) => body,
            Err(e) => {
                error!(gateway = %item.gateway_id, error = %e, "gateway_status_encode_failed");
                return;
            }
        };

        let result = client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(
                    gateway = %item.gateway_id,
                    configs = %item.configs.len(),
                    "gateway_status_forwarded"
                );
            }
            Ok(response) => {
                warn!(
                    gateway = %item.gateway_id,
                    status = %response.status(),
                    "control_endpoint_rejected"
                );
            }
            Err(e) => {
                warn!(gateway = %item.gateway_id, error = %e, "control_endpoint_unreachable");
            }
        }
    }
}
