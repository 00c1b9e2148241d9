//! Gateway lifecycle handlers feeding the output queues
//!
//! Each handler processes one message category. Handlers are stateless and
//! idempotent given their input: gateway lifecycle state is materialized by
//! downstream consumers of the gateway-status queue, never here.

use crate::domain::positioning::{
    self, POSITIONING_DESTINATION_EP, POSITIONING_SOURCE_EP,
};
use crate::domain::types::{
    epoch_ms, ConfigRequest, ConfigResponse, GatewayState, GatewayStatusEvent, GatewayStatusItem,
    StorageRecord, StoredPayload,
};
use crate::infra::metrics::Metrics;
use crate::io::queues::Fanout;
use crate::services::topic::TopicCapture;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Handler logic for status, config-response, and data messages
pub struct GatewayTracker {
    fanout: Fanout,
    metrics: Arc<Metrics>,
}

impl GatewayTracker {
    pub fn new(fanout: Fanout, metrics: Arc<Metrics>) -> Self {
        Self { fanout, metrics }
    }

    /// Handle a gateway status message.
    ///
    /// ONLINE asks the gateway for its current sink configuration; OFFLINE
    /// synthesizes an empty-configs notice so every downstream consumer
    /// learns the gateway and all its sinks stopped without waiting for
    /// per-sink detail.
    pub(crate) fn handle_status(&self, payload: &[u8]) {
        let event: GatewayStatusEvent = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "status_payload_invalid");
                return;
            }
        };
        self.metrics.record_status_event();

        match event.state {
            GatewayState::Online => {
                debug!(gateway = %event.gateway_id, "gateway_online");
                self.fanout.send_config_request(ConfigRequest { gateway_id: event.gateway_id });
            }
            GatewayState::Offline => {
                info!(gateway = %event.gateway_id, "gateway_offline");
                self.fanout.send_gateway_status(GatewayStatusItem::offline(event.gateway_id));
            }
        }
    }

    /// Handle a configuration response: the full structured response goes
    /// to the gateway-status queue unmodified.
    pub(crate) fn handle_config_response(&self, payload: &[u8]) {
        let response: ConfigResponse = match serde_json::from_slice(payload) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "config_response_invalid");
                return;
            }
        };
        self.metrics.record_config_response();

        info!(
            gateway = %response.gateway_id,
            sinks = %response.sinks.len(),
            "gateway_configs_received"
        );
        self.fanout.send_gateway_status(GatewayStatusItem::from_response(response));
    }

    /// Handle a data message: wrap it with its topic metadata and route it
    /// to the storage queue. Positioning advertisements (endpoint 238/238)
    /// are decoded first; a malformed payload drops the whole message.
    pub(crate) fn handle_data(&self, topic: &str, payload: &[u8], capture: &TopicCapture<'_>) {
        let source_ep = capture.get("src_ep").and_then(|s| s.parse::<u8>().ok());
        let dest_ep = capture.get("dst_ep").and_then(|s| s.parse::<u8>().ok());

        let stored = if source_ep == Some(POSITIONING_SOURCE_EP)
            && dest_ep == Some(POSITIONING_DESTINATION_EP)
        {
            match positioning::decode(payload) {
                Ok(record) => StoredPayload::Positioning(record),
                Err(e) => {
                    error!(topic = %topic, error = %e, "positioning_decode_failed");
                    self.metrics.record_decode_failure();
                    return;
                }
            }
        } else {
            StoredPayload::Raw { hex: hex::encode(payload) }
        };

        self.fanout.send_storage(StorageRecord {
            topic: topic.to_string(),
            gateway: capture.get("gw").map(str::to_string),
            sink: capture.get("sink").map(str::to_string),
            network: capture.get("network").map(str::to_string),
            source_ep,
            dest_ep,
            received_at: epoch_ms(),
            payload: stored,
        });
    }
}
