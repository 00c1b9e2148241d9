//! Shared types for the mesh bridge

use crate::domain::positioning::PositioningRecord;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as epoch milliseconds
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Newtype wrapper for gateway identifiers to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayId(pub String);

impl std::fmt::Display for GatewayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gateway lifecycle state carried by status messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayState {
    Online,
    Offline,
}

/// Status message payload, one per gateway lifecycle transition
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayStatusEvent {
    pub gateway_id: GatewayId,
    pub state: GatewayState,
}

/// Per-sink configuration reported by a gateway.
///
/// Unknown fields on the wire are ignored; gateways of different firmware
/// generations report different supersets of this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    pub sink_id: String,
    #[serde(default)]
    pub network_id: Option<u64>,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub app_config_seq: Option<u32>,
}

/// Inbound response to a [`ConfigRequest`]
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigResponse {
    pub gateway_id: GatewayId,
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Outbound request asking a gateway for its current sink configuration
#[derive(Debug, Clone, Serialize)]
pub struct ConfigRequest {
    pub gateway_id: GatewayId,
}

/// Item on the gateway-status queue.
///
/// An empty `configs` list signals that the gateway and all of its sinks
/// stopped; a non-empty list is a config response passed through unmodified.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatusItem {
    pub gateway_id: GatewayId,
    pub configs: Vec<SinkConfig>,
}

impl GatewayStatusItem {
    /// Synthesized offline notice - no per-sink detail
    pub fn offline(gateway_id: GatewayId) -> Self {
        Self { gateway_id, configs: Vec::new() }
    }

    pub fn from_response(response: ConfigResponse) -> Self {
        Self { gateway_id: response.gateway_id, configs: response.sinks }
    }
}

/// A broker message on its way through the router. Consumed exactly once.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub topic: String,
    pub payload: bytes::Bytes,
}

/// Payload half of a storage record
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredPayload {
    /// Decoded positioning advertisement
    Positioning(PositioningRecord),
    /// Anything else passes through as raw evidence
    Raw { hex: String },
}

/// Data message destined for persistence, tagged with its topic metadata
#[derive(Debug, Clone, Serialize)]
pub struct StorageRecord {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ep: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_ep: Option<u8>,
    pub received_at: u64,
    pub payload: StoredPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_event_from_json() {
        let event: GatewayStatusEvent =
            serde_json::from_str(r#"{"gateway_id": "gw-1", "state": "online"}"#).unwrap();
        assert_eq!(event.gateway_id, GatewayId("gw-1".to_string()));
        assert_eq!(event.state, GatewayState::Online);

        let event: GatewayStatusEvent =
            serde_json::from_str(r#"{"gateway_id": "gw-1", "state": "offline"}"#).unwrap();
        assert_eq!(event.state, GatewayState::Offline);
    }

    #[test]
    fn test_status_event_rejects_unknown_state() {
        let result: Result<GatewayStatusEvent, _> =
            serde_json::from_str(r#"{"gateway_id": "gw-1", "state": "rebooting"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_response_ignores_extra_fields() {
        let response: ConfigResponse = serde_json::from_str(
            r#"{
                "gateway_id": "gw-2",
                "sinks": [
                    {"sink_id": "sink0", "network_id": 777, "started": true, "firmware": "5.1"},
                    {"sink_id": "sink1"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(response.sinks.len(), 2);
        assert_eq!(response.sinks[0].network_id, Some(777));
        assert!(response.sinks[0].started);
        assert_eq!(response.sinks[1].network_id, None);
        assert!(!response.sinks[1].started);
    }

    #[test]
    fn test_offline_item_has_no_configs() {
        let item = GatewayStatusItem::offline(GatewayId("gw-3".to_string()));
        assert!(item.configs.is_empty());

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["gateway_id"], "gw-3");
        assert_eq!(json["configs"].as_array().unwrap().len(), 0);
    }
}
