//! Integration tests for the routing pipeline
//!
//! Drives the router directly with broker-shaped messages and asserts on
//! the output queues, covering the armed gate, the gateway lifecycle
//! fanout, and positioning decode routing.

use bytes::Bytes;
use mesh_bridge::domain::types::{IncomingMessage, StoredPayload};
use mesh_bridge::infra::{Config, Metrics};
use mesh_bridge::io::{create_fanout, FanoutQueues};
use mesh_bridge::services::{ArmedGate, TopicRouter};
use std::sync::Arc;

fn bridge() -> (TopicRouter, ArmedGate, FanoutQueues) {
    let metrics = Arc::new(Metrics::new());
    let (fanout, queues) = create_fanout(16, metrics.clone());
    let armed = ArmedGate::new();
    let router = TopicRouter::new(&Config::default(), armed.clone(), fanout, metrics);
    (router, armed, queues)
}

fn message(topic: &str, payload: &[u8]) -> IncomingMessage {
    IncomingMessage { topic: topic.to_string(), payload: Bytes::copy_from_slice(payload) }
}

fn status(gateway: &str, state: &str) -> IncomingMessage {
    message(
        &format!("event/status/{}", gateway),
        format!(r#"{{"gateway_id": "{}", "state": "{}"}}"#, gateway, state).as_bytes(),
    )
}

const POSITIONING_PAYLOAD: [u8; 12] = [
    0x05, 0x00, 0x02, 0x08, // header: sequence=5, type=2, declared_length=8
    0x01, 0x02, 0x03, 0x0A, // address 0x030201, rss -5.0
    0x04, 0x05, 0x06, 0x14, // address 0x060504, rss -10.0
];

#[test]
fn test_unarmed_messages_reach_no_queue() {
    let (router, armed, mut queues) = bridge();

    router.dispatch(&status("gw-1", "online"));
    router.dispatch(&message("event/received_data/gw-1/s/n/238/238", &POSITIONING_PAYLOAD));
    router.dispatch(&message("event/received_data/gw-1/s/n/238/238", &[0x01])); // malformed

    assert!(queues.storage.try_recv().is_err());
    assert!(queues.gateway_status.try_recv().is_err());
    assert!(queues.publish.try_recv().is_err());

    // Arming does not replay prior messages
    armed.arm();
    assert!(queues.storage.try_recv().is_err());
    assert!(queues.publish.try_recv().is_err());
    assert_eq!(router.messages_seen(), 3);
}

#[test]
fn test_online_status_requests_configs() {
    let (router, armed, mut queues) = bridge();
    armed.arm();

    router.dispatch(&status("gw-1", "online"));

    let request = queues.publish.try_recv().unwrap();
    assert_eq!(request.gateway_id.0, "gw-1");
    // exactly one request, nothing on the gateway-status queue
    assert!(queues.publish.try_recv().is_err());
    assert!(queues.gateway_status.try_recv().is_err());
}

#[test]
fn test_offline_status_synthesizes_empty_configs() {
    let (router, armed, mut queues) = bridge();
    armed.arm();

    router.dispatch(&status("gw-1", "offline"));

    let item = queues.gateway_status.try_recv().unwrap();
    assert_eq!(item.gateway_id.0, "gw-1");
    assert!(item.configs.is_empty());
    assert!(queues.gateway_status.try_recv().is_err());
    assert!(queues.publish.try_recv().is_err());
}

#[test]
fn test_config_response_passes_through() {
    let (router, armed, mut queues) = bridge();
    armed.arm();

    router.dispatch(&message(
        "response/get_configs/gw-2/sink0",
        br#"{
            "gateway_id": "gw-2",
            "sinks": [
                {"sink_id": "sink0", "network_id": 777, "started": true},
                {"sink_id": "sink1", "started": false}
            ]
        }"#,
    ));

    let item = queues.gateway_status.try_recv().unwrap();
    assert_eq!(item.gateway_id.0, "gw-2");
    assert_eq!(item.configs.len(), 2);
    assert_eq!(item.configs[0].sink_id, "sink0");
    assert_eq!(item.configs[0].network_id, Some(777));
    assert!(item.configs[0].started);
    assert!(queues.publish.try_recv().is_err());
}

#[test]
fn test_positioning_data_decoded_to_storage() {
    let (router, armed, mut queues) = bridge();
    armed.arm();

    router.dispatch(&message("event/received_data/gw-1/sink0/net9/238/238", &POSITIONING_PAYLOAD));

    let record = queues.storage.try_recv().unwrap();
    assert_eq!(record.gateway.as_deref(), Some("gw-1"));
    assert_eq!(record.sink.as_deref(), Some("sink0"));
    assert_eq!(record.source_ep, Some(238));
    assert_eq!(record.dest_ep, Some(238));

    match record.payload {
        StoredPayload::Positioning(positioning) => {
            assert_eq!(positioning.sequence, 5);
            assert_eq!(positioning.measurements.len(), 2);
            assert_eq!(positioning.measurements[0].address, 0x030201);
            assert_eq!(positioning.measurements[0].rss, -5.0);
            assert_eq!(positioning.measurements[1].address, 0x060504);
            assert_eq!(positioning.measurements[1].rss, -10.0);
        }
        StoredPayload::Raw { .. } => panic!("expected decoded positioning payload"),
    }
}

#[test]
fn test_malformed_positioning_dropped() {
    let (router, armed, mut queues) = bridge();
    armed.arm();

    // 5-byte body, not a multiple of 4
    let payload = [0x05, 0x00, 0x02, 0x08, 0x01, 0x02, 0x03, 0x0A, 0x04];
    router.dispatch(&message("event/received_data/gw-1/s/n/238/238", &payload));

    assert!(queues.storage.try_recv().is_err());
}

#[test]
fn test_non_positioning_data_passes_raw() {
    let (router, armed, mut queues) = bridge();
    armed.arm();

    router.dispatch(&message("event/received_data/gw-1/s/n/12/13", &[0xDE, 0xAD, 0xBE]));

    let record = queues.storage.try_recv().unwrap();
    match record.payload {
        StoredPayload::Raw { hex } => assert_eq!(hex, "deadbe"),
        StoredPayload::Positioning(_) => panic!("raw passthrough expected"),
    }
}

#[test]
fn test_unrecognized_topic_dropped_silently() {
    let (router, armed, mut queues) = bridge();
    armed.arm();

    router.dispatch(&message("event/unknown/gw-1", b"{}"));
    router.dispatch(&message("request/get_configs/gw-1", b"{}")); // our own outbound shape

    assert!(queues.storage.try_recv().is_err());
    assert!(queues.gateway_status.try_recv().is_err());
    assert!(queues.publish.try_recv().is_err());
}

#[test]
fn test_at_most_one_handler_per_message() {
    let (router, armed, mut queues) = bridge();
    armed.arm();

    // status topic carries a body that would also parse as a config response;
    // only the status handler may run
    router.dispatch(&message(
        "event/status/gw-1",
        br#"{"gateway_id": "gw-1", "state": "offline", "sinks": []}"#,
    ));

    assert!(queues.gateway_status.try_recv().is_ok());
    assert!(queues.gateway_status.try_recv().is_err());
    assert!(queues.storage.try_recv().is_err());
    assert!(queues.publish.try_recv().is_err());
}

#[test]
fn test_invalid_status_json_dropped() {
    let (router, armed, mut queues) = bridge();
    armed.arm();

    router.dispatch(&message("event/status/gw-1", b"not json"));
    router.dispatch(&message("event/status/gw-1", br#"{"gateway_id": "g", "state": "odd"}"#));

    assert!(queues.gateway_status.try_recv().is_err());
    assert!(queues.publish.try_recv().is_err());
}
