//! Named output channels connecting the router to its collaborators
//!
//! Three bounded queues fan out of the routing step: storage records,
//! gateway-status items, and outbound config requests. Producers use
//! non-blocking sends so the broker receive path is never stalled; a full
//! queue drops the item.

use crate::domain::types::{ConfigRequest, GatewayStatusItem, StorageRecord};
use crate::infra::metrics::Metrics;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Receiver half of the fanout, one receiver per collaborator
pub struct FanoutQueues {
    pub storage: mpsc::Receiver<StorageRecord>,
    pub gateway_status: mpsc::Receiver<GatewayStatusItem>,
    pub publish: mpsc::Receiver<ConfigRequest>,
}

/// Sender bundle for the output queues
///
/// Clone this to share across producers. Sends never block; if a channel
/// is full the item is dropped with a warn log and a metrics increment.
#[derive(Clone)]
pub struct Fanout {
    storage_tx: mpsc::Sender<StorageRecord>,
    gateway_status_tx: mpsc::Sender<GatewayStatusItem>,
    publish_tx: mpsc::Sender<ConfigRequest>,
    metrics: Arc<Metrics>,
}

impl Fanout {
    /// Enqueue a decoded/raw data record for persistence
    pub fn send_storage(&self, record: StorageRecord) {
        if self.storage_tx.try_send(record).is_err() {
            self.record_drop("storage");
        }
    }

    /// Enqueue a gateway-status item for the control channel
    pub fn send_gateway_status(&self, item: GatewayStatusItem) {
        if self.gateway_status_tx.try_send(item).is_err() {
            self.record_drop("gateway_status");
        }
    }

    /// Enqueue an outbound config request for the broker publisher
    pub fn send_config_request(&self, request: ConfigRequest) {
        if self.publish_tx.try_send(request).is_err() {
            self.record_drop("publish");
        }
    }

    fn record_drop(&self, queue: &'static str) {
        warn!(queue = %queue, "queue_full_dropped");
        self.metrics.record_queue_drop();
    }
}

/// Create the fanout channel set.
///
/// Returns (sender bundle, receivers). Buffer size bounds each queue
/// independently.
pub fn create_fanout(buffer_size: usize, metrics: Arc<Metrics>) -> (Fanout, FanoutQueues) {
    let (storage_tx, storage) = mpsc::channel(buffer_size);
    let (gateway_status_tx, gateway_status) = mpsc::channel(buffer_size);
    let (publish_tx, publish) = mpsc::channel(buffer_size);

    let fanout = Fanout { storage_tx, gateway_status_tx, publish_tx, metrics };
    (fanout, FanoutQueues { storage, gateway_status, publish })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{epoch_ms, GatewayId, StoredPayload};

    fn record(topic: &str) -> StorageRecord {
        StorageRecord {
            topic: topic.to_string(),
            gateway: None,
            sink: None,
            network: None,
            source_ep: None,
            dest_ep: None,
            received_at: epoch_ms(),
            payload: StoredPayload::Raw { hex: "00".to_string() },
        }
    }

    #[test]
    fn test_fanout_delivers_to_named_queues() {
        let metrics = Arc::new(Metrics::new());
        let (fanout, mut queues) = create_fanout(4, metrics);

        fanout.send_storage(record("event/received_data/g/s/n/1/1"));
        fanout.send_gateway_status(GatewayStatusItem::offline(GatewayId("gw-1".to_string())));
        fanout.send_config_request(ConfigRequest { gateway_id: GatewayId("gw-2".to_string()) });

        assert_eq!(queues.storage.try_recv().unwrap().topic, "event/received_data/g/s/n/1/1");
        assert!(queues.gateway_status.try_recv().unwrap().configs.is_empty());
        assert_eq!(queues.publish.try_recv().unwrap().gateway_id.0, "gw-2");

        // nothing cross-delivered
        assert!(queues.storage.try_recv().is_err());
        assert!(queues.gateway_status.try_recv().is_err());
        assert!(queues.publish.try_recv().is_err());
    }

    #[test]
    fn test_full_queue_drops_instead_of_blocking() {
        let metrics = Arc::new(Metrics::new());
        let (fanout, mut queues) = create_fanout(1, metrics.clone());

        fanout.send_storage(record("a"));
        fanout.send_storage(record("b")); // dropped, buffer is 1

        assert_eq!(queues.storage.try_recv().unwrap().topic, "a");
        assert!(queues.storage.try_recv().is_err());
        assert_eq!(metrics.report().queue_drops, 1);
    }
}
