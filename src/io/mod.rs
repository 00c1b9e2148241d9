//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `mqtt` - MQTT ingest client feeding the topic router
//! - `mqtt_egress` - MQTT publisher for outbound config requests
//! - `queues` - named output channels (storage, gateway-status, publish)
//! - `storage` - storage sink draining records to a JSONL file
//! - `control` - control channel forwarding gateway-status items over HTTP

pub mod control;
pub mod mqtt;
pub mod mqtt_egress;
pub mod queues;
pub mod storage;

// Re-export commonly used types
pub use control::ControlChannel;
pub use mqtt_egress::ConfigRequestPublisher;
pub use queues::{create_fanout, Fanout, FanoutQueues};
pub use storage::StorageSink;
