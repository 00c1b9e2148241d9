//! Domain models - wire payloads, queue items, positioning records
//!
//! This module contains the canonical data types used throughout the bridge:
//! - `GatewayStatusEvent` / `ConfigResponse` - inbound gateway lifecycle payloads
//! - `ConfigRequest` / `GatewayStatusItem` - items emitted on the output queues
//! - `StorageRecord` - decoded data message destined for persistence
//! - `PositioningRecord` - decoded positioning advertisement

pub mod positioning;
pub mod types;
