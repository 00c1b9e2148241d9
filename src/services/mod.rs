//! Services - routing and gateway state interpretation
//!
//! This module contains the core protocol logic:
//! - `topic` - segmented topic patterns and capture of identifier segments
//! - `router` - topic dispatch gated on the one-shot armed signal
//! - `gateway` - handlers interpreting status, config-response, and data messages

pub mod gateway;
pub mod router;
pub mod topic;

// Re-export commonly used types
pub use gateway::GatewayTracker;
pub use router::{ArmedGate, TopicRouter};
pub use topic::{Segment, TopicCapture, TopicPattern};
