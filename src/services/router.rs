//! Topic dispatch gated on the one-shot armed signal
//!
//! The router holds a registration table `{TopicPattern -> Route}` built
//! once at startup from the worker's configured identifiers. Patterns are
//! mutually disjoint by their literal prefixes, so at most one handler ever
//! matches a topic.

use crate::domain::types::IncomingMessage;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::queues::Fanout;
use crate::services::gateway::GatewayTracker;
use crate::services::topic::{Segment, TopicPattern};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// One-shot monotonic gate enabling message processing.
///
/// Transitions false -> true exactly once, at system start. Messages
/// arriving while unarmed are dropped, not buffered.
#[derive(Clone, Default)]
pub struct ArmedGate(Arc<AtomicBool>);

impl ArmedGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Message category a pattern routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Status,
    ConfigResponse,
    Data,
}

struct Registration {
    pattern: TopicPattern,
    route: Route,
}

/// Routes broker messages to the matching handler
pub struct TopicRouter {
    table: Vec<Registration>,
    armed: ArmedGate,
    tracker: GatewayTracker,
    metrics: Arc<Metrics>,
    /// Messages seen by this router instance, armed or not
    messages_seen: AtomicU64,
}

impl TopicRouter {
    pub fn new(config: &Config, armed: ArmedGate, fanout: Fanout, metrics: Arc<Metrics>) -> Self {
        let table = vec![
            Registration { pattern: data_pattern(config), route: Route::Data },
            Registration { pattern: status_pattern(), route: Route::Status },
            Registration { pattern: config_response_pattern(config), route: Route::ConfigResponse },
        ];
        let tracker = GatewayTracker::new(fanout, metrics.clone());
        Self { table, armed, tracker, metrics, messages_seen: AtomicU64::new(0) }
    }

    /// Subscription filters derived from the registration table
    pub fn filters(&self) -> Vec<String> {
        self.table.iter().map(|r| r.pattern.to_filter()).collect()
    }

    pub fn messages_seen(&self) -> u64 {
        self.messages_seen.load(Ordering::Relaxed)
    }

    /// Route one broker message. At most one handler runs; side effects are
    /// confined to queue writes and log statements.
    pub fn dispatch(&self, message: &IncomingMessage) {
        self.messages_seen.fetch_add(1, Ordering::Relaxed);
        self.metrics.record_message_received();

        if !self.armed.is_armed() {
            debug!(topic = %message.topic, "router_not_armed");
            self.metrics.record_unarmed_drop();
            return;
        }

        for registration in &self.table {
            if let Some(capture) = registration.pattern.matches(&message.topic) {
                match registration.route {
                    Route::Status => self.tracker.handle_status(&message.payload),
                    Route::ConfigResponse => self.tracker.handle_config_response(&message.payload),
                    Route::Data => {
                        self.tracker.handle_data(&message.topic, &message.payload, &capture)
                    }
                }
                self.metrics.record_message_routed();
                return;
            }
        }

        // Unrecognized topics are routine, not an error
        trace!(topic = %message.topic, "router_unmatched_topic");
        self.metrics.record_unmatched_topic();
    }
}

fn data_pattern(config: &Config) -> TopicPattern {
    TopicPattern::new(vec![
        Segment::Literal("event"),
        Segment::Literal("received_data"),
        Segment::named("gw", config.gateway_id().map(str::to_string)),
        Segment::named("sink", config.sink_id().map(str::to_string)),
        Segment::named("network", config.network_id().map(str::to_string)),
        Segment::named("src_ep", config.source_endpoint().map(str::to_string)),
        Segment::named("dst_ep", config.destination_endpoint().map(str::to_string)),
    ])
}

// Intentionally unfiltered by gateway id: offline notices must be received
// for any gateway, even one this worker cannot individually address.
fn status_pattern() -> TopicPattern {
    TopicPattern::new(vec![Segment::Literal("event"), Segment::Literal("status"), Segment::Rest])
}

fn config_response_pattern(config: &Config) -> TopicPattern {
    TopicPattern::new(vec![
        Segment::Literal("response"),
        Segment::Literal("get_configs"),
        Segment::named("gw", config.gateway_id().map(str::to_string)),
        Segment::Rest,
    ])
}
