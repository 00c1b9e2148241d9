//! Lock-free pipeline counters
//!
//! All counters are relaxed atomics updated on the hot receive path and
//! read by the periodic reporter; exactness across threads is not required.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

#[derive(Debug, Default)]
pub struct Metrics {
    messages_received: AtomicU64,
    messages_routed: AtomicU64,
    unarmed_drops: AtomicU64,
    unmatched_topics: AtomicU64,
    status_events: AtomicU64,
    config_responses: AtomicU64,
    decode_failures: AtomicU64,
    queue_drops: AtomicU64,
    records_stored: AtomicU64,
    requests_published: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_routed(&self) {
        self.messages_routed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unarmed_drop(&self) {
        self.unarmed_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unmatched_topic(&self) {
        self.unmatched_topics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_status_event(&self) {
        self.status_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_config_response(&self) {
        self.config_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queue_drop(&self) {
        self.queue_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_record_stored(&self) {
        self.records_stored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request_published(&self) {
        self.requests_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters
    pub fn report(&self) -> MetricsSummary {
        MetricsSummary {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_routed: self.messages_routed.load(Ordering::Relaxed),
            unarmed_drops: self.unarmed_drops.load(Ordering::Relaxed),
            unmatched_topics: self.unmatched_topics.load(Ordering::Relaxed),
            status_events: self.status_events.load(Ordering::Relaxed),
            config_responses: self.config_responses.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            queue_drops: self.queue_drops.load(Ordering::Relaxed),
            records_stored: self.records_stored.load(Ordering::Relaxed),
            requests_published: self.requests_published.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time counter snapshot
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub messages_received: u64,
    pub messages_routed: u64,
    pub unarmed_drops: u64,
    pub unmatched_topics: u64,
    pub status_events: u64,
    pub config_responses: u64,
    pub decode_failures: u64,
    pub queue_drops: u64,
    pub records_stored: u64,
    pub requests_published: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            received = %self.messages_received,
            routed = %self.messages_routed,
            unarmed = %self.unarmed_drops,
            unmatched = %self.unmatched_topics,
            status = %self.status_events,
            configs = %self.config_responses,
            decode_failures = %self.decode_failures,
            queue_drops = %self.queue_drops,
            stored = %self.records_stored,
            published = %self.requests_published,
            "bridge_metrics"
        );
    }
}
