//! Mesh bridge - gateway telemetry ingest for mesh networks
//!
//! Subscribes to gateway topics on an MQTT broker, interprets gateway
//! lifecycle events, decodes positioning advertisements, and fans derived
//! records out to storage and control collaborators.
//!
//! Module structure:
//! - `domain/` - Wire payloads, queue items, positioning decoding
//! - `io/` - External interfaces (MQTT, storage sink, control channel)
//! - `services/` - Protocol logic (topic patterns, router, gateway handlers)
//! - `infra/` - Infrastructure (config, metrics, embedded broker)

use clap::Parser;
use mesh_bridge::infra::{Config, Metrics};
use mesh_bridge::io::{create_fanout, ConfigRequestPublisher, ControlChannel, StorageSink};
use mesh_bridge::services::{ArmedGate, TopicRouter};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Mesh bridge - gateway telemetry router
#[derive(Parser, Debug)]
#[command(name = "mesh-bridge", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Structured logging, level configurable via RUST_LOG (default: info)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(
        version = %env!("CARGO_PKG_VERSION"),
        git = %env!("GIT_HASH"),
        "mesh-bridge starting"
    );

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    if config.broker_embedded() {
        mesh_bridge::infra::broker::start_embedded_broker(&config);
    }

    info!(
        config_file = %config.config_file(),
        mqtt_host = %config.mqtt_host(),
        mqtt_port = %config.mqtt_port(),
        gateway_id = %config.gateway_id().unwrap_or("+"),
        storage_file = %config.storage_file(),
        control_endpoint = %config.control_endpoint(),
        queue_buffer = %config.queue_buffer(),
        "config_loaded"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics = Arc::new(Metrics::new());
    let (fanout, queues) = create_fanout(config.queue_buffer(), metrics.clone());

    // Storage sink drains the storage queue
    let storage_sink = StorageSink::new(config.storage_file(), metrics.clone());
    tokio::spawn(storage_sink.run(queues.storage, shutdown_rx.clone()));

    // Control channel drains the gateway-status queue
    if config.control_enabled() {
        let control = ControlChannel::new(&config);
        tokio::spawn(control.run(queues.gateway_status, shutdown_rx.clone()));
    } else {
        // Keep the queue draining so producers never see it fill up
        let mut status_rx = queues.gateway_status;
        tokio::spawn(async move {
            while let Some(item) = status_rx.recv().await {
                tracing::debug!(gateway = %item.gateway_id, "gateway_status_discarded");
            }
        });
    }

    // Outbound publisher drains the config-request queue
    let publisher = ConfigRequestPublisher::new(&config, queues.publish, metrics.clone());
    tokio::spawn(publisher.run(shutdown_rx.clone()));

    // Periodic metrics report
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            metrics_clone.report().log();
        }
    });

    // Router owns the registration table and the gateway handlers
    let armed = ArmedGate::new();
    let router = TopicRouter::new(&config, armed.clone(), fanout, metrics);

    // Ingest worker binds the broker connection and feeds the router
    let ingest_config = config.clone();
    let ingest_shutdown = shutdown_rx.clone();
    let ingest = tokio::spawn(async move {
        if let Err(e) =
            mesh_bridge::io::mqtt::start_ingest(&ingest_config, router, ingest_shutdown).await
        {
            tracing::error!(error = %e, "ingest client error");
        }
    });

    // Handle shutdown on Ctrl+C
    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    // All collaborators are up - open the gate. Messages that arrived
    // before this point were dropped, never buffered.
    armed.arm();
    info!("router_armed");

    ingest.await?;

    info!("mesh-bridge shutdown complete");
    Ok(())
}
