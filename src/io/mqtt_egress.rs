//! MQTT publisher for outbound config requests
//!
//! Drains the outbound-publish queue and emits `request/get_configs/{gw}`
//! messages, one per gateway observed transitioning to ONLINE.

use crate::domain::types::ConfigRequest;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Publisher actor for the outbound-publish queue
pub struct ConfigRequestPublisher {
    client: AsyncClient,
    rx: mpsc::Receiver<ConfigRequest>,
    metrics: Arc<Metrics>,
}

impl ConfigRequestPublisher {
    /// Create a new publisher connected to the configured broker
    pub fn new(config: &Config, rx: mpsc::Receiver<ConfigRequest>, metrics: Arc<Metrics>) -> Self {
        let client_id = format!("mesh-bridge-egress-{}", std::process::id());
        let mut mqttoptions = MqttOptions::new(client_id, config.mqtt_host(), config.mqtt_port());
        mqttoptions.set_keep_alive(Duration::from_secs(30));
        mqttoptions.set_clean_session(true);

        if let (Some(username), Some(password)) = (config.mqtt_username(), config.mqtt_password()) {
            mqttoptions.set_credentials(username, password);
        }

        let (client, eventloop) = AsyncClient::new(mqttoptions, 100);

        // Spawn the eventloop handler
        tokio::spawn(async move {
            let mut eventloop = eventloop;
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("egress_connected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "egress_mqtt_error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Self { client, rx, metrics }
    }

    /// Run the publisher loop until shutdown, draining remaining requests
    /// before returning.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("config_publisher_started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        while let Ok(request) = self.rx.try_recv() {
                            self.publish_request(request).await;
                        }
                        info!("config_publisher_shutdown");
                        return;
                    }
                }
                Some(request) = self.rx.recv() => {
                    self.publish_request(request).await;
                }
            }
        }
    }

    async fn publish_request(&self, request: ConfigRequest) {
        let topic = format!("request/get_configs/{}", request.gateway_id);
        let body = match serde_json::to_vec(&request) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "config_request_encode_failed");
                return;
            }
        };

        // QoS 1: a lost request would leave the gateway unconfigured downstream
        match self.client.publish(topic, QoS::AtLeastOnce, false, body).await {
            Ok(()) => {
                self.metrics.record_request_published();
                debug!(gateway = %request.gateway_id, "config_request_published");
            }
            Err(e) => {
                error!(gateway = %request.gateway_id, error = %e, "config_request_publish_failed");
            }
        }
    }
}
