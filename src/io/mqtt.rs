//! MQTT ingest client feeding the topic router
//!
//! Binds one broker connection; message callbacks execute synchronously and
//! sequentially on this worker's receive path. Routing only enqueues, so
//! the event loop is never stalled.

use crate::domain::types::IncomingMessage;
use crate::infra::config::Config;
use crate::services::router::TopicRouter;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// Start the ingest client and route incoming publishes until shutdown.
///
/// Subscription filters are derived from the router's registration table.
/// Event-loop errors are logged and retried after a short backoff; failures
/// of individual messages never surface to the broker client.
pub async fn start_ingest(
    config: &Config,
    router: TopicRouter,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client_id = format!("mesh-bridge-{}", std::process::id());
    let mut mqttoptions = MqttOptions::new(client_id, config.mqtt_host(), config.mqtt_port());
    mqttoptions.set_keep_alive(Duration::from_secs(30));

    if let (Some(username), Some(password)) = (config.mqtt_username(), config.mqtt_password()) {
        mqttoptions.set_credentials(username, password);
    }

    let (client, mut eventloop) = AsyncClient::new(mqttoptions, 100);

    let filters = router.filters();
    for filter in &filters {
        client.subscribe(filter.clone(), QoS::AtMostOnce).await?;
    }

    info!(
        host = %config.mqtt_host(),
        port = %config.mqtt_port(),
        filters = ?filters,
        "ingest_subscribed"
    );

    loop {
        tokio::select! {
            // Absorb the interrupt at the top of the run loop so no
            // half-completed dispatch leaves visible partial state
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!(messages_seen = %router.messages_seen(), "ingest_shutdown");
                    return Ok(());
                }
            }
            result = eventloop.poll() => {
                match result {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let message = IncomingMessage {
                            topic: publish.topic,
                            payload: publish.payload,
                        };
                        router.dispatch(&message);
                    }
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("ingest_connected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, "ingest_mqtt_error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }
    }
}
