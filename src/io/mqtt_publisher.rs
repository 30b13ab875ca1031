//! MQTT publisher for discovery messages
//!
//! Publishes to the Home Assistant broker with QoS 0 (fire-and-forget).
//! Connection handling and reconnects live in the spawned event loop task.
//! Publishes never wait: when the request queue is full (broker unreachable)
//! the message is dropped and reported as an error.

use crate::infra::config::Config;
use crate::io::publisher::{Publication, Publisher};
use async_trait::async_trait;
use anyhow::anyhow;
use rumqttc::{AsyncClient, ClientError, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the client's outgoing request queue
const REQUEST_QUEUE_CAPACITY: usize = 100;

pub struct MqttPublisher {
    client: AsyncClient,
    eventloop_task: JoinHandle<()>,
}

impl MqttPublisher {
    /// Create the client and spawn its event loop
    ///
    /// Must be called from within a tokio runtime. The connection is
    /// established lazily by the event loop; publishes queue until then,
    /// up to the request queue capacity.
    pub fn new(config: &Config) -> Self {
        let mut mqttoptions = MqttOptions::new(config.client_id(), config.mqtt_host(), config.mqtt_port());
        mqttoptions.set_keep_alive(Duration::from_secs(30));
        mqttoptions.set_clean_session(true);
        mqttoptions.set_credentials(config.mqtt_username(), config.mqtt_password());

        let (client, eventloop) = AsyncClient::new(mqttoptions, REQUEST_QUEUE_CAPACITY);

        let eventloop_task = tokio::spawn(async move {
            let mut eventloop = eventloop;
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("mqtt_connected");
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        warn!("mqtt_disconnected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "mqtt_connection_error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        info!(host = %config.mqtt_host(), port = %config.mqtt_port(), client_id = %config.client_id(), "mqtt_publisher_started");
        Self { client, eventloop_task }
    }

    /// Disconnect from the broker and stop the event loop
    pub async fn shutdown(self) {
        if let Err(e) = self.client.disconnect().await {
            debug!(error = %e, "mqtt_disconnect_failed");
        }
        // Give the event loop a moment to flush the disconnect packet
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.eventloop_task.abort();
        info!("mqtt_publisher_stopped");
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, publication: Publication) -> anyhow::Result<()> {
        self.client
            .try_publish(publication.topic, QoS::AtMostOnce, publication.retain, publication.payload.into_bytes())
            .map_err(|e| match e {
                ClientError::TryRequest(_) => anyhow!("mqtt request queue full, message dropped"),
                other => anyhow!(other),
            })
    }
}
