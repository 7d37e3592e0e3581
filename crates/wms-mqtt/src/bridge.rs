//! MQTT client wiring and message dispatch.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::watch;
use tracing::{info, warn};

use wms_config::MqttConfig;
use wms_coordinator::{HandleSlotError, InventoryCoordinator};
use wms_domain::InventoryError;
use wms_reconcile::PhysicalReconciler;

use crate::messages::{parse_topic, ShelfEventMsg, ShelfStatusMsg, TopicKind};
use crate::retry::{with_retry_if, RetryPolicy};

const CLIENT_ID: &str = "inventory-service";
const RECONNECT_CEILING: Duration = Duration::from_secs(10);

pub struct ShelfBridge {
    coordinator: Arc<InventoryCoordinator>,
    reconciler: Arc<PhysicalReconciler>,
    topic_prefix: String,
    retry: RetryPolicy,
}

impl ShelfBridge {
    pub fn new(
        coordinator: Arc<InventoryCoordinator>,
        reconciler: Arc<PhysicalReconciler>,
        topic_prefix: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            coordinator,
            reconciler,
            topic_prefix: topic_prefix.into(),
            retry,
        }
    }

    /// Connect, subscribe and pump the event loop until shutdown. Connection
    /// loss reconnects with a capped backoff; the persistent session keeps
    /// QoS-1 subscriptions alive across reconnects.
    pub async fn run(
        &self,
        cfg: &MqttConfig,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let (host, port) = parse_broker_url(&cfg.broker_url)?;
        let mut options = MqttOptions::new(CLIENT_ID, host, port);
        options
            .set_keep_alive(Duration::from_secs(60))
            .set_clean_session(false);

        let (client, mut eventloop) = AsyncClient::new(options, 64);
        let event_filter = format!("{}/+/events", self.topic_prefix);
        let status_filter = format!("{}/+/status", self.topic_prefix);

        client
            .subscribe(&event_filter, QoS::AtLeastOnce)
            .await
            .context("subscribe to shelf events failed")?;
        client
            .subscribe(&status_filter, QoS::AtLeastOnce)
            .await
            .context("subscribe to shelf status failed")?;

        info!(broker = %cfg.broker_url, prefix = %self.topic_prefix, "shelf bridge connected");

        let mut reconnect_delay = Duration::from_secs(1);
        loop {
            tokio::select! {
                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        reconnect_delay = Duration::from_secs(1);
                        self.dispatch(&publish.topic, &publish.payload).await;
                    }
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        reconnect_delay = Duration::from_secs(1);
                        // A broker that dropped our session needs the
                        // subscriptions re-issued.
                        if !ack.session_present {
                            let _ = client.subscribe(&event_filter, QoS::AtLeastOnce).await;
                            let _ = client.subscribe(&status_filter, QoS::AtLeastOnce).await;
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, delay_secs = reconnect_delay.as_secs(),
                              "mqtt connection error, reconnecting");
                        tokio::time::sleep(reconnect_delay).await;
                        reconnect_delay = (reconnect_delay * 2).min(RECONNECT_CEILING);
                    }
                },
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("shelf bridge stopping");
                        let _ = client.disconnect().await;
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Route one raw publish to the right handler. Handler failures are
    /// logged, never propagated: the bus redelivers at QoS 1 and the state
    /// machine tolerates replays.
    pub async fn dispatch(&self, topic: &str, payload: &[u8]) {
        match parse_topic(topic, &self.topic_prefix) {
            Some((_, TopicKind::Events)) => {
                let msg: ShelfEventMsg = match serde_json::from_slice(payload) {
                    Ok(msg) => msg,
                    Err(err) => {
                        warn!(topic, error = %err, "undecodable shelf event payload");
                        return;
                    }
                };
                if let Err(err) = self.handle_shelf_event(msg).await {
                    warn!(topic, error = %err, "shelf event handling failed");
                }
            }
            Some((_, TopicKind::Status)) => {
                let msg: ShelfStatusMsg = match serde_json::from_slice(payload) {
                    Ok(msg) => msg,
                    Err(err) => {
                        warn!(topic, error = %err, "undecodable shelf status payload");
                        return;
                    }
                };
                if let Err(err) = self.handle_shelf_status(msg).await {
                    warn!(topic, error = %err, "shelf status handling failed");
                }
            }
            None => warn!(topic, "ignoring message on unexpected topic"),
        }
    }

    /// Full pipeline per event, wrapped in the retry policy. Only transient
    /// failures (conflicts, infrastructure) are retried; validation and
    /// missing-row errors surface immediately.
    pub async fn handle_shelf_event(&self, msg: ShelfEventMsg) -> Result<(), InventoryError> {
        with_retry_if(&self.retry, InventoryError::is_transient, || {
            let msg = msg.clone();
            async move {
                match msg.event_type.as_str() {
                    "material_detected" => {
                        let barcode = msg.material_barcode.as_deref().ok_or_else(|| {
                            InventoryError::validation(
                                "material_detected event requires material_barcode",
                            )
                        })?;
                        self.reconciler
                            .handle_material_detected(&msg.shelf_id, &msg.slot_id, barcode)
                            .await
                    }
                    "material_removed" => {
                        self.reconciler
                            .handle_material_removed(&msg.shelf_id, &msg.slot_id)
                            .await
                    }
                    "slot_error" => {
                        self.coordinator
                            .handle_slot_error(HandleSlotError {
                                slot_id: msg.slot_id.clone(),
                                error_type: "sensor_error".to_string(),
                            })
                            .await
                    }
                    other => Err(InventoryError::validation(format!(
                        "unknown shelf event type: {other}"
                    ))),
                }
            }
        })
        .await
    }

    pub async fn handle_shelf_status(&self, msg: ShelfStatusMsg) -> Result<(), InventoryError> {
        self.coordinator
            .update_shelf_status(&msg.shelf_id, &msg.status)
            .await
    }
}

/// Accept `mqtt://host:port`, `tcp://host:port` or bare `host:port`.
fn parse_broker_url(url: &str) -> anyhow::Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);
    let (host, port) = match stripped.rsplit_once(':') {
        Some((host, port)) => (
            host,
            port.parse::<u16>()
                .with_context(|| format!("invalid mqtt port in {url}"))?,
        ),
        None => (stripped, 1883),
    };
    if host.is_empty() {
        bail!("invalid mqtt broker url: {url}");
    }
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_url_forms() {
        assert_eq!(
            parse_broker_url("mqtt://broker:1884").unwrap(),
            ("broker".to_string(), 1884)
        );
        assert_eq!(
            parse_broker_url("tcp://broker:1883").unwrap(),
            ("broker".to_string(), 1883)
        );
        assert_eq!(
            parse_broker_url("broker").unwrap(),
            ("broker".to_string(), 1883)
        );
        assert!(parse_broker_url("mqtt://:1883").is_err());
        assert!(parse_broker_url("mqtt://broker:notaport").is_err());
    }
}
