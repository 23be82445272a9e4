//! MQTT broker session with automatic reconnect.
//!
//! Wraps a [`rumqttc::AsyncClient`] and drives its event loop on a
//! background task. Publishes are enqueued without blocking; the event
//! loop flushes them once the broker accepts the connection.
//!
//! When a status topic is configured, the session (re)subscribes to it on
//! every `ConnAck` and forwards each status message as a `bool`
//! (`payload == "online"`) through an [`mpsc`] channel.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::Error;

// ── Capacities ───────────────────────────────────────────────────────

/// Outgoing request queue of the client. A full queue rejects publishes.
const REQUEST_QUEUE_CAPACITY: usize = 1024;

/// Buffered status notifications before the event loop starts dropping.
const STATUS_CHANNEL_CAPACITY: usize = 16;

/// Delay between reconnection attempts after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// How long `close` waits for the disconnect to go out.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

// ── MqttSettings ─────────────────────────────────────────────────────

/// Connection parameters for the broker.
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub keep_alive: Duration,
    /// Topic carrying `online`/`offline` announcements of the consumer.
    pub status_topic: Option<String>,
}

impl MqttSettings {
    fn to_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        if let Some(username) = &self.username {
            let password = self
                .password
                .as_ref()
                .map(|p| p.expose_secret().to_owned())
                .unwrap_or_default();
            options.set_credentials(username, password);
        }
        options
    }
}

// ── MqttSession ──────────────────────────────────────────────────────

/// Handle to a running broker session.
pub struct MqttSession {
    client: AsyncClient,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MqttSession {
    /// Create the client and spawn the event loop task.
    ///
    /// Returns immediately; the first connection attempt happens on the
    /// background task. The receiver yields one `bool` per status message.
    pub fn connect(settings: &MqttSettings) -> (Self, mpsc::Receiver<bool>) {
        let (client, eventloop) = AsyncClient::new(settings.to_options(), REQUEST_QUEUE_CAPACITY);
        let (status_tx, status_rx) = mpsc::channel(STATUS_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        tracing::debug!(
            host = %settings.host,
            port = settings.port,
            client_id = %settings.client_id,
            "starting MQTT session"
        );

        let task = tokio::spawn(event_loop(
            eventloop,
            client.clone(),
            settings.status_topic.clone(),
            status_tx,
            cancel.clone(),
        ));

        (
            Self {
                client,
                cancel,
                task,
            },
            status_rx,
        )
    }

    /// Enqueue a QoS 0, non-retained publish.
    pub fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>) -> Result<(), Error> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(Error::from)
    }

    /// Disconnect from the broker and wait for the event loop to finish.
    ///
    /// Queued publishes get a short grace period to flush before the
    /// disconnect request goes out.
    pub async fn close(self) {
        if let Err(e) = self.client.try_disconnect() {
            tracing::debug!(error = %e, "disconnect request not queued");
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {}
            () = tokio::time::sleep(CLOSE_GRACE) => self.cancel.cancel(),
        }
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "MQTT event loop task failed");
        }
    }
}

// ── Background event loop ────────────────────────────────────────────

async fn event_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    status_topic: Option<String>,
    status_tx: mpsc::Sender<bool>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    tracing::info!(code = ?ack.code, "connected to MQTT broker");
                    if let Some(topic) = &status_topic {
                        if let Err(e) = client.try_subscribe(topic, QoS::ExactlyOnce) {
                            tracing::error!(topic = %topic, error = %e, "failed to subscribe to status topic");
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if status_topic.as_deref() == Some(publish.topic.as_str()) {
                        let online = publish.payload.as_ref() == b"online";
                        tracing::debug!(online, "status message received");
                        if let Err(e) = status_tx.try_send(online) {
                            tracing::warn!(error = %e, "dropping status message");
                        }
                    }
                }
                Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) => {
                    tracing::debug!("disconnect sent");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "MQTT connection error, retrying");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                    }
                }
            }
        }
    }
    cancel.cancel();
    tracing::debug!("MQTT event loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> MqttSettings {
        MqttSettings {
            host: "127.0.0.1".into(),
            port: 1,
            client_id: "aptrack-test".into(),
            username: Some("mqtt".into()),
            password: Some(SecretString::from("secret")),
            keep_alive: Duration::from_secs(30),
            status_topic: Some("homeassistant/status".into()),
        }
    }

    #[test]
    fn options_carry_identity_and_credentials() {
        let options = settings().to_options();
        assert_eq!(options.client_id(), "aptrack-test");
        assert_eq!(options.broker_address(), ("127.0.0.1".to_owned(), 1));
        assert_eq!(
            options.credentials(),
            Some(("mqtt".to_owned(), "secret".to_owned()))
        );
        assert_eq!(options.keep_alive(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn publish_is_queued_before_connect_and_close_terminates() {
        let (session, _status) = MqttSession::connect(&settings());
        session
            .publish("aptrack/test", "payload")
            .expect("publish should be queued");
        session.close().await;
    }
}
