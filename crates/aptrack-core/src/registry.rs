// ── Presence registry ──
//
// The external system holding one tracker entity per hostname. The
// tracker only ever talks to it through `Registry`; `MqttRegistry` maps
// the operations onto Home Assistant MQTT discovery.

use std::future::Future;

use tokio::sync::mpsc;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::discovery::Discovery;
use crate::error::CoreError;
use crate::model::{PresenceState, TrackerAttributes};

/// Operations the tracker issues against the registry.
pub trait Registry: Send + Sync {
    /// Announce a tracker entity for `hostname`.
    fn create(&self, hostname: &str) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Publish the presence state of `hostname`.
    fn update_state(
        &self,
        hostname: &str,
        state: PresenceState,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Publish the attribute payload of `hostname`.
    fn update_attributes(
        &self,
        hostname: &str,
        attributes: &TrackerAttributes,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Remove the tracker entity of `hostname`.
    fn delete(&self, hostname: &str) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Registry backed by an MQTT broker with Home Assistant discovery.
pub struct MqttRegistry {
    session: aptrack_api::MqttSession,
    discovery: Discovery,
}

impl MqttRegistry {
    /// Start the broker session.
    ///
    /// Returns the registry and the receiver of Home Assistant status
    /// notifications (`true` = online).
    pub fn connect(config: &RegistryConfig) -> (Self, mpsc::Receiver<bool>) {
        let (session, status) = aptrack_api::MqttSession::connect(&config.session_settings());
        let registry = Self {
            session,
            discovery: Discovery::from_config(config),
        };
        (registry, status)
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// Flush and disconnect.
    pub async fn close(self) {
        self.session.close().await;
    }

    fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>) -> Result<(), CoreError> {
        debug!(topic, "publishing");
        self.session.publish(topic, payload)?;
        Ok(())
    }

    fn to_json(value: &impl serde::Serialize) -> Result<String, CoreError> {
        serde_json::to_string(value).map_err(|e| CoreError::Internal(e.to_string()))
    }
}

impl Registry for MqttRegistry {
    async fn create(&self, hostname: &str) -> Result<(), CoreError> {
        let payload = Self::to_json(&self.discovery.config_payload(hostname))?;
        self.publish(&self.discovery.config_topic(hostname), payload)
    }

    async fn update_state(&self, hostname: &str, state: PresenceState) -> Result<(), CoreError> {
        self.publish(&self.discovery.state_topic(hostname), state.to_string())
    }

    async fn update_attributes(
        &self,
        hostname: &str,
        attributes: &TrackerAttributes,
    ) -> Result<(), CoreError> {
        let payload = Self::to_json(attributes)?;
        self.publish(&self.discovery.attributes_topic(hostname), payload)
    }

    async fn delete(&self, hostname: &str) -> Result<(), CoreError> {
        self.publish(&self.discovery.config_topic(hostname), Vec::new())
    }
}
