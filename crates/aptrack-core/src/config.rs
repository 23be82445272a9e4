// ── Runtime configuration ──
//
// These types describe *where* the access points and the broker are and
// how the tracker loop is paced. They carry credential data but never
// touch disk. The CLI builds them from the config file and hands them in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy for TR-064 endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. AVM devices ship self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for aptrack_api::TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// One access point whose host table is polled.
#[derive(Debug, Clone)]
pub struct AccessPointConfig {
    /// Identifier reported in `seen_by` and `connected_to`.
    pub label: String,
    /// TR-064 root URL (e.g. `http://fritz.box:49000`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

/// Broker connection and Home Assistant discovery settings.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub keep_alive: Duration,
    /// Prefix of discovery config topics (`homeassistant`).
    pub discovery_prefix: String,
    /// Optional node id inserted into every topic.
    pub node_id: Option<String>,
    /// Prepended to the hostname to form the entity name.
    pub name_prefix: String,
    /// Home Assistant birth/will topic.
    pub status_topic: Option<String>,
}

impl RegistryConfig {
    /// Connection parameters for the api-level MQTT session.
    pub fn session_settings(&self) -> aptrack_api::MqttSettings {
        aptrack_api::MqttSettings {
            host: self.host.clone(),
            port: self.port,
            client_id: self.client_id.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            keep_alive: self.keep_alive,
            status_topic: self.status_topic.clone(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            client_id: "aptrack".into(),
            username: None,
            password: None,
            keep_alive: Duration::from_secs(30),
            discovery_prefix: "homeassistant".into(),
            node_id: None,
            name_prefix: String::new(),
            status_topic: Some("homeassistant/status".into()),
        }
    }
}

/// Pacing of the tracker loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Sleep between two poll cycles.
    pub poll_interval: Duration,
    /// Pause between issuing creates and the first state updates.
    pub settle_delay: Duration,
    /// Publish the state on every cycle, not only on change.
    pub send_state_always: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            settle_delay: Duration::from_secs(10),
            send_state_always: false,
        }
    }
}
