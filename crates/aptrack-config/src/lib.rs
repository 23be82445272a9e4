//! Configuration for aptrack.
//!
//! TOML file, layered loading (defaults, file, `APTRACK_` environment),
//! credential resolution (env + keyring + plaintext) and translation to
//! the runtime configs of `aptrack_core`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use aptrack_core::{AccessPointConfig, RegistryConfig, TlsVerification, TrackerConfig};

/// Keyring service name all secrets are stored under.
pub const KEYRING_SERVICE: &str = "aptrack";

/// Credential target of the broker password.
pub const MQTT_TARGET: &str = "mqtt";

/// Credential target of the primary access point password.
pub const PRIMARY_TARGET: &str = "primary";

const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for '{target}'")]
    NoCredentials { target: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub mqtt: MqttSection,

    /// The Fritz!Box holding the main host table.
    #[serde(default)]
    pub primary: AccessPointSection,

    /// Repeaters with their own host tables.
    #[serde(default)]
    pub repeaters: Vec<AccessPointSection>,

    #[serde(default)]
    pub tracker: TrackerSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MqttSection {
    #[serde(default = "default_mqtt_host")]
    pub host: String,

    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    pub username: Option<String>,

    /// Plaintext password. Prefer the keyring or `password_env`.
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Keep alive interval in seconds.
    #[serde(default = "default_keep_alive")]
    pub keep_alive: u64,

    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,

    pub node_id: Option<String>,

    /// Prepended to every entity name.
    #[serde(default)]
    pub name_prefix: String,

    /// Home Assistant status topic. Empty disables reconnect detection.
    #[serde(default = "default_status_topic")]
    pub status_topic: String,
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            username: None,
            password: None,
            password_env: None,
            client_id: default_client_id(),
            keep_alive: default_keep_alive(),
            discovery_prefix: default_discovery_prefix(),
            node_id: None,
            name_prefix: String::new(),
            status_topic: default_status_topic(),
        }
    }
}

fn default_mqtt_host() -> String {
    "localhost".into()
}
fn default_mqtt_port() -> u16 {
    1883
}
fn default_client_id() -> String {
    "aptrack".into()
}
fn default_keep_alive() -> u64 {
    30
}
fn default_discovery_prefix() -> String {
    "homeassistant".into()
}
fn default_status_topic() -> String {
    "homeassistant/status".into()
}

/// One TR-064 endpoint (Fritz!Box or Fritz!Repeater).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccessPointSection {
    /// Label used in `seen_by` / `connected_to` and as keyring target.
    pub name: Option<String>,

    /// TR-064 root URL (e.g., "http://fritz.box:49000").
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_username")]
    pub username: String,

    /// Plaintext password. Prefer the keyring or `password_env`.
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Accept invalid TLS certificates (https endpoints only).
    pub insecure: Option<bool>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,
}

impl Default for AccessPointSection {
    fn default() -> Self {
        Self {
            name: None,
            url: default_url(),
            username: default_username(),
            password: None,
            password_env: None,
            insecure: None,
            ca_cert: None,
            timeout: None,
        }
    }
}

fn default_url() -> String {
    "http://fritz.box:49000".into()
}
fn default_username() -> String {
    "admin".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrackerSection {
    /// Seconds between two poll cycles. Values below one are raised to one.
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Seconds to wait after creating entities before publishing states.
    #[serde(default = "default_settle_delay")]
    pub settle_delay: u64,

    /// Publish the state on every cycle instead of on change only.
    #[serde(default)]
    pub send_state_always: bool,
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            settle_delay: default_settle_delay(),
            send_state_always: false,
        }
    }
}

fn default_interval() -> u64 {
    60
}
fn default_settle_delay() -> u64 {
    10
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "aptrack")
}

fn home_fallback(parts: &[&str]) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.extend(parts);
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(&[".config", "aptrack", "config.toml"]),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the persistent state file.
pub fn state_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(&[".local", "share", "aptrack", "state.yaml"]),
        |dirs| dirs.data_dir().join("state.yaml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from defaults, `path` and the environment.
///
/// A missing file is not an error; the defaults and environment apply.
/// Nested keys use `__` in variable names (`APTRACK_MQTT__HOST`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading configuration");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("APTRACK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load the full Config from the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Commented example configuration.
pub fn example_config() -> String {
    r#"# aptrack configuration

[mqtt]
host = "mqtt.local.net"
port = 1883
username = "mqtt"
# Prefer `aptrack config set-password mqtt` or password_env over plaintext.
# password = "secret"
# password_env = "MQTT_PASSWORD"
client_id = "aptrack"
discovery_prefix = "homeassistant"
# node_id = "aptrack"
name_prefix = ""
status_topic = "homeassistant/status"

[primary]
url = "http://fritz.box:49000"
username = "admin"
# password = "secret"
# name = "Fritz!Box"

# One section per repeater.
[[repeaters]]
url = "http://fritz.repeater:49000"
username = "admin"
# name = "Upstairs"
# password = "secret"

[tracker]
interval = 60
settle_delay = 10
send_state_always = false
"#
    .to_owned()
}

// ── Presentation ────────────────────────────────────────────────────

impl Config {
    /// Copy with every plaintext password masked, for display.
    pub fn redacted(&self) -> Self {
        let mask = |p: &Option<String>| p.as_ref().map(|_| REDACTED.to_owned());
        let mut cfg = self.clone();
        cfg.mqtt.password = mask(&self.mqtt.password);
        cfg.primary.password = mask(&self.primary.password);
        for repeater in &mut cfg.repeaters {
            repeater.password = mask(&repeater.password);
        }
        cfg
    }

    /// Find the section a credential target names: `primary` or a
    /// repeater's name / host.
    pub fn access_point(&self, target: &str) -> Option<&AccessPointSection> {
        if target == PRIMARY_TARGET {
            return Some(&self.primary);
        }
        self.repeaters
            .iter()
            .find(|r| r.credential_target(false) == target)
    }
}

impl AccessPointSection {
    fn host(&self) -> String {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .unwrap_or_else(|| self.url.clone())
    }

    /// Label reported by this access point.
    pub fn label(&self, primary: bool) -> String {
        match (&self.name, primary) {
            (Some(name), _) => name.clone(),
            (None, true) => "Fritz!Box".into(),
            (None, false) => format!("Repeater {}", self.host()),
        }
    }

    /// Keyring target holding this access point's password.
    pub fn credential_target(&self, primary: bool) -> String {
        match (&self.name, primary) {
            (_, true) => PRIMARY_TARGET.into(),
            (Some(name), false) => name.clone(),
            (None, false) => self.host(),
        }
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a password: named env var → system keyring → plaintext.
pub fn resolve_password(
    target: &str,
    password_env: Option<&str>,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    // 1. Env var named by the config
    if let Some(env_name) = password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{target}/password")) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    plaintext.map(|p| SecretString::from(p.to_owned()))
}

/// Store a password in the system keyring.
pub fn store_password(target: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{target}/password"))?;
    entry.set_password(password)?;
    Ok(())
}

// ── Translation to runtime configs ──────────────────────────────────

fn access_point_config(
    section: &AccessPointSection,
    primary: bool,
) -> Result<AccessPointConfig, ConfigError> {
    let label = section.label(primary);
    let target = section.credential_target(primary);

    let url: url::Url = section.url.parse().map_err(|_| ConfigError::Validation {
        field: format!("{label}.url"),
        reason: format!("invalid URL: {}", section.url),
    })?;

    let password = resolve_password(
        &target,
        section.password_env.as_deref(),
        section.password.as_deref(),
    )
    .ok_or(ConfigError::NoCredentials { target })?;

    let tls = if section.insecure.unwrap_or(true) {
        TlsVerification::DangerAcceptInvalid // AVM devices are self-signed
    } else if let Some(ref ca_path) = section.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(AccessPointConfig {
        label,
        url,
        username: section.username.clone(),
        password,
        tls,
        timeout: Duration::from_secs(section.timeout.unwrap_or(30)),
    })
}

/// Runtime configs of the primary and all repeaters, primary first.
pub fn to_access_point_configs(cfg: &Config) -> Result<Vec<AccessPointConfig>, ConfigError> {
    std::iter::once((&cfg.primary, true))
        .chain(cfg.repeaters.iter().map(|r| (r, false)))
        .map(|(section, primary)| access_point_config(section, primary))
        .collect()
}

/// Runtime broker config.
pub fn to_registry_config(cfg: &Config) -> RegistryConfig {
    let mqtt = &cfg.mqtt;
    let password = resolve_password(
        MQTT_TARGET,
        mqtt.password_env.as_deref(),
        mqtt.password.as_deref(),
    );

    RegistryConfig {
        host: mqtt.host.clone(),
        port: mqtt.port,
        client_id: mqtt.client_id.clone(),
        username: mqtt.username.clone(),
        password,
        keep_alive: Duration::from_secs(mqtt.keep_alive),
        discovery_prefix: mqtt.discovery_prefix.clone(),
        node_id: mqtt.node_id.clone().filter(|n| !n.is_empty()),
        name_prefix: mqtt.name_prefix.clone(),
        status_topic: Some(mqtt.status_topic.clone()).filter(|t| !t.is_empty()),
    }
}

/// Shortest accepted poll interval in seconds.
const MIN_INTERVAL: u64 = 1;

/// Runtime tracker pacing.
pub fn to_tracker_config(cfg: &Config) -> TrackerConfig {
    TrackerConfig {
        poll_interval: Duration::from_secs(cfg.tracker.interval.max(MIN_INTERVAL)),
        settle_delay: Duration::from_secs(cfg.tracker.settle_delay),
        send_state_always: cfg.tracker.send_state_always,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|_jail| {
            let cfg = load_config_from(Path::new("missing.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg, Config::default());
            assert_eq!(cfg.tracker.interval, 60);
            assert_eq!(cfg.tracker.settle_delay, 10);
            assert_eq!(cfg.primary.url, "http://fritz.box:49000");
            Ok(())
        });
    }

    #[test]
    fn example_config_parses() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", &example_config())?;
            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.mqtt.host, "mqtt.local.net");
            assert_eq!(cfg.mqtt.username.as_deref(), Some("mqtt"));
            assert_eq!(cfg.repeaters.len(), 1);
            assert_eq!(cfg.repeaters[0].label(false), "Repeater fritz.repeater");
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    [mqtt]
                    host = "broker"

                    [tracker]
                    interval = 120
                "#,
            )?;
            jail.set_env("APTRACK_MQTT__HOST", "other-broker");
            jail.set_env("APTRACK_TRACKER__SEND_STATE_ALWAYS", "true");

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.mqtt.host, "other-broker");
            assert_eq!(cfg.tracker.interval, 120);
            assert!(cfg.tracker.send_state_always);
            Ok(())
        });
    }

    #[test]
    fn password_env_takes_precedence_over_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("APTRACK_TEST_FRITZ_PW", "from-env");
            let secret = resolve_password(
                "aptrack-test-target",
                Some("APTRACK_TEST_FRITZ_PW"),
                Some("from-file"),
            )
            .unwrap();
            assert_eq!(secret.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn access_point_configs_carry_labels_and_credentials() {
        Jail::expect_with(|jail| {
            jail.set_env("APTRACK_TEST_PRIMARY_PW", "primary-pw");
            jail.set_env("APTRACK_TEST_REPEATER_PW", "repeater-pw");

            let cfg = Config {
                primary: AccessPointSection {
                    password_env: Some("APTRACK_TEST_PRIMARY_PW".into()),
                    ..AccessPointSection::default()
                },
                repeaters: vec![AccessPointSection {
                    url: "http://192.168.178.2:49000".into(),
                    password_env: Some("APTRACK_TEST_REPEATER_PW".into()),
                    ..AccessPointSection::default()
                }],
                ..Config::default()
            };

            let aps = to_access_point_configs(&cfg).map_err(|e| e.to_string())?;
            assert_eq!(aps.len(), 2);
            assert_eq!(aps[0].label, "Fritz!Box");
            assert_eq!(aps[1].label, "Repeater 192.168.178.2");
            assert_eq!(aps[1].password.expose_secret(), "repeater-pw");
            assert_eq!(aps[0].tls, TlsVerification::DangerAcceptInvalid);
            Ok(())
        });
    }

    #[test]
    fn invalid_url_is_a_validation_error() {
        let cfg = Config {
            primary: AccessPointSection {
                url: "not a url".into(),
                password: Some("pw".into()),
                ..AccessPointSection::default()
            },
            ..Config::default()
        };
        let err = to_access_point_configs(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn tracker_and_registry_translation() {
        let mut cfg = Config::default();
        cfg.tracker.interval = 30;
        cfg.mqtt.node_id = Some(String::new());
        cfg.mqtt.status_topic = String::new();

        let tracker = to_tracker_config(&cfg);
        assert_eq!(tracker.poll_interval, Duration::from_secs(30));
        assert_eq!(tracker.settle_delay, Duration::from_secs(10));

        let registry = to_registry_config(&cfg);
        assert_eq!(registry.node_id, None);
        assert_eq!(registry.status_topic, None);
        assert_eq!(registry.discovery_prefix, "homeassistant");
    }

    #[test]
    fn zero_interval_is_raised_to_one_second() {
        let mut cfg = Config::default();
        cfg.tracker.interval = 0;
        assert_eq!(
            to_tracker_config(&cfg).poll_interval,
            Duration::from_secs(1)
        );
    }

    #[test]
    fn redacted_masks_passwords() {
        let mut cfg = Config::default();
        cfg.mqtt.password = Some("secret".into());
        cfg.repeaters.push(AccessPointSection {
            password: Some("secret".into()),
            ..AccessPointSection::default()
        });

        let shown = cfg.redacted();
        assert_eq!(shown.mqtt.password.as_deref(), Some(REDACTED));
        assert_eq!(shown.repeaters[0].password.as_deref(), Some(REDACTED));
        assert_eq!(shown.primary.password, None);
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut cfg = Config::default();
        cfg.repeaters.push(AccessPointSection {
            name: Some("Upstairs".into()),
            ..AccessPointSection::default()
        });

        save_config_to(&cfg, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let reloaded: Config = toml::from_str(&text).unwrap();
        assert_eq!(reloaded, cfg);
        assert!(cfg.access_point("Upstairs").is_some());
        assert!(cfg.access_point(PRIMARY_TARGET).is_some());
    }
}
