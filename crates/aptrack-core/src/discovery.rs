// ── Home Assistant MQTT discovery ──
//
// Topic layout and payloads for `device_tracker` entities. Hostnames are
// not valid topic segments in general, so every entity is addressed by the
// MD5 hex digest of its hostname.

use md5::{Digest, Md5};
use serde::Serialize;

use crate::config::RegistryConfig;
use crate::model::PresenceState;

/// Discovery config payload announcing one tracker entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryPayload {
    pub state_topic: String,
    pub json_attributes_topic: String,
    pub name: String,
    pub unique_id: String,
    pub payload_home: String,
    pub payload_not_home: String,
}

/// Topic builder for one discovery namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    discovery_prefix: String,
    node_id: Option<String>,
    name_prefix: String,
}

impl Discovery {
    pub fn new(discovery_prefix: &str, node_id: Option<&str>, name_prefix: &str) -> Self {
        Self {
            discovery_prefix: discovery_prefix.trim_end_matches('/').to_owned(),
            node_id: node_id
                .map(|n| n.trim_matches('/'))
                .filter(|n| !n.is_empty())
                .map(str::to_owned),
            name_prefix: name_prefix.to_owned(),
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(
            &config.discovery_prefix,
            config.node_id.as_deref(),
            &config.name_prefix,
        )
    }

    /// Stable entity id of a hostname.
    pub fn object_id(hostname: &str) -> String {
        format!("{:x}", Md5::digest(hostname.as_bytes()))
    }

    fn base(&self, hostname: &str) -> String {
        let object_id = Self::object_id(hostname);
        match &self.node_id {
            Some(node_id) => format!("{node_id}/{object_id}"),
            None => object_id,
        }
    }

    pub fn config_topic(&self, hostname: &str) -> String {
        format!(
            "{}/device_tracker/{}/config",
            self.discovery_prefix,
            self.base(hostname)
        )
    }

    pub fn state_topic(&self, hostname: &str) -> String {
        format!("{}/state", self.base(hostname))
    }

    pub fn attributes_topic(&self, hostname: &str) -> String {
        format!("{}/attributes", self.base(hostname))
    }

    pub fn config_payload(&self, hostname: &str) -> DiscoveryPayload {
        DiscoveryPayload {
            state_topic: self.state_topic(hostname),
            json_attributes_topic: self.attributes_topic(hostname),
            name: format!("{}{hostname}", self.name_prefix),
            unique_id: Self::object_id(hostname),
            payload_home: PresenceState::Home.to_string(),
            payload_not_home: PresenceState::NotHome.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn object_id_is_md5_of_hostname() {
        assert_eq!(
            Discovery::object_id("living-room-tv"),
            format!("{:x}", Md5::digest(b"living-room-tv"))
        );
        assert_eq!(Discovery::object_id(""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn topics_without_node_id() {
        let discovery = Discovery::new("homeassistant", None, "");
        let oid = Discovery::object_id("nas");
        assert_eq!(
            discovery.config_topic("nas"),
            format!("homeassistant/device_tracker/{oid}/config")
        );
        assert_eq!(discovery.state_topic("nas"), format!("{oid}/state"));
        assert_eq!(discovery.attributes_topic("nas"), format!("{oid}/attributes"));
    }

    #[test]
    fn topics_with_node_id() {
        let discovery = Discovery::new("homeassistant/", Some("aptrack"), "");
        let oid = Discovery::object_id("nas");
        assert_eq!(
            discovery.config_topic("nas"),
            format!("homeassistant/device_tracker/aptrack/{oid}/config")
        );
        assert_eq!(discovery.state_topic("nas"), format!("aptrack/{oid}/state"));
    }

    #[test]
    fn empty_node_id_is_ignored() {
        assert_eq!(
            Discovery::new("homeassistant", Some(""), ""),
            Discovery::new("homeassistant", None, "")
        );
    }

    #[test]
    fn config_payload_fields() {
        let discovery = Discovery::new("homeassistant", None, "AP ");
        let oid = Discovery::object_id("nas");
        let json = serde_json::to_value(discovery.config_payload("nas")).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({
                "state_topic": format!("{oid}/state"),
                "json_attributes_topic": format!("{oid}/attributes"),
                "name": "AP nas",
                "unique_id": oid,
                "payload_home": "home",
                "payload_not_home": "not_home",
            })
        );
    }
}
