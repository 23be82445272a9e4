// ── Merged presence records ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::MacAddress;

/// Interface type AVM reports for wireless associations.
pub const WIRELESS: &str = "802.11";

/// Prefix of the placeholder names access points invent for unnamed hosts.
pub const PLACEHOLDER_PREFIX: &str = "PC-";

/// Returns `true` for generated placeholder names (`PC-192-168-178-21`).
pub fn is_placeholder(name: &str) -> bool {
    name.starts_with(PLACEHOLDER_PREFIX)
}

/// One device as seen across all access points during a single poll.
///
/// Rebuilt every poll; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub mac: MacAddress,
    pub name: String,
    pub ip: String,
    pub interface_type: String,
    /// Access point with the authoritative sighting.
    pub connected_to: String,
    /// Currently associated.
    pub status: bool,
    /// Access points that listed this MAC, in poll order.
    pub seen_by: Vec<String>,
}

impl Device {
    /// A device with empty connectivity fields.
    pub fn new(mac: MacAddress) -> Self {
        Self {
            mac,
            name: String::new(),
            ip: String::new(),
            interface_type: String::new(),
            connected_to: String::new(),
            status: false,
            seen_by: Vec::new(),
        }
    }

    /// Observed by at least one access point this poll.
    pub fn is_known(&self) -> bool {
        !self.seen_by.is_empty()
    }

    pub fn presence(&self) -> PresenceState {
        PresenceState::from(self.status)
    }

    /// Attribute payload published for this device.
    pub fn attributes(&self, last_update: &str) -> TrackerAttributes {
        TrackerAttributes {
            mac: self.mac.to_string(),
            ip: self.ip.clone(),
            interface_type: self.interface_type.clone(),
            connected_to: self.connected_to.clone(),
            last_update: last_update.to_owned(),
        }
    }
}

/// Registry-side presence value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PresenceState {
    Home,
    NotHome,
}

impl From<bool> for PresenceState {
    fn from(present: bool) -> Self {
        if present { Self::Home } else { Self::NotHome }
    }
}

/// Extra attributes attached to a tracker entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerAttributes {
    pub mac: String,
    pub ip: String,
    pub interface_type: String,
    pub connected_to: String,
    /// Local time, RFC 3339 with second precision.
    pub last_update: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn presence_state_strings() {
        assert_eq!(PresenceState::Home.to_string(), "home");
        assert_eq!(PresenceState::NotHome.to_string(), "not_home");
        assert_eq!(
            "not_home".parse::<PresenceState>().unwrap(),
            PresenceState::NotHome
        );
        assert_eq!(PresenceState::from(true), PresenceState::Home);
    }

    #[test]
    fn known_follows_seen_by() {
        let mut device = Device::new(MacAddress::new("aa:bb:cc:00:11:22"));
        assert!(!device.is_known());
        device.seen_by.push("Fritz!Box".into());
        assert!(device.is_known());
    }

    #[test]
    fn presence_follows_status() {
        let mut device = Device::new(MacAddress::new("aa:bb:cc:00:11:22"));
        assert_eq!(device.presence(), PresenceState::NotHome);
        device.status = true;
        assert_eq!(device.presence(), PresenceState::Home);
    }

    #[test]
    fn attributes_serialize_with_registry_keys() {
        let mut device = Device::new(MacAddress::new("AA:BB:CC:00:11:22"));
        device.ip = "192.168.178.20".into();
        device.interface_type = WIRELESS.into();
        device.connected_to = "Fritz!Box".into();

        let json = serde_json::to_value(device.attributes("2024-05-01T10:00:00+02:00")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "mac": "aa:bb:cc:00:11:22",
                "ip": "192.168.178.20",
                "interface_type": "802.11",
                "connected_to": "Fritz!Box",
                "last_update": "2024-05-01T10:00:00+02:00",
            })
        );
    }

    #[test]
    fn placeholder_detection() {
        assert!(is_placeholder("PC-192-168-178-21"));
        assert!(!is_placeholder("living-room-tv"));
    }
}
