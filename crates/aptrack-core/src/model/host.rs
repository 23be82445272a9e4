// ── Raw host observations ──

use serde::{Deserialize, Serialize};

/// One row of one access point's host table, as reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEntry {
    pub mac: String,
    pub name: String,
    pub ip: String,
    pub interface_type: String,
    /// Currently associated.
    pub active: bool,
}

impl From<aptrack_api::RawHost> for HostEntry {
    fn from(raw: aptrack_api::RawHost) -> Self {
        let active = raw.is_active();
        Self {
            mac: raw.mac,
            name: raw.name.trim().to_owned(),
            ip: raw.ip.trim().to_owned(),
            interface_type: raw.interface_type.trim().to_owned(),
            active,
        }
    }
}
