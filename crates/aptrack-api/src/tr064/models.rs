// Wire types for the TR-064 host list document.

use serde::Deserialize;

/// `<List>` document returned by the host list path.
#[derive(Debug, Deserialize)]
pub(crate) struct HostList {
    #[serde(rename = "Item", default)]
    pub items: Vec<RawHost>,
}

/// One `<Item>` of the host list, exactly as the access point reports it.
///
/// Every field may be empty: repeaters in particular list hosts they only
/// know by MAC, without IP or interface type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawHost {
    #[serde(rename = "MACAddress", default)]
    pub mac: String,
    #[serde(rename = "IPAddress", default)]
    pub ip: String,
    #[serde(rename = "HostName", default)]
    pub name: String,
    #[serde(rename = "InterfaceType", default)]
    pub interface_type: String,
    #[serde(rename = "Active", default)]
    pub active: String,
}

impl RawHost {
    /// `Active` is `1` for hosts currently associated.
    pub fn is_active(&self) -> bool {
        self.active.trim() == "1"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_items_and_ignores_unknown_fields() {
        let xml = r#"<?xml version="1.0"?>
<List>
<Item><Index>1</Index><IPAddress>192.168.178.20</IPAddress><AddressSource>DHCP</AddressSource><LeaseTimeRemaining>0</LeaseTimeRemaining><MACAddress>AA:BB:CC:00:11:22</MACAddress><Active>1</Active><HostName>living-room-tv</HostName><InterfaceType>802.11</InterfaceType><X_AVM-DE_Port>0</X_AVM-DE_Port><X_AVM-DE_Speed>0</X_AVM-DE_Speed></Item>
<Item><Index>2</Index><IPAddress></IPAddress><MACAddress>AA:BB:CC:00:11:33</MACAddress><Active>0</Active><HostName>PC-192-168-178-21</HostName><InterfaceType></InterfaceType></Item>
</List>"#;

        let list: HostList = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(list.items.len(), 2);

        let tv = &list.items[0];
        assert_eq!(tv.mac, "AA:BB:CC:00:11:22");
        assert_eq!(tv.ip, "192.168.178.20");
        assert_eq!(tv.name, "living-room-tv");
        assert_eq!(tv.interface_type, "802.11");
        assert!(tv.is_active());

        let pc = &list.items[1];
        assert_eq!(pc.ip, "");
        assert_eq!(pc.interface_type, "");
        assert!(!pc.is_active());
    }

    #[test]
    fn empty_list() {
        let list: HostList = quick_xml::de::from_str("<List></List>").unwrap();
        assert!(list.items.is_empty());
    }
}
