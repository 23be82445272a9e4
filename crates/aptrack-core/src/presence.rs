// ── Presence view ──
//
// The registry addresses devices by display name, not MAC. Collapse the
// per-MAC table into one entry per hostname, skipping placeholder names
// and protecting live entries from offline duplicates.

use indexmap::IndexMap;

use crate::model::{Device, MacAddress, is_placeholder};

/// Per-hostname view of a per-MAC device table, in MAC iteration order.
pub fn presence_view(devices: &IndexMap<MacAddress, Device>) -> IndexMap<String, Device> {
    let mut hosts: IndexMap<String, Device> = IndexMap::new();

    for device in devices.values() {
        if device.name.is_empty() || is_placeholder(&device.name) {
            continue;
        }
        if hosts.get(&device.name).is_some_and(|existing| existing.status) {
            continue;
        }
        hosts.insert(device.name.clone(), device.clone());
    }

    hosts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(mac: &str, name: &str, status: bool) -> Device {
        let mut device = Device::new(MacAddress::new(mac));
        device.name = name.into();
        device.status = status;
        device.seen_by.push("Fritz!Box".into());
        device
    }

    fn table(devices: Vec<Device>) -> IndexMap<MacAddress, Device> {
        devices.into_iter().map(|d| (d.mac.clone(), d)).collect()
    }

    #[test]
    fn skips_placeholder_and_unnamed_hosts() {
        let view = presence_view(&table(vec![
            device("aa:00", "PC-192-168-178-21", true),
            device("aa:01", "", true),
            device("aa:02", "tv", true),
        ]));
        assert_eq!(view.keys().collect::<Vec<_>>(), vec!["tv"]);
    }

    #[test]
    fn live_entry_wins_regardless_of_order() {
        let online = device("aa:01", "phone", true);
        let offline = device("aa:02", "phone", false);

        for order in [
            vec![online.clone(), offline.clone()],
            vec![offline.clone(), online.clone()],
        ] {
            let view = presence_view(&table(order));
            assert_eq!(view.len(), 1);
            assert!(view["phone"].status);
            assert_eq!(view["phone"].mac, MacAddress::new("aa:01"));
        }
    }

    #[test]
    fn later_offline_duplicate_replaces_offline_entry() {
        let view = presence_view(&table(vec![
            device("aa:01", "phone", false),
            device("aa:02", "phone", false),
        ]));
        assert_eq!(view["phone"].mac, MacAddress::new("aa:02"));
    }

    #[test]
    fn first_live_entry_is_kept() {
        let view = presence_view(&table(vec![
            device("aa:01", "phone", true),
            device("aa:02", "phone", true),
        ]));
        assert_eq!(view["phone"].mac, MacAddress::new("aa:01"));
    }
}
