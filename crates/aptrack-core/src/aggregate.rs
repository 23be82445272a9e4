// ── Device aggregation ──
//
// Merges the host tables of all access points into one record per MAC.
// Access points disagree: the primary knows IPs and interface types, the
// repeaters often only list a MAC with a name, and names differ between
// devices. Cross-poll memories of the best name and interface type per
// MAC smooth that over.

use futures_util::future::join_all;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Device, HostEntry, MacAddress, WIRELESS, is_placeholder};
use crate::source::HostSource;
use crate::state::{PersistentState, StateSnapshot};

/// Number of leading characters two names must share to be treated as the
/// same (possibly truncated) name.
const NAME_PREFIX_LEN: usize = 15;

/// Host table of one access point for one poll.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub label: String,
    pub hosts: Vec<HostEntry>,
}

/// Whether `candidate` replaces the `remembered` name of a MAC.
pub fn accept_name(remembered: Option<&str>, candidate: &str) -> bool {
    let Some(remembered) = remembered else {
        return true;
    };
    if is_placeholder(candidate) {
        return false;
    }
    is_placeholder(remembered)
        || !candidate
            .chars()
            .take(NAME_PREFIX_LEN)
            .eq(remembered.chars().take(NAME_PREFIX_LEN))
        || candidate.chars().count() > remembered.chars().count()
}

/// Refine the name and interface-type memories with one poll's tables.
fn learn(tables: &[SourceTable], memory: &mut StateSnapshot) {
    for host in tables.iter().flat_map(|t| &t.hosts) {
        let mac = MacAddress::new(&host.mac);
        if mac.is_empty() {
            continue;
        }

        if !host.name.is_empty() {
            let remembered = memory.mac_to_name.get(&mac).map(String::as_str);
            if accept_name(remembered, &host.name) {
                debug!(%mac, name = %host.name, "learned name");
                memory.mac_to_name.insert(mac.clone(), host.name.clone());
            }
        }

        if !host.interface_type.is_empty() {
            match memory.mac_to_interface_type.get(&mac) {
                None => {
                    memory
                        .mac_to_interface_type
                        .insert(mac, host.interface_type.clone());
                }
                Some(known) if host.interface_type == WIRELESS && known != WIRELESS => {
                    debug!(%mac, from = %known, "promoting interface type to wireless");
                    memory
                        .mac_to_interface_type
                        .insert(mac, WIRELESS.to_owned());
                }
                Some(_) => {}
            }
        }
    }
}

/// Merge one poll's host tables into per-MAC devices.
///
/// Names and interface types are resolved against (and refine) the
/// memories in `memory` first. A row then sets the connectivity fields of
/// its MAC only when it carries an IP and the canonical interface type, so
/// a stale wired sighting cannot mask a wireless one. MACs without such a
/// row are still listed, with `status = false`.
pub fn aggregate(tables: &[SourceTable], memory: &mut StateSnapshot) -> IndexMap<MacAddress, Device> {
    learn(tables, memory);

    let mut devices: IndexMap<MacAddress, Device> = IndexMap::new();

    for table in tables {
        for host in &table.hosts {
            let mac = MacAddress::new(&host.mac);
            if mac.is_empty() {
                continue;
            }

            let canonical = memory.mac_to_interface_type.get(&mac).cloned();
            let device = devices
                .entry(mac)
                .or_insert_with_key(|mac| Device::new(mac.clone()));

            if !device.seen_by.contains(&table.label) {
                device.seen_by.push(table.label.clone());
            }

            let fully_identified = !host.ip.is_empty()
                && !host.interface_type.is_empty()
                && canonical.as_deref() == Some(host.interface_type.as_str());

            if fully_identified {
                device.ip.clone_from(&host.ip);
                device.interface_type.clone_from(&host.interface_type);
                device.connected_to.clone_from(&table.label);
                device.status = host.active;
            }
        }
    }

    for (mac, device) in &mut devices {
        if let Some(name) = memory.mac_to_name.get(mac) {
            device.name.clone_from(name);
        }
        if device.interface_type.is_empty() {
            if let Some(interface_type) = memory.mac_to_interface_type.get(mac) {
                device.interface_type.clone_from(interface_type);
            }
        }
    }

    devices
}

// ── DeviceMonitor ────────────────────────────────────────────────────

/// Polls every access point and aggregates the answers.
pub struct DeviceMonitor<S> {
    sources: Vec<S>,
}

impl<S: HostSource> DeviceMonitor<S> {
    pub fn new(sources: Vec<S>) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &[S] {
        &self.sources
    }

    /// Query all sources concurrently. A failing source yields an empty table.
    pub async fn collect(&self) -> Vec<SourceTable> {
        let results = join_all(self.sources.iter().map(|source| async move {
            (source.label(), source.fetch_hosts().await)
        }))
        .await;

        results
            .into_iter()
            .map(|(label, result)| {
                let hosts = result.unwrap_or_else(|e| {
                    warn!(source = %label, error = %e, "host table unavailable, treating as empty");
                    Vec::new()
                });
                debug!(source = %label, hosts = hosts.len(), "host table received");
                SourceTable {
                    label: label.to_owned(),
                    hosts,
                }
            })
            .collect()
    }

    /// Poll all sources and return the per-MAC table.
    ///
    /// The refined memories are written to `state` before returning.
    pub async fn poll(
        &self,
        state: &mut PersistentState,
    ) -> Result<IndexMap<MacAddress, Device>, CoreError> {
        let tables = self.collect().await;

        let before = (
            state.data().mac_to_name.clone(),
            state.data().mac_to_interface_type.clone(),
        );
        let devices = aggregate(&tables, state.data_mut());

        if before.0 != state.data().mac_to_name || before.1 != state.data().mac_to_interface_type
        {
            state.save()?;
        }
        Ok(devices)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn host(mac: &str, name: &str, ip: &str, interface_type: &str, active: bool) -> HostEntry {
        HostEntry {
            mac: mac.into(),
            name: name.into(),
            ip: ip.into(),
            interface_type: interface_type.into(),
            active,
        }
    }

    fn table(label: &str, hosts: Vec<HostEntry>) -> SourceTable {
        SourceTable {
            label: label.into(),
            hosts,
        }
    }

    fn mac(raw: &str) -> MacAddress {
        MacAddress::new(raw)
    }

    #[test]
    fn placeholder_on_primary_named_by_repeater() {
        let tables = vec![
            table("AP1", vec![host("AA:1", "PC-1234", "10.0.0.5", "802.11", true)]),
            table("AP2", vec![host("AA:1", "living-room-tv", "", "", false)]),
        ];
        let mut memory = StateSnapshot::default();

        let devices = aggregate(&tables, &mut memory);
        let device = &devices[&mac("AA:1")];

        assert_eq!(device.name, "living-room-tv");
        assert_eq!(device.interface_type, "802.11");
        assert_eq!(device.ip, "10.0.0.5");
        assert_eq!(device.connected_to, "AP1");
        assert!(device.status);
        assert_eq!(device.seen_by, vec!["AP1".to_owned(), "AP2".to_owned()]);
        assert_eq!(memory.mac_to_name[&mac("AA:1")], "living-room-tv");
    }

    #[test]
    fn aggregation_is_idempotent() {
        let tables = vec![
            table(
                "Fritz!Box",
                vec![
                    host("aa:bb:cc:00:00:01", "PC-10-0-0-5", "10.0.0.5", "802.11", true),
                    host("aa:bb:cc:00:00:02", "nas", "10.0.0.6", "Ethernet", true),
                    host("", "ghost", "10.0.0.7", "Ethernet", true),
                ],
            ),
            table(
                "Repeater 10.0.0.2",
                vec![
                    host("aa:bb:cc:00:00:01", "phone", "", "", false),
                    host("aa:bb:cc:00:00:02", "nas-backup-volume", "10.0.0.6", "802.11", false),
                ],
            ),
        ];

        let mut memory = StateSnapshot::default();
        let first = aggregate(&tables, &mut memory);
        let memory_after_first = memory.clone();
        let second = aggregate(&tables, &mut memory);

        assert_eq!(first, second);
        assert_eq!(memory, memory_after_first);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn accepted_name_survives_placeholder_and_truncated_candidates() {
        let mut memory = StateSnapshot::default();
        aggregate(
            &[table("AP1", vec![host("AA:1", "living-room-television", "", "", false)])],
            &mut memory,
        );

        for candidate in ["PC-10-0-0-5", "living-room-tel", "living-room-television"] {
            let devices = aggregate(
                &[table("AP1", vec![host("AA:1", candidate, "", "", false)])],
                &mut memory,
            );
            assert_eq!(devices[&mac("AA:1")].name, "living-room-television");
        }
    }

    #[test]
    fn name_acceptance_rules() {
        assert!(accept_name(None, "PC-1"));
        assert!(accept_name(Some("PC-1"), "tv"));
        assert!(!accept_name(Some("tv"), "PC-1"));
        // Same first 15 characters: only a longer name wins.
        assert!(accept_name(Some("living-room-tel"), "living-room-television"));
        assert!(!accept_name(Some("living-room-television"), "living-room-tel"));
        // Different within the first 15 characters: treated as a rename.
        assert!(accept_name(Some("living-room-tv"), "kitchen-radio"));
        assert!(!accept_name(Some("tv"), "tv"));
    }

    #[test]
    fn interface_promotion_is_one_directional() {
        let mut memory = StateSnapshot::default();

        aggregate(
            &[table("AP1", vec![host("AA:1", "tv", "10.0.0.5", "Ethernet", true)])],
            &mut memory,
        );
        assert_eq!(memory.mac_to_interface_type[&mac("AA:1")], "Ethernet");

        aggregate(
            &[table("AP2", vec![host("AA:1", "tv", "10.0.0.5", "802.11", true)])],
            &mut memory,
        );
        assert_eq!(memory.mac_to_interface_type[&mac("AA:1")], "802.11");

        let devices = aggregate(
            &[table("AP1", vec![host("AA:1", "tv", "10.0.0.5", "Ethernet", true)])],
            &mut memory,
        );
        assert_eq!(memory.mac_to_interface_type[&mac("AA:1")], "802.11");

        // The wired row does not match the canonical type: not authoritative.
        let device = &devices[&mac("AA:1")];
        assert!(!device.status);
        assert_eq!(device.connected_to, "");
        assert_eq!(device.interface_type, "802.11");
        assert_eq!(device.seen_by, vec!["AP1".to_owned()]);
    }

    #[test]
    fn wired_sighting_does_not_mask_wireless_in_same_poll() {
        let tables = vec![
            table("AP1", vec![host("AA:1", "phone", "10.0.0.5", "Ethernet", false)]),
            table("AP2", vec![host("AA:1", "phone", "10.0.0.5", "802.11", true)]),
        ];
        let mut memory = StateSnapshot::default();
        let devices = aggregate(&tables, &mut memory);

        let device = &devices[&mac("AA:1")];
        assert_eq!(device.connected_to, "AP2");
        assert!(device.status);
    }

    #[test]
    fn partially_identified_mac_is_listed_offline() {
        let mut memory = StateSnapshot::default();
        let devices = aggregate(
            &[table("AP1", vec![host("AA:1", "printer", "", "Ethernet", true)])],
            &mut memory,
        );

        let device = &devices[&mac("AA:1")];
        assert!(device.is_known());
        assert!(!device.status);
        assert_eq!(device.ip, "");
        assert_eq!(device.interface_type, "Ethernet");
        assert_eq!(device.name, "printer");
    }

    #[test]
    fn empty_candidate_names_are_ignored() {
        let mut memory = StateSnapshot::default();
        aggregate(&[table("AP1", vec![host("AA:1", "tv", "", "", false)])], &mut memory);
        let devices = aggregate(&[table("AP1", vec![host("AA:1", "", "", "", false)])], &mut memory);
        assert_eq!(devices[&mac("AA:1")].name, "tv");
    }

    #[test]
    fn macs_are_normalized_across_sources() {
        let mut memory = StateSnapshot::default();
        let devices = aggregate(
            &[
                table("AP1", vec![host("AA-BB-CC-00-00-01", "tv", "", "", false)]),
                table("AP2", vec![host("aa:bb:cc:00:00:01", "tv", "", "", false)]),
            ],
            &mut memory,
        );
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].seen_by.len(), 2);
    }
}
