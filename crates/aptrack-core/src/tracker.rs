// ── Tracker lifecycle ──
//
// Each cycle: poll all access points, collapse to per-hostname presence,
// diff against the set of created entities and the last published states,
// then issue creates, state updates, attribute updates and deletes.
//
// Per hostname: Unknown -> Created -> (status flips) -> Created ...
// -> Removed when the device is no longer listed. Removal only drops the
// bookkeeping; entities are deleted from the registry by `cleanup` alone.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, SecondsFormat};
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::aggregate::DeviceMonitor;
use crate::config::TrackerConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::error::CoreError;
use crate::model::{PresenceState, TrackerAttributes};
use crate::presence::presence_view;
use crate::registry::Registry;
use crate::source::HostSource;
use crate::state::PersistentState;

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Hostnames a create was issued for.
    pub created: Vec<String>,
    /// State updates issued.
    pub updated: Vec<(String, PresenceState)>,
    /// Hostnames an attribute update was issued for.
    pub attributes: Vec<String>,
    /// Hostnames dropped from the created set.
    pub untracked: Vec<String>,
    /// Hostnames a delete was issued for.
    pub deleted: Vec<String>,
    /// The cycle was a full resync after a registry reconnect.
    pub reconfigured: bool,
}

/// Drives the registry entities from the access point host tables.
pub struct Tracker<S, R> {
    monitor: DeviceMonitor<S>,
    registry: R,
    state: PersistentState,
    connectivity: Arc<ConnectivityMonitor>,
    config: TrackerConfig,
    last_states: HashMap<String, bool>,
}

impl<S: HostSource, R: Registry> Tracker<S, R> {
    pub fn new(
        monitor: DeviceMonitor<S>,
        registry: R,
        state: PersistentState,
        connectivity: Arc<ConnectivityMonitor>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            monitor,
            registry,
            state,
            connectivity,
            config,
            last_states: HashMap::new(),
        }
    }

    /// Give back the registry, e.g. to close its session.
    pub fn into_registry(self) -> R {
        self.registry
    }

    /// Run poll cycles until `cancel` fires.
    ///
    /// Only state file failures end the loop early.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), CoreError> {
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            sources = self.monitor.sources().len(),
            "tracker started"
        );

        loop {
            let report = self.poll_once().await?;
            debug!(
                created = report.created.len(),
                updated = report.updated.len(),
                attributes = report.attributes.len(),
                untracked = report.untracked.len(),
                "cycle finished"
            );

            debug!(
                "sleeping for {} seconds",
                self.config.poll_interval.as_secs()
            );
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!("tracker stopped");
        Ok(())
    }

    /// Run a single cycle.
    pub async fn poll_once(&mut self) -> Result<CycleReport, CoreError> {
        let devices = self.monitor.poll(&mut self.state).await?;
        let host_states = presence_view(&devices);

        let reconfigure_all = self.connectivity.take_reconfigure_all();
        let timestamp = Local::now().to_rfc3339_opts(SecondsFormat::Secs, false);

        let mut report = CycleReport {
            reconfigured: reconfigure_all,
            ..CycleReport::default()
        };
        let mut to_create: Vec<String> = Vec::new();
        let mut to_update: IndexMap<String, PresenceState> = IndexMap::new();
        let mut to_attribute: IndexMap<String, TrackerAttributes> = IndexMap::new();
        let to_delete: Vec<String> = Vec::new();
        let mut created_changed = false;

        for (hostname, device) in &host_states {
            if !device.is_known() {
                if self.untrack(hostname) {
                    report.untracked.push(hostname.clone());
                    created_changed = true;
                }
                continue;
            }

            let created = &mut self.state.data_mut().created_hostnames;
            let is_created = created.contains(hostname);

            if !is_created || reconfigure_all {
                to_create.push(hostname.clone());
                to_update.insert(hostname.clone(), device.presence());
                self.last_states.insert(hostname.clone(), device.status);
                if !is_created {
                    created.push(hostname.clone());
                    created_changed = true;
                }
            } else if self.last_states.get(hostname) != Some(&device.status)
                || self.config.send_state_always
            {
                to_update.insert(hostname.clone(), device.presence());
                self.last_states.insert(hostname.clone(), device.status);
            }

            to_attribute.insert(hostname.clone(), device.attributes(&timestamp));
        }

        // Created hostnames no access point lists any more are not known.
        let vanished: Vec<String> = self
            .state
            .data()
            .created_hostnames
            .iter()
            .filter(|h| !host_states.contains_key(h.as_str()))
            .cloned()
            .collect();
        for hostname in vanished {
            if self.untrack(&hostname) {
                report.untracked.push(hostname);
                created_changed = true;
            }
        }

        if !report.untracked.is_empty() {
            info!(hostnames = ?report.untracked, "no longer tracking");
        }

        if created_changed {
            self.state.save()?;
        }

        if !to_create.is_empty() {
            info!(count = to_create.len(), hostnames = ?to_create, "creating device trackers");
            for hostname in &to_create {
                if let Err(e) = self.registry.create(hostname).await {
                    error!(hostname = %hostname, error = %e, "failed to create device tracker");
                }
            }
            // Home Assistant needs time to subscribe to the new state topics.
            tokio::time::sleep(self.config.settle_delay).await;
        }

        if !to_update.is_empty() {
            debug!(count = to_update.len(), "updating device tracker states");
            for (hostname, presence) in &to_update {
                if let Err(e) = self.registry.update_state(hostname, *presence).await {
                    error!(hostname = %hostname, error = %e, "failed to update device tracker state");
                }
                report.updated.push((hostname.clone(), *presence));
            }
        }

        if !to_attribute.is_empty() {
            debug!(count = to_attribute.len(), "updating device tracker attributes");
            for (hostname, attributes) in &to_attribute {
                if let Err(e) = self.registry.update_attributes(hostname, attributes).await {
                    error!(hostname = %hostname, error = %e, "failed to update device tracker attributes");
                }
            }
        }

        if !to_delete.is_empty() {
            info!(count = to_delete.len(), hostnames = ?to_delete, "deleting device trackers");
            for hostname in &to_delete {
                if let Err(e) = self.registry.delete(hostname).await {
                    error!(hostname = %hostname, error = %e, "failed to delete device tracker");
                }
            }
        }

        report.created = to_create;
        report.attributes = to_attribute.into_keys().collect();
        report.deleted = to_delete;
        Ok(report)
    }

    /// Delete every created entity and clear the created set.
    pub async fn cleanup(&mut self) -> Result<Vec<String>, CoreError> {
        let hostnames = std::mem::take(&mut self.state.data_mut().created_hostnames);
        info!(count = hostnames.len(), "deleting device trackers");

        for hostname in &hostnames {
            if let Err(e) = self.registry.delete(hostname).await {
                error!(hostname = %hostname, error = %e, "failed to delete device tracker");
            }
        }

        self.last_states.clear();
        self.state.save()?;
        Ok(hostnames)
    }

    /// Drop `hostname` from the created set and the status cache.
    fn untrack(&mut self, hostname: &str) -> bool {
        let created = &mut self.state.data_mut().created_hostnames;
        let Some(index) = created.iter().position(|h| h == hostname) else {
            return false;
        };
        created.remove(index);
        self.last_states.remove(hostname);
        true
    }
}
