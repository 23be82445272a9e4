// ── Host sources ──
//
// A host source is anything that can list the hosts an access point
// currently knows about. `AccessPoint` is the TR-064 implementation; tests
// plug in in-memory sources.

use std::future::Future;

use tracing::debug;

use crate::config::AccessPointConfig;
use crate::error::CoreError;
use crate::model::HostEntry;

/// Per-access-point host table query.
pub trait HostSource: Send + Sync {
    /// Identifier used in `seen_by` and `connected_to`.
    fn label(&self) -> &str;

    /// Fetch the current host table.
    fn fetch_hosts(&self) -> impl Future<Output = Result<Vec<HostEntry>, CoreError>> + Send;
}

/// A Fritz!Box or Fritz!Repeater queried over TR-064.
pub struct AccessPoint {
    label: String,
    client: aptrack_api::Tr064Client,
}

impl AccessPoint {
    pub fn new(config: &AccessPointConfig) -> Result<Self, CoreError> {
        let transport = aptrack_api::TransportConfig {
            tls: (&config.tls).into(),
            timeout: config.timeout,
        };
        let client = aptrack_api::Tr064Client::new(
            config.url.clone(),
            config.username.clone(),
            config.password.clone(),
            &transport,
        )?;
        Ok(Self {
            label: config.label.clone(),
            client,
        })
    }
}

impl HostSource for AccessPoint {
    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch_hosts(&self) -> Result<Vec<HostEntry>, CoreError> {
        debug!(source = %self.label, url = %self.client.base_url(), "gathering host table");
        let hosts = self.client.host_list().await?;
        Ok(hosts.into_iter().map(HostEntry::from).collect())
    }
}
