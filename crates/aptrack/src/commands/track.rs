//! Lifecycle command handlers: `track` and `cleanup`.

use std::sync::Arc;

use aptrack_core::{AccessPoint, ConnectivityMonitor, DeviceMonitor, MqttRegistry, Tracker};

use crate::cli::GlobalOpts;
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Run poll cycles until Ctrl-C.
pub async fn handle(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let sources = config::access_points(cfg)?;
    let state = config::open_state(global)?;
    let (registry, status) = MqttRegistry::connect(&config::registry_config(cfg));

    let cancel = super::shutdown_token();
    let connectivity = Arc::new(ConnectivityMonitor::new());
    let listener = {
        let connectivity = Arc::clone(&connectivity);
        let cancel = cancel.clone();
        tokio::spawn(async move { connectivity.listen(status, cancel).await })
    };

    let mut tracker = Tracker::new(
        DeviceMonitor::new(sources),
        registry,
        state,
        connectivity,
        config::tracker_config(cfg),
    );
    let result = tracker.run(cancel.clone()).await;

    cancel.cancel();
    if let Err(e) = listener.await {
        tracing::warn!(error = %e, "connectivity listener failed");
    }
    tracker.into_registry().close().await;

    result.map_err(CliError::from)
}

/// Delete every created device tracker and clear the created set.
pub async fn cleanup(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let state = config::open_state(global)?;
    let (registry, _status) = MqttRegistry::connect(&config::registry_config(cfg));

    // No polling happens here; the tracker only needs the registry and state.
    let mut tracker = Tracker::new(
        DeviceMonitor::<AccessPoint>::new(Vec::new()),
        registry,
        state,
        Arc::new(ConnectivityMonitor::new()),
        config::tracker_config(cfg),
    );
    let result = tracker.cleanup().await;
    tracker.into_registry().close().await;

    let deleted = result?;
    if !global.quiet {
        eprintln!("Deleted {} device tracker(s)", deleted.len());
    }
    output::print_output(&deleted.join("\n"), global.quiet);
    Ok(())
}
