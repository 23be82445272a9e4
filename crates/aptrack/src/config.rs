//! CLI configuration: thin wrapper around `aptrack_config`.
//!
//! Resolves file locations from `GlobalOpts` overrides and builds the
//! runtime pieces (access points, registry config, state) the commands
//! need.

use std::path::PathBuf;

use tracing::debug;

use aptrack_core::{AccessPoint, PersistentState, RegistryConfig, TrackerConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use aptrack_config::{Config, example_config, save_config_to};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file path: `--config-file` / `APTRACK_CONFIG`, else the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config_file
        .clone()
        .unwrap_or_else(aptrack_config::config_path)
}

/// State file path: `--state-file` / `APTRACK_STATE_FILE`, else the platform default.
pub fn state_file(global: &GlobalOpts) -> PathBuf {
    global
        .state_file
        .clone()
        .unwrap_or_else(aptrack_config::state_path)
}

/// Load the layered configuration for this invocation.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(aptrack_config::load_config_from(&config_file(global))?)
}

/// Open the persistent state, creating its directory if needed.
pub fn open_state(global: &GlobalOpts) -> Result<PersistentState, CliError> {
    let path = state_file(global);
    debug!(path = %path.display(), "opening state file");
    Ok(PersistentState::open(path)?)
}

/// One TR-064 source per configured access point, primary first.
pub fn access_points(cfg: &Config) -> Result<Vec<AccessPoint>, CliError> {
    aptrack_config::to_access_point_configs(cfg)?
        .iter()
        .map(|ap| AccessPoint::new(ap).map_err(CliError::from))
        .collect()
}

pub fn registry_config(cfg: &Config) -> RegistryConfig {
    aptrack_config::to_registry_config(cfg)
}

pub fn tracker_config(cfg: &Config) -> TrackerConfig {
    aptrack_config::to_tracker_config(cfg)
}
