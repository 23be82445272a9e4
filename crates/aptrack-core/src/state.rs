// ── Persistent state ──
//
// Whole-snapshot YAML file surviving restarts: the name and
// interface-type memories of the aggregator and the set of hostnames
// with a registry entity. Every save rewrites the complete snapshot via
// a temporary file renamed over the target.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::model::MacAddress;

/// Everything the tracker remembers between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Best name ever observed per MAC.
    #[serde(rename = "MacToName", default)]
    pub mac_to_name: BTreeMap<MacAddress, String>,

    /// Canonical interface type per MAC.
    #[serde(rename = "MacToInterfaceType", default)]
    pub mac_to_interface_type: BTreeMap<MacAddress, String>,

    /// Hostnames with a registry entity, in creation order.
    #[serde(rename = "CreatedHostnames", default)]
    pub created_hostnames: Vec<String>,
}

/// File-backed [`StateSnapshot`].
#[derive(Debug)]
pub struct PersistentState {
    path: PathBuf,
    data: StateSnapshot,
}

impl PersistentState {
    /// Open the state file, creating its parent directory if needed.
    ///
    /// A missing file yields an empty snapshot.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        debug!(path = %path.display(), "initializing persistent state");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CoreError::StateIo {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut state = Self {
            path,
            data: StateSnapshot::default(),
        };
        state.load()?;
        Ok(state)
    }

    /// A state that is never read from disk, for one-off commands and tests.
    pub fn in_memory(path: impl Into<PathBuf>, data: StateSnapshot) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Replace the in-memory snapshot with the file contents.
    pub fn load(&mut self) -> Result<(), CoreError> {
        self.data = match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => StateSnapshot::default(),
            Ok(contents) => {
                debug!(path = %self.path.display(), "loading persistent state");
                serde_yaml::from_str(&contents).map_err(|source| CoreError::StateFormat {
                    path: self.path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no persistent state found, using empty state");
                StateSnapshot::default()
            }
            Err(source) => {
                return Err(CoreError::StateIo {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        Ok(())
    }

    /// Write the whole snapshot, atomically replacing the previous file.
    pub fn save(&self) -> Result<(), CoreError> {
        debug!(path = %self.path.display(), "saving persistent state");

        let yaml = serde_yaml::to_string(&self.data).map_err(|source| CoreError::StateFormat {
            path: self.path.clone(),
            source,
        })?;

        let io_err = |source: std::io::Error| CoreError::StateIo {
            path: self.path.clone(),
            source,
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(yaml.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &StateSnapshot {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut StateSnapshot {
        &mut self.data
    }
}
