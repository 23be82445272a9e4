// aptrack-core: Device aggregation and presence lifecycle between aptrack-api and the CLI.

pub mod aggregate;
pub mod config;
pub mod connectivity;
pub mod discovery;
pub mod error;
pub mod model;
pub mod presence;
pub mod registry;
pub mod source;
pub mod state;
pub mod tracker;

// ── Primary re-exports ──────────────────────────────────────────────
pub use aggregate::{DeviceMonitor, SourceTable, aggregate};
pub use config::{AccessPointConfig, RegistryConfig, TlsVerification, TrackerConfig};
pub use connectivity::ConnectivityMonitor;
pub use discovery::Discovery;
pub use error::CoreError;
pub use presence::presence_view;
pub use registry::{MqttRegistry, Registry};
pub use source::{AccessPoint, HostSource};
pub use state::{PersistentState, StateSnapshot};
pub use tracker::{CycleReport, Tracker};

// Re-export model types at the crate root for ergonomics.
pub use model::{Device, HostEntry, MacAddress, PresenceState, TrackerAttributes};
