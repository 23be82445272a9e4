// aptrack-api: Async clients for access point host tables (TR-064) and the MQTT broker

pub mod error;
pub mod mqtt;
pub mod tr064;
pub mod transport;

pub use error::Error;
pub use mqtt::{MqttSession, MqttSettings};
pub use tr064::{RawHost, Tr064Client};
pub use transport::{TlsMode, TransportConfig};
