// ── Core error types ──
//
// User-facing errors from aptrack-core. Consumers never see HTTP status
// codes, SOAP faults or MQTT client internals directly. The
// `From<aptrack_api::Error>` impl translates transport-layer errors into
// domain-appropriate variants.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Access point errors ──────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Access point protocol error: {message}")]
    Protocol { message: String },

    // ── Registry errors ──────────────────────────────────────────────
    #[error("Registry unavailable: {message}")]
    RegistryUnavailable { message: String },

    // ── State file errors ────────────────────────────────────────────
    #[error("Cannot access state file {}: {source}", path.display())]
    StateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed state file {}: {source}", path.display())]
    StateFormat {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for errors caused by the state file.
    pub fn is_state(&self) -> bool {
        matches!(self, Self::StateIo { .. } | Self::StateFormat { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<aptrack_api::Error> for CoreError {
    fn from(err: aptrack_api::Error) -> Self {
        match err {
            aptrack_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            aptrack_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Protocol {
                        message: e.to_string(),
                    }
                }
            }
            aptrack_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            aptrack_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            aptrack_api::Error::Soap {
                action,
                status,
                message,
            } => CoreError::Protocol {
                message: format!("{action} failed (HTTP {status}): {message}"),
            },
            aptrack_api::Error::NotConnected => CoreError::RegistryUnavailable {
                message: "MQTT session is closed".into(),
            },
            aptrack_api::Error::QueueFull => CoreError::RegistryUnavailable {
                message: "MQTT outgoing queue is full".into(),
            },
            aptrack_api::Error::Deserialization { message, body: _ } => CoreError::Protocol {
                message: format!("Deserialization error: {message}"),
            },
        }
    }
}
