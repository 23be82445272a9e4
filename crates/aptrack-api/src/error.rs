use thiserror::Error;

/// Top-level error type for the `aptrack-api` crate.
///
/// Covers every failure mode of the two wire surfaces: the TR-064 SOAP
/// service of the access points and the MQTT broker session.
/// `aptrack-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Digest challenge answered but rejected, or no usable challenge.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── TR-064 ──────────────────────────────────────────────────────
    /// SOAP fault or unexpected HTTP status from a TR-064 action.
    #[error("TR-064 action {action} failed (HTTP {status}): {message}")]
    Soap {
        action: String,
        status: u16,
        message: String,
    },

    // ── MQTT ────────────────────────────────────────────────────────
    /// The MQTT session has shut down; nothing can be enqueued.
    #[error("MQTT client is not connected")]
    NotConnected,

    /// The outgoing request queue of the MQTT client is full.
    #[error("MQTT client queue size exceeded")]
    QueueFull,

    // ── Data ────────────────────────────────────────────────────────
    /// XML deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error is an authentication rejection.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying on the
    /// next poll.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::QueueFull => true,
            _ => false,
        }
    }
}

impl From<rumqttc::ClientError> for Error {
    fn from(err: rumqttc::ClientError) -> Self {
        match err {
            rumqttc::ClientError::TryRequest(_) => Self::QueueFull,
            rumqttc::ClientError::Request(_) => Self::NotConnected,
        }
    }
}
