//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use aptrack_config::ConfigError;
use aptrack_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const STATE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(aptrack::connection_failed),
        help(
            "Check that the access point is reachable and TR-064 is enabled\n\
             (Home Network > Network > Network Settings > Allow access for applications).\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(aptrack::timeout),
        help("Increase `timeout` in the access point section or check its responsiveness.")
    )]
    Timeout,

    #[error("MQTT broker unavailable: {message}")]
    #[diagnostic(
        code(aptrack::registry),
        help("Check the [mqtt] section: host, port and credentials.")
    )]
    Registry { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(aptrack::auth_failed),
        help(
            "Verify the username and password of the access point.\n\
             Store a password with: aptrack config set-password <target>"
        )
    )]
    AuthFailed { message: String },

    #[error("No password configured for '{target}'")]
    #[diagnostic(
        code(aptrack::no_credentials),
        help(
            "Store one with: aptrack config set-password {target}\n\
             Or set `password_env` / `password` in the config file."
        )
    )]
    NoCredentials { target: String },

    // ── Access point protocol ────────────────────────────────────────

    #[error("Access point error: {message}")]
    #[diagnostic(code(aptrack::protocol))]
    Protocol { message: String },

    // ── State file ───────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(aptrack::state_file),
        help(
            "The state file could not be read or written.\n\
             Check its permissions, or point --state-file at another location."
        )
    )]
    State { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(aptrack::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Unknown credential target '{target}'")]
    #[diagnostic(
        code(aptrack::unknown_target),
        help("Valid targets: {available}")
    )]
    UnknownTarget { target: String, available: String },

    #[error("{path} already exists")]
    #[diagnostic(
        code(aptrack::file_exists),
        help("Use --force to overwrite it.")
    )]
    FileExists { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(aptrack::config),
        help("Create a configuration with: aptrack config init")
    )]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────

    #[error("Internal error: {0}")]
    #[diagnostic(code(aptrack::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout | Self::Registry { .. } => {
                exit_code::CONNECTION
            }
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::State { .. } => exit_code::STATE,
            Self::Validation { .. } | Self::UnknownTarget { .. } | Self::FileExists { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        if err.is_state() {
            return CliError::State {
                message: err.to_string(),
            };
        }

        match err {
            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout => CliError::Timeout,
            CoreError::Protocol { message } => CliError::Protocol { message },
            CoreError::RegistryUnavailable { message } => CliError::Registry { message },
            CoreError::Config { message } => CliError::Config { message },
            other => CliError::Internal(other.to_string()),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { target } => CliError::NoCredentials { target },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
