//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` / `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use dyness_config::ConfigError;
use dyness_core::CoreError;

/// Exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot connect to the Dyness cloud API")]
    #[diagnostic(
        code(dyness::connection_failed),
        help(
            "Check your network connection and region setting.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { reason: String },

    // ── API / auth ───────────────────────────────────────────────────
    #[error("The Dyness API rejected the request (code {code}): {message}")]
    #[diagnostic(
        code(dyness::api_error),
        help(
            "Verify your API ID/secret and serial numbers in the Dyness portal.\n\
             Request path: {path}"
        )
    )]
    ApiRejected {
        path: String,
        code: String,
        message: String,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(dyness::no_credentials),
        help(
            "Set DYNESS_API_SECRET, store a secret with: dyness config set-secret\n\
             or add api_secret to the profile."
        )
    )]
    NoCredentials { profile: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(dyness::profile_not_found),
        help("Check the config file: dyness config path")
    )]
    ProfileNotFound { name: String },

    #[error("Missing required setting: {field}")]
    #[diagnostic(
        code(dyness::missing_setting),
        help("Provide --{field} (or the matching env var / profile entry).")
    )]
    MissingSetting { field: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dyness::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(dyness::config))]
    Config(String),

    // ── Catch-all ────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    #[diagnostic(code(dyness::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(dyness::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::ApiRejected { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::MissingSetting { .. } | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError ─────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => Self::ConnectionFailed { reason },
            CoreError::Api { path, code, message } => Self::ApiRejected { path, code, message },
            CoreError::Config { message } => Self::Config(message),
            CoreError::NotRunning => Self::Internal("poller is not running".into()),
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::ProfileNotFound { profile } => Self::ProfileNotFound { name: profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other.to_string()),
        }
    }
}
