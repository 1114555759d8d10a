// ── Core error types ──
//
// User-facing errors from dyness-core. Consumers never see reqwest
// errors directly; the `From<dyness_api::Error>` impl translates
// transport-layer faults into domain-appropriate variants so the CLI
// can distinguish "cannot connect" from a coded API rejection.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Network-level failure: unreachable host, timeout, reset,
    /// or a response body that was not JSON at all.
    #[error("Cannot reach the Dyness API: {reason}")]
    ConnectionFailed { reason: String },

    /// The API parsed the request but rejected it.
    #[error("API error on {path} (code {code}): {message}")]
    Api {
        path: String,
        code: String,
        message: String,
    },

    /// Configuration problem (bad serials, unusable client settings).
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The poller is not running / already shut down.
    #[error("Poller is not running")]
    NotRunning,

    /// Anything unexpected.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` when the failure is a connectivity problem
    /// rather than an application-level rejection.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. })
    }
}

// ── Conversion from the API client's error surface ───────────────────

impl From<dyness_api::Error> for CoreError {
    fn from(err: dyness_api::Error) -> Self {
        match err {
            dyness_api::Error::Api { path, code, message } => Self::Api { path, code, message },
            dyness_api::Error::Transport { .. } | dyness_api::Error::Json { .. } => {
                Self::ConnectionFailed {
                    reason: err.to_string(),
                }
            }
            dyness_api::Error::Body { .. } => Self::Internal(err.to_string()),
            dyness_api::Error::ClientBuild(msg) => Self::Config { message: msg },
        }
    }
}
