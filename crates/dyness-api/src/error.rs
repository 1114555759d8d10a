use thiserror::Error;

/// Top-level error type for the `dyness-api` crate.
///
/// One surface for every failure mode: callers branch on "the call
/// failed", not on whether the fault was transport-level or an
/// application-level rejection. Each variant still carries the
/// request path for diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    /// The response parsed but carried a non-success status code.
    #[error("API error on {path}: code={code} | {message}")]
    Api {
        path: String,
        code: String,
        message: String,
    },

    /// HTTP transport fault (connection refused, timeout, DNS, ...).
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response body was not valid JSON.
    #[error("malformed response from {path}: {message}")]
    Json { path: String, message: String },

    /// The request body could not be serialized.
    #[error("failed to serialize request body for {path}: {message}")]
    Body { path: String, message: String },

    /// The HTTP client itself could not be built.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl Error {
    /// The request path this error relates to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Api { path, .. }
            | Self::Transport { path, .. }
            | Self::Json { path, .. }
            | Self::Body { path, .. } => Some(path),
            Self::ClientBuild(_) => None,
        }
    }

    /// Returns `true` for faults below the application layer
    /// (network unreachable, timeout, malformed body).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Json { .. })
    }

    /// The application-level error code, if the API rejected the call.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}
