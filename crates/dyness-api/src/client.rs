// Dyness open API HTTP client
//
// Wraps `reqwest::Client` with request signing, region-based base URL
// selection, and envelope classification. Endpoint methods live in
// `endpoints.rs` to keep this module focused on transport mechanics.

use std::time::Duration;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Error;
use crate::models::Envelope;
use crate::sign;

/// Default per-request timeout. There is no retry: one call is exactly
/// one network attempt, and a slow remote just makes that call run long.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

// ── Region registry ──────────────────────────────────────────────────

/// Fixed registry of Dyness cloud regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    /// Global / Europe (`open-api.dyness.com`).
    #[default]
    Global,
    /// Asia-Pacific (`apacopenapi.dyness.com`).
    Apac,
}

impl Region {
    /// Base URL for this region, including the fixed API root path.
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Global => "https://open-api.dyness.com/openapi/ems-device",
            Self::Apac => "https://apacopenapi.dyness.com/openapi/ems-device",
        }
    }

    /// Parse a region key. Unrecognized keys fall back to [`Region::Global`]
    /// rather than failing.
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "apac" => Self::Apac,
            "global" | "" => Self::Global,
            other => {
                warn!(region = other, "unknown region, falling back to global");
                Self::Global
            }
        }
    }

    /// The canonical key for this region.
    pub fn key(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Apac => "apac",
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Signed HTTP client for the Dyness open API.
///
/// Owns the credentials and endpoint configuration for its lifetime.
/// Every call is a single authenticated POST; the response is
/// classified by the application-level `code` field, never by the HTTP
/// status alone.
pub struct DynessClient {
    http: reqwest::Client,
    base_url: String,
    api_id: String,
    api_secret: SecretString,
}

impl DynessClient {
    /// Create a client for the given region with the default timeout.
    pub fn new(
        api_id: impl Into<String>,
        api_secret: SecretString,
        region: Region,
    ) -> Result<Self, Error> {
        Self::with_timeout(api_id, api_secret, region, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout.
    pub fn with_timeout(
        api_id: impl Into<String>,
        api_secret: SecretString,
        region: Region,
        timeout: Duration,
    ) -> Result<Self, Error> {
        Self::build(api_id.into(), api_secret, region.base_url().to_owned(), timeout)
    }

    /// Create a client against an arbitrary base URL.
    ///
    /// Intended for tests against a mock server; production code should
    /// go through the [`Region`] registry.
    pub fn with_base_url(
        api_id: impl Into<String>,
        api_secret: SecretString,
        base_url: impl Into<String>,
    ) -> Result<Self, Error> {
        Self::build(api_id.into(), api_secret, base_url.into(), DEFAULT_TIMEOUT)
    }

    fn build(
        api_id: String,
        api_secret: SecretString,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dyness-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_id,
            api_secret,
        })
    }

    /// The base URL this client was constructed against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Request cycle ────────────────────────────────────────────────

    /// Send one signed POST and classify the result.
    ///
    /// The body is serialized exactly once (compact JSON); those bytes
    /// feed both the Content-MD5 digest and the wire, keeping the
    /// signature valid. The response body is parsed as JSON regardless
    /// of the declared content type — the service mislabels it.
    pub async fn call(&self, path: &str, body: &impl Serialize) -> Result<Envelope, Error> {
        let body_bytes = serde_json::to_vec(body).map_err(|e| Error::Body {
            path: path.to_owned(),
            message: e.to_string(),
        })?;

        let md5 = sign::content_md5(&body_bytes);
        let date = sign::http_date(Utc::now());
        let string_to_sign = sign::string_to_sign(&md5, &date, path);
        let signature = sign::signature(self.api_secret.expose_secret(), &string_to_sign);
        let authorization = sign::authorization(&self.api_id, &signature);

        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");

        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, sign::WIRE_CONTENT_TYPE)
            .header("Content-MD5", &md5)
            .header(reqwest::header::DATE, &date)
            .header(reqwest::header::AUTHORIZATION, &authorization)
            .body(body_bytes)
            .send()
            .await
            .map_err(|e| Error::Transport {
                path: path.to_owned(),
                source: e,
            })?;

        let text = resp.text().await.map_err(|e| Error::Transport {
            path: path.to_owned(),
            source: e,
        })?;

        let envelope: Envelope = serde_json::from_str(&text).map_err(|e| Error::Json {
            path: path.to_owned(),
            message: e.to_string(),
        })?;

        if envelope.is_success() {
            Ok(envelope)
        } else {
            Err(Error::Api {
                path: path.to_owned(),
                code: envelope.code_str(),
                message: envelope.message().to_owned(),
            })
        }
    }
}

impl std::fmt::Debug for DynessClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // api_secret intentionally omitted.
        f.debug_struct("DynessClient")
            .field("base_url", &self.base_url)
            .field("api_id", &self.api_id)
            .finish_non_exhaustive()
    }
}
