// ── Runtime poller configuration ──
//
// These types describe *what* to poll and with which credentials.
// They carry credential data and polling cadence, but never touch disk.
// The CLI (or any other host) constructs a `PollerConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;

use dyness_api::{DEFAULT_TIMEOUT, Region};

/// Dyness open API credentials.
///
/// The secret is held in a `SecretString`: never logged, never
/// serialized, immutable for the lifetime of the client built from it.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_id: String,
    pub api_secret: SecretString,
}

/// Configuration for polling one battery installation.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// API credentials.
    pub credentials: Credentials,
    /// Cloud region (selects the base URL once, at construction).
    pub region: Region,
    /// BMS serial number (the primary device identifier).
    pub sn_bms: String,
    /// Dongle / data-logger serial number.
    pub sn_dongle: String,
    /// Module serial. Usually left `None` and discovered from the
    /// first BMS response carrying a `SUB` point.
    pub sn_module: Option<String>,
    /// Fixed refresh cadence for the background task.
    pub refresh_interval: Duration,
    /// Per-request network timeout.
    pub timeout: Duration,
}

impl PollerConfig {
    /// Default refresh cadence: one cycle every five minutes.
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

    pub fn new(credentials: Credentials, sn_bms: impl Into<String>, sn_dongle: impl Into<String>) -> Self {
        Self {
            credentials,
            region: Region::default(),
            sn_bms: sn_bms.into(),
            sn_dongle: sn_dongle.into(),
            sn_module: None,
            refresh_interval: Self::DEFAULT_REFRESH_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
