//! Shared configuration for the Dyness monitor CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `dyness_core::PollerConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dyness_core::{Credentials, PollerConfig, Region};

/// Keyring service name for stored secrets.
const KEYRING_SERVICE: &str = "dyness";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API secret configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found")]
    ProfileNotFound { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Named installation profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            profiles: HashMap::new(),
        }
    }
}

/// One battery installation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Dyness open API ID.
    pub api_id: String,

    /// API secret (plaintext — prefer keyring or env var).
    pub api_secret: Option<String>,

    /// Environment variable name containing the API secret.
    pub api_secret_env: Option<String>,

    /// Cloud region: "global" or "apac". Unknown values fall back to global.
    #[serde(default = "default_region")]
    pub region: String,

    /// BMS serial number (from the Dyness portal).
    pub sn_bms: String,

    /// Dongle serial number.
    pub sn_dongle: String,

    /// Module serial; usually omitted and auto-discovered.
    pub sn_module: Option<String>,

    /// Refresh cadence override (seconds).
    pub refresh_interval_secs: Option<u64>,

    /// Per-request timeout override (seconds).
    pub timeout_secs: Option<u64>,
}

fn default_region() -> String {
    "global".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "dyness-rs", "dyness").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("dyness");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load configuration from an explicit file path plus the environment.
///
/// Merge order: built-in defaults, then the TOML file, then
/// `DYNESS_*` environment variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DYNESS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load the configuration from the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Profile selection ───────────────────────────────────────────────

/// The profile to operate on: explicit name, else the configured
/// default, else `"default"`.
pub fn active_profile_name(explicit: Option<&str>, cfg: &Config) -> String {
    explicit
        .map(str::to_owned)
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Fetch a profile by name.
pub fn profile<'a>(cfg: &'a Config, name: &str) -> Result<&'a Profile, ConfigError> {
    cfg.profiles.get(name).ok_or_else(|| ConfigError::ProfileNotFound {
        profile: name.to_owned(),
    })
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the API secret from the credential chain:
/// profile env var → system keyring → plaintext config value.
pub fn resolve_api_secret(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_secret_env → env var lookup
    if let Some(ref env_name) = profile.api_secret_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-secret")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref secret) = profile.api_secret {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.to_owned(),
    })
}

/// Store the API secret in the system keyring.
pub fn store_api_secret(profile_name: &str, secret: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-secret"))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })?;
    entry.set_password(secret).map_err(|e| ConfigError::Validation {
        field: "keyring".into(),
        reason: e.to_string(),
    })
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `PollerConfig` from a profile.
pub fn profile_to_poller_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<PollerConfig, ConfigError> {
    if profile.sn_bms.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "sn_bms".into(),
            reason: "must not be empty".into(),
        });
    }
    if profile.sn_dongle.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "sn_dongle".into(),
            reason: "must not be empty".into(),
        });
    }

    let api_secret = resolve_api_secret(profile, profile_name)?;
    let credentials = Credentials {
        api_id: profile.api_id.clone(),
        api_secret,
    };

    let mut config = PollerConfig::new(credentials, &profile.sn_bms, &profile.sn_dongle);
    config.region = Region::from_key(&profile.region);
    config.sn_module = profile
        .sn_module
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);
    if let Some(secs) = profile.refresh_interval_secs {
        config.refresh_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = profile.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}
