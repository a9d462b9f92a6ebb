//! Environment-driven configuration
//!
//! # Environment variables
//!
//! - `TALLY_DB` - database path (default: `<data dir>/tally/tally.db`)
//! - `TALLY_CLOUD_SYNC` - `true` enables cloud sync; also honoured when set
//!   at build time
//! - `TALLY_SYNC_URL` - base URL of the sync gateway
//! - `TALLY_SYNC_TOKEN` - optional bearer token for the gateway
//! - `TALLY_SYNC_TIMEOUT_SECS` - request timeout (default 30)

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable names
pub const DB_PATH_ENV: &str = "TALLY_DB";
pub const CLOUD_SYNC_ENV: &str = "TALLY_CLOUD_SYNC";
pub const SYNC_URL_ENV: &str = "TALLY_SYNC_URL";
pub const SYNC_TOKEN_ENV: &str = "TALLY_SYNC_TOKEN";
pub const SYNC_TIMEOUT_ENV: &str = "TALLY_SYNC_TIMEOUT_SECS";

pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloud sync flag baked in at compile time
const BUILD_CLOUD_SYNC: Option<&str> = option_env!("TALLY_CLOUD_SYNC");

/// Top-level configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub sync: SyncConfig,
}

impl Config {
    /// Build configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup(DB_PATH_ENV)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        Self {
            db_path,
            sync: SyncConfig::from_lookup(lookup),
        }
    }
}

/// Cloud sync configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            token: None,
            timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = is_true(BUILD_CLOUD_SYNC) || is_true(lookup(CLOUD_SYNC_ENV).as_deref());

        let timeout = lookup(SYNC_TIMEOUT_ENV)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SYNC_TIMEOUT);

        Self {
            enabled,
            url: lookup(SYNC_URL_ENV).filter(|u| !u.trim().is_empty()),
            token: lookup(SYNC_TOKEN_ENV).filter(|t| !t.trim().is_empty()),
            timeout,
        }
    }

    /// Enabled sync configuration with no gateway (tests, in-process stores)
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Check if an HTTP gateway is configured
    pub fn has_gateway(&self) -> bool {
        self.url.is_some()
    }
}

fn is_true(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Default database location: `~/.local/share/tally/tally.db` on Linux
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tally")
        .join("tally.db")
}
