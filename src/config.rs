//! Configuration for codehut-access.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Directory of the local purchase store inside the data directory.
pub const STORE_DIR_NAME: &str = "purchases";

/// Upper bound accepted for `authority.query_timeout_secs`.
pub const MAX_QUERY_TIMEOUT_SECS: u64 = 3600;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Directory holding the local purchase store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Remote purchase authority configuration.
    #[serde(default)]
    pub authority: AuthorityConfig,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Remote purchase authority configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityConfig {
    /// Query the remote authority (false = local cache only).
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Base URL the `/api/purchases/check` path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Deadline for a single purchase check, in seconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            authority: AuthorityConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: default_base_url(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

impl AuthorityConfig {
    /// Deadline for a single purchase check.
    #[must_use]
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Check the authority settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the query timeout is zero or above
    /// [`MAX_QUERY_TIMEOUT_SECS`].
    pub fn validate(&self) -> crate::Result<()> {
        if self.query_timeout_secs == 0 || self.query_timeout_secs > MAX_QUERY_TIMEOUT_SECS {
            return Err(crate::Error::Config(format!(
                "authority.query_timeout_secs must be between 1 and {MAX_QUERY_TIMEOUT_SECS}, got {}",
                self.query_timeout_secs
            )));
        }
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "codehut")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".codehut"))
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_enabled() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

const fn default_query_timeout() -> u64 {
    5
}

impl AccessConfig {
    /// Directory of the local purchase store.
    #[must_use]
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join(STORE_DIR_NAME)
    }

    /// Check the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any section is out of range.
    pub fn validate(&self) -> crate::Result<()> {
        self.authority.validate()
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
