//! Command-line interface definition.

use clap::{Parser, Subcommand};
use codehut_access::config::AccessConfig;
use std::path::PathBuf;

/// Purchase accessibility checks for CodeHut snippets.
#[derive(Parser, Debug)]
#[command(name = "codehut-access")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the local purchase store.
    #[arg(long, env = "CODEHUT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the purchase API.
    #[arg(long, env = "CODEHUT_API_URL")]
    pub api_url: Option<String>,

    /// Deadline for a remote purchase check, in seconds.
    #[arg(long, env = "CODEHUT_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Skip the remote authority and decide from the local cache only.
    #[arg(long, env = "CODEHUT_OFFLINE")]
    pub offline: bool,

    /// Log level.
    #[arg(long, env = "RUST_LOG")]
    pub log_level: Option<String>,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Operations exposed by the CLI.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether a user may access a snippet.
    Check {
        /// Snippet identifier.
        #[arg(long, short)]
        snippet: String,

        /// Snippet price (0 for free).
        #[arg(long, short)]
        price: f64,

        /// Signed-in user; omit for an anonymous visitor.
        #[arg(long, short)]
        user: Option<String>,
    },

    /// Record a completed purchase in the local cache.
    Record {
        /// Snippet identifier.
        #[arg(long, short)]
        snippet: String,

        /// Purchasing user.
        #[arg(long, short)]
        user: String,
    },

    /// List purchases recorded locally for a user.
    List {
        /// User identifier.
        #[arg(long, short)]
        user: String,
    },

    /// Write the effective configuration as TOML.
    InitConfig {
        /// Destination file.
        path: PathBuf,
    },
}

impl Cli {
    /// Build the effective configuration: file (or defaults) overridden by flags.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded,
    /// or if the resulting configuration is out of range.
    pub fn to_config(&self) -> color_eyre::Result<AccessConfig> {
        let mut config = if let Some(ref path) = self.config {
            AccessConfig::from_file(path)?
        } else {
            AccessConfig::default()
        };

        if let Some(ref data_dir) = self.data_dir {
            config.data_dir.clone_from(data_dir);
        }
        if let Some(ref api_url) = self.api_url {
            config.authority.base_url.clone_from(api_url);
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.authority.query_timeout_secs = timeout_secs;
        }
        if self.offline {
            config.authority.enabled = false;
        }
        if let Some(ref log_level) = self.log_level {
            config.log_level.clone_from(log_level);
        }

        config.validate()?;
        Ok(config)
    }
}
