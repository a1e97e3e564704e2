//! Host configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux/macOS: `~/.config/blobbridge/host.toml`
//! - Windows: `%APPDATA%/blobbridge/host.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use blobbridge_direct_download::DEFAULT_EXTENSIONS;
use blobbridge_transfer::{DecodeFailurePolicy, ReassemblerConfig};
use serde::{Deserialize, Serialize};

/// Host configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Private directory where finished blobs are staged before sharing.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Seconds without activity after which an unfinished transfer is evicted.
    #[serde(default = "default_session_timeout")]
    pub session_timeout_secs: u64,

    /// Seconds between sweeps for abandoned transfers.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// What an undecodable chunk does to its transfer.
    #[serde(default)]
    pub decode_failure: DecodeFailurePolicy,

    /// Navigations to URLs ending in these extensions are downloaded directly.
    #[serde(default = "default_extensions")]
    pub downloadable_extensions: Vec<String>,
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("blobbridge").join("staging")
}

fn default_session_timeout() -> u64 {
    30
}

fn default_sweep_interval() -> u64 {
    5
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            session_timeout_secs: default_session_timeout(),
            sweep_interval_secs: default_sweep_interval(),
            decode_failure: DecodeFailurePolicy::default(),
            downloadable_extensions: default_extensions(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads configuration from `path`, writing the defaults there if the
    /// file does not exist yet.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn reassembler_config(&self) -> ReassemblerConfig {
        ReassemblerConfig {
            session_timeout: Duration::from_secs(self.session_timeout_secs.max(1)),
            decode_failure: self.decode_failure,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("blobbridge").join("host.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("blobbridge")
            .join("host.toml"))
    }
}
