//! Configuration for plughost
//!
//! Settings live in `config.json` inside the config directory. The directory
//! is, in order of preference: the `--config` flag, `$DOCKER_CONFIG`, or
//! `~/.docker`. A missing file is not an error; every setting has a default.
//!
//! ```json
//! {
//!   "cliPluginsExtraDirs": ["~/my-plugins", "/opt/plugins"],
//!   "pluginMetadataTimeoutSecs": 5
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HostError, Result};
use crate::plugins::DEFAULT_METADATA_TIMEOUT;

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "DOCKER_CONFIG";

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Additional plugin directories, searched before all others.
    #[serde(
        rename = "cliPluginsExtraDirs",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub cli_plugins_extra_dirs: Vec<String>,

    /// How long a plugin may take to answer the metadata subcommand.
    #[serde(
        rename = "pluginMetadataTimeoutSecs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub plugin_metadata_timeout_secs: Option<u64>,

    #[serde(skip)]
    dir: PathBuf,
}

impl Config {
    /// A default configuration rooted at `dir`, without reading anything.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// The config directory used when none is given explicitly.
    pub fn default_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return PathBuf::from(dir);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".docker")
    }

    /// Load configuration from the default directory.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_dir())
    }

    /// Load `config.json` from `dir`, falling back to defaults if absent.
    pub fn load_from(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let path = dir.join(CONFIG_FILE_NAME);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::with_dir(dir));
            }
            Err(e) => {
                return Err(HostError::Config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let mut config: Config = serde_json::from_str(&content).map_err(|e| {
            HostError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.dir = dir;
        Ok(config)
    }

    /// The directory this configuration belongs to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the configuration file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    /// Extra plugin directories with a leading `~` expanded.
    pub fn extra_plugin_dirs(&self) -> Vec<PathBuf> {
        self.cli_plugins_extra_dirs
            .iter()
            .map(|d| expand_home(d))
            .collect()
    }

    /// Effective timeout for the plugin metadata subcommand.
    pub fn metadata_timeout(&self) -> Duration {
        self.plugin_metadata_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_METADATA_TIMEOUT)
    }
}

fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(path),
    }
}
