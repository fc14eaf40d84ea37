//! Plugin search directories
//!
//! Plugins are looked up in an ordered list of directories and the first
//! directory holding a match wins. From highest to lowest precedence:
//!
//! 1. extra directories from the configuration file, in the order given;
//! 2. the user's own plugin directory, `<config dir>/cli-plugins`;
//! 3. system-wide directories for the current OS.
//!
//! Every input is an explicit value on [`PluginDirs`], so precedence can be
//! tested without touching the real home directory or system paths.

use std::path::PathBuf;

use crate::config::Config;

use super::types::NAME_PREFIX;

/// Name of the per-user plugin directory inside the config directory.
pub const USER_PLUGIN_DIR_NAME: &str = "cli-plugins";

/// Ordered set of directories to search for plugins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDirs {
    extra: Vec<PathBuf>,
    user: PathBuf,
    system: Vec<PathBuf>,
}

impl PluginDirs {
    pub fn new(extra: Vec<PathBuf>, user: PathBuf, system: Vec<PathBuf>) -> Self {
        Self {
            extra,
            user,
            system,
        }
    }

    /// Directories for the given configuration and this OS's system paths.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.extra_plugin_dirs(),
            config.dir().join(USER_PLUGIN_DIR_NAME),
            default_system_dirs(),
        )
    }

    /// All directories, highest precedence first.
    pub fn resolve(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::with_capacity(self.extra.len() + 1 + self.system.len());
        dirs.extend(self.extra.iter().cloned());
        dirs.push(self.user.clone());
        dirs.extend(self.system.iter().cloned());
        dirs
    }
}

/// System-wide plugin directories on Unix-like systems.
#[cfg(not(windows))]
pub fn default_system_dirs() -> Vec<PathBuf> {
    [
        "/usr/local/lib/docker/cli-plugins",
        "/usr/local/libexec/docker/cli-plugins",
        "/usr/lib/docker/cli-plugins",
        "/usr/libexec/docker/cli-plugins",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

/// System-wide plugin directories on Windows.
#[cfg(windows)]
pub fn default_system_dirs() -> Vec<PathBuf> {
    ["ProgramData", "ProgramFiles"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .map(|root| PathBuf::from(root).join("Docker").join("cli-plugins"))
        .collect()
}

/// File name of the executable implementing plugin `name` on this platform.
pub fn exe_name(name: &str) -> String {
    format!("{}{}{}", NAME_PREFIX, name, std::env::consts::EXE_SUFFIX)
}
