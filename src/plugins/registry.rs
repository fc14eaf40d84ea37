//! Plugin lookup and catalog for plughost
//!
//! `PluginManager` searches the plugin directories. Looking up one name stats
//! `<dir>/docker-<name>` in precedence order and validates only the first
//! hit. Listing reads every directory, groups executables by name, and
//! validates the highest-precedence one of each group; the others are
//! recorded as shadowed.
//!
//! `PluginRegistry` holds the result of a listing for help and `plugin ls`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Command;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{HostError, Result};

use super::candidate::{ExecCandidate, DEFAULT_METADATA_TIMEOUT};
use super::dirs::{exe_name, PluginDirs};
use super::loader::{is_valid_plugin_name, new_plugin, trim_exe_suffix};
use super::types::{Plugin, NAME_PREFIX};

/// Finds and validates plugins against a builtin command tree.
#[derive(Debug, Clone)]
pub struct PluginManager<'a> {
    dirs: Vec<PathBuf>,
    builtins: &'a Command,
    metadata_timeout: Duration,
}

impl<'a> PluginManager<'a> {
    pub fn new(dirs: &PluginDirs, builtins: &'a Command) -> Self {
        Self {
            dirs: dirs.resolve(),
            builtins,
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
        }
    }

    /// A manager for the directories and timeout named by `config`.
    pub fn from_config(config: &Config, builtins: &'a Command) -> Self {
        Self::new(&PluginDirs::from_config(config), builtins)
            .with_metadata_timeout(config.metadata_timeout())
    }

    pub fn with_metadata_timeout(mut self, timeout: Duration) -> Self {
        self.metadata_timeout = timeout;
        self
    }

    /// Search directories, highest precedence first.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub(crate) fn candidate(&self, path: PathBuf) -> ExecCandidate {
        ExecCandidate::new(path).with_timeout(self.metadata_timeout)
    }

    /// Path of the executable that would serve plugin `name`, if any.
    ///
    /// Only "file does not exist" moves on to the next directory. A file that
    /// exists but cannot be stat'ed or executed still ends the search, so
    /// that it is reported as broken instead of silently skipped.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        let exe = exe_name(name);
        for dir in &self.dirs {
            let path = dir.join(&exe);
            match fs::metadata(&path) {
                Ok(_) => return Some(path),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Plugin stat failed, using it anyway");
                    return Some(path);
                }
            }
        }
        None
    }

    /// Look up and validate one plugin.
    ///
    /// Returns the plugin even when it failed validation; check `Plugin::err`.
    ///
    /// # Errors
    /// - `HostError::NotFound` if `name` is not a valid plugin name (the
    ///   filesystem is not consulted) or no directory contains it.
    /// - `HostError::InvalidCandidate` if the matched file is not a candidate.
    pub async fn get_plugin(&self, name: &str) -> Result<Plugin> {
        if !is_valid_plugin_name(name) {
            return Err(HostError::NotFound(name.to_string()));
        }
        let path = self
            .locate(name)
            .ok_or_else(|| HostError::NotFound(name.to_string()))?;

        debug!(plugin = %name, path = %path.display(), "Found plugin candidate");
        new_plugin(&self.candidate(path), self.builtins).await
    }

    /// Validate every plugin in every directory, sorted by name.
    pub async fn list_plugins(&self) -> Result<Vec<Plugin>> {
        let candidates = find_candidates(&self.dirs);
        let mut plugins = Vec::with_capacity(candidates.len());

        for (name, mut paths) in candidates {
            let path = paths.remove(0);
            let mut plugin = new_plugin(&self.candidate(path), self.builtins).await?;
            plugin.shadowed_paths = paths;

            match &plugin.err {
                None => debug!(
                    plugin = %name,
                    version = %plugin.metadata.version,
                    "Discovered plugin"
                ),
                Some(e) => debug!(plugin = %name, error = %e, "Discovered invalid plugin"),
            }
            plugins.push(plugin);
        }

        Ok(plugins)
    }

    /// Build a catalog of every plugin found.
    pub async fn registry(&self) -> Result<PluginRegistry> {
        let mut registry = PluginRegistry::new();
        for plugin in self.list_plugins().await? {
            registry.register(plugin)?;
        }
        info!(
            plugins = registry.plugin_count(),
            invalid = registry.invalid().count(),
            "Built plugin catalog"
        );
        Ok(registry)
    }
}

/// Every plugin executable in `dirs`, grouped by plugin name.
///
/// Each group lists paths in directory precedence order. Regular files and
/// symlinks are considered; directories that do not exist are skipped.
pub fn find_candidates(dirs: &[PathBuf]) -> BTreeMap<String, Vec<PathBuf>> {
    let mut found: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for dir in dirs {
        for (name, path) in dir_candidates(dir) {
            found.entry(name).or_default().push(path);
        }
    }
    found
}

fn dir_candidates(dir: &Path) -> Vec<(String, PathBuf)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "Plugin directory does not exist, skipping");
            return Vec::new();
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Failed to read plugin directory, skipping");
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !(file_type.is_file() || file_type.is_symlink()) {
            continue;
        }
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some(name) = file_name.strip_prefix(NAME_PREFIX).and_then(trim_exe_suffix) else {
            continue;
        };
        out.push((name.to_string(), entry.path()));
    }
    out
}

/// Catalog of discovered plugins, keyed by name.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Plugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin to the catalog.
    ///
    /// # Returns
    /// `HostError::AlreadyRegistered` if a plugin with the same name is
    /// already registered; the existing entry is kept.
    pub fn register(&mut self, plugin: Plugin) -> Result<()> {
        if let Some(existing) = self.plugins.get(plugin.name()) {
            return Err(HostError::AlreadyRegistered {
                name: plugin.name.clone(),
                path: plugin.path.clone(),
                existing: existing.path.clone(),
            });
        }
        self.plugins.insert(plugin.name.clone(), plugin);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.plugins.get(name)
    }

    /// Whether `name` is a known plugin, valid or not.
    pub fn is_plugin(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// All plugins, sorted by name.
    pub fn list_plugins(&self) -> Vec<&Plugin> {
        self.plugins.values().collect()
    }

    /// Plugins that can be executed.
    pub fn valid(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.values().filter(|p| p.is_valid())
    }

    /// Plugins that were found but failed validation.
    pub fn invalid(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.values().filter(|p| !p.is_valid())
    }
}
