//! Plugin candidate validation for plughost
//!
//! This module turns a [`Candidate`] into a [`Plugin`] record. Validation is a
//! fixed sequence of checks; the first one that fails decides the outcome and
//! no further checks run.
//!
//! Two kinds of failure are distinguished:
//! - structural problems (empty path, missing `docker-` prefix) mean the file
//!   is not a plugin candidate at all, and are returned as `Err`;
//! - everything else yields `Ok(plugin)` with `plugin.err` set, so the broken
//!   plugin can still be listed along with the reason it cannot run.

use clap::Command;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::error::Category;
use tracing::debug;

use crate::error::{HostError, Result};

use super::candidate::Candidate;
use super::types::{Metadata, Plugin, PluginError, NAME_PREFIX, SUPPORTED_SCHEMA_VERSION};

/// Shape every plugin command name must have: lowercase alphanumeric words
/// joined by single dashes, starting with a letter.
pub const PLUGIN_NAME_PATTERN: &str = r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$";

static PLUGIN_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(PLUGIN_NAME_PATTERN).expect("plugin name pattern compiles"));

/// Whether `name` (without prefix) is an acceptable plugin command name.
pub fn is_valid_plugin_name(name: &str) -> bool {
    PLUGIN_NAME_RE.is_match(name)
}

/// Validate a candidate against the builtin command tree.
///
/// `builtins` is the root command; the names and aliases of its direct
/// subcommands are reserved and cannot be taken by a plugin. The tree is only
/// read.
///
/// # Errors
/// - `HostError::InvalidCandidate` if the path is empty, has no file name,
///   lacks the `docker-` prefix, or (on Windows) lacks the `.exe` suffix.
///
/// Every other problem is reported through `Plugin::err`.
pub async fn new_plugin(candidate: &dyn Candidate, builtins: &Command) -> Result<Plugin> {
    let path = candidate.path();
    if path.as_os_str().is_empty() {
        return Err(HostError::InvalidCandidate(
            "plugin candidate path cannot be empty".to_string(),
        ));
    }

    let fullname = path.file_name().ok_or_else(|| {
        HostError::InvalidCandidate(format!(
            "unable to determine basename of plugin candidate {:?}",
            path.display().to_string()
        ))
    })?;
    let fullname = fullname.to_string_lossy();

    let Some(name) = fullname.strip_prefix(NAME_PREFIX) else {
        return Err(HostError::InvalidCandidate(format!(
            "plugin candidate {:?}: does not have {:?} prefix",
            path.display().to_string(),
            NAME_PREFIX
        )));
    };
    let name = trim_exe_suffix(name).ok_or_else(|| {
        HostError::InvalidCandidate(format!(
            "path {:?} lacks required {:?} suffix",
            path.display().to_string(),
            std::env::consts::EXE_SUFFIX
        ))
    })?;

    let mut plugin = Plugin::new(name, path.to_path_buf());

    if !is_valid_plugin_name(name) {
        return Ok(plugin.invalid(PluginError::new(format!(
            "plugin candidate {:?} did not match {:?}",
            name, PLUGIN_NAME_PATTERN
        ))));
    }

    if let Some(err) = builtin_conflict(name, builtins) {
        return Ok(plugin.invalid(err));
    }

    let raw = match candidate.metadata().await {
        Ok(raw) => raw,
        Err(e) => {
            debug!(plugin = %name, error = %e, "Metadata subcommand failed");
            return Ok(plugin.invalid(PluginError::wrap(e, "failed to fetch metadata")));
        }
    };

    let metadata: Metadata = match serde_json::from_slice(&raw) {
        Ok(metadata) => metadata,
        Err(e) => return Ok(plugin.invalid(invalid_metadata(e))),
    };
    plugin.metadata = metadata;

    if plugin.metadata.schema_version != SUPPORTED_SCHEMA_VERSION {
        let err = PluginError::new(format!(
            "plugin SchemaVersion {:?} is not valid",
            plugin.metadata.schema_version
        ));
        return Ok(plugin.invalid(err));
    }

    if plugin.metadata.vendor.trim().is_empty() {
        return Ok(plugin.invalid(PluginError::new(
            "plugin metadata does not define a vendor",
        )));
    }

    Ok(plugin)
}

/// Strip the platform executable suffix. `None` means it was required but absent.
pub(crate) fn trim_exe_suffix(name: &str) -> Option<&str> {
    let suffix = std::env::consts::EXE_SUFFIX;
    if suffix.is_empty() {
        return Some(name);
    }
    name.strip_suffix(suffix)
}

fn builtin_conflict(name: &str, builtins: &Command) -> Option<PluginError> {
    for cmd in builtins.get_subcommands() {
        if cmd.get_name() == name {
            return Some(PluginError::new(format!(
                "plugin {:?} duplicates builtin command",
                name
            )));
        }
        if cmd.get_all_aliases().any(|alias| alias == name) {
            return Some(PluginError::new(format!(
                "plugin {:?} duplicates an alias of builtin command {:?}",
                name,
                cmd.get_name()
            )));
        }
    }
    None
}

fn invalid_metadata(err: serde_json::Error) -> PluginError {
    let message = match err.classify() {
        Category::Syntax => format!("invalid metadata: invalid character: {}", err),
        _ => format!("invalid metadata: {}", err),
    };
    PluginError::with_message(err, message)
}
