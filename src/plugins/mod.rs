//! External CLI plugins for plughost
//!
//! A plugin is a separate executable named `docker-<name>` that plughost runs
//! as if `<name>` were one of its own subcommands. Before running anything,
//! the plugin is located in the plugin directories and validated: it must
//! answer `docker-cli-plugin-metadata` with a JSON description of itself, and
//! its name must not clash with a builtin command.
//!
//! # Architecture
//!
//! - **types**: wire metadata, the `Plugin` record, `PluginError`, protocol constants
//! - **candidate**: the `Candidate` trait and the exec-based implementation
//! - **loader**: the validation state machine (`new_plugin`)
//! - **dirs**: search directory precedence (`PluginDirs`)
//! - **registry**: lookup by name, full listing, and the `PluginRegistry` catalog
//! - **invoke**: building and running the plugin process
//! - **annotations**: what help and listing output learn about each plugin
//!
//! # Plugin Directory Structure
//!
//! ```text
//! ~/.docker/cli-plugins/
//! ├── docker-compose
//! ├── docker-buildx
//! └── docker-hello
//! ```
//!
//! # Metadata
//!
//! ```text
//! $ docker-hello docker-cli-plugin-metadata
//! {"SchemaVersion":"0.1.0","Vendor":"Acme Inc.","Version":"v1.0.0","ShortDescription":"Say hello"}
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! # async fn demo() -> plughost::error::Result<()> {
//! use plughost::config::Config;
//! use plughost::plugins::{run_plugin, Invocation, PluginManager};
//!
//! let config = Config::load()?;
//! let builtins = clap::Command::new("plughost").subcommand(clap::Command::new("version"));
//! let manager = PluginManager::from_config(&config, &builtins);
//!
//! let cmd = manager.run_command("hello", &Invocation::from_env()).await?;
//! let code = run_plugin(cmd).await?;
//! std::process::exit(code);
//! # }
//! ```

pub mod annotations;
mod candidate;
pub mod dirs;
mod invoke;
mod loader;
pub mod registry;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use candidate::{Candidate, ExecCandidate, DEFAULT_METADATA_TIMEOUT};
pub use dirs::{default_system_dirs, exe_name, PluginDirs};
pub use invoke::{plugin_command, run_plugin, Invocation};
pub use loader::{is_valid_plugin_name, new_plugin, PLUGIN_NAME_PATTERN};
pub use registry::{find_candidates, PluginManager, PluginRegistry};
pub use types::{
    Metadata, Plugin, PluginError, METADATA_SUBCOMMAND_NAME, NAME_PREFIX, REEXEC_ENV_VAR,
    SUPPORTED_SCHEMA_VERSION,
};
