//! Running a plugin as a subcommand
//!
//! The plugin receives the root CLI's complete argument vector (minus the
//! program name), not just the arguments that follow the plugin name, so
//! global flags given before the plugin name reach it unchanged. Standard
//! streams are the parent's own OS handles; nothing buffers in between.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

use crate::error::{HostError, Result};

use super::registry::PluginManager;
use super::types::REEXEC_ENV_VAR;

/// The command line the root CLI was started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
}

impl Invocation {
    /// Build from a full argv, program name first.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv.next().unwrap_or_default();
        Self {
            program,
            args: argv.collect(),
        }
    }

    /// The current process's command line.
    pub fn from_env() -> Self {
        Self::new(std::env::args_os())
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Every argument after the program name.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl PluginManager<'_> {
    /// Resolve plugin `name` and prepare the command that runs it.
    ///
    /// # Errors
    /// - `HostError::NotFound` if no such plugin exists (or the name cannot
    ///   be a plugin name); callers should fall back to their unknown-command
    ///   handling.
    /// - `HostError::Invalid` if the plugin exists but failed validation.
    /// - `HostError::InvalidCandidate` if the matched file is not a candidate.
    pub async fn run_command(&self, name: &str, invocation: &Invocation) -> Result<Command> {
        let plugin = self.get_plugin(name).await?;
        if let Some(err) = plugin.err {
            return Err(HostError::Invalid {
                name: plugin.name,
                source: err,
            });
        }

        debug!(plugin = %name, path = %plugin.path.display(), "Resolved plugin");
        Ok(plugin_command(&plugin.path, invocation))
    }
}

/// The command running the plugin at `path` for `invocation`.
pub fn plugin_command(path: &Path, invocation: &Invocation) -> Command {
    let mut cmd = Command::new(path);
    cmd.args(invocation.args())
        .env(REEXEC_ENV_VAR, invocation.program())
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    cmd
}

/// Run a prepared plugin command to completion and return its exit code.
///
/// A child killed by a signal on Unix reports `128 + signal`, as shells do.
pub async fn run_plugin(cmd: Command) -> Result<i32> {
    let mut cmd = tokio::process::Command::from(cmd);
    let status = cmd.status().await?;
    let code = exit_code(status);
    debug!(code, "Plugin exited");
    Ok(code)
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
