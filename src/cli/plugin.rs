//! Plugin command handlers (dispatch, listing, inspection, help).

use std::ffi::OsString;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Command, CommandFactory};
use tracing::debug;

use plughost::config::Config;
use plughost::plugins::annotations::{
    add_plugin_command_stubs, annotations, invalid_reason, vendor, version,
};
use plughost::plugins::{run_plugin, Invocation, Plugin, PluginManager};

use super::Cli;

/// Run an external plugin as if it were a builtin subcommand.
///
/// A missing plugin becomes clap's usual unrecognized-subcommand error. An
/// invalid plugin reports why it cannot run. Otherwise this process exits
/// with the plugin's exit code.
pub(crate) async fn cmd_external(
    config: &Config,
    builtins: &Command,
    args: &[OsString],
) -> Result<()> {
    let name = args
        .first()
        .map(|a| a.to_string_lossy().into_owned())
        .unwrap_or_default();
    let manager = PluginManager::from_config(config, builtins);

    let cmd = match manager.run_command(&name, &Invocation::from_env()).await {
        Ok(cmd) => cmd,
        Err(e) if e.is_not_found() => {
            debug!(plugin = %name, "No plugin found, reporting unknown command");
            Cli::command()
                .error(
                    ErrorKind::InvalidSubcommand,
                    format!("unrecognized subcommand '{}'", name),
                )
                .exit()
        }
        Err(e) => return Err(e.into()),
    };

    let code = run_plugin(cmd)
        .await
        .with_context(|| format!("Failed to run plugin {}", name))?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// `plughost plugin ls`
pub(crate) async fn cmd_plugin_list(config: &Config, builtins: &Command, json: bool) -> Result<()> {
    let registry = PluginManager::from_config(config, builtins)
        .registry()
        .await
        .with_context(|| "Failed to list plugins")?;
    let plugins: Vec<&Plugin> = registry.list_plugins();

    if json {
        println!("{}", serde_json::to_string_pretty(&plugins)?);
    } else {
        print!("{}", format_plugin_table(&plugins));
    }
    Ok(())
}

/// `plughost plugin inspect <name>`
pub(crate) async fn cmd_plugin_inspect(
    config: &Config,
    builtins: &Command,
    name: &str,
) -> Result<()> {
    let plugin = PluginManager::from_config(config, builtins)
        .get_plugin(name)
        .await?;
    println!("{}", serde_json::to_string_pretty(&plugin)?);
    Ok(())
}

/// Root help, `--help` and `help <name>`, rendered with plugin stubs and the
/// invalid-plugin section.
pub(crate) async fn cmd_help(config: &Config, builtins: &Command, args: &[OsString]) -> Result<()> {
    let mut root = help_command(&PluginManager::from_config(config, builtins)).await?;
    if let Err(e) = root.clone().try_get_matches_from(args) {
        e.exit();
    }
    root.print_help()?;
    println!();
    Ok(())
}

/// The root command with every discovered plugin attached.
async fn help_command(manager: &PluginManager<'_>) -> Result<Command> {
    let plugins = manager
        .list_plugins()
        .await
        .with_context(|| "Failed to list plugins")?;
    Ok(add_plugin_command_stubs(Cli::command(), &plugins))
}

fn format_plugin_table(plugins: &[&Plugin]) -> String {
    let mut out = format!(
        "{:<16} {:<12} {:<20} {}\n",
        "NAME", "VERSION", "VENDOR", "DESCRIPTION"
    );
    let mut invalid = Vec::new();
    for plugin in plugins {
        let map = annotations(plugin);
        if let Some(reason) = invalid_reason(&map) {
            invalid.push(format!("{:<16} {}\n", plugin.name, reason));
            continue;
        }
        out.push_str(&format!(
            "{:<16} {:<12} {:<20} {}\n",
            plugin.name,
            version(&map),
            vendor(&map),
            plugin.metadata.short_description
        ));
        for shadowed in &plugin.shadowed_paths {
            out.push_str(&format!("  shadows {}\n", shadowed.display()));
        }
    }

    if !invalid.is_empty() {
        out.push_str("\nInvalid Plugins:\n");
        out.extend(invalid);
    }
    out
}
