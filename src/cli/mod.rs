//! Command-line surface of plughost.

mod plugin;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plughost::config::Config;

#[derive(Parser, Debug)]
#[command(name = "plughost", version)]
#[command(about = "A CLI that runs docker-style plugins as subcommands", long_about = None)]
#[command(allow_external_subcommands = true)]
pub(crate) struct Cli {
    /// Location of client config files
    #[arg(long, global = true, value_name = "DIR")]
    config: Option<PathBuf>,

    /// Enable debug mode
    #[arg(short = 'D', long, global = true)]
    debug: bool,

    /// Set the logging level
    #[arg(short = 'l', long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage CLI plugins
    #[command(visible_alias = "plugins")]
    Plugin {
        #[command(subcommand)]
        action: PluginAction,
    },
    /// Show version information
    Version,
    #[command(external_subcommand)]
    External(Vec<OsString>),
}

#[derive(Subcommand, Debug)]
enum PluginAction {
    /// List all discovered plugins, including invalid ones
    #[command(visible_alias = "ls")]
    List {
        /// Print the plugin records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one plugin's record as JSON
    Inspect { name: String },
}

/// The root command as seen by plugin validation: builtin names and aliases,
/// including clap's generated `help`.
pub(crate) fn builtin_commands() -> clap::Command {
    let mut cmd = Cli::command();
    cmd.build();
    cmd
}

/// Global flags of a root-level help request.
///
/// Help lists plugins, so it is recognized before clap parses: `-h`/`--help`
/// ahead of any subcommand, or the `help` subcommand. Everything else goes
/// through clap unchanged.
#[derive(Debug, Default, PartialEq)]
struct HelpRequest {
    config: Option<PathBuf>,
    debug: bool,
    log_level: Option<String>,
}

impl HelpRequest {
    fn scan(args: &[OsString]) -> Option<Self> {
        let mut req = Self::default();
        let mut help = false;
        let mut in_help_command = false;
        let mut rest = args.iter().skip(1);
        while let Some(arg) = rest.next() {
            let Some(arg) = arg.to_str() else {
                if in_help_command {
                    continue;
                }
                return None;
            };
            match arg {
                "--" => break,
                "-D" | "--debug" => req.debug = true,
                "--config" => req.config = rest.next().map(PathBuf::from),
                "-l" | "--log-level" => {
                    req.log_level = rest.next().map(|v| v.to_string_lossy().into_owned())
                }
                _ if arg.starts_with("--config=") => {
                    req.config = Some(PathBuf::from(&arg["--config=".len()..]))
                }
                _ if arg.starts_with("--log-level=") => {
                    req.log_level = Some(arg["--log-level=".len()..].to_string())
                }
                _ if in_help_command => {}
                "-h" | "--help" => help = true,
                "help" => {
                    help = true;
                    in_help_command = true;
                }
                _ => return None,
            }
        }
        help.then_some(req)
    }
}

pub(crate) async fn run() -> Result<()> {
    let args: Vec<OsString> = std::env::args_os().collect();

    if let Some(req) = HelpRequest::scan(&args) {
        init_logging(req.log_level.as_deref(), req.debug);
        let config = load_config(req.config.as_deref())?;
        return plugin::cmd_help(&config, &builtin_commands(), &args).await;
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.log_level.as_deref(), cli.debug);
    let config = load_config(cli.config.as_deref())?;
    let builtins = builtin_commands();

    match cli.command {
        None => plugin::cmd_help(&config, &builtins, &args).await,
        Some(Commands::Version) => {
            println!("plughost {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Plugin { action }) => match action {
            PluginAction::List { json } => plugin::cmd_plugin_list(&config, &builtins, json).await,
            PluginAction::Inspect { name } => {
                plugin::cmd_plugin_inspect(&config, &builtins, &name).await
            }
        },
        Some(Commands::External(args)) => plugin::cmd_external(&config, &builtins, &args).await,
    }
}

fn load_config(dir: Option<&Path>) -> Result<Config> {
    match dir {
        Some(dir) => Config::load_from(dir),
        None => Config::load(),
    }
    .with_context(|| "Failed to load configuration")
}

fn init_logging(log_level: Option<&str>, debug: bool) {
    let filter = match (log_level, debug) {
        (Some(level), _) => EnvFilter::new(level),
        (None, true) => EnvFilter::new("debug"),
        (None, false) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
